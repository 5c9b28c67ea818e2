//! Server state
//!
//! One [`ServerState`] per process, cloned into every handler. All services
//! share the same [`StoreStorage`], so every mutation funnels through the
//! single redb writer.

use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::db::StoreStorage;
use crate::notify::{LogNotifier, Notifier};
use crate::orders::OrderManager;
use crate::reports::ReportService;
use crate::sales::SalesService;
use crate::stock::StockService;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: StoreStorage,
    pub catalog: CatalogService,
    pub stock: StockService,
    pub sales: SalesService,
    pub orders: OrderManager,
    pub checkout: CheckoutService,
    pub reports: ReportService,
}

impl ServerState {
    /// Open the database and wire up all services
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = StoreStorage::open(config.database_path())?;
        Ok(Self::with_storage(config.clone(), storage, Arc::new(LogNotifier)))
    }

    pub fn with_storage(
        config: Config,
        storage: StoreStorage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let catalog = CatalogService::new(storage.clone());
        let stock = StockService::new(storage.clone());
        let sales = SalesService::new(storage.clone());
        let orders = OrderManager::new(storage.clone(), stock.clone(), sales.clone());
        let checkout = CheckoutService::new(storage.clone(), stock.clone(), notifier);
        let reports = ReportService::new(storage.clone(), sales.clone());
        Self {
            config,
            storage,
            catalog,
            stock,
            sales,
            orders,
            checkout,
            reports,
        }
    }
}
