//! Checkout stress test
//!
//! Many buyers race for limited stock across several variants. The stock
//! counters must never double-spend: committed orders account for exactly
//! the available units, everyone else gets a stock conflict, and the
//! movement ledger explains every unit with an intact hash chain.

use std::sync::Arc;
use std::time::Instant;

use shared::models::{
    Actor, CartItem, CartSelection, PaymentMethod, ProductCreate, VariantCreate,
};
use shared::util::now_millis;
use shared::CoreError;
use store_server::checkout::{AddressInput, CheckoutRequest, ShippingAddress};
use store_server::core::Config;
use store_server::db::StoreStorage;
use store_server::notify::LogNotifier;
use store_server::ServerState;

const BUYERS: usize = 40;
const PRODUCTS: usize = 4;
const UNITS_PER_PRODUCT: i64 = 10;

fn build_state(dir: &tempfile::TempDir) -> ServerState {
    let config = Config {
        work_dir: dir.path().display().to_string(),
        http_port: 0,
        log_level: "warn".into(),
        environment: "development".into(),
    };
    let storage = StoreStorage::open(config.database_path()).unwrap();
    ServerState::with_storage(config, storage, Arc::new(LogNotifier))
}

#[test]
fn concurrent_buyers_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(&dir);

    for p in 0..PRODUCTS {
        state
            .catalog
            .create_product_with_id(
                &format!("p{}", p),
                ProductCreate {
                    name: format!("Product {}", p),
                    description: None,
                    category: None,
                    variants: vec![VariantCreate {
                        sku: format!("S{}", p),
                        name: "Default".into(),
                        price: 10.0 + p as f64,
                        stock: UNITS_PER_PRODUCT,
                        low_stock_threshold: 1,
                        is_default: true,
                    }],
                },
                Actor::System,
            )
            .unwrap();
    }

    // Every buyer wants 2 units of one product, round-robin across products:
    // 10 buyers per product requesting 20 units of 10 available
    for b in 0..BUYERS {
        let product_id = format!("p{}", b % PRODUCTS);
        let cart = shared::models::Cart {
            user_id: format!("u{}", b),
            items: vec![CartItem {
                product_id,
                variant_sku: None,
                qty: 2,
            }],
            updated_at: now_millis(),
        };
        let txn = state.storage.begin_write().unwrap();
        state.storage.put_cart_txn(&txn, &cart).unwrap();
        txn.commit().unwrap();
    }

    let started = Instant::now();
    let handles: Vec<_> = (0..BUYERS)
        .map(|b| {
            let checkout = state.checkout.clone();
            std::thread::spawn(move || {
                let product_id = format!("p{}", b % PRODUCTS);
                checkout.checkout(CheckoutRequest {
                    user_id: format!("u{}", b),
                    selection: vec![CartSelection {
                        product_id,
                        variant_sku: None,
                    }],
                    shipping: ShippingAddress::New(AddressInput {
                        recipient: format!("Buyer {}", b),
                        line1: "1 Main St".into(),
                        line2: None,
                        city: "Lisbon".into(),
                        postal_code: "1000-001".into(),
                        country: "PT".into(),
                        phone: None,
                    }),
                    payment_method: PaymentMethod::Online,
                })
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    eprintln!("{} checkouts in {:?}", BUYERS, started.elapsed());

    // 5 of the 10 contenders per product win (2 units each, 10 available)
    let committed = results.iter().filter(|r| r.is_ok()).count();
    let conflicted = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::InsufficientStock(_))))
        .count();
    assert_eq!(committed, PRODUCTS * 5);
    assert_eq!(committed + conflicted, BUYERS);

    for p in 0..PRODUCTS {
        let product = state.catalog.get_product(&format!("p{}", p)).unwrap();
        assert_eq!(product.variant(&format!("S{}", p)).unwrap().stock, 0);
    }

    // Every committed order has a unique order number
    let mut numbers: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|receipt| receipt.order_number.clone()))
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), committed);

    // Ledger: one initial adjustment per product plus one sale per committed
    // order, all chained
    let verification = state.reports.verify_movement_chain().unwrap();
    assert_eq!(verification.total_entries as usize, PRODUCTS + committed);
    assert!(verification.chain_intact);
}
