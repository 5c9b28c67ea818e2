//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog with embedded variant stock counters |
//! | `orders` | `order_id` | `Order` | Orders with per-item status |
//! | `carts` | `user_id` | `Cart` | Active shopping carts |
//! | `addresses` | `address_id` | `Address` | Shipping addresses |
//! | `stock_movements` | `sequence` | `StockMovement` | Append-only movement ledger |
//! | `sale_records` | `(order_id, product_id, sku)` | `SaleRecord` | Revenue attribution |
//! | `counters` | `name` | `u64` | Movement sequence, order counter |
//! | `meta` | `name` | `string` | Ledger head hash |
//!
//! # Atomicity
//!
//! redb admits a single write transaction at a time and commits are durable
//! when `commit()` returns. Every conditional check (stock sufficiency,
//! version, terminal status) re-executes inside the write transaction that
//! applies its consequences, so a read-then-write race is impossible.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::models::{
    Actor, Address, Cart, MovementKind, MovementQuery, Order, Product, SaleRecord, StockMovement,
};
use shared::util::now_millis;
use shared::CoreError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::stock::ledger;

/// Products: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Carts: key = user_id, value = JSON-serialized Cart
const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// Addresses: key = address_id, value = JSON-serialized Address
const ADDRESSES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("addresses");

/// Movement ledger: key = global sequence, value = JSON-serialized StockMovement
const MOVEMENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("stock_movements");

/// Sale records: key = (order_id, product_id, variant_sku)
const SALES_TABLE: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("sale_records");

/// Counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Meta: key = name, value = string (ledger head hash)
const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("meta");

const MOVEMENT_SEQ_KEY: &str = "movement_seq";
const ORDER_COUNT_KEY: &str = "order_count";
const LEDGER_HEAD_KEY: &str = "ledger_head";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        CoreError::Internal(e.to_string())
    }
}

/// Movement fields supplied by stock operations; sequence, timestamp and the
/// hash chain are filled in by [`StoreStorage::append_movement`]
#[derive(Debug, Clone)]
pub struct MovementDraft {
    pub product_id: String,
    pub variant_sku: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub order_id: Option<String>,
    pub actor: Actor,
    pub note: Option<String>,
    pub unit_cost: Option<f64>,
}

/// Storage backed by redb
#[derive(Clone)]
pub struct StoreStorage {
    db: Arc<Database>,
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

impl StoreStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns, the order, its deductions and the matching ledger entries are
    /// on disk together.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
            let _ = write_txn.open_table(ADDRESSES_TABLE)?;
            let _ = write_txn.open_table(MOVEMENTS_TABLE)?;
            let _ = write_txn.open_table(SALES_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(MOVEMENT_SEQ_KEY)?.is_none() {
                counters.insert(MOVEMENT_SEQ_KEY, 0u64)?;
            }
            if counters.get(ORDER_COUNT_KEY)?.is_none() {
                counters.insert(ORDER_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Products ==========

    // Write-transaction accessors bind the decoded value to a local before
    // returning: a `Table` access guard borrows the table itself, unlike the
    // `ReadOnlyTable` guards used on the read paths.

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        let product = match table.get(id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(product)
    }

    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        table.insert(product.id.as_str(), encode(product)?.as_slice())?;
        Ok(())
    }

    pub fn get_product(&self, id: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn list_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            products.push(decode(value.value())?);
        }
        Ok(products)
    }

    // ========== Orders ==========

    pub fn get_order_txn(&self, txn: &WriteTransaction, id: &str) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let order = match table.get(id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(order)
    }

    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), encode(order)?.as_slice())?;
        Ok(())
    }

    pub fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn list_orders_by_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let order: Order = decode(value.value())?;
            if order.user_id == user_id {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Increment and return the order counter (for order numbers), within the
    /// caller's transaction so an aborted checkout does not burn a committed
    /// number ahead of the order itself
    pub fn next_order_count_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut counters = txn.open_table(COUNTERS_TABLE)?;
        let current = counters.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        counters.insert(ORDER_COUNT_KEY, next)?;
        Ok(next)
    }

    // ========== Carts ==========

    pub fn get_cart_txn(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<Option<Cart>> {
        let table = txn.open_table(CARTS_TABLE)?;
        let cart = match table.get(user_id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(cart)
    }

    pub fn put_cart_txn(&self, txn: &WriteTransaction, cart: &Cart) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        table.insert(cart.user_id.as_str(), encode(cart)?.as_slice())?;
        Ok(())
    }

    pub fn get_cart(&self, user_id: &str) -> StorageResult<Option<Cart>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;
        match table.get(user_id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Addresses ==========

    pub fn get_address_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Address>> {
        let table = txn.open_table(ADDRESSES_TABLE)?;
        let address = match table.get(id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(address)
    }

    pub fn put_address_txn(&self, txn: &WriteTransaction, address: &Address) -> StorageResult<()> {
        let mut table = txn.open_table(ADDRESSES_TABLE)?;
        table.insert(address.id.as_str(), encode(address)?.as_slice())?;
        Ok(())
    }

    // ========== Movement ledger ==========

    /// Append one movement to the ledger within the caller's transaction.
    ///
    /// Fills sequence, timestamp and the hash chain. The entry becomes
    /// durable with the rest of the transaction; callers never write
    /// movements outside the transaction that mutates the matching counter.
    pub fn append_movement(
        &self,
        txn: &WriteTransaction,
        draft: MovementDraft,
    ) -> StorageResult<StockMovement> {
        let mut counters = txn.open_table(COUNTERS_TABLE)?;
        let seq = counters
            .get(MOVEMENT_SEQ_KEY)?
            .map(|g| g.value())
            .unwrap_or(0)
            + 1;
        counters.insert(MOVEMENT_SEQ_KEY, seq)?;
        drop(counters);

        let mut meta = txn.open_table(META_TABLE)?;
        let prev_hash = meta
            .get(LEDGER_HEAD_KEY)?
            .map(|g| g.value().to_string())
            .unwrap_or_else(|| ledger::GENESIS_HASH.to_string());

        let movement = ledger::seal(seq, now_millis(), &prev_hash, draft);
        meta.insert(LEDGER_HEAD_KEY, movement.curr_hash.as_str())?;
        drop(meta);

        let mut table = txn.open_table(MOVEMENTS_TABLE)?;
        table.insert(movement.id, encode(&movement)?.as_slice())?;
        Ok(movement)
    }

    /// Filtered, paginated movement scan in append order
    pub fn query_movements(&self, query: &MovementQuery) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;
        let mut matched = Vec::new();
        let mut skipped = 0usize;
        for entry in table.iter()? {
            let (_, value) = entry?;
            let movement: StockMovement = decode(value.value())?;
            if !query_matches(query, &movement) {
                continue;
            }
            if skipped < query.offset {
                skipped += 1;
                continue;
            }
            matched.push(movement);
            if matched.len() >= query.limit {
                break;
            }
        }
        Ok(matched)
    }

    /// Full ledger scan in append order (chain verification)
    pub fn all_movements(&self) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;
        let mut movements = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            movements.push(decode(value.value())?);
        }
        Ok(movements)
    }

    pub fn movement_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Sale records ==========

    pub fn sale_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        product_id: &str,
        sku: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(SALES_TABLE)?;
        let exists = table.get((order_id, product_id, sku))?.is_some();
        Ok(exists)
    }

    pub fn insert_sale_txn(&self, txn: &WriteTransaction, record: &SaleRecord) -> StorageResult<()> {
        let mut table = txn.open_table(SALES_TABLE)?;
        table.insert(
            (
                record.order_id.as_str(),
                record.product_id.as_str(),
                record.variant_sku.as_str(),
            ),
            encode(record)?.as_slice(),
        )?;
        Ok(())
    }

    /// Returns true when a record was actually removed
    pub fn remove_sale_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        product_id: &str,
        sku: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(SALES_TABLE)?;
        let removed = table.remove((order_id, product_id, sku))?.is_some();
        Ok(removed)
    }

    pub fn list_sales(&self) -> StorageResult<Vec<SaleRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SALES_TABLE)?;
        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    pub fn sales_in_range(
        &self,
        from: Option<i64>,
        to: Option<i64>,
    ) -> StorageResult<Vec<SaleRecord>> {
        let mut records = self.list_sales()?;
        records.retain(|r| {
            from.map_or(true, |f| r.recorded_at >= f) && to.map_or(true, |t| r.recorded_at <= t)
        });
        Ok(records)
    }
}

fn query_matches(query: &MovementQuery, movement: &StockMovement) -> bool {
    if let Some(pid) = &query.product_id {
        if &movement.product_id != pid {
            return false;
        }
    }
    if let Some(sku) = &query.variant_sku {
        if &movement.variant_sku != sku {
            return false;
        }
    }
    if let Some(kind) = query.kind {
        if movement.kind != kind {
            return false;
        }
    }
    if let Some(from) = query.from {
        if movement.timestamp < from {
            return false;
        }
    }
    if let Some(to) = query.to {
        if movement.timestamp > to {
            return false;
        }
    }
    true
}
