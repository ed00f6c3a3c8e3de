use crate::domain::order::{Order, OrderStatus, OrderUpdate, Priority, StatusReport};
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Column Family for order records, keyed by business `order_id`.
pub const CF_ORDERS: &str = "orders";
/// Column Family mapping the process-assigned `id` to its `order_id`.
pub const CF_ORDER_IDS: &str = "order_ids";
/// Column Family indexing ready orders in dispatch order. Values are `order_id`s.
pub const CF_READY: &str = "ready";

/// Index key that sorts bytewise the way `dispatch_order` sorts orders: priority rank,
/// then `created_at`, then `order_id`.
fn ready_key(order: &Order) -> Vec<u8> {
    let rank: u8 = match order.priority {
        Priority::High => 0,
        Priority::Normal => 1,
    };
    // Sign bit flipped so pre-epoch seconds still compare as unsigned bytes
    let secs = (order.created_at.timestamp() as u64) ^ (1 << 63);
    let nanos = order.created_at.timestamp_subsec_nanos();

    let mut key = Vec::with_capacity(13 + order.order_id.len());
    key.push(rank);
    key.extend_from_slice(&secs.to_be_bytes());
    key.extend_from_slice(&nanos.to_be_bytes());
    key.extend_from_slice(order.order_id.as_bytes());
    key
}

/// A persistent order store implementation using RocksDB.
///
/// RocksDB has no conditional update, so every read-check-write (create, claim, update,
/// stale-claim release) runs under a single write mutex. Each record write also maintains
/// the `ready` index in the same batch, so selection never scans the whole store. Plain
/// reads go straight to the DB.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("orders", "order_ids" and "ready")
    /// exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_ORDERS, CF_ORDER_IDS, CF_READY]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            OrderError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_guard
            .lock()
            .map_err(|_| OrderError::StoreUnavailable("write guard poisoned".to_string()))
    }

    fn read_order(&self, order_id: &str) -> Result<Option<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(cf, order_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Adds the record and its `ready` index entry to `batch`.
    fn stage_order(&self, batch: &mut WriteBatch, order: &Order) -> Result<()> {
        batch.put_cf(
            self.cf(CF_ORDERS)?,
            order.order_id.as_bytes(),
            serde_json::to_vec(order)?,
        );
        let ready = self.cf(CF_READY)?;
        if order.is_ready() {
            batch.put_cf(ready, ready_key(order), order.order_id.as_bytes());
        } else {
            batch.delete_cf(ready, ready_key(order));
        }
        Ok(())
    }

    fn write_order(&self, order: &Order) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_order(&mut batch, order)?;
        self.db.write(batch)?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            orders.push(serde_json::from_slice(&value)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create(&self, order: Order) -> Result<()> {
        let _guard = self.lock_writes()?;
        if self.read_order(&order.order_id)?.is_some() {
            return Err(OrderError::Duplicate(order.order_id));
        }

        let mut batch = WriteBatch::default();
        self.stage_order(&mut batch, &order)?;
        batch.put_cf(
            self.cf(CF_ORDER_IDS)?,
            order.id.as_bytes(),
            order.order_id.as_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order> {
        let cf = self.cf(CF_ORDER_IDS)?;
        let order_id = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let order_id = String::from_utf8(order_id)
            .map_err(|e| OrderError::InternalError(Box::new(e)))?;
        self.get_by_order_id(&order_id).await
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Order> {
        self.read_order(order_id)?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn next_ready(&self) -> Result<Order> {
        let cf = self.cf(CF_READY)?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, order_id) = item?;
            let order_id = std::str::from_utf8(&order_id)
                .map_err(|e| OrderError::InternalError(Box::new(e)))?;
            // The iterator is a snapshot; the record may have been claimed since
            if let Some(order) = self.read_order(order_id)?.filter(Order::is_ready) {
                return Ok(order);
            }
        }
        Err(OrderError::NotFound("no ready order".to_string()))
    }

    async fn claim(&self, order_id: &str) -> Result<()> {
        let _guard = self.lock_writes()?;
        match self.read_order(order_id)? {
            Some(mut order) if order.is_ready() => {
                order.apply(&OrderUpdate {
                    order_id: order_id.to_string(),
                    status: None,
                    lock: Some(true),
                })?;
                self.write_order(&order)
            }
            _ => Err(OrderError::NotFound(order_id.to_string())),
        }
    }

    async fn update(&self, update: OrderUpdate) -> Result<()> {
        let _guard = self.lock_writes()?;
        let mut order = self
            .read_order(&update.order_id)?
            .ok_or_else(|| OrderError::NotFound(update.order_id.clone()))?;
        order.apply(&update)?;
        self.write_order(&order)
    }

    async fn status_report(&self) -> Result<StatusReport> {
        Ok(self.scan()?.into_iter().map(|order| order.status).collect())
    }

    async fn release_stale_claims(&self) -> Result<usize> {
        let _guard = self.lock_writes()?;
        let mut batch = WriteBatch::default();
        let mut released = 0;
        for mut order in self.scan()? {
            if order.lock && order.status == OrderStatus::Pending {
                order.apply(&OrderUpdate {
                    order_id: order.order_id.clone(),
                    status: None,
                    lock: Some(false),
                })?;
                self.stage_order(&mut batch, &order)?;
                released += 1;
            }
        }
        self.db.write(batch)?;
        Ok(released)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.scan()
    }
}
