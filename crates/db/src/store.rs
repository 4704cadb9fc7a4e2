use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use fashiondesk_core::config::StoreConfig;
use fashiondesk_core::domain::order::{OrderId, OrderRecord};
use fashiondesk_core::errors::DomainError;

use crate::fixtures::seed_orders;
use crate::snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order `{0}` not found")]
    OrderNotFound(OrderId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("could not read snapshot `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write snapshot `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not decode snapshot `{path}`: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
    #[error("could not encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Key-indexed order collection behind a single reader/writer lock.
///
/// Records keep their insertion order so a save followed by a load
/// reproduces the collection exactly.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: RwLock<Vec<OrderRecord>>,
}

impl OrderStore {
    pub fn from_records(records: Vec<OrderRecord>) -> Result<Self, StoreError> {
        validate_collection(&records)?;
        Ok(Self { orders: RwLock::new(records) })
    }

    pub fn seeded() -> Self {
        Self { orders: RwLock::new(seed_orders()) }
    }

    /// Opens the snapshot at `path`, or starts from the seed orders when the
    /// file does not exist yet.
    pub async fn open_or_seed(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|source| StoreError::Read { path: path.to_path_buf(), source })?
        {
            info!(
                event_name = "store.snapshot.missing",
                path = %path.display(),
                "snapshot not found, starting from seed orders"
            );
            return Ok(Self::seeded());
        }

        let store = Self::default();
        store.load_snapshot(path).await?;
        Ok(store)
    }

    /// Store described by configuration: the configured snapshot (seeded when
    /// absent) or the seed orders alone.
    pub async fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        match &config.snapshot_path {
            Some(path) => Self::open_or_seed(path).await,
            None => Ok(Self::seeded()),
        }
    }

    /// Saves to the configured snapshot when `save_on_shutdown` is set.
    /// Returns the number of records written, if any.
    pub async fn save_on_shutdown(
        &self,
        config: &StoreConfig,
    ) -> Result<Option<usize>, StoreError> {
        match (&config.snapshot_path, config.save_on_shutdown) {
            (Some(path), true) => self.save_snapshot(path).await.map(Some),
            _ => Ok(None),
        }
    }

    pub async fn get(&self, order_id: &OrderId) -> Option<OrderRecord> {
        let orders = self.orders.read().await;
        orders.iter().find(|order| &order.order_id == order_id).cloned()
    }

    pub async fn update_address(
        &self,
        order_id: &OrderId,
        new_address: &str,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|order| &order.order_id == order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        order.address = new_address.to_string();

        info!(
            event_name = "store.order.address_updated",
            order_id = %order_id,
            "order address updated"
        );
        debug!(order_id = %order_id, address = %new_address, "new shipping address");
        Ok(())
    }

    pub async fn list(&self) -> Vec<OrderRecord> {
        self.orders.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Replaces the whole collection with the snapshot at `path`.
    ///
    /// The snapshot is decoded and validated before the lock is taken; a
    /// rejected snapshot leaves the current collection untouched.
    pub async fn load_snapshot(&self, path: &Path) -> Result<usize, StoreError> {
        let records = snapshot::read(path).await?;
        validate_collection(&records)?;
        let count = records.len();

        *self.orders.write().await = records;

        info!(
            event_name = "store.snapshot.loaded",
            path = %path.display(),
            order_count = count,
            "order snapshot loaded"
        );
        Ok(count)
    }

    /// Writes the whole collection to `path`, holding the write lock so no
    /// address update can interleave with the save.
    pub async fn save_snapshot(&self, path: &Path) -> Result<usize, StoreError> {
        let orders = self.orders.write().await;
        snapshot::write(path, &orders).await?;

        info!(
            event_name = "store.snapshot.saved",
            path = %path.display(),
            order_count = orders.len(),
            "order snapshot saved"
        );
        Ok(orders.len())
    }
}

fn validate_collection(records: &[OrderRecord]) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(&record.order_id) {
            return Err(DomainError::DuplicateOrderId(record.order_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use fashiondesk_core::config::StoreConfig;
    use fashiondesk_core::domain::order::OrderId;
    use fashiondesk_core::errors::DomainError;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{OrderStore, StoreError};
    use crate::fixtures::seed_orders;

    #[tokio::test]
    async fn get_returns_seeded_records_and_none_for_unknown_ids() {
        let store = OrderStore::seeded();

        for seeded in seed_orders() {
            let found = store.get(&seeded.order_id).await;
            assert_eq!(found, Some(seeded));
        }
        assert_eq!(store.get(&OrderId::from("999")).await, None);
    }

    #[tokio::test]
    async fn update_address_changes_only_the_address() {
        let store = OrderStore::seeded();
        let id = OrderId::from("123");
        let before = store.get(&id).await.expect("seeded order");

        store.update_address(&id, "B").await.expect("update");

        let after = store.get(&id).await.expect("seeded order");
        assert_eq!(after.address, "B");
        assert_eq!(after.customer_name, before.customer_name);
        assert_eq!(after.items, before.items);
        assert_eq!(after.status, before.status);
        assert_eq!(after.total_amount, before.total_amount);
        assert_eq!(after.create_date, before.create_date);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn update_address_for_unknown_id_is_not_found_and_changes_nothing() {
        let store = OrderStore::seeded();
        let before = store.list().await;

        let result = store.update_address(&OrderId::from("999"), "Nowhere").await;

        assert!(matches!(result, Err(StoreError::OrderNotFound(ref id)) if id.0 == "999"));
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn returned_records_do_not_alias_store_state() {
        let store = OrderStore::seeded();
        let id = OrderId::from("456");

        let mut copy = store.get(&id).await.expect("seeded order");
        copy.address = "mutated locally".to_string();

        let stored = store.get(&id).await.expect("seeded order");
        assert_ne!(stored.address, "mutated locally");
    }

    #[tokio::test]
    async fn save_then_load_reproduces_collection() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.json");
        let store = OrderStore::seeded();
        store.update_address(&OrderId::from("789"), "Changed").await.expect("update");
        let before = store.list().await;

        let saved = store.save_snapshot(&path).await.expect("save");
        let reloaded = OrderStore::default();
        let loaded = reloaded.load_snapshot(&path).await.expect("load");

        assert_eq!(saved, 3);
        assert_eq!(loaded, 3);
        assert_eq!(reloaded.list().await, before);
    }

    #[tokio::test]
    async fn snapshot_keeps_high_precision_amounts_exact() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.json");
        let amounts = ["19.99", "123456789012345678.91", "0.1000000000000000055511151231"];
        let records = seed_orders()
            .into_iter()
            .zip(amounts)
            .map(|(mut record, amount)| {
                record.total_amount = amount.parse::<Decimal>().expect("decimal");
                record
            })
            .collect::<Vec<_>>();
        let store = OrderStore::from_records(records.clone()).expect("store");

        store.save_snapshot(&path).await.expect("save");
        let reloaded = OrderStore::default();
        reloaded.load_snapshot(&path).await.expect("load");

        let loaded = reloaded.list().await;
        assert_eq!(loaded, records);
        for (record, amount) in loaded.iter().zip(amounts) {
            assert_eq!(record.total_amount.to_string(), amount);
        }
    }

    #[tokio::test]
    async fn load_missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("tempdir");
        let store = OrderStore::seeded();

        let result = store.load_snapshot(&dir.path().join("missing.json")).await;

        assert!(matches!(result, Err(StoreError::Read { .. })));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn load_malformed_file_is_a_decode_error_and_keeps_state() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.json");
        fs::write(&path, "not json").expect("write");
        let store = OrderStore::seeded();

        let result = store.load_snapshot(&path).await;

        assert!(matches!(result, Err(StoreError::Decode { .. })));
        assert_eq!(store.list().await, seed_orders());
    }

    #[tokio::test]
    async fn load_rejects_duplicate_ids() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.json");
        let mut records = seed_orders();
        records.push(records[0].clone());
        fs::write(&path, serde_json::to_vec(&records).expect("encode")).expect("write");
        let store = OrderStore::seeded();

        let result = store.load_snapshot(&path).await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DuplicateOrderId(ref id))) if id.0 == "123"
        ));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn open_or_seed_falls_back_to_seed_when_snapshot_is_absent() {
        let dir = TempDir::new().expect("tempdir");

        let store = OrderStore::open_or_seed(&dir.path().join("orders.json")).await.expect("open");

        assert_eq!(store.list().await, seed_orders());
    }

    #[tokio::test]
    async fn configured_snapshot_is_saved_on_shutdown_only_when_enabled() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("data").join("orders.json");
        let mut config =
            StoreConfig { snapshot_path: Some(path.clone()), save_on_shutdown: false };
        let store = OrderStore::from_config(&config).await.expect("open");

        assert_eq!(store.save_on_shutdown(&config).await.expect("skip"), None);
        assert!(!path.exists());

        config.save_on_shutdown = true;
        assert_eq!(store.save_on_shutdown(&config).await.expect("save"), Some(3));
        let reopened = OrderStore::from_config(&config).await.expect("reopen");
        assert_eq!(reopened.list().await, seed_orders());
    }

    #[tokio::test]
    async fn from_records_rejects_duplicates() {
        let mut records = seed_orders();
        records.push(records[1].clone());

        assert!(matches!(OrderStore::from_records(records), Err(StoreError::Domain(_))));
    }

    #[tokio::test]
    async fn concurrent_readers_and_writer_see_consistent_records() {
        let store = Arc::new(OrderStore::seeded());
        let id = OrderId::from("123");

        let mut handles = Vec::new();
        for round in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                if round % 4 == 0 {
                    store.update_address(&id, &format!("address-{round}")).await.expect("update");
                }
                let record = store.get(&id).await.expect("present");
                assert_eq!(record.customer_name, "Zhang San");
                assert_eq!(record.status, "processing");
            }));
        }
        for handle in handles {
            handle.await.expect("task");
        }

        assert_eq!(store.len().await, 3);
        assert!(store.get(&id).await.expect("present").address.starts_with("address-"));
    }
}
