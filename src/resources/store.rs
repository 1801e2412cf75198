use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory record table keyed by a monotonically assigned id.
#[derive(Debug)]
pub struct RecordStore<T> {
    inner: RwLock<StoreInner<T>>,
}

#[derive(Debug)]
struct StoreInner<T> {
    last_id: i64,
    records: BTreeMap<i64, T>,
}

impl<T: Clone> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                last_id: 0,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Builds a record from its freshly assigned id and stores it.
    pub async fn put_with<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        let record = build(id);
        inner.records.insert(id, record.clone());
        record
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.inner.read().await.records.get(&id).cloned()
    }

    /// Records matching `pred`, in id order.
    pub async fn query<P>(&self, pred: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        let inner = self.inner.read().await;
        inner.records.values().filter(|r| pred(*r)).cloned().collect()
    }

    /// Removes the record if `allow` accepts it. `Ok(None)` means no such id;
    /// `Err(record)` means the record exists but was refused.
    pub async fn remove_if<P>(&self, id: i64, allow: P) -> Result<Option<T>, T>
    where
        P: FnOnce(&T) -> bool,
    {
        let mut inner = self.inner.write().await;
        let record = match inner.records.get(&id) {
            None => return Ok(None),
            Some(record) => record,
        };
        if !allow(record) {
            return Err(record.clone());
        }
        Ok(inner.records.remove(&id))
    }
}
