//! In-memory table engine.
//!
//! A [`MemoryTable`] keeps records keyed by a sequential `u64` id, iterates in
//! id order and guards access with an async `RwLock`, so it can stand in for a
//! durable store behind the application's persistence ports.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

/// A slice of a table scan plus the number of rows that matched overall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice<T> {
    pub rows: Vec<T>,
    pub total: usize,
}

#[derive(Debug)]
struct Inner<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

/// Id-ordered table of `T` records.
#[derive(Debug)]
pub struct MemoryTable<T> {
    name: &'static str,
    inner: RwLock<Inner<T>>,
}

impl<T: Clone> MemoryTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Allocate the next id and store the record built from it.
    pub async fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(u64) -> T,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let row = build(id);
        inner.rows.insert(id, row.clone());
        tracing::trace!(table = self.name, id, "row inserted");
        row
    }

    pub async fn get(&self, id: u64) -> Option<T> {
        self.inner.read().await.rows.get(&id).cloned()
    }

    /// Apply `change` to the row with `id`, returning the updated row.
    pub async fn update<F>(&self, id: u64, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id)?;
        change(row);
        tracing::trace!(table = self.name, id, "row updated");
        Some(row.clone())
    }

    pub async fn remove(&self, id: u64) -> Option<T> {
        let removed = self.inner.write().await.rows.remove(&id);
        if removed.is_some() {
            tracing::trace!(table = self.name, id, "row removed");
        }
        removed
    }

    /// First row, in id order, matching the predicate.
    pub async fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.inner
            .read()
            .await
            .rows
            .values()
            .find(|row| predicate(row))
            .cloned()
    }

    pub async fn any<P>(&self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool,
    {
        self.inner.read().await.rows.values().any(predicate)
    }

    /// Every row matching the predicate, in id order.
    pub async fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.inner
            .read()
            .await
            .rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    /// Matching rows in id order, skipping `offset` and keeping at most `limit`.
    pub async fn scan<P>(&self, predicate: P, offset: usize, limit: usize) -> Slice<T>
    where
        P: Fn(&T) -> bool,
    {
        let inner = self.inner.read().await;
        let mut total = 0;
        let mut rows = Vec::new();
        for row in inner.rows.values().filter(|row| predicate(row)) {
            if total >= offset && rows.len() < limit {
                rows.push(row.clone());
            }
            total += 1;
        }
        Slice { rows, total }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
