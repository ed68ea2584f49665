//! The persistence capability and its in-memory implementation.
//!
//! The store works in whole aggregates: `load` hands out a copy of an
//! [`EntryGraph`], `save` replaces the stored one. An operation that
//! fails part-way simply never calls `save`, so partial writes cannot
//! happen.

use crate::error::{Error, Result};
use async_trait::async_trait;
use daedalus_core::{EntryGraph, EntryId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Transactional load/save of entry aggregates.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Loads a copy of the entry's aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`daedalus_core::Error::EntryNotFound`] for an unknown id.
    async fn load(&self, id: EntryId) -> Result<EntryGraph>;

    /// Replaces the stored aggregate with this one.
    ///
    /// # Errors
    ///
    /// Returns [`daedalus_core::Error::EntryNotFound`] if the entry was
    /// never inserted.
    async fn save(&self, graph: EntryGraph) -> Result<()>;

    /// Inserts a new aggregate, assigning and returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the insert.
    async fn insert(&self, graph: EntryGraph) -> Result<EntryId>;

    /// Finds an entry by its canonical path.
    ///
    /// With `published_only` set, unpublished entries are invisible.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn find_by_path(&self, canonical: &str, published_only: bool)
        -> Result<Option<EntryId>>;

    /// Ids of all stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list_ids(&self) -> Result<Vec<EntryId>>;
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<EntryId, EntryGraph>,
    next_id: u64,
}

/// In-memory [`EntryStore`], used by tests and single-process embedders.
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    inner: RwLock<Inner>,
}

impl InMemoryEntryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn load(&self, id: EntryId) -> Result<EntryGraph> {
        self.inner
            .read()
            .await
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::from(daedalus_core::Error::EntryNotFound))
    }

    async fn save(&self, graph: EntryGraph) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = graph.entry.id;
        if !inner.entries.contains_key(&id) {
            return Err(daedalus_core::Error::EntryNotFound.into());
        }
        inner.entries.insert(id, graph);
        Ok(())
    }

    async fn insert(&self, mut graph: EntryGraph) -> Result<EntryId> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = EntryId(inner.next_id);
        graph.entry.id = id;
        inner.entries.insert(id, graph);
        Ok(id)
    }

    async fn find_by_path(
        &self,
        canonical: &str,
        published_only: bool,
    ) -> Result<Option<EntryId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .find(|g| {
                g.entry.path.canonical() == canonical && (!published_only || g.entry.is_published)
            })
            .map(|g| g.entry.id))
    }

    async fn list_ids(&self) -> Result<Vec<EntryId>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<EntryId> = inner.entries.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
