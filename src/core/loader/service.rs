//! Per-key once-only loader

use super::fetcher::ResourceFetcher;
use crate::utils::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Caches the result of `fetcher` per key
pub struct LoaderService<F: ResourceFetcher> {
    fetcher: F,
    slots: DashMap<String, Slot<F::Output>>,
}

impl<F: ResourceFetcher> LoaderService<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            slots: DashMap::new(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Value for `key`, fetching it on first use
    pub async fn load(&self, key: &str) -> Result<Arc<F::Output>> {
        let slot = self.slots.entry(key.to_string()).or_default().clone();

        let value = slot
            .get_or_try_init(|| async {
                debug!("Loading {}", key);
                self.fetcher.fetch(key).await.map(Arc::new)
            })
            .await?;
        Ok(value.clone())
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of keys with a loaded value
    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.initialized()).count()
    }

    /// Forget `key` so the next load fetches again; true if it was loaded
    pub fn invalidate(&self, key: &str) -> bool {
        self.slots
            .remove(key)
            .is_some_and(|(_, slot)| slot.initialized())
    }
}

impl<F: ResourceFetcher + std::fmt::Debug> std::fmt::Debug for LoaderService<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderService")
            .field("fetcher", &self.fetcher)
            .field("loaded", &self.loaded_count())
            .finish()
    }
}
