use super::index::MarketIndex;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Market metadata shared by all calls of one adapter instance.
///
/// Readers never block on each other. Loads are serialized through a separate
/// guard so concurrent first calls trigger a single fetch.
#[derive(Debug, Default)]
pub struct MarketCache {
    index: RwLock<Option<Arc<MarketIndex>>>,
    loading: Mutex<()>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<MarketIndex>> {
        self.index.read().await.clone()
    }

    /// Held for the duration of a load.
    pub async fn begin_load(&self) -> MutexGuard<'_, ()> {
        self.loading.lock().await
    }

    pub async fn store(&self, index: Arc<MarketIndex>) {
        *self.index.write().await = Some(index);
    }

    pub async fn clear(&self) {
        *self.index.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_clear() {
        let cache = MarketCache::new();
        assert!(cache.current().await.is_none());

        cache.store(Arc::new(MarketIndex::new("bitso", vec![], None))).await;
        assert!(cache.current().await.is_some());

        cache.clear().await;
        assert!(cache.current().await.is_none());
    }
}
