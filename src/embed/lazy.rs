//! One-time model initialization

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

type Loader<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// A model loaded on first use, at most once per process
///
/// Concurrent first callers wait on the same initialization. The loader
/// runs on the blocking pool. A failed load leaves the cell empty, so the
/// next caller tries again.
pub struct LazyModel<T> {
    name: String,
    cell: OnceCell<Arc<T>>,
    loader: Loader<T>,
}

#[cfg_attr(not(feature = "local-embed"), allow(dead_code))]
impl<T: Send + Sync + 'static> LazyModel<T> {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the model, loading it if this is the first use
    pub async fn get(&self) -> Result<Arc<T>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                info!(model = %self.name, "Loading embedding model");
                let loader = Arc::clone(&self.loader);
                let model = tokio::task::spawn_blocking(move || (*loader)())
                    .await
                    .map_err(|e| Error::Embedding(format!("Task join error: {}", e)))??;
                info!(model = %self.name, "Embedding model loaded");
                Ok::<_, Error>(Arc::new(model))
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let lazy = Arc::new(LazyModel::new("slow-model", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(42usize)
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                tokio::spawn(async move { *lazy.get().await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let lazy = LazyModel::new("flaky-model", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::Embedding("download failed".to_string()))
            } else {
                Ok("ready")
            }
        });

        tokio_test::assert_err!(lazy.get().await);
        assert!(!lazy.is_loaded());

        let model = tokio_test::assert_ok!(lazy.get().await);
        assert_eq!(*model, "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
