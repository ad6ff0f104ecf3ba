//! Stale Cleanup Task
//!
//! Background task that periodically removes stale cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically purges stale cache entries.
///
/// Only useful while the stale fallback is off: with it on, stale entries are
/// the fallback values and must be kept.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(cache: CacheStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting stale cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_stale(Instant::now());
            if removed > 0 {
                info!("Stale cleanup: removed {} entries", removed);
            } else {
                debug!("Stale cleanup: no stale entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregationResult;

    const TTL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_stale_entries() {
        let cache = CacheStore::new(TTL, 0);
        cache
            .refresh("octocat", Instant::now(), || async { Ok(AggregationResult::default()) })
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(TTL + Duration::from_millis(1500)).await;
        assert!(cache.get("octocat").is_none(), "Stale entry should have been purged");

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_fresh_entries() {
        let cache = CacheStore::new(Duration::from_secs(3600), 0);
        cache
            .refresh("octocat", Instant::now(), || async { Ok(AggregationResult::default()) })
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(cache.get("octocat").is_some(), "Fresh entry should not be removed");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(CacheStore::new(TTL, 0), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
