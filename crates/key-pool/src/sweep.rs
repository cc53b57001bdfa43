//! Background reclamation of stranded leases
//!
//! A caller that leases and never releases (crash, kill, lost task) would
//! otherwise park that key in the processing list until the next bootstrap.
//! The sweeper bounds the damage: every lease is timestamped, and leases
//! older than the configured TTL are released back to their recorded tier
//! with `exhausted = false`, so a crashed caller never costs a demotion.
//!
//! A sweep racing a legitimate late release is harmless: whichever side
//! loses the processing-list removal lands on the absorbed release-anomaly
//! path.
//!
//! Each cycle also stamps processing entries that carry no timestamp at all
//! (a writer that died between the queue move and the stamp). Stamping
//! happens after the expiry scan, so such an entry is reclaimed on a later
//! cycle once its fresh stamp has aged past the TTL.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::pool::KeyPool;

/// Spawn a background task that reclaims leases older than `ttl` every
/// `interval`. Returns the `JoinHandle` for the spawned task.
pub fn spawn_sweep_task(
    pool: Arc<KeyPool>,
    ttl: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick — nothing can be stale at startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_cycle(&pool, ttl).await;
        }
    })
}

/// Run one sweep cycle: scan for expired leases and return them, then stamp
/// any untracked processing entries so they expire on a later cycle.
async fn sweep_cycle(pool: &KeyPool, ttl: Duration) {
    match pool.stale_leases(ttl).await {
        Ok(stale) if stale.is_empty() => {}
        Ok(stale) => {
            info!(count = stale.len(), "reclaiming expired leases");
            for key in stale {
                if let Err(e) = pool.release(&key, false).await {
                    warn!(error = %e, "failed to reclaim an expired lease");
                }
            }
        }
        Err(e) => warn!(error = %e, "lease sweep scan failed"),
    }

    if let Err(e) = pool.stamp_untracked_leases().await {
        warn!(error = %e, "untracked lease stamping failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::install_keys;
    use crate::memory::MemoryStore;
    use crate::store::SharedStore;
    use crate::tier::{CostTier, KeyTier, PROCESSING_QUEUE};

    async fn pool_with(keys: &[&str], tier: KeyTier) -> (Arc<MemoryStore>, KeyPool) {
        let store = Arc::new(MemoryStore::new());
        install_keys(
            store.as_ref(),
            keys.iter().map(|k| k.to_string()).collect(),
            tier,
        )
        .await
        .unwrap();
        (store.clone(), KeyPool::new(store))
    }

    #[tokio::test]
    async fn sweep_returns_expired_lease_to_its_tier() {
        let (store, pool) = pool_with(&["a"], KeyTier::Mid).await;
        pool.lease(CostTier::Mid).await.unwrap();
        assert_eq!(store.list_len(PROCESSING_QUEUE).await.unwrap(), 1);

        sweep_cycle(&pool, Duration::ZERO).await;

        assert_eq!(store.list_len(PROCESSING_QUEUE).await.unwrap(), 0);
        assert_eq!(store.list_len(KeyTier::Mid.queue()).await.unwrap(), 1);
        // The reclaimed key kept its tier.
        let lease = pool.lease(CostTier::Mid).await.unwrap();
        assert_eq!(lease.tier, KeyTier::Mid);
    }

    #[tokio::test]
    async fn sweep_leaves_fresh_leases_alone() {
        let (store, pool) = pool_with(&["a"], KeyTier::Full).await;
        pool.lease(CostTier::Full).await.unwrap();

        sweep_cycle(&pool, Duration::from_secs(3600)).await;

        assert_eq!(store.list_len(PROCESSING_QUEUE).await.unwrap(), 1);
        assert_eq!(store.list_len(KeyTier::Full.queue()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_reclaims_a_lease_with_no_timestamp() {
        let (store, pool) = pool_with(&["a"], KeyTier::Full).await;
        // Processing entry without a lease record, as left by a writer that
        // died right after the queue move.
        store
            .move_back_to_front(KeyTier::Full.queue(), PROCESSING_QUEUE)
            .await
            .unwrap();

        // First cycle stamps the entry but must not steal it.
        sweep_cycle(&pool, Duration::ZERO).await;
        assert_eq!(store.list_len(PROCESSING_QUEUE).await.unwrap(), 1);

        // A later cycle finds the stamp expired and returns the key.
        tokio::time::sleep(Duration::from_millis(5)).await;
        sweep_cycle(&pool, Duration::ZERO).await;
        assert_eq!(store.list_len(PROCESSING_QUEUE).await.unwrap(), 0);
        assert_eq!(store.list_len(KeyTier::Full.queue()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sweep_on_idle_pool_is_a_noop() {
        let (store, pool) = pool_with(&["a", "b"], KeyTier::Full).await;
        sweep_cycle(&pool, Duration::ZERO).await;
        assert_eq!(store.list_len(KeyTier::Full.queue()).await.unwrap(), 2);
    }
}
