//! Lease manager over the shared store
//!
//! `KeyPool` is stateless: every piece of mutable state lives in the shared
//! store, and every state change is a single atomic store call. That makes
//! one pool instance freely shareable across tasks, and makes several
//! processes pointed at the same store behave as one fleet-wide pool.
//!
//! Key lifecycle:
//! 1. Bootstrap installs keys into a tier queue (`bootstrap::load_keys`)
//! 2. `lease` walks the requested cost class's candidate tiers, atomically
//!    moving the first hit into the processing list
//! 3. The request layer uses the key upstream, then calls `release` exactly
//!    once with `exhausted` describing the outcome
//! 4. A non-exhausted release requeues to the recorded tier; an exhausted
//!    one demotes Full → Mid → Low, and discards at the bottom
//! 5. The sweeper returns leases stranded by crashed callers (`sweep`)

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::SharedStore;
use crate::tier::{CostTier, KeyTier, LEASED_AT, PROCESSING_QUEUE, TIER_META, candidate_tiers};

/// A leased key, ready for an upstream call.
///
/// The secret is wrapped so Debug/Display output and logs never carry key
/// material; `tier` is the queue it was taken from.
#[derive(Debug, Clone)]
pub struct LeasedKey {
    pub key: Secret<String>,
    pub tier: KeyTier,
}

impl LeasedKey {
    /// The raw key, for the upstream Authorization header and for `release`.
    pub fn as_str(&self) -> &str {
        self.key.expose()
    }
}

/// Tiered key pool: lease, release, and count diagnostics.
pub struct KeyPool {
    store: Arc<dyn SharedStore>,
}

impl KeyPool {
    /// Wrap a shared store. Construct one pool at startup and hand it to
    /// every request handler; fleet-wide safety comes from the store's
    /// atomicity, not from instance identity.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Lease a key for the given cost class.
    ///
    /// Tries each candidate tier in policy order with one atomic
    /// queue-to-processing move per tier; the first tier that yields wins.
    /// Never blocks and never retries: an empty run returns
    /// [`Error::PoolExhausted`] and backpressure is the caller's problem.
    pub async fn lease(&self, cost: CostTier) -> Result<LeasedKey> {
        for tier in candidate_tiers(cost) {
            let Some(key) = self
                .store
                .move_back_to_front(tier.queue(), PROCESSING_QUEUE)
                .await?
            else {
                continue;
            };
            if let Err(e) = self
                .store
                .hash_set(LEASED_AT, &key, &unix_millis().to_string())
                .await
            {
                // An untracked lease would be invisible to the sweeper, so
                // put the key back rather than hand it out without a stamp.
                warn!(tier = %tier, "lease timestamp write failed, requeueing key");
                if let Err(undo) = self.unwind_lease(&key, tier).await {
                    warn!(error = %undo, "lease rollback failed, sweeper will restamp");
                }
                return Err(e);
            }
            debug!(tier = %tier, cost = %cost, "key leased");
            metrics::counter!("pool_lease_total", "tier" => tier.label()).increment(1);
            return Ok(LeasedKey {
                key: Secret::new(key),
                tier,
            });
        }

        warn!(cost = %cost, "pool exhausted");
        metrics::counter!("pool_exhausted_total", "cost" => cost.label()).increment(1);
        Err(Error::PoolExhausted(cost))
    }

    /// Release a leased key back to the pool.
    ///
    /// `exhausted = false` requeues it to the tier it came from;
    /// `exhausted = true` demotes it one tier, or discards it permanently if
    /// it was already at Low. Releasing a key that is not in processing
    /// (double release, never leased, or already reclaimed by the sweeper)
    /// is logged and absorbed.
    pub async fn release(&self, key: &str, exhausted: bool) -> Result<()> {
        let removed = self.store.remove_one(PROCESSING_QUEUE, key).await?;
        if removed == 0 {
            warn!("release of a key not in processing, ignoring");
            metrics::counter!("pool_release_total", "outcome" => "anomaly").increment(1);
            return Ok(());
        }
        self.store.hash_delete(LEASED_AT, key).await?;

        let tier = self
            .store
            .hash_get(TIER_META, key)
            .await?
            .and_then(|label| KeyTier::parse(&label));
        let Some(tier) = tier else {
            // No usable recorded tier to route by: discarding beats guessing.
            warn!("leased key has no recorded tier, discarding");
            self.store.hash_delete(TIER_META, key).await?;
            metrics::counter!("pool_discard_total", "reason" => "metadata_missing").increment(1);
            return Ok(());
        };

        if !exhausted {
            self.store.push_front(tier.queue(), key).await?;
            debug!(tier = %tier, "key released");
            metrics::counter!("pool_release_total", "outcome" => "requeued").increment(1);
            return Ok(());
        }

        match tier.next_lower() {
            Some(next) => {
                // Metadata first: the key must never be leasable from the
                // lower queue while still recorded at the old tier.
                self.store.hash_set(TIER_META, key, next.label()).await?;
                self.store.push_front(next.queue(), key).await?;
                info!(from = %tier, to = %next, "key demoted");
                metrics::counter!("pool_release_total", "outcome" => "demoted").increment(1);
            }
            None => {
                self.store.hash_delete(TIER_META, key).await?;
                info!("key exhausted at lowest tier, discarded");
                metrics::counter!("pool_discard_total", "reason" => "exhausted").increment(1);
            }
        }
        Ok(())
    }

    /// Available-key count per tier, from one consistent store snapshot.
    ///
    /// Informational path: a store failure reports -1 per tier instead of an
    /// error so pollers never destabilize on a blip.
    pub async fn queue_counts(&self) -> BTreeMap<KeyTier, i64> {
        let queues: Vec<&str> = KeyTier::ALL.iter().map(|t| t.queue()).collect();
        match self.store.list_lens(&queues).await {
            Ok(lens) => KeyTier::ALL.iter().copied().zip(lens).collect(),
            Err(e) => {
                warn!(error = %e, "queue count snapshot failed");
                KeyTier::ALL.iter().map(|t| (*t, -1)).collect()
            }
        }
    }

    /// Pool health summary for a health endpoint.
    ///
    /// "healthy" while any key is available, "empty" when none are, and
    /// "unknown" when the store could not be read.
    pub async fn health(&self) -> serde_json::Value {
        let counts = self.queue_counts().await;
        let unknown = counts.values().any(|c| *c < 0);
        let available: i64 = counts.values().filter(|c| **c > 0).sum();
        let status = if unknown {
            "unknown"
        } else if available > 0 {
            "healthy"
        } else {
            "empty"
        };

        let queues: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(tier, count)| (tier.label().to_string(), (*count).into()))
            .collect();
        serde_json::json!({
            "status": status,
            "available_total": if unknown { serde_json::Value::Null } else { available.into() },
            "queues": queues,
        })
    }

    /// Return a half-leased key to its tier queue.
    async fn unwind_lease(&self, key: &str, tier: KeyTier) -> Result<()> {
        if self.store.remove_one(PROCESSING_QUEUE, key).await? > 0 {
            self.store.push_front(tier.queue(), key).await?;
        }
        Ok(())
    }

    /// Timestamp processing-list entries that have no lease record — a
    /// writer that died between the queue move and the stamp, or a rollback
    /// that could not complete. Stamped keys age out through the normal TTL
    /// path on a later sweep, so a live lease whose timestamp write is
    /// mid-flight is never stolen. Returns the number stamped.
    pub async fn stamp_untracked_leases(&self) -> Result<usize> {
        let leased = self.store.list_entries(PROCESSING_QUEUE).await?;
        if leased.is_empty() {
            return Ok(0);
        }
        let tracked: HashSet<String> = self
            .store
            .hash_entries(LEASED_AT)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let now = unix_millis().to_string();
        let mut stamped = 0;
        for key in leased {
            if !tracked.contains(&key) {
                self.store.hash_set(LEASED_AT, &key, &now).await?;
                stamped += 1;
            }
        }
        if stamped > 0 {
            warn!(count = stamped, "stamped untracked leases for reclamation");
        }
        Ok(stamped)
    }

    /// Keys whose current lease is older than `ttl`. Used by the sweeper;
    /// entries with a mangled timestamp are skipped.
    pub async fn stale_leases(&self, ttl: Duration) -> Result<Vec<String>> {
        let cutoff = unix_millis().saturating_sub(ttl.as_millis() as u64);
        let entries = self.store.hash_entries(LEASED_AT).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, ts)| match ts.parse::<u64>() {
                Ok(t) if t <= cutoff => Some(key),
                _ => None,
            })
            .collect())
    }
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
