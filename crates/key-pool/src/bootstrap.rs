//! Keys-file parsing and atomic pool load
//!
//! Bootstrap is the one operation that is not safe to run against live
//! lease/release traffic: it wipes every queue and both hashes before
//! refilling. The wipe and refill go to the store as a single atomic batch,
//! so a concurrent reader sees the old pool or the new one, never a mix.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::store::{AtomicReload, SharedStore};
use crate::tier::{KeyTier, LEASED_AT, PROCESSING_QUEUE, TIER_META};

/// Parse keys-file contents: one key per line, surrounding whitespace
/// trimmed, blank lines and `#` comments skipped. Duplicate lines collapse
/// to the first occurrence — a key can only hold one pool slot.
pub fn parse_keys(contents: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for line in contents.lines() {
        let key = line.trim();
        if key.is_empty() || key.starts_with('#') {
            continue;
        }
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Clear all pool state and install `keys` into `tier`, atomically.
/// Returns the number of keys installed.
pub async fn install_keys(
    store: &dyn SharedStore,
    keys: Vec<String>,
    tier: KeyTier,
) -> Result<usize> {
    let count = keys.len();
    let mut delete: Vec<String> = KeyTier::ALL.iter().map(|t| t.queue().to_string()).collect();
    delete.extend([
        PROCESSING_QUEUE.to_string(),
        TIER_META.to_string(),
        LEASED_AT.to_string(),
    ]);
    let hash_fill = keys
        .iter()
        .map(|k| (k.clone(), tier.label().to_string()))
        .collect();
    store
        .replace_all(AtomicReload {
            delete,
            push_front: (tier.queue().to_string(), keys),
            hash_fill: (TIER_META.to_string(), hash_fill),
        })
        .await?;
    info!(count, tier = %tier, "key pool loaded");
    Ok(count)
}

/// Load the keys file at `path` into `tier`. Unreadable file →
/// `Error::Bootstrap`; an empty or all-comments file loads zero keys (and
/// still clears the pool).
pub async fn load_keys(store: &dyn SharedStore, path: &Path, tier: KeyTier) -> Result<usize> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Bootstrap(format!("cannot read {}: {e}", path.display())))?;
    install_keys(store, parse_keys(&contents), tier).await
}
