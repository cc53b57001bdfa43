//! Tier ordering, the downgrade ladder, and lease routing policy
//!
//! Two enumerations share the same three-level set but mean different
//! things: `KeyTier` is the quota class a key currently sits in, `CostTier`
//! is the cost class a caller is asking for. Keeping them as separate types
//! stops a requested cost class from being used as a queue name by accident.

use std::fmt;

/// Quota tier of a pooled key, ordered high-value to low-value.
///
/// Demotion is strictly linear: Full → Mid → Low → discard. A key that
/// exhausts at Low leaves the pool permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyTier {
    Full,
    Mid,
    Low,
}

impl KeyTier {
    /// All tiers, high to low. Drives count snapshots and bootstrap clears.
    pub const ALL: [KeyTier; 3] = [KeyTier::Full, KeyTier::Mid, KeyTier::Low];

    /// The tier a key drops to on exhaustion, or None at the bottom.
    pub fn next_lower(self) -> Option<KeyTier> {
        match self {
            KeyTier::Full => Some(KeyTier::Mid),
            KeyTier::Mid => Some(KeyTier::Low),
            KeyTier::Low => None,
        }
    }

    /// Tier label as stored in the metadata hash and used in logs.
    pub fn label(self) -> &'static str {
        match self {
            KeyTier::Full => "full",
            KeyTier::Mid => "mid",
            KeyTier::Low => "low",
        }
    }

    /// Parse a tier label; inverse of [`KeyTier::label`].
    pub fn parse(s: &str) -> Option<KeyTier> {
        match s {
            "full" => Some(KeyTier::Full),
            "mid" => Some(KeyTier::Mid),
            "low" => Some(KeyTier::Low),
            _ => None,
        }
    }

    /// Store list holding the Available keys of this tier.
    pub fn queue(self) -> &'static str {
        match self {
            KeyTier::Full => "key_queue:full",
            KeyTier::Mid => "key_queue:mid",
            KeyTier::Low => "key_queue:low",
        }
    }
}

impl fmt::Display for KeyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cost class of an incoming request, resolved from the model name by the
/// request layer before it calls `lease`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostTier {
    Full,
    Mid,
    Low,
}

impl CostTier {
    pub fn label(self) -> &'static str {
        match self {
            CostTier::Full => "full",
            CostTier::Mid => "mid",
            CostTier::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<CostTier> {
        match s {
            "full" => Some(CostTier::Full),
            "mid" => Some(CostTier::Mid),
            "low" => Some(CostTier::Low),
            _ => None,
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Candidate key tiers for a cost class, tried in order until one yields.
///
/// Each list is a full permutation of the tiers, so no tier is structurally
/// unreachable from any cost class. The orders bias a request toward its own
/// cost class first, then spend cheaper capacity before premium capacity.
pub fn candidate_tiers(cost: CostTier) -> [KeyTier; 3] {
    match cost {
        CostTier::Full => [KeyTier::Full, KeyTier::Mid, KeyTier::Low],
        CostTier::Mid => [KeyTier::Mid, KeyTier::Full, KeyTier::Low],
        CostTier::Low => [KeyTier::Low, KeyTier::Mid, KeyTier::Full],
    }
}

/// List of keys currently leased out, tier-agnostic.
pub const PROCESSING_QUEUE: &str = "key_processing";

/// Hash: key → tier label it returns to on a non-exhausted release.
pub const TIER_META: &str = "key_tier";

/// Hash: key → unix-millis timestamp of its current lease.
pub const LEASED_AT: &str = "key_leased_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_strictly_linear() {
        assert_eq!(KeyTier::Full.next_lower(), Some(KeyTier::Mid));
        assert_eq!(KeyTier::Mid.next_lower(), Some(KeyTier::Low));
        assert_eq!(KeyTier::Low.next_lower(), None);
    }

    #[test]
    fn labels_round_trip() {
        for tier in KeyTier::ALL {
            assert_eq!(KeyTier::parse(tier.label()), Some(tier));
        }
        for cost in [CostTier::Full, CostTier::Mid, CostTier::Low] {
            assert_eq!(CostTier::parse(cost.label()), Some(cost));
        }
        assert_eq!(KeyTier::parse("platinum"), None);
    }

    #[test]
    fn candidate_lists_are_permutations() {
        for cost in [CostTier::Full, CostTier::Mid, CostTier::Low] {
            let mut candidates = candidate_tiers(cost).to_vec();
            candidates.sort();
            candidates.dedup();
            assert_eq!(
                candidates.len(),
                KeyTier::ALL.len(),
                "candidate list for {cost} must cover every tier exactly once"
            );
        }
    }

    #[test]
    fn candidate_lists_try_own_class_first() {
        assert_eq!(candidate_tiers(CostTier::Full)[0], KeyTier::Full);
        assert_eq!(candidate_tiers(CostTier::Mid)[0], KeyTier::Mid);
        assert_eq!(candidate_tiers(CostTier::Low)[0], KeyTier::Low);
    }

    #[test]
    fn queue_names_are_distinct() {
        let mut names: Vec<&str> = KeyTier::ALL.iter().map(|t| t.queue()).collect();
        names.push(PROCESSING_QUEUE);
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
