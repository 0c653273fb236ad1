//! Statebag accumulator: the two persistent key/value namespaces.
//!
//! Orchestration state is transient and cleared at every step boundary
//! except a reserved subset of keys. Claims persist across step boundaries
//! within a session and are only cleared at session boundaries. The two
//! namespaces never overlap.

use std::collections::BTreeMap;

use journeytrace_model::keys::{ORCHESTRATION_STEP_KEY, RETAINED_STATEBAG_KEYS};

/// Accumulates engine state and user claims over a parse. All operations
/// are total; merges are overwrite-by-key and idempotent.
#[derive(Debug, Clone, Default)]
pub struct Statebag {
    statebag: BTreeMap<String, String>,
    claims: BTreeMap<String, String>,
}

impl Statebag {
    pub fn new() -> Statebag {
        Statebag::default()
    }

    /// Merge engine-state keys, overwriting by key.
    pub fn apply_updates(&mut self, updates: &BTreeMap<String, String>) {
        for (key, value) in updates {
            self.statebag.insert(key.clone(), value.clone());
        }
    }

    /// Merge claims keys. Claims are additive and never dropped by a step
    /// boundary.
    pub fn apply_claims_updates(&mut self, updates: &BTreeMap<String, String>) {
        for (key, value) in updates {
            self.claims.insert(key.clone(), value.clone());
        }
    }

    /// Empty the engine-state namespace except the reserved keys; claims
    /// are untouched. Called at every step boundary.
    pub fn clear_statebag_keep_claims(&mut self) {
        self.statebag
            .retain(|key, _| RETAINED_STATEBAG_KEYS.contains(&key.as_str()));
    }

    /// Empty both namespaces. Called at session boundaries.
    pub fn reset(&mut self) {
        self.statebag.clear();
        self.claims.clear();
    }

    /// Point-in-time copy of the engine-state namespace. Safe to hold
    /// across later mutations.
    pub fn statebag_snapshot(&self) -> BTreeMap<String, String> {
        self.statebag.clone()
    }

    /// Point-in-time copy of the claims namespace.
    pub fn claims_snapshot(&self) -> BTreeMap<String, String> {
        self.claims.clone()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.statebag.get(key).map(String::as_str)
    }

    /// Current orchestration counter, when present and numeric.
    pub fn orchestration_step(&self) -> Option<i64> {
        self.get(ORCHESTRATION_STEP_KEY)?.parse().ok()
    }
}
