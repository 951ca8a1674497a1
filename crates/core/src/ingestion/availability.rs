use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::stores::StoreKind;

/// Last observed availability per store, shared by every job.
///
/// Used to turn per-tick availability probes into transition events: only a
/// change is reported, and a store that starts available is not reported at
/// all.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    last: Mutex<HashMap<StoreKind, bool>>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StoreKind, bool>> {
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an observation. Returns `true` when it is a reportable transition.
    pub fn observe(&self, store: StoreKind, available: bool) -> bool {
        match self.lock().insert(store, available) {
            Some(previous) => previous != available,
            None => !available,
        }
    }

    pub fn last(&self, store: StoreKind) -> Option<bool> {
        self.lock().get(&store).copied()
    }
}
