//! Latest-result slot for a serving layer.
//!
//! Empty until the first run with usable data, then replaced wholesale by
//! each later such run. Readers get an immutable snapshot. The engine itself
//! never reads from here.

use crate::domain::market_strength::AggregateResult;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct ResultCache {
    slot: RwLock<Option<Arc<AggregateResult>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` if it carries data. Returns whether the slot changed.
    /// A "no data yet" result never overwrites an earlier good one.
    pub fn replace(&self, result: AggregateResult) -> bool {
        if !result.has_data() {
            return false;
        }
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(result));
        true
    }

    pub fn snapshot(&self) -> Option<Arc<AggregateResult>> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_none()
    }
}
