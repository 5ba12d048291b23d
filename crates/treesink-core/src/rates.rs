//! Delta computation against the previous observation of a measurement.
//!
//! Values are tracked raw (before unit scaling); callers scale the delta with
//! the measurement's descriptor. A decrease is a counter reset on the
//! monitored process and reads as zero.

use std::collections::HashMap;

use crate::model::TagSetId;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute f64 delta, returning `None` on counter regression (stats reset).
pub fn df64(curr: f64, prev: f64) -> Option<f64> {
    (curr >= prev).then_some(curr - prev)
}

/// Delta with regressions clamped to zero.
pub fn clamped_delta(curr: f64, prev: f64) -> f64 {
    df64(curr, prev).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Delta state
// ---------------------------------------------------------------------------

/// Last raw value per measurement identity.
///
/// Entries are never evicted; the map grows with the number of distinct
/// measurements seen.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    prev_sample: HashMap<TagSetId, HashMap<String, f64>>,
    len: usize,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `raw` as the latest value and returns the delta against the
    /// previous one. The first observation is a baseline and yields 0.
    pub fn observe(&mut self, tag_set: TagSetId, name: &str, raw: f64) -> f64 {
        let per_set = self.prev_sample.entry(tag_set).or_default();
        match per_set.get_mut(name) {
            Some(prev) => {
                let delta = clamped_delta(raw, *prev);
                *prev = raw;
                delta
            }
            None => {
                per_set.insert(name.to_string(), raw);
                self.len += 1;
                0.0
            }
        }
    }

    #[cfg(test)]
    fn previous(&self, tag_set: TagSetId, name: &str) -> Option<f64> {
        self.prev_sample.get(&tag_set)?.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
