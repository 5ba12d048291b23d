//! Per-pass rollup of overview deltas into `total <type>` summaries.

use std::collections::{BTreeMap, BTreeSet};

/// Sums deltas by type for a single snapshot pass.
///
/// The accumulator is empty until the first eligible measurement of a pass,
/// which seeds every overview type with zero. [`OverviewAccumulator::drain`]
/// hands out the sums and leaves it empty for the next pass.
#[derive(Debug)]
pub struct OverviewAccumulator {
    types: BTreeSet<String>,
    sums: BTreeMap<String, f64>,
}

impl OverviewAccumulator {
    pub fn new(types: BTreeSet<String>) -> Self {
        Self {
            types,
            sums: BTreeMap::new(),
        }
    }

    pub fn is_overview_type(&self, metric_type: &str) -> bool {
        self.types.contains(metric_type)
    }

    /// Adds `delta` to the running sum of `metric_type`. Non-overview types are ignored.
    pub fn add(&mut self, metric_type: &str, delta: f64) {
        if !self.is_overview_type(metric_type) {
            return;
        }
        if self.sums.is_empty() {
            self.sums = self.types.iter().map(|t| (t.clone(), 0.0)).collect();
        }
        if let Some(sum) = self.sums.get_mut(metric_type) {
            *sum += delta;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Takes the sums of this pass, in type order.
    pub fn drain(&mut self) -> Vec<(String, f64)> {
        std::mem::take(&mut self.sums).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc() -> OverviewAccumulator {
        OverviewAccumulator::new(["bytes", "count"].into_iter().map(String::from).collect())
    }

    #[test]
    fn sums_deltas_per_type() {
        let mut a = acc();
        a.add("count", 1.0);
        a.add("count", 2.0);
        a.add("count", 3.0);
        assert_eq!(
            a.drain(),
            vec![("bytes".to_string(), 0.0), ("count".to_string(), 6.0)]
        );
        assert!(a.is_empty());
    }

    #[test]
    fn ignores_other_types_and_stays_empty() {
        let mut a = acc();
        a.add("ms", 5.0);
        assert!(a.is_empty());
        assert!(a.drain().is_empty());
    }

    #[test]
    fn passes_do_not_carry_over() {
        let mut a = acc();
        a.add("bytes", 10.0);
        a.drain();
        a.add("count", 1.0);
        assert_eq!(
            a.drain(),
            vec![("bytes".to_string(), 0.0), ("count".to_string(), 1.0)]
        );
    }
}
