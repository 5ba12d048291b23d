//! Metric grouping diagnostics.
//!
//! Counts distinct `(name shape, type)` combinations so operators can audit
//! how many series a process produces. Keys use the dashboard wildcard form
//! `<shape>/*[<type>]`.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct GroupingCollector {
    counts: BTreeMap<String, u64>,
}

impl GroupingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(shape: &str, metric_type: &str) -> String {
        format!("{shape}/*[{metric_type}]")
    }

    pub fn record(&mut self, shape: &str, metric_type: &str) {
        *self.counts.entry(Self::key(shape, metric_type)).or_insert(0) += 1;
    }

    /// `(key, count)` pairs sorted by key.
    pub fn entries(&self) -> Vec<(String, u64)> {
        self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_key() {
        let mut g = GroupingCollector::new();
        g.record("Hadoop/NameNode/jvm", "bytes");
        g.record("Hadoop/NameNode/jvm", "bytes");
        g.record("Hadoop/delta/NameNode/jvm", "bytes");
        assert_eq!(
            g.entries(),
            vec![
                ("Hadoop/NameNode/jvm/*[bytes]".to_string(), 2),
                ("Hadoop/delta/NameNode/jvm/*[bytes]".to_string(), 1),
            ]
        );
    }
}
