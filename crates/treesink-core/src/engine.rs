//! The translation engine: snapshot in, named metrics out.
//!
//! ```text
//! Snapshot ──► BaseNameCache ──► for each measurement:
//!                                  DescriptorCache ──► DeltaTracker ──► Emitter
//!                                        │                   │
//!                                        ▼                   ▼
//!                                GroupingCollector   OverviewAccumulator ──► Emitter (end of pass)
//! ```
//!
//! All caches live on one [`Engine`] owned by the caller. Processing is
//! sequential and total: malformed measurements are skipped, never reported.

use tracing::debug;

use crate::base_name::{BaseNameCache, NameLayout};
use crate::config::SinkConfig;
use crate::descriptor::{DescriptorCache, DescriptorRules};
use crate::emit::Emitter;
use crate::grouping::GroupingCollector;
use crate::model::Snapshot;
use crate::overview::OverviewAccumulator;
use crate::rates::DeltaTracker;
use crate::tags::TagClassifier;

/// Counters for one processed snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub emitted: usize,
    pub skipped: usize,
}

/// Cache sizes, for watching cardinality over a long run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub tag_sets: usize,
    pub descriptors: usize,
    pub tracked_values: usize,
    pub groupings: usize,
}

pub struct Engine<C: TagClassifier> {
    layout: NameLayout,
    rules: DescriptorRules,
    classifier: C,
    skip_extremes: bool,
    base_names: BaseNameCache,
    descriptors: DescriptorCache,
    deltas: DeltaTracker,
    overview: OverviewAccumulator,
    grouping: Option<GroupingCollector>,
    /// Reused buffer for metric names.
    name_buf: String,
}

impl<C: TagClassifier> Engine<C> {
    pub fn new(config: &SinkConfig, process_type: &str, classifier: C) -> Self {
        Self {
            layout: NameLayout::new(config, process_type),
            rules: DescriptorRules::new(config),
            classifier,
            skip_extremes: config.skip_extremes,
            base_names: BaseNameCache::new(),
            descriptors: DescriptorCache::new(),
            deltas: DeltaTracker::new(),
            overview: OverviewAccumulator::new(config.overview_types.clone()),
            grouping: config.groupings_enabled().then(GroupingCollector::new),
            name_buf: String::with_capacity(128),
        }
    }

    /// Base name of a snapshot, derived on first sight of its tag set.
    pub fn base_name(&mut self, snapshot: &Snapshot) -> &str {
        let (_, base) = self
            .base_names
            .resolve(&self.layout, snapshot, &self.classifier);
        &base.raw
    }

    /// Translates one snapshot, handing every derived metric to `emitter`.
    ///
    /// Per measurement: absolute value, delta, and for overview-eligible
    /// measurements their overview copies. Overview summaries follow the
    /// last measurement.
    pub fn process<E: Emitter>(&mut self, snapshot: &Snapshot, emitter: &mut E) -> PassSummary {
        let mut summary = PassSummary::default();
        let (tag_set, base) = self
            .base_names
            .resolve(&self.layout, snapshot, &self.classifier);
        let overview_record = snapshot
            .name
            .eq_ignore_ascii_case(&self.layout.process_type);

        for measurement in &snapshot.measurements {
            let Some((name, raw)) = measurement.reading() else {
                debug!(
                    record = %snapshot.name,
                    measurement = ?measurement.name,
                    "skipping unusable measurement"
                );
                summary.skipped += 1;
                continue;
            };
            if self.skip_extremes && (name.contains("_imin_") || name.contains("_imax_")) {
                summary.skipped += 1;
                continue;
            }

            let (descriptor, fresh) = self.descriptors.resolve(
                &self.rules,
                tag_set,
                name,
                measurement.description.as_deref(),
                &snapshot.context,
            );
            if fresh && let Some(grouping) = self.grouping.as_mut() {
                grouping.record(&base.shape, &descriptor.metric_type);
                grouping.record(&base.delta_shape, &descriptor.metric_type);
            }

            let value = descriptor.scaled(raw);
            let delta = descriptor.scaled(self.deltas.observe(tag_set, name, raw));
            let metric_type = descriptor.metric_type.as_str();

            let suffix = descriptor.suffix.as_str();
            let buf = &mut self.name_buf;
            let mut put = |prefix: &str, v: f64| {
                buf.clear();
                buf.push_str(prefix);
                buf.push_str(suffix);
                emitter.emit(buf.as_str(), name, metric_type, v);
            };

            put(&base.raw, value);
            put(&base.delta, delta);
            summary.emitted += 2;

            if overview_record && self.overview.is_overview_type(metric_type) {
                self.overview.add(metric_type, delta);
                put(&base.overview, value);
                put(&base.overview_delta, delta);
                summary.emitted += 2;
            }
        }

        for (metric_type, total) in self.overview.drain() {
            let name = self.layout.summary_name(&metric_type);
            emitter.emit(&name, &metric_type, &metric_type, total);
            summary.emitted += 1;
        }

        summary
    }

    /// Grouping dump, when grouping diagnostics are enabled.
    pub fn groupings(&self) -> Option<Vec<(String, u64)>> {
        self.grouping.as_ref().map(GroupingCollector::entries)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            tag_sets: self.base_names.len(),
            descriptors: self.descriptors.len(),
            tracked_values: self.deltas.len(),
            groupings: self.grouping.as_ref().map_or(0, GroupingCollector::len),
        }
    }
}
