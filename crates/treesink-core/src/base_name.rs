//! Base-name composition and memoization.
//!
//! A base name is the shared prefix of every metric in a snapshot:
//!
//! ```text
//! <category>/<proc type>/<context>[/<record>][/<disc 1>/<disc 2>...]
//! ```
//!
//! It is derived once per distinct tag set and cached together with the
//! namespaced variants (delta, overview, overview delta) and the grouping
//! shapes, so a cache hit does no string work at all.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SinkConfig;
use crate::model::{Snapshot, TagSetId, TagSetKey};
use crate::tags::{TagClassifier, TagRole};

/// Namespace labels and separator shared by every emitted name.
#[derive(Clone, Debug)]
pub struct NameLayout {
    pub separator: char,
    pub category: String,
    pub process_type: String,
    pub delta_label: String,
    pub overview_label: String,
}

impl NameLayout {
    pub fn new(config: &SinkConfig, process_type: &str) -> Self {
        Self {
            separator: config.separator,
            category: config.category.clone(),
            process_type: process_type.to_string(),
            delta_label: config.delta_label.clone(),
            overview_label: config.overview_label.clone(),
        }
    }

    /// `<category>/<overview>/total <type>`
    pub fn summary_name(&self, metric_type: &str) -> String {
        let sep = self.separator;
        format!(
            "{}{sep}{}{sep}total {metric_type}",
            self.category, self.overview_label
        )
    }

    fn prefixed(&self, namespace: Option<&str>, path: &str) -> String {
        let sep = self.separator;
        match namespace {
            Some(ns) => format!("{}{sep}{ns}{sep}{path}", self.category),
            None => format!("{}{sep}{path}", self.category),
        }
    }
}

/// Cached name prefixes for one tag set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseName {
    /// The base name proper.
    pub raw: String,
    pub delta: String,
    pub overview: String,
    pub overview_delta: String,
    /// Grouping shape: base name without discriminators.
    pub shape: String,
    pub delta_shape: String,
    /// Captured but not part of the name.
    pub host: Option<String>,
    /// Captured but not part of the name.
    pub port: Option<String>,
}

impl BaseName {
    /// Composes the base name for `snapshot`. Pure function of the tag set.
    pub fn compose<C: TagClassifier>(
        layout: &NameLayout,
        snapshot: &Snapshot,
        classifier: &C,
    ) -> Self {
        let sep = layout.separator;

        let mut record_path = format!("{}{sep}{}", layout.process_type, snapshot.context);
        if !snapshot.name.is_empty() && !snapshot.name.eq_ignore_ascii_case(&snapshot.context) {
            record_path.push(sep);
            record_path.push_str(&snapshot.name);
        }

        let mut host = None;
        let mut port = None;
        let mut discriminators = String::new();
        for (name, value) in snapshot.present_tags() {
            match classifier.classify(name) {
                TagRole::Ignored => {}
                TagRole::Host => host = Some(value.to_string()),
                TagRole::Port => port = Some(value.to_string()),
                TagRole::Discriminator => {
                    if !discriminators.is_empty() {
                        discriminators.push(sep);
                    }
                    discriminators.push_str(value);
                }
            }
        }

        let full_path = if discriminators.is_empty() {
            record_path.clone()
        } else {
            format!("{record_path}{sep}{discriminators}")
        };
        let overview_delta = format!("{}_{}", layout.overview_label, layout.delta_label);

        Self {
            raw: layout.prefixed(None, &full_path),
            delta: layout.prefixed(Some(&layout.delta_label), &full_path),
            overview: layout.prefixed(Some(&layout.overview_label), &full_path),
            overview_delta: layout.prefixed(Some(&overview_delta), &full_path),
            shape: layout.prefixed(None, &record_path),
            delta_shape: layout.prefixed(Some(&layout.delta_label), &record_path),
            host,
            port,
        }
    }
}

/// Memoizes [`BaseName`]s by tag-set identity and interns the identity
/// into a [`TagSetId`] for per-measurement keys.
#[derive(Debug, Default)]
pub struct BaseNameCache {
    ids: HashMap<TagSetKey, TagSetId>,
    names: Vec<BaseName>,
}

impl BaseNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<C: TagClassifier>(
        &mut self,
        layout: &NameLayout,
        snapshot: &Snapshot,
        classifier: &C,
    ) -> (TagSetId, &BaseName) {
        let key = TagSetKey::of(snapshot);
        if let Some(&id) = self.ids.get(&key) {
            return (id, &self.names[id.0]);
        }

        let base = BaseName::compose(layout, snapshot, classifier);
        debug!(base = %base.raw, "new tag set");

        let id = TagSetId(self.names.len());
        self.names.push(base);
        self.ids.insert(key, id);
        (id, &self.names[id.0])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
