//! Measurement descriptors: display suffix, semantic type and unit scale.
//!
//! A descriptor is derived from the first occurrence of a measurement and
//! reused for every later observation of the same identity. It never depends
//! on the measured value.

use std::collections::HashMap;

use crate::config::SinkConfig;
use crate::model::TagSetId;

/// Type whose `GB`/`M` suffixed measurements are scaled to bytes.
pub const BYTES_TYPE: &str = "bytes";

#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    /// Appended to a base name, starts with the separator.
    pub suffix: String,
    pub metric_type: String,
    /// Multiplier applied to values and deltas before emission.
    pub scale: f64,
}

impl Descriptor {
    pub fn scaled(&self, value: f64) -> f64 {
        value * self.scale
    }
}

/// Lookup tables consulted when deriving descriptors.
#[derive(Clone, Debug)]
pub struct DescriptorRules {
    separator: char,
    default_type: String,
    types: HashMap<String, String>,
    gigabytes_to_bytes: f64,
    megabytes_to_bytes: f64,
    raw_name_contexts: Vec<String>,
}

impl DescriptorRules {
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            separator: config.separator,
            default_type: config.default_type.clone(),
            types: config.types.clone(),
            gigabytes_to_bytes: config.gigabytes_to_bytes,
            megabytes_to_bytes: config.megabytes_to_bytes,
            raw_name_contexts: config.raw_name_contexts.clone(),
        }
    }

    pub fn derive(&self, name: &str, description: Option<&str>, context: &str) -> Descriptor {
        let metric_type = self
            .types
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_type.clone());
        let scale = self.scale_for(name, &metric_type);
        Descriptor {
            suffix: self.suffix_for(name, description, context),
            metric_type,
            scale,
        }
    }

    fn suffix_for(&self, name: &str, description: Option<&str>, context: &str) -> String {
        let sep = self.separator;
        let raw = || format!("{sep}{name}");

        if self.raw_name_contexts.iter().any(|c| c == context) {
            return raw();
        }
        let desc = match description.map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => return raw(),
        };

        if ends_with_word_for(desc) {
            // "Rate of ops for" + "Foo_bar" -> "Rate of ops for Foo"
            return match name.find('_') {
                Some(i) => format!("{sep}{desc} {}", &name[..i]),
                None => raw(),
            };
        }
        format!("{sep}{desc}")
    }

    fn scale_for(&self, name: &str, metric_type: &str) -> f64 {
        if metric_type != BYTES_TYPE {
            return 1.0;
        }
        if name.ends_with("GB") {
            self.gigabytes_to_bytes
        } else if name.ends_with('M') {
            self.megabytes_to_bytes
        } else {
            1.0
        }
    }
}

fn ends_with_word_for(desc: &str) -> bool {
    desc.strip_suffix("for")
        .is_some_and(|head| head.is_empty() || head.ends_with(char::is_whitespace))
}

/// Descriptors memoized by measurement identity (tag set + raw name).
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: HashMap<TagSetId, HashMap<String, Descriptor>>,
    len: usize,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor and whether it was derived by this call.
    pub fn resolve(
        &mut self,
        rules: &DescriptorRules,
        tag_set: TagSetId,
        name: &str,
        description: Option<&str>,
        context: &str,
    ) -> (&Descriptor, bool) {
        let per_set = self.entries.entry(tag_set).or_default();
        if per_set.contains_key(name) {
            return (&per_set[name], false);
        }
        let descriptor = rules.derive(name, description, context);
        self.len += 1;
        let slot = per_set.entry(name.to_string()).or_insert(descriptor);
        (slot, true)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GIGABYTES_TO_BYTES, MEGABYTES_TO_BYTES};

    fn rules() -> DescriptorRules {
        let mut cfg = SinkConfig::default();
        cfg.types.insert("heapUsedGB".into(), "bytes".into());
        cfg.types.insert("heapUsedM".into(), "bytes".into());
        cfg.types.insert("heapUsed".into(), "bytes".into());
        cfg.types.insert("uptimeM".into(), "ms".into());
        cfg.raw_name_contexts = vec!["ugi".into()];
        DescriptorRules::new(&cfg)
    }

    #[test]
    fn suffix_from_name_when_description_blank() {
        let r = rules();
        assert_eq!(r.derive("GcCount", None, "jvm").suffix, "/GcCount");
        assert_eq!(r.derive("GcCount", Some("   "), "jvm").suffix, "/GcCount");
    }

    #[test]
    fn suffix_from_trimmed_description() {
        let r = rules();
        let d = r.derive("GcCount", Some("  Total GC count "), "jvm");
        assert_eq!(d.suffix, "/Total GC count");
    }

    #[test]
    fn description_ending_in_for_takes_name_prefix() {
        let r = rules();
        let d = r.derive("getBlockLocations_num_ops", Some("Number of ops for "), "rpc");
        assert_eq!(d.suffix, "/Number of ops for getBlockLocations");

        // no underscore: plain name
        let d = r.derive("getBlockLocations", Some("Number of ops for"), "rpc");
        assert_eq!(d.suffix, "/getBlockLocations");

        // leading underscore appends an empty prefix
        let d = r.derive("_ops", Some("Number of ops for"), "rpc");
        assert_eq!(d.suffix, "/Number of ops for ");

        // "for" must be a word of its own
        let d = r.derive("a_b", Some("Therefor"), "rpc");
        assert_eq!(d.suffix, "/Therefor");
    }

    #[test]
    fn raw_name_contexts_ignore_descriptions() {
        let r = rules();
        let d = r.derive("LoginSuccessNumOps", Some("Login successes"), "ugi");
        assert_eq!(d.suffix, "/LoginSuccessNumOps");
    }

    #[test]
    fn type_lookup_falls_back_to_default() {
        let r = rules();
        assert_eq!(r.derive("GcCount", None, "jvm").metric_type, "count");
        assert_eq!(r.derive("SomethingNew", None, "jvm").metric_type, "value");
    }

    #[test]
    fn byte_suffixes_scale_only_bytes() {
        let r = rules();
        let gb = r.derive("heapUsedGB", None, "jvm");
        assert_eq!(gb.scaled(2.0), 2.0 * GIGABYTES_TO_BYTES);

        let m = r.derive("heapUsedM", None, "jvm");
        assert_eq!(m.scaled(5.0), 5.0 * MEGABYTES_TO_BYTES);

        let plain = r.derive("heapUsed", None, "jvm");
        assert_eq!(plain.scaled(5.0), 5.0);

        let not_bytes = r.derive("uptimeM", None, "jvm");
        assert_eq!(not_bytes.scale, 1.0);

        let unknown = r.derive("otherGB", None, "jvm");
        assert_eq!(unknown.scale, 1.0);
    }

    #[test]
    fn cache_derives_once_per_identity() {
        let r = rules();
        let mut cache = DescriptorCache::new();
        let set = TagSetId(0);

        let (first, fresh) = cache.resolve(&r, set, "GcCount", Some("GC count"), "jvm");
        let first = first.clone();
        assert!(fresh);

        // a later description change does not re-derive
        let (again, fresh) = cache.resolve(&r, set, "GcCount", Some("other"), "jvm");
        assert!(!fresh);
        assert_eq!(again, &first);

        let (_, fresh) = cache.resolve(&r, TagSetId(1), "GcCount", None, "jvm");
        assert!(fresh);
        assert_eq!(cache.len(), 2);
    }
}
