//! Static sink configuration.
//!
//! Read once at startup and never re-read. Every field has a default so a
//! config file only needs to name what it overrides:
//!
//! ```json
//! { "proc_type": "NameNode", "license_key": "...", "types": { "MyCounter": "ops" } }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tags::TagRole;

/// Process type used when the sink is merely `enabled` without naming one.
pub const DEFAULT_PROC_TYPE: &str = "Hadoop";

/// 2^30
pub const GIGABYTES_TO_BYTES: f64 = 1_073_741_824.0;
/// 2^20
pub const MEGABYTES_TO_BYTES: f64 = 1_048_576.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Path separator for metric names.
    pub separator: char,
    /// Root namespace of every emitted metric.
    pub category: String,
    /// Namespace label for delta series.
    pub delta_label: String,
    /// Namespace label for overview series and summaries.
    pub overview_label: String,
    /// Type used for measurement names absent from `types`.
    pub default_type: String,
    /// Tag name -> role. Unlisted tags are discriminators.
    pub tags: HashMap<String, TagRole>,
    /// Measurement name -> semantic type.
    pub types: HashMap<String, String>,
    /// Types rolled up into `total <type>` summaries.
    pub overview_types: BTreeSet<String>,
    pub gigabytes_to_bytes: f64,
    pub megabytes_to_bytes: f64,
    /// Contexts whose measurement descriptions are ignored for naming.
    pub raw_name_contexts: Vec<String>,
    /// Skip `*_imin_*` / `*_imax_*` measurements.
    pub skip_extremes: bool,

    /// Process type of the monitored daemon (e.g. `NameNode`).
    pub proc_type: Option<String>,
    /// Enables the sink with [`DEFAULT_PROC_TYPE`] when `proc_type` is absent.
    pub enabled: bool,
    pub license_key: Option<String>,
    /// Agent hostname; resolved from the machine when absent.
    pub hostname: Option<String>,
    /// Diagnostics mode: log metrics instead of delivering them.
    pub debug: bool,
    /// Collect metric groupings (only honored in diagnostics mode).
    pub groupings: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            separator: '/',
            category: "Hadoop".to_string(),
            delta_label: "delta".to_string(),
            overview_label: "overview".to_string(),
            default_type: "value".to_string(),
            tags: default_tag_roles(),
            types: default_types(),
            overview_types: ["blocks", "bytes", "count", "files", "ops"]
                .into_iter()
                .map(String::from)
                .collect(),
            gigabytes_to_bytes: GIGABYTES_TO_BYTES,
            megabytes_to_bytes: MEGABYTES_TO_BYTES,
            raw_name_contexts: Vec::new(),
            skip_extremes: false,
            proc_type: None,
            enabled: false,
            license_key: None,
            hostname: None,
            debug: false,
            groupings: false,
        }
    }
}

impl SinkConfig {
    /// Loads a JSON config file, falling back to defaults for absent fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Effective process type, if monitoring is enabled for this process.
    pub fn process_type(&self) -> Option<&str> {
        match self.proc_type.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(p),
            _ if self.enabled => Some(DEFAULT_PROC_TYPE),
            _ => None,
        }
    }

    /// Checks that the sink has the identity it needs to run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.process_type().is_none() {
            return Err(ConfigError::MissingProcessType);
        }
        let has_key = self
            .license_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key && !self.debug {
            return Err(ConfigError::MissingLicenseKey);
        }
        Ok(())
    }

    /// Groupings are a diagnostics feature and need both flags.
    pub fn groupings_enabled(&self) -> bool {
        self.debug && self.groupings
    }
}

fn default_tag_roles() -> HashMap<String, TagRole> {
    [
        ("Context", TagRole::Ignored),
        ("SessionId", TagRole::Ignored),
        ("Hostname", TagRole::Host),
        ("port", TagRole::Port),
    ]
    .into_iter()
    .map(|(n, r)| (n.to_string(), r))
    .collect()
}

fn default_types() -> HashMap<String, String> {
    let table: &[(&str, &str)] = &[
        // jvm
        ("MemNonHeapUsedM", "bytes"),
        ("MemNonHeapCommittedM", "bytes"),
        ("MemNonHeapMaxM", "bytes"),
        ("MemHeapUsedM", "bytes"),
        ("MemHeapCommittedM", "bytes"),
        ("MemHeapMaxM", "bytes"),
        ("MemMaxM", "bytes"),
        ("GcCount", "count"),
        ("GcTimeMillis", "ms"),
        ("ThreadsNew", "threads"),
        ("ThreadsRunnable", "threads"),
        ("ThreadsBlocked", "threads"),
        ("ThreadsWaiting", "threads"),
        ("ThreadsTimedWaiting", "threads"),
        ("ThreadsTerminated", "threads"),
        ("LogFatal", "count"),
        ("LogError", "count"),
        ("LogWarn", "count"),
        ("LogInfo", "count"),
        // rpc
        ("ReceivedBytes", "bytes"),
        ("SentBytes", "bytes"),
        ("RpcQueueTimeNumOps", "ops"),
        ("RpcQueueTimeAvgTime", "ms"),
        ("RpcProcessingTimeNumOps", "ops"),
        ("RpcProcessingTimeAvgTime", "ms"),
        ("NumOpenConnections", "connections"),
        ("CallQueueLength", "calls"),
        // dfs
        ("CapacityTotalGB", "bytes"),
        ("CapacityUsedGB", "bytes"),
        ("CapacityRemainingGB", "bytes"),
        ("FilesTotal", "files"),
        ("BlocksTotal", "blocks"),
        ("MissingBlocks", "blocks"),
        ("CorruptBlocks", "blocks"),
        ("UnderReplicatedBlocks", "blocks"),
        ("BytesWritten", "bytes"),
        ("BytesRead", "bytes"),
        ("BlocksWritten", "blocks"),
        ("BlocksRead", "blocks"),
    ];
    table
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect()
}
