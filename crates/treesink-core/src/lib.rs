//! treesink-core: translates Hadoop metrics records into a metric tree.
//!
//! Provides:
//! - `model`: snapshots, tags, measurements and their structural identities
//! - `config`: static sink configuration (JSON, all fields defaulted)
//! - `tags`: tag classification
//! - `base_name`: memoized base-name composition
//! - `descriptor`: memoized display suffix, type and unit scale
//! - `rates`: delta tracking against the previous observation
//! - `overview`: per-pass `total <type>` rollups
//! - `grouping`: metric grouping diagnostics
//! - `emit`: emitter boundary (outbound batch, diagnostic log)
//! - `engine`: the pipeline tying the above together
//! - `sink`: validated facade for hosts, shared variant for concurrent delivery

pub mod base_name;
pub mod config;
pub mod descriptor;
pub mod emit;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod model;
pub mod overview;
pub mod rates;
pub mod sink;
pub mod tags;

pub use config::SinkConfig;
pub use emit::{Batch, Emitter, Metric};
pub use engine::{Engine, EngineStats, PassSummary};
pub use error::ConfigError;
pub use model::{Measurement, Snapshot, Tag};
pub use sink::{AgentIdentity, Delivery, SharedSink, Sink};
