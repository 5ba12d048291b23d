//! Data models for incoming metrics records.
//!
//! - [`snapshot`]: one record as delivered by the monitored process
//!   (`Snapshot`, `Tag`, `Measurement`, `RawValue`)
//! - [`key`]: structural identities used as cache keys
//!   (`TagSetKey`, `TagSetId`)
//!
//! # Identity
//!
//! ```text
//! Snapshot ──► TagSetKey (context, record, sorted non-empty tags)
//!                 │ interned
//!                 ▼
//!              TagSetId ──┬── base name
//!                         └── (TagSetId, measurement name) ──┬── descriptor
//!                                                            └── last value
//! ```

mod key;
mod snapshot;

pub use key::{TagSetId, TagSetKey};
pub use snapshot::{Measurement, RawValue, Snapshot, Tag};
