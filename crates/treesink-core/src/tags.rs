//! Tag classification.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What a tag contributes to a metric name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagRole {
    /// Identity only, never part of a name.
    Ignored,
    Host,
    Port,
    /// Value is folded into the metric name.
    Discriminator,
}

/// Decides the role of a tag by its name. Must be total: unknown names are valid input.
pub trait TagClassifier {
    fn classify(&self, tag_name: &str) -> TagRole;
}

/// Table-backed classifier built from [`crate::config::SinkConfig::tags`].
#[derive(Clone, Debug, Default)]
pub struct TagTable {
    roles: HashMap<String, TagRole>,
}

impl TagTable {
    pub fn new(roles: HashMap<String, TagRole>) -> Self {
        Self { roles }
    }
}

impl TagClassifier for TagTable {
    fn classify(&self, tag_name: &str) -> TagRole {
        self.roles
            .get(tag_name)
            .copied()
            .unwrap_or(TagRole::Discriminator)
    }
}
