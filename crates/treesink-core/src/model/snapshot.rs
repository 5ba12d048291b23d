use serde::{Deserialize, Serialize};

/// One metrics record produced by the monitored process per collection interval.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Metrics context (e.g. `jvm`, `dfs`, `rpc`).
    pub context: String,
    /// Record name. Often equal to the context.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

impl Snapshot {
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurements.push(measurement);
        self
    }

    /// Tags that carry a non-empty value, in record order.
    pub fn present_tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().filter_map(|t| match t.value.as_deref() {
            Some(v) if !v.is_empty() => Some((t.name.as_str(), v)),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A value as handed over by the host: either numeric or its string form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric reading, or `None` when the value is empty, unparseable or not finite.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// One named reading inside a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<RawValue>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns `(name, value)` when the measurement is usable.
    ///
    /// Missing or empty names, missing values and values without a numeric
    /// reading all yield `None`.
    pub fn reading(&self) -> Option<(&str, f64)> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        let value = self.value.as_ref()?.as_f64()?;
        Some((name, value))
    }
}
