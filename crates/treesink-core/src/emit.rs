//! The sink boundary: where derived `(name, value)` pairs leave the engine.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Receives every metric the engine derives for a snapshot.
pub trait Emitter {
    /// `name` is the full metric path without type; `raw_name` is the
    /// measurement name as delivered by the host.
    fn emit(&mut self, name: &str, raw_name: &str, metric_type: &str, value: f64);
}

/// One outbound series point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// `<name>[<type>]`
    pub name: String,
    pub value: f64,
}

/// Outbound metrics of one pass, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub metrics: Vec<Metric>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }
}

impl Emitter for Batch {
    fn emit(&mut self, name: &str, _raw_name: &str, metric_type: &str, value: f64) {
        self.metrics.push(Metric {
            name: format!("{name}[{metric_type}]"),
            value,
        });
    }
}

/// Diagnostics mode: logs a line per metric and delivers nothing.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    pub lines: Vec<String>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for DiagnosticLog {
    fn emit(&mut self, name: &str, raw_name: &str, metric_type: &str, value: f64) {
        let line = format!("{name}, {raw_name}, {metric_type}, {value}");
        info!("{}", line);
        self.lines.push(line);
    }
}
