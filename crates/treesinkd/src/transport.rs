//! Outbound delivery: one JSON envelope per batch, one envelope per line.

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use treesink_core::{AgentIdentity, Batch, Metric};

#[derive(Serialize)]
struct Envelope<'a> {
    timestamp: i64,
    agent: &'a AgentIdentity,
    metrics: &'a [Metric],
}

pub struct JsonLinesTransport<W: Write> {
    writer: W,
    sent: u64,
}

impl<W: Write> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    /// Writes `batch`; empty batches are dropped. Returns whether anything was written.
    pub fn send(&mut self, agent: &AgentIdentity, batch: &Batch) -> io::Result<bool> {
        if batch.is_empty() {
            return Ok(false);
        }
        let envelope = Envelope {
            timestamp: Utc::now().timestamp(),
            agent,
            metrics: &batch.metrics,
        };
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.sent += 1;
        Ok(true)
    }

    /// Number of envelopes written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesink_core::Emitter;

    #[test]
    fn writes_one_envelope_per_batch() {
        let agent = AgentIdentity::new("nn1", "NameNode");
        let mut batch = Batch::new();
        batch.emit("Hadoop/NameNode/jvm/GcCount", "GcCount", "count", 3.0);
        batch.emit("Hadoop/delta/NameNode/jvm/GcCount", "GcCount", "count", 1.0);

        let mut t = JsonLinesTransport::new(Vec::new());
        assert!(t.send(&agent, &batch).unwrap());
        assert!(!t.send(&agent, &Batch::new()).unwrap());
        assert_eq!(t.sent(), 1);

        let out = String::from_utf8(t.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);

        let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(v["agent"]["component"], "nn1 NameNode");
        assert_eq!(v["metrics"][0]["name"], "Hadoop/NameNode/jvm/GcCount[count]");
        assert_eq!(v["metrics"][1]["value"], 1.0);
        assert!(v["timestamp"].as_i64().unwrap() > 0);
    }
}
