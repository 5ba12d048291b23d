//! Sink facade used by hosts: validated construction, one call per record.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SinkConfig;
use crate::emit::{Batch, DiagnosticLog};
use crate::engine::{Engine, EngineStats};
use crate::error::ConfigError;
use crate::model::Snapshot;
use crate::tags::TagTable;

pub const AGENT_GUID: &str = "com.treesink.hadoop";
const FALLBACK_HOST: &str = "hadoop";

/// Who is reporting: sent along with every batch by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentIdentity {
    pub host: String,
    pub version: String,
    /// `<host> <process type>`
    pub component: String,
    pub guid: String,
}

impl AgentIdentity {
    pub fn new(host: &str, process_type: &str) -> Self {
        Self {
            host: host.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            component: format!("{host} {process_type}"),
            guid: AGENT_GUID.to_string(),
        }
    }
}

/// Machine hostname as reported by the OS, `hadoop` if it cannot be read.
pub fn local_hostname() -> String {
    match system_hostname() {
        Ok(host) if !host.is_empty() => host,
        Ok(_) => FALLBACK_HOST.to_string(),
        Err(e) => {
            warn!("cannot resolve hostname, using {}: {}", FALLBACK_HOST, e);
            FALLBACK_HOST.to_string()
        }
    }
}

#[cfg(unix)]
fn system_hostname() -> std::io::Result<String> {
    let mut buf = vec![0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).trim().to_string())
}

#[cfg(not(unix))]
fn system_hostname() -> std::io::Result<String> {
    std::env::var("COMPUTERNAME").map_err(std::io::Error::other)
}

/// Result of one `put_metrics` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Delivery {
    /// Normal mode: hand this to the transport.
    Batch(Batch),
    /// Diagnostics mode: nothing is sent.
    Diagnostics {
        lines: Vec<String>,
        /// Present when grouping diagnostics are enabled.
        groupings: Option<Vec<(String, u64)>>,
    },
}

pub struct Sink {
    engine: Engine<TagTable>,
    identity: AgentIdentity,
    debug: bool,
}

impl Sink {
    /// Builds a sink from validated configuration.
    ///
    /// Fails when the process has no process type (monitoring disabled) or
    /// when a license key is required but missing.
    pub fn new(config: &SinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let process_type = config
            .process_type()
            .ok_or(ConfigError::MissingProcessType)?;

        let host = match config.hostname.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => local_hostname(),
        };
        let identity = AgentIdentity::new(&host, process_type);

        if config.debug {
            info!("diagnostics mode enabled, metrics will not be sent");
        }
        if config.groupings_enabled() {
            info!("collecting metric groupings");
        } else if config.groupings {
            warn!("metric groupings need diagnostics mode, ignoring");
        }

        let classifier = TagTable::new(config.tags.clone());
        Ok(Self {
            engine: Engine::new(config, process_type, classifier),
            identity,
            debug: config.debug,
        })
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    /// Translates one record.
    pub fn put_metrics(&mut self, snapshot: &Snapshot) -> Delivery {
        if !self.debug {
            let mut batch = Batch::new();
            self.engine.process(snapshot, &mut batch);
            return Delivery::Batch(batch);
        }

        let mut log = DiagnosticLog::new();
        self.engine.process(snapshot, &mut log);
        info!("diagnostics mode: {} metrics not sent", log.lines.len());

        let groupings = self.engine.groupings();
        if let Some(groupings) = &groupings {
            info!("metric groupings so far:");
            for (key, count) in groupings {
                info!("{} : {}", key, count);
            }
        }
        Delivery::Diagnostics {
            lines: log.lines,
            groupings,
        }
    }
}

/// A [`Sink`] shared between threads that may deliver records concurrently.
///
/// All caches sit behind one mutex so no delta update is lost.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Sink>>,
}

impl SharedSink {
    pub fn new(sink: Sink) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn put_metrics(&self, snapshot: &Snapshot) -> Delivery {
        // Caches are updated per measurement; a poisoned lock holds consistent state.
        let mut sink = self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("sink lock poisoned, continuing");
            PoisonError::into_inner(poisoned)
        });
        sink.put_metrics(snapshot)
    }

    pub fn stats(&self) -> EngineStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;

    fn config() -> SinkConfig {
        SinkConfig {
            proc_type: Some("NameNode".into()),
            license_key: Some("key".into()),
            hostname: Some("nn1".into()),
            ..SinkConfig::default()
        }
    }

    fn snapshot(v: f64) -> Snapshot {
        Snapshot::new("jvm", "jvm").with_measurement(Measurement::new("GcCount", v))
    }

    #[test]
    fn refuses_to_build_without_identity() {
        assert!(matches!(
            Sink::new(&SinkConfig::default()),
            Err(ConfigError::MissingProcessType)
        ));
        let no_key = SinkConfig {
            license_key: None,
            ..config()
        };
        assert!(matches!(
            Sink::new(&no_key),
            Err(ConfigError::MissingLicenseKey)
        ));
    }

    #[test]
    fn identity_names_component_after_host_and_process() {
        let sink = Sink::new(&config()).unwrap();
        assert_eq!(sink.identity().host, "nn1");
        assert_eq!(sink.identity().component, "nn1 NameNode");
        assert_eq!(sink.identity().guid, AGENT_GUID);
    }

    #[test]
    fn hostname_comes_from_the_os_when_unset() {
        let host = local_hostname();
        assert!(!host.is_empty());
        assert_ne!(host, FALLBACK_HOST);

        let cfg = SinkConfig {
            hostname: None,
            ..config()
        };
        let sink = Sink::new(&cfg).unwrap();
        assert_eq!(sink.identity().host, host);
        assert_eq!(sink.identity().component, format!("{host} NameNode"));
    }

    #[test]
    fn normal_mode_returns_batch() {
        let mut sink = Sink::new(&config()).unwrap();
        sink.put_metrics(&snapshot(1.0));
        let Delivery::Batch(batch) = sink.put_metrics(&snapshot(4.0)) else {
            panic!("expected a batch");
        };
        assert_eq!(batch.get("Hadoop/NameNode/jvm/GcCount[count]"), Some(4.0));
        assert_eq!(batch.get("Hadoop/delta/NameNode/jvm/GcCount[count]"), Some(3.0));
    }

    #[test]
    fn diagnostics_mode_returns_lines_and_groupings() {
        let cfg = SinkConfig {
            debug: true,
            groupings: true,
            license_key: None,
            ..config()
        };
        let mut sink = Sink::new(&cfg).unwrap();
        let Delivery::Diagnostics { lines, groupings } = sink.put_metrics(&snapshot(2.0)) else {
            panic!("expected diagnostics");
        };
        assert_eq!(
            lines,
            vec![
                "Hadoop/NameNode/jvm/GcCount, GcCount, count, 2",
                "Hadoop/delta/NameNode/jvm/GcCount, GcCount, count, 0",
            ]
        );
        assert_eq!(
            groupings,
            Some(vec![
                ("Hadoop/NameNode/jvm/*[count]".to_string(), 1),
                ("Hadoop/delta/NameNode/jvm/*[count]".to_string(), 1),
            ])
        );
    }

    #[test]
    fn shared_sink_serializes_concurrent_delivery() {
        let shared = SharedSink::new(Sink::new(&config()).unwrap());
        shared.put_metrics(&snapshot(0.0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = shared.clone();
                std::thread::spawn(move || s.put_metrics(&snapshot(5.0)))
            })
            .collect();
        let deltas: Vec<f64> = handles
            .into_iter()
            .map(|h| match h.join().unwrap() {
                Delivery::Batch(b) => b.get("Hadoop/delta/NameNode/jvm/GcCount[count]").unwrap(),
                Delivery::Diagnostics { .. } => unreachable!(),
            })
            .collect();

        // exactly one caller observes the 0 -> 5 step
        assert_eq!(deltas.iter().filter(|d| **d == 5.0).count(), 1);
        assert_eq!(deltas.iter().sum::<f64>(), 5.0);
        assert_eq!(shared.stats().tracked_values, 1);
    }
}
