//! treesinkd - Hadoop metrics record translator.
//!
//! Reads metrics records (one JSON snapshot per line), translates them into a
//! metric tree with deltas and overview rollups, and writes outbound batches
//! as JSON lines. Records come either from a replay file or from a spool
//! directory polled at a fixed interval.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod source;
mod transport;

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{ArgGroup, Parser};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use treesink_core::{Delivery, Sink, SinkConfig, Snapshot};

use crate::source::{SnapshotLines, mark_done, pending_files};
use crate::transport::JsonLinesTransport;

/// Log engine cache sizes every this many records.
const STATS_EVERY: u64 = 60;

/// Hadoop metrics record translator.
#[derive(Parser)]
#[command(name = "treesinkd", about = "Hadoop metrics record translator", version)]
#[command(group(ArgGroup::new("input").required(true).args(["replay", "spool"])))]
struct Args {
    /// JSON config file. Absent fields keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process type of the monitored daemon (e.g. NameNode).
    #[arg(long)]
    proc_type: Option<String>,

    /// License key for the monitoring backend.
    #[arg(long, env = "TREESINK_LICENSE_KEY", hide_env_values = true)]
    license_key: Option<String>,

    /// Agent hostname. Defaults to the machine hostname.
    #[arg(long)]
    hostname: Option<String>,

    /// Diagnostics mode: log metrics instead of writing batches.
    #[arg(long)]
    debug: bool,

    /// Collect metric groupings (diagnostics mode only).
    #[arg(long)]
    groupings: bool,

    /// Replay records from a file ("-" for stdin) and exit.
    #[arg(long, value_name = "FILE")]
    replay: Option<String>,

    /// Poll a directory for *.json record files.
    #[arg(long, value_name = "DIR")]
    spool: Option<PathBuf>,

    /// Spool polling interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Append batches to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so stdout stays free for batches.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["treesinkd", "treesink_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> Result<SinkConfig, treesink_core::ConfigError> {
    let mut config = match &args.config {
        Some(path) => SinkConfig::load(path)?,
        None => SinkConfig::default(),
    };
    if args.proc_type.is_some() {
        config.proc_type = args.proc_type.clone();
    }
    if args.license_key.is_some() {
        config.license_key = args.license_key.clone();
    }
    if args.hostname.is_some() {
        config.hostname = args.hostname.clone();
    }
    config.debug |= args.debug;
    config.groupings |= args.groupings;
    Ok(config)
}

/// Drives records through the sink and hands batches to the transport.
struct Pipeline<W: Write> {
    sink: Sink,
    transport: JsonLinesTransport<W>,
    records: u64,
}

impl<W: Write> Pipeline<W> {
    fn new(sink: Sink, writer: W) -> Self {
        Self {
            sink,
            transport: JsonLinesTransport::new(writer),
            records: 0,
        }
    }

    fn handle(&mut self, snapshot: &Snapshot) {
        self.records += 1;
        match self.sink.put_metrics(snapshot) {
            Delivery::Batch(batch) => {
                debug!(
                    "record #{} {}/{}: {} metrics",
                    self.records,
                    snapshot.context,
                    snapshot.name,
                    batch.len()
                );
                if let Err(e) = self.transport.send(self.sink.identity(), &batch) {
                    error!("failed to deliver batch: {}", e);
                }
            }
            Delivery::Diagnostics { .. } => {}
        }

        if self.records.is_multiple_of(STATS_EVERY) {
            let stats = self.sink.stats();
            info!(
                "Cache stats: tag_sets={}, descriptors={}, tracked_values={}, groupings={}",
                stats.tag_sets, stats.descriptors, stats.tracked_values, stats.groupings
            );
        }
    }

    fn run_lines<R: BufRead>(&mut self, reader: R) {
        for snapshot in SnapshotLines::new(reader) {
            self.handle(&snapshot);
        }
    }

    fn run_spool_once(&mut self, dir: &Path) {
        let files = match pending_files(dir) {
            Ok(files) => files,
            Err(e) => {
                error!("cannot list spool {}: {}", dir.display(), e);
                return;
            }
        };
        for path in files {
            match File::open(&path) {
                Ok(file) => self.run_lines(BufReader::new(file)),
                Err(e) => {
                    warn!("cannot open {}: {}", path.display(), e);
                    continue;
                }
            }
            if let Err(e) = mark_done(&path) {
                error!("cannot mark {} done: {}", path.display(), e);
            }
        }
    }
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) => Ok(Box::new(
            OpenOptions::new().create(true).append(true).open(p)?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("treesinkd {} starting", env!("CARGO_PKG_VERSION"));

    let sink = match build_config(&args).and_then(|config| Sink::new(&config)) {
        Ok(sink) => sink,
        Err(e) => {
            error!("{}", e);
            error!("Shutting down sink");
            std::process::exit(1);
        }
    };
    info!(
        "Agent: host={}, component={}",
        sink.identity().host,
        sink.identity().component
    );

    let writer = match open_output(args.output.as_deref()) {
        Ok(w) => w,
        Err(e) => {
            error!("cannot open output: {}", e);
            std::process::exit(1);
        }
    };
    let mut pipeline = Pipeline::new(sink, writer);

    if let Some(replay) = &args.replay {
        if replay == "-" {
            pipeline.run_lines(io::stdin().lock());
        } else {
            match File::open(replay) {
                Ok(file) => pipeline.run_lines(BufReader::new(file)),
                Err(e) => {
                    error!("cannot open {}: {}", replay, e);
                    std::process::exit(1);
                }
            }
        }
        info!(
            "Replay complete: {} records, {} batches",
            pipeline.records,
            pipeline.transport.sent()
        );
        return;
    }

    let Some(spool) = args.spool.as_deref() else {
        return;
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let interval = Duration::from_secs(args.interval);
    info!(
        "Polling spool {} every {}s",
        spool.display(),
        args.interval
    );

    while running.load(Ordering::SeqCst) {
        pipeline.run_spool_once(spool);

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!(
        "Shutdown complete: {} records, {} batches",
        pipeline.records,
        pipeline.transport.sent()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["treesinkd", "--replay", "-"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn pipeline() -> Pipeline<Vec<u8>> {
        let config = build_config(&args(&[
            "--proc-type",
            "NameNode",
            "--license-key",
            "k",
            "--hostname",
            "nn1",
        ]))
        .unwrap();
        Pipeline::new(Sink::new(&config).unwrap(), Vec::new())
    }

    #[test]
    fn input_source_is_required() {
        assert!(Args::try_parse_from(["treesinkd"]).is_err());
        assert!(Args::try_parse_from(["treesinkd", "--replay", "a", "--spool", "b"]).is_err());
    }

    #[test]
    fn command_line_overrides_config() {
        let config = build_config(&args(&["--proc-type", "DataNode", "--debug"])).unwrap();
        assert_eq!(config.process_type(), Some("DataNode"));
        assert!(config.debug);
        assert!(!config.groupings_enabled());
    }

    #[test]
    fn replay_writes_a_batch_per_record() {
        let mut p = pipeline();
        let input = concat!(
            r#"{"context": "jvm", "name": "jvm", "measurements": [{"name": "GcCount", "value": 1}]}"#,
            "\n",
            r#"{"context": "jvm", "name": "jvm", "measurements": [{"name": "GcCount", "value": 4}]}"#,
            "\n",
            r#"{"context": "jvm", "name": "jvm", "measurements": [{"name": "GcCount", "value": ""}]}"#,
            "\n",
        );
        p.run_lines(io::Cursor::new(input));
        assert_eq!(p.records, 3);
        // the last record has nothing to send
        assert_eq!(p.transport.sent(), 2);
    }

    #[test]
    fn spool_files_are_processed_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("0001.json"),
            r#"{"context": "rpc", "name": "rpc", "measurements": [{"name": "SentBytes", "value": 10}]}"#,
        )
        .unwrap();

        let mut p = pipeline();
        p.run_spool_once(dir.path());
        p.run_spool_once(dir.path());
        assert_eq!(p.records, 1);
        assert!(dir.path().join("0001.json.done").exists());
    }
}
