//! Snapshot sources: JSON lines from a reader, or files dropped into a spool directory.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use tracing::warn;
use treesink_core::Snapshot;

const SPOOL_EXTENSION: &str = "json";
const DONE_SUFFIX: &str = ".done";

/// Iterates snapshots, one JSON object per line. Blank lines are skipped,
/// malformed lines are logged and skipped.
pub struct SnapshotLines<R: BufRead> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> SnapshotLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for SnapshotLines<R> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!("read failed after line {}: {}", self.line_no, e);
                    return None;
                }
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => warn!("line {}: invalid snapshot: {}", self.line_no, e),
            }
        }
    }
}

/// `*.json` files in `dir`, oldest name first.
pub fn pending_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == SPOOL_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Renames a processed spool file to `<name>.done` so it is not picked up again.
pub fn mark_done(path: &Path) -> io::Result<PathBuf> {
    let mut done = path.as_os_str().to_owned();
    done.push(DONE_SUFFIX);
    let done = PathBuf::from(done);
    std::fs::rename(path, &done)?;
    Ok(done)
}
