//! Append-only JSONL decision ledger.
//!
//! One JSON object per line in `<dir>/decisions.jsonl`. Every line carries a
//! BLAKE3 checksum of the entry it holds, and a trailing line without a
//! newline (a write interrupted by a crash) is cut off when the ledger is
//! opened, or before the next append if it appeared while open. A failed
//! append truncates the file back to where it started. Sequence numbers continue across reopen: the counter is rebuilt
//! from the number of complete entries already on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::entry::{Decision, LedgerEntry, LedgerQuery};

/// File name of the decision log inside the ledger directory.
pub const LEDGER_FILE: &str = "decisions.jsonl";

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("field `{0}` is not a finite number")]
    NonFinite(&'static str),

    #[error("line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: checksum mismatch")]
    ChecksumMismatch { line: usize },
}

impl LedgerError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Behavior switches for a ledger instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// `fsync` the file after every append.
    #[serde(default)]
    pub sync_on_append: bool,
}

/// On-disk line: the entry plus its checksum.
#[derive(Serialize)]
struct RecordOut<'a> {
    #[serde(flatten)]
    entry: &'a LedgerEntry,
    checksum: String,
}

#[derive(Deserialize)]
struct RecordIn {
    #[serde(flatten)]
    entry: LedgerEntry,
    #[serde(default)]
    checksum: Option<String>,
}

fn checksum(entry: &LedgerEntry) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_string(entry)?;
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

#[derive(Debug)]
struct LedgerState {
    seq: u64,
}

/// Append-only decision ledger, safe to share between threads.
///
/// The sequence counter is private to one instance. Two instances opened on
/// the same directory do not coordinate with each other.
#[derive(Debug)]
pub struct DecisionLedger {
    path: PathBuf,
    options: LedgerOptions,
    state: Mutex<LedgerState>,
}

impl DecisionLedger {
    /// Open (or create) a ledger in `dir` with default options.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::open_with(dir, LedgerOptions::default())
    }

    /// Open (or create) a ledger in `dir`.
    pub fn open_with(dir: impl AsRef<Path>, options: LedgerOptions) -> Result<Self, LedgerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| LedgerError::io(format!("create ledger dir {}", dir.display()), e))?;

        let path = dir.join(LEDGER_FILE);
        repair_torn_tail(&path)?;

        let existing = read_entries(&path)?;
        let seq = existing.len() as u64;
        info!(path = %path.display(), entries = seq, "opened decision ledger");

        Ok(Self {
            path,
            options,
            state: Mutex::new(LedgerState { seq }),
        })
    }

    /// Record a decision. Assigns the next sequence number and the current time.
    ///
    /// On failure the counter is left untouched, so the next successful append
    /// takes the number this one would have used.
    pub fn append(&self, mut entry: LedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.state.lock();

        if let Some(field) = entry.non_finite_field() {
            return Err(LedgerError::NonFinite(field));
        }

        entry.seq = state.seq + 1;
        entry.recorded_at = Utc::now();

        let record = RecordOut {
            entry: &entry,
            checksum: checksum(&entry)?,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::io("open ledger for append", e))?;
        let mut start = file_len(&file)?;
        if !ends_with_newline(&mut file, start)? {
            repair_torn_tail(&self.path)?;
            start = file_len(&file)?;
        }

        if let Err(e) = write_line(&mut file, &line, self.options.sync_on_append) {
            // A short write must not leave a fragment for the next append to extend.
            if let Err(trunc) = file.set_len(start) {
                warn!(
                    path = %self.path.display(),
                    error = %trunc,
                    "could not remove partial ledger line"
                );
            }
            return Err(e);
        }

        state.seq = entry.seq;
        debug!(
            seq = entry.seq,
            strategy_id = %entry.strategy_id,
            symbol = %entry.symbol,
            decision = %entry.decision,
            "ledger append"
        );
        Ok(entry)
    }

    /// Every entry in file order. Empty if the log does not exist yet.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let _state = self.state.lock();
        read_entries(&self.path)
    }

    /// Entries matching every predicate of `query`.
    pub fn filter(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| query.matches(e))
            .collect())
    }

    /// Shorthand for [`filter`](Self::filter) where empty strings and `None` match all.
    pub fn filter_by(
        &self,
        strategy_id: &str,
        symbol: &str,
        decision: Option<Decision>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.filter(&LedgerQuery::new(strategy_id, symbol, decision))
    }

    /// Sequence number of the most recent entry (0 when empty).
    pub fn last_sequence(&self) -> u64 {
        self.state.lock().seq
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn file_len(file: &File) -> Result<u64, LedgerError> {
    file.metadata()
        .map(|m| m.len())
        .map_err(|e| LedgerError::io("stat ledger", e))
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File, len: u64) -> Result<bool, LedgerError> {
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| LedgerError::io("read ledger tail", e))?;
    Ok(last[0] == b'\n')
}

fn write_line(file: &mut File, line: &[u8], sync: bool) -> Result<(), LedgerError> {
    file.write_all(line)
        .map_err(|e| LedgerError::io("write ledger entry", e))?;
    if sync {
        file.sync_data()
            .map_err(|e| LedgerError::io("sync ledger", e))?;
    }
    Ok(())
}

fn read_entries(path: &Path) -> Result<Vec<LedgerEntry>, LedgerError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LedgerError::io("read ledger", e)),
    };

    let mut entries = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let record: RecordIn = serde_json::from_str(line)
            .map_err(|source| LedgerError::MalformedLine { line: line_no, source })?;
        if let Some(expected) = &record.checksum {
            let actual = checksum(&record.entry)?;
            if &actual != expected {
                return Err(LedgerError::ChecksumMismatch { line: line_no });
            }
        }
        entries.push(record.entry);
    }
    Ok(entries)
}

/// Drop a final line that was never terminated by a newline.
///
/// Appends write line and newline with one `write_all`, so a missing
/// newline means the process died mid-write.
fn repair_torn_tail(path: &Path) -> Result<(), LedgerError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(LedgerError::io("read ledger", e)),
    };
    if bytes.last().map_or(true, |&b| b == b'\n') {
        return Ok(());
    }

    let keep = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| LedgerError::io("open ledger for repair", e))?;
    file.set_len(keep as u64)
        .map_err(|e| LedgerError::io("truncate torn ledger line", e))?;
    file.sync_all()
        .map_err(|e| LedgerError::io("sync repaired ledger", e))?;

    warn!(
        path = %path.display(),
        dropped_bytes = bytes.len() - keep,
        "truncated torn trailing ledger line"
    );
    Ok(())
}
