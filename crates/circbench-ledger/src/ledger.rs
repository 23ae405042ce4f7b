use circbench_utils::LedgerKey;
use circbench_utils::error::LedgerError;
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::lock::LedgerLock;
use crate::record::{
    INSTANCES_FILE, INSTANCES_HEADER, InstanceRecord, LedgerRecord, RESULTS_FILE, RESULTS_HEADER,
};

/// Result of an idempotent append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    AlreadyPresent,
}

/// Durable, append-only store of completed execution requests.
///
/// Rows are never rewritten. Every append is one `write_all` of a complete
/// line followed by `sync_data`, so after a crash the file holds a prefix of
/// complete rows plus at most one torn line, which [`reload`](Self::reload)
/// cuts off.
#[derive(Debug)]
pub struct Ledger {
    dir: PathBuf,
    results_path: PathBuf,
    instances_path: PathBuf,
    completed: HashSet<LedgerKey>,
    instances: Vec<InstanceRecord>,
    instance_index: HashMap<String, usize>,
    _lock: LedgerLock,
}

impl Ledger {
    /// Open (creating if needed) the ledger in `dir` for writing.
    pub fn open(dir: &Path) -> Result<Self, LedgerError> {
        std::fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let lock = LedgerLock::acquire(dir)?;

        let mut ledger = Self {
            dir: dir.to_path_buf(),
            results_path: dir.join(RESULTS_FILE),
            instances_path: dir.join(INSTANCES_FILE),
            completed: HashSet::new(),
            instances: Vec::new(),
            instance_index: HashMap::new(),
            _lock: lock,
        };
        ledger.reload()?;
        Ok(ledger)
    }

    /// Rebuild the completed-key index and instance registry from disk.
    pub fn reload(&mut self) -> Result<&HashSet<LedgerKey>, LedgerError> {
        repair_torn_tail(&self.results_path)?;
        repair_torn_tail(&self.instances_path)?;

        let records: Vec<LedgerRecord> = read_rows(&self.results_path, &RESULTS_HEADER)?;
        self.completed.clear();
        for record in records {
            let key = record.key();
            if !self.completed.insert(key) {
                warn!(
                    instance_id = %record.instance_id,
                    variant = %record.variant,
                    repetition = record.repetition,
                    "Duplicate ledger row ignored"
                );
            }
        }

        let instances: Vec<InstanceRecord> = read_rows(&self.instances_path, &INSTANCES_HEADER)?;
        self.instances.clear();
        self.instance_index.clear();
        for record in instances {
            if self.instance_index.contains_key(&record.instance_id) {
                warn!(instance_id = %record.instance_id, "Duplicate instance row ignored");
                continue;
            }
            self.instance_index
                .insert(record.instance_id.clone(), self.instances.len());
            self.instances.push(record);
        }

        debug!(
            completed = self.completed.len(),
            instances = self.instances.len(),
            "Ledger loaded from {}",
            self.dir.display()
        );
        Ok(&self.completed)
    }

    #[must_use]
    pub fn contains(&self, key: &LedgerKey) -> bool {
        self.completed.contains(key)
    }

    #[must_use]
    pub fn completed(&self) -> &HashSet<LedgerKey> {
        &self.completed
    }

    /// Append one record unless its key is already present.
    pub fn append(&mut self, record: &LedgerRecord) -> Result<AppendOutcome, LedgerError> {
        let key = record.key();
        if self.completed.contains(&key) {
            debug!(
                instance_id = %key.instance_id,
                variant = %key.variant,
                repetition = key.repetition,
                "Ledger already holds this request"
            );
            return Ok(AppendOutcome::AlreadyPresent);
        }
        append_row(&self.results_path, &RESULTS_HEADER, record)?;
        self.completed.insert(key);
        Ok(AppendOutcome::Appended)
    }

    /// Record an instance's parameters. Re-registering identical parameters
    /// is a no-op; different parameters under the same id are a conflict.
    pub fn register_instance(
        &mut self,
        record: &InstanceRecord,
    ) -> Result<AppendOutcome, LedgerError> {
        if let Some(existing) = self.instance(&record.instance_id) {
            if existing == record {
                return Ok(AppendOutcome::AlreadyPresent);
            }
            return Err(LedgerError::InstanceConflict {
                instance_id: record.instance_id.clone(),
            });
        }
        append_row(&self.instances_path, &INSTANCES_HEADER, record)?;
        self.instance_index
            .insert(record.instance_id.clone(), self.instances.len());
        self.instances.push(record.clone());
        Ok(AppendOutcome::Appended)
    }

    #[must_use]
    pub fn instance(&self, instance_id: &str) -> Option<&InstanceRecord> {
        self.instance_index
            .get(instance_id)
            .map(|&idx| &self.instances[idx])
    }

    /// Registered instances in registration order.
    #[must_use]
    pub fn instances(&self) -> &[InstanceRecord] {
        &self.instances
    }

    /// All result rows, in file order.
    pub fn records(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        read_rows(&self.results_path, &RESULTS_HEADER)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn results_path(&self) -> &Path {
        &self.results_path
    }
}

/// Read result rows without taking the writer lock, ignoring a torn tail.
/// Used for status reporting while a campaign may be running.
pub fn read_results(dir: &Path) -> Result<Vec<LedgerRecord>, LedgerError> {
    read_rows(&dir.join(RESULTS_FILE), &RESULTS_HEADER)
}

/// Read the instance registry without taking the writer lock.
pub fn read_instances(dir: &Path) -> Result<Vec<InstanceRecord>, LedgerError> {
    read_rows(&dir.join(INSTANCES_FILE), &INSTANCES_HEADER)
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> LedgerError + '_ {
    move |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Cut a trailing line that lacks its newline.
fn repair_torn_tail(path: &Path) -> Result<(), LedgerError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error(path)(e)),
    };
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        return Ok(());
    }

    let keep = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    warn!(
        path = %path.display(),
        dropped_bytes = bytes.len() - keep,
        "Truncating torn trailing ledger row"
    );
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(io_error(path))?;
    file.set_len(keep as u64).map_err(io_error(path))?;
    file.sync_all().map_err(io_error(path))?;
    Ok(())
}

fn complete_lines(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|&b| b == b'\n') {
        Some(pos) => &bytes[..=pos],
        None => &[],
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path, header: &[&str]) -> Result<Vec<T>, LedgerError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(path)(e)),
    };
    let bytes = complete_lines(&bytes);
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let corrupt = |line: u64, reason: String| LedgerError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let found = reader
        .headers()
        .map_err(|e| corrupt(1, e.to_string()))?
        .clone();
    if found.iter().ne(header.iter().copied()) {
        return Err(corrupt(
            1,
            format!(
                "unexpected header '{}', expected '{}'",
                found.iter().collect::<Vec<_>>().join(","),
                header.join(",")
            ),
        ));
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        let row = result.map_err(|e| {
            let line = e.position().map_or(0, csv::Position::line);
            corrupt(line, e.to_string())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Serialize `row` (and the header if the file is new) into one buffer and
/// append it with a single write, then sync.
fn append_row<T: Serialize>(path: &Path, header: &[&str], row: &T) -> Result<(), LedgerError> {
    let needs_header = std::fs::metadata(path).map_or(true, |meta| meta.len() == 0);

    let to_io = |e: csv::Error| io_error(path)(std::io::Error::other(e));
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if needs_header {
        writer.write_record(header).map_err(to_io)?;
    }
    writer.serialize(row).map_err(to_io)?;
    let buffer = writer
        .into_inner()
        .map_err(|e| io_error(path)(std::io::Error::other(e.to_string())))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error(path))?;
    file.write_all(&buffer).map_err(io_error(path))?;
    file.sync_data().map_err(io_error(path))?;

    if needs_header {
        info!(path = %path.display(), "Created ledger table");
    }
    Ok(())
}
