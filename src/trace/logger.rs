use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::{fs::OpenOptions, io::Write, sync::Mutex};

use crate::trace::record::RunRecord;

/// Side-channel sink for run records. Never part of control flow: a failing
/// observer must not fail the invocation.
pub trait RunObserver {
    fn record(&self, record: &RunRecord);
}

/// Appends one JSON line per run to a file.
pub struct RunLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl RunLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("could not create run log directory '{}': {}", parent.display(), e);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                tracing::warn!("could not open run log '{}': {}", path.display(), e);
                Self { file: None }
            }
        }
    }

    /// A logger that drops every record.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }
}

impl RunObserver for RunLogger {
    fn record(&self, record: &RunRecord) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return, // logging disabled
        };

        let json = match serde_json::to_string(record) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("failed to serialize run record: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("run logger lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            tracing::warn!("failed to write run record: {}", e);
        }
    }
}

/// Keeps records in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryObserver {
    records: Rc<RefCell<Vec<RunRecord>>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.records.borrow().clone()
    }
}

impl RunObserver for MemoryObserver {
    fn record(&self, record: &RunRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}
