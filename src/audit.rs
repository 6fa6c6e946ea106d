//! Audit log
//!
//! Appends one JSON line per script step start and finish. A failed write is
//! logged and otherwise ignored; the audit trail never aborts a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    run_id: Uuid,
    entry_type: &'static str,
    step: &'a str,
    detail: &'a Value,
    result: Option<Value>,
    error: Option<String>,
    duration_ms: u64,
    status: &'static str,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// JSONL audit trail for one script run
#[derive(Clone)]
pub struct AuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
    run_id: Uuid,
}

impl AuditLog {
    /// Create an audit log appending to `log_path`
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter::new(log_path.into()))),
            run_id: Uuid::new_v4(),
        }
    }

    /// Identifier shared by every entry of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub async fn path(&self) -> PathBuf {
        self.writer.lock().await.path.clone()
    }

    /// Record that a step is about to run
    pub async fn step_started(&self, step: &str, detail: &Value) {
        self.append(AuditEntry {
            timestamp: Utc::now(),
            run_id: self.run_id,
            entry_type: "step_start",
            step,
            detail,
            result: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        })
        .await;
    }

    /// Record how a step ended
    pub async fn step_finished(
        &self,
        step: &str,
        detail: &Value,
        outcome: std::result::Result<Value, String>,
        duration_ms: u64,
    ) {
        let (result, error, status) = match outcome {
            Ok(v) => (Some(v), None, "success"),
            Err(e) => (None, Some(e), "error"),
        };

        self.append(AuditEntry {
            timestamp: Utc::now(),
            run_id: self.run_id,
            entry_type: "step_complete",
            step,
            detail,
            result,
            error,
            duration_ms,
            status,
        })
        .await;
    }

    async fn append(&self, entry: AuditEntry<'_>) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, path = %writer.path.display(), "Failed to write audit log entry");
        }
    }
}

/// Read back every entry of an audit file
pub fn read_entries(path: &Path) -> std::io::Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
        .collect()
}
