// crates/fleetgate-core/src/core/audit.rs
// ============================================================================
// Module: Fleetgate Audit Log
// Description: Append-only audit records for planning and execution.
// Purpose: Record every planned and executed change with redacted details.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool invocation that plans or mutates state appends audit records
//! through the [`AuditSink`] trait. Records are append-only for the process
//! lifetime; `details` must already be redacted by the producer. The
//! in-memory log is the shipped default; stderr and file sinks serialize the
//! same records as JSON lines for external pipelines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::actions::Action;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Outcome recorded for one audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation accepted into a plan.
    Planned,
    /// Operation executed successfully.
    Success,
    /// Operation failed during execution.
    Failed,
    /// Operation satisfied from the idempotency cache.
    Skipped,
}

/// One append-only audit entry.
///
/// # Invariants
/// - `details` is redacted before the record is constructed.
/// - `correlation_id` is minted once per tool invocation and shared by every
///   record that invocation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Actor that requested the change.
    pub actor: String,
    /// Unix-seconds timestamp supplied by the host.
    pub timestamp: u64,
    /// Target project the entry applies to.
    pub target_project: String,
    /// Operation the entry applies to.
    pub operation_id: String,
    /// Action name for the operation.
    pub action: Action,
    /// Entry outcome.
    pub outcome: AuditOutcome,
    /// Correlation identifier for the producing invocation.
    pub correlation_id: String,
    /// Redacted free-form details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Append-only audit sink.
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    fn append(&self, record: AuditRecord);

    /// Lists recorded entries, oldest first.
    ///
    /// Sinks that forward records elsewhere return an empty list; only the
    /// in-memory log retains entries for inspection.
    fn list(&self) -> Vec<AuditRecord>;
}

/// In-memory append-only audit log.
#[derive(Default)]
pub struct InMemoryAuditLog {
    /// Recorded entries, oldest first.
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    fn list(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

/// Audit sink that writes JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn append(&self, record: AuditRecord) {
        if let Ok(payload) = serde_json::to_string(&record) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn list(&self) -> Vec<AuditRecord> {
        Vec::new()
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, record: AuditRecord) {
        if let Ok(payload) = serde_json::to_string(&record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }

    fn list(&self) -> Vec<AuditRecord> {
        Vec::new()
    }
}
