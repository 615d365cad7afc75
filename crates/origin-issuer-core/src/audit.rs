// crates/origin-issuer-core/src/audit.rs
// ============================================================================
// Module: Reconcile Audit Logging
// Description: Structured JSON-lines events for reconciliation outcomes.
// Purpose: Emit operator-facing logs without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Reconcilers describe every step outcome as a [`ReconcileEvent`] and hand it
//! to an [`AuditSink`]. Sinks serialize events as single JSON lines. The
//! condition on the resource remains the primary diagnostic channel; these
//! events add the step and error context that status messages leave out.
//!
//! Secret material never reaches an event: only object keys are recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Quiet no-op outcomes (ignored gates).
    Debug,
    /// State changes and notable skips.
    Info,
    /// Failed steps.
    Error,
}

/// Resource kind named by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `OriginIssuer` resource.
    OriginIssuer,
    /// `CertificateRequest` resource.
    CertificateRequest,
}

/// Outcome label for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// The step completed and reconciliation continued.
    Proceeded,
    /// Reconciliation stopped quietly.
    Ignored,
    /// Reconciliation finished successfully.
    Succeeded,
    /// Reconciliation stopped with a terminal status and no retry.
    Terminal,
    /// Reconciliation failed and the host should retry.
    Failed,
    /// Reconciliation was cancelled by the host.
    Cancelled,
}

/// Reconcile audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: AuditLevel,
    /// Resource kind.
    pub resource_kind: ResourceKind,
    /// Resource namespace; absent for cluster-scoped resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Resource name.
    pub name: String,
    /// Step or gate label.
    pub step: &'static str,
    /// Step outcome.
    pub outcome: EventOutcome,
    /// Condition reason written by the step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error text when the step failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inputs required to construct a reconcile event.
#[derive(Debug, Clone)]
pub struct ReconcileEventParams {
    /// Event severity.
    pub level: AuditLevel,
    /// Resource kind.
    pub resource_kind: ResourceKind,
    /// Resource namespace, if namespaced.
    pub namespace: Option<String>,
    /// Resource name.
    pub name: String,
    /// Step or gate label.
    pub step: &'static str,
    /// Step outcome.
    pub outcome: EventOutcome,
    /// Condition reason, if any.
    pub reason: Option<String>,
    /// Human-readable detail.
    pub message: Option<String>,
    /// Error text, if any.
    pub error: Option<String>,
}

/// Event label for step outcomes.
pub const EVENT_RECONCILE_STEP: &str = "reconcile_step";
/// Event label for condition status transitions.
pub const EVENT_CONDITION_TRANSITION: &str = "condition_transition";

impl ReconcileEvent {
    /// Creates a step event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ReconcileEventParams) -> Self {
        Self::with_label(EVENT_RECONCILE_STEP, params)
    }

    /// Creates a condition transition event.
    #[must_use]
    pub fn transition(params: ReconcileEventParams) -> Self {
        Self::with_label(EVENT_CONDITION_TRANSITION, params)
    }

    /// Creates an event with the given label.
    fn with_label(event: &'static str, params: ReconcileEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            level: params.level,
            resource_kind: params.resource_kind,
            namespace: params.namespace,
            name: params.name,
            step: params.step,
            outcome: params.outcome,
            reason: params.reason,
            message: params.message,
            error: params.error,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for reconcile events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ReconcileEvent);
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &ReconcileEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &ReconcileEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &ReconcileEvent) {}
}

/// Audit sink that keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    /// Captured events in arrival order.
    events: Mutex<Vec<ReconcileEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the captured steps for a resource name, in order.
    #[must_use]
    pub fn steps_for(&self, name: &str) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.name == name)
            .map(|event| event.step)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &ReconcileEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

/// Sink wrapper that drops events below a minimum level.
pub struct LevelFilter {
    /// Lowest level forwarded to the inner sink.
    min_level: AuditLevel,
    /// Destination sink.
    inner: Arc<dyn AuditSink>,
}

impl LevelFilter {
    /// Wraps a sink with a minimum level.
    #[must_use]
    pub fn new(min_level: AuditLevel, inner: Arc<dyn AuditSink>) -> Self {
        Self {
            min_level,
            inner,
        }
    }
}

impl AuditSink for LevelFilter {
    fn record(&self, event: &ReconcileEvent) {
        if event.level >= self.min_level {
            self.inner.record(event);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    fn params(level: AuditLevel) -> ReconcileEventParams {
        ReconcileEventParams {
            level,
            resource_kind: ResourceKind::CertificateRequest,
            namespace: Some("default".to_string()),
            name: "web".to_string(),
            step: "sign",
            outcome: EventOutcome::Failed,
            reason: Some("Failed".to_string()),
            message: None,
            error: Some("boom".to_string()),
        }
    }

    #[test]
    fn level_filter_drops_lower_levels() {
        let memory = Arc::new(MemoryAuditSink::new());
        let filter = LevelFilter::new(AuditLevel::Info, memory.clone());
        filter.record(&ReconcileEvent::new(params(AuditLevel::Debug)));
        filter.record(&ReconcileEvent::new(params(AuditLevel::Error)));
        let events = memory.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, AuditLevel::Error);
    }

    #[test]
    fn event_serializes_as_single_json_object() {
        let event = ReconcileEvent::new(params(AuditLevel::Error));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "reconcile_step");
        assert_eq!(value["resource_kind"], "certificate_request");
        assert_eq!(value["outcome"], "failed");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(&ReconcileEvent::new(params(AuditLevel::Info)));
        sink.record(&ReconcileEvent::transition(params(AuditLevel::Info)));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("condition_transition"));
    }
}
