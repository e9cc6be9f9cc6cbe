//! Audit trail for completed turns
//!
//! Every turn that reaches a final reply produces one [`AuditEvent`]: who
//! asked what, what was answered, and which documents were referenced.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::turn::TurnState;
use crate::core::{ChatError, Result};

/// Record of one completed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_name: String,
    pub user_input: String,
    pub reply: String,
    /// Latest document captured from a search result
    pub reference_doc_id: Option<String>,
    /// Every document captured during the turn
    pub doc_references: Vec<String>,
    pub tool_calls: usize,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Build the event for a finished turn
    pub fn from_turn(user_name: &str, user_input: &str, reply: &str, turn: &TurnState) -> Self {
        Self {
            user_name: user_name.to_string(),
            user_input: user_input.to_string(),
            reply: reply.to_string(),
            reference_doc_id: turn.reference_doc_id().map(str::to_string),
            doc_references: turn.doc_references.clone(),
            tool_calls: turn.tool_calls,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes events to the `audit` log target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<()> {
        info!(
            target: "audit",
            user_name = %event.user_name,
            user_input = %event.user_input,
            reply = %event.reply,
            reference_doc_id = event.reference_doc_id.as_deref(),
            doc_references = ?event.doc_references,
            tool_calls = event.tool_calls,
            "User {} asked {}",
            event.user_name,
            event.user_input
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a file
#[derive(Debug)]
pub struct JsonlAuditSink {
    file: Mutex<File>,
}

impl JsonlAuditSink {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ChatError::config(format!("Failed to open audit log {}: {}", path.display(), e))
            })?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = lock(&self.file);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps events in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<AuditEvent> {
        lock(&self.events).clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<()> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

/// Fans events out to several sinks.
///
/// Every sink sees the event even if an earlier one fails; the first
/// failure is returned.
#[derive(Default, Clone)]
pub struct MultiAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl MultiAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AuditSink for MultiAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.record(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn event() -> AuditEvent {
        let mut turn = TurnState::new(10);
        turn.record_dispatch(Some(&json!({"type": "search-result", "id": "doc123"})));
        AuditEvent::from_turn("Ada", "What is the leave policy?", "20 days.", &turn)
    }

    #[test]
    fn test_event_from_turn() {
        let event = event();
        assert_eq!(event.reference_doc_id.as_deref(), Some("doc123"));
        assert_eq!(event.doc_references, vec!["doc123"]);
        assert_eq!(event.tool_calls, 1);
    }

    #[test]
    fn test_jsonl_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("audit.jsonl");

        let sink = JsonlAuditSink::open(&path).unwrap();
        sink.record(&event()).unwrap();
        sink.record(&event()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.user_name, "Ada");
        assert_eq!(parsed.reference_doc_id.as_deref(), Some("doc123"));
    }

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _event: &AuditEvent) -> Result<()> {
            Err(ChatError::Other("disk full".to_string()))
        }
    }

    #[test]
    fn test_multi_sink_reaches_every_sink() {
        let memory = MemoryAuditSink::new();
        let multi = MultiAuditSink::new()
            .with(Arc::new(FailingSink))
            .with(Arc::new(memory.clone()));

        let result = multi.record(&event());
        assert!(matches!(result, Err(ChatError::Other(ref m)) if m == "disk full"));
        assert_eq!(memory.events().len(), 1);
    }
}
