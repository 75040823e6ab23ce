//! Typed sweep events and their mapping onto JSONL entries.
//!
//! A sweep is single-shot and synchronous, so events are written inline
//! rather than handed to a logger thread. A disabled logger accepts and
//! drops everything, which lets callers log unconditionally.

#![allow(missing_docs)]

use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Events emitted over the course of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    SweepStarted {
        version: String,
        config_hash: String,
        project_root: String,
    },
    DirectorySkipped {
        path: String,
        error_message: String,
    },
    ReferenceUnreadable {
        path: String,
        error_message: String,
    },
    AssetDeleted {
        category: String,
        path: String,
    },
    AssetDeletionFailed {
        category: String,
        path: String,
        error_code: String,
        error_message: String,
    },
    SweepCompleted {
        references_scanned: usize,
        assets_found: usize,
        assets_deleted: usize,
        assets_failed: usize,
        duration_ms: u64,
    },
}

/// Activity logger: an optional JSONL sink.
pub struct ActivityLogger {
    jsonl: Option<JsonlWriter>,
}

impl ActivityLogger {
    /// Logger that discards every event.
    pub fn disabled() -> Self {
        Self { jsonl: None }
    }

    pub fn to_jsonl(config: JsonlConfig) -> Self {
        Self {
            jsonl: Some(JsonlWriter::open(config)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.jsonl.is_some()
    }

    pub fn log(&mut self, event: &ActivityEvent) {
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.write_entry(&event_to_log_entry(event));
        }
    }

    pub fn flush(&mut self) {
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.flush();
        }
    }
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::SweepStarted {
            version,
            config_hash,
            project_root,
        } => {
            let mut e = LogEntry::new(EventType::SweepStart, Severity::Info);
            e.path = Some(project_root.clone());
            e.details = Some(format!("version={version} config_hash={config_hash}"));
            e
        }
        ActivityEvent::DirectorySkipped {
            path,
            error_message,
        } => {
            let mut e = LogEntry::new(EventType::DirectorySkip, Severity::Warning);
            e.path = Some(path.clone());
            e.error_code = Some("SWP-3002".to_string());
            e.error_message = Some(error_message.clone());
            e
        }
        ActivityEvent::ReferenceUnreadable {
            path,
            error_message,
        } => {
            let mut e = LogEntry::new(EventType::ReferenceUnreadable, Severity::Warning);
            e.path = Some(path.clone());
            e.error_code = Some("SWP-3002".to_string());
            e.error_message = Some(error_message.clone());
            e
        }
        ActivityEvent::AssetDeleted { category, path } => {
            let mut e = LogEntry::new(EventType::AssetDelete, Severity::Info);
            e.category = Some(category.clone());
            e.path = Some(path.clone());
            e.ok = Some(true);
            e
        }
        ActivityEvent::AssetDeletionFailed {
            category,
            path,
            error_code,
            error_message,
        } => {
            let mut e = LogEntry::new(EventType::AssetDeleteFailed, Severity::Error);
            e.category = Some(category.clone());
            e.path = Some(path.clone());
            e.ok = Some(false);
            e.error_code = Some(error_code.clone());
            e.error_message = Some(error_message.clone());
            e
        }
        ActivityEvent::SweepCompleted {
            references_scanned,
            assets_found,
            assets_deleted,
            assets_failed,
            duration_ms,
        } => {
            let mut e = LogEntry::new(EventType::SweepComplete, Severity::Info);
            e.count = Some(u64::try_from(*assets_deleted).unwrap_or(u64::MAX));
            e.duration_ms = Some(*duration_ms);
            e.ok = Some(*assets_failed == 0);
            e.details = Some(format!(
                "references={references_scanned} assets={assets_found} deleted={assets_deleted} failed={assets_failed}"
            ));
            e
        }
    }
}
