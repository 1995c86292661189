//! Notification sink.
//!
//! The engine reports confirmed issues and store changes through a
//! `NotificationSink`. Delivery is fire-and-forget: sinks must not fail the
//! scan cycle, so the trait methods return nothing.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::extraction::patterns::Category;
use crate::storage::models::{char_prefix, Issue};

/// Event fired when an issue is confirmed.
pub const EVENT_ISSUE_DETECTED: &str = "ha_log_assistant_issue_detected";

/// Event fired when the store count changes.
pub const EVENT_ASSISTANT_UPDATED: &str = "ha_log_assistant_updated";

/// Snippet characters embedded in a persistent notice.
pub const NOTICE_SNIPPET_CHARS: usize = 300;

const NO_DETAILS: &str = "No additional details";

/// User-facing notice for one confirmed issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub notification_id: String,
}

impl Notice {
    /// Format the notice for `issue`, the `ordinal`-th issue in the store.
    pub fn for_issue(issue: &Issue, ordinal: usize) -> Self {
        let details = if issue.details.is_empty() {
            NO_DETAILS
        } else {
            issue.details.as_str()
        };

        let message = format!(
            "**Suggested Fix:** {}\n\n**Log Snippet:**\n```\n{}...\n```\n\n**Confidence:** {}%\n\n**Details:** {}",
            issue.suggested_fix,
            char_prefix(&issue.log_snippet, NOTICE_SNIPPET_CHARS),
            issue.confidence,
            details
        );

        Self {
            title: issue.category.title(),
            message,
            notification_id: format!("log_assistant_{}", ordinal),
        }
    }
}

/// Events delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistantEvent {
    IssueDetected {
        issue_type: Category,
        suggested_fix: String,
        confidence: u8,
    },
    StoreUpdated {
        issues_count: usize,
    },
    PersistentNotice(Notice),
}

impl AssistantEvent {
    pub fn issue_detected(issue: &Issue) -> Self {
        AssistantEvent::IssueDetected {
            issue_type: issue.category,
            suggested_fix: issue.suggested_fix.clone(),
            confidence: issue.confidence,
        }
    }

    /// Host-side event name.
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantEvent::IssueDetected { .. } => EVENT_ISSUE_DETECTED,
            AssistantEvent::StoreUpdated { .. } => EVENT_ASSISTANT_UPDATED,
            AssistantEvent::PersistentNotice(_) => "persistent_notification",
        }
    }

    /// JSON payload without the `kind` tag.
    pub fn payload(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.remove("kind");
        }
        value
    }
}

/// Receiver of engine events.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: AssistantEvent);
}

/// Writes events to the log.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn notify(&self, event: AssistantEvent) {
        match &event {
            AssistantEvent::IssueDetected {
                issue_type,
                confidence,
                ..
            } => {
                log::info!(
                    "NOTIFY_ISSUE_DETECTED issue_type={} confidence={}",
                    issue_type,
                    confidence
                );
            }
            AssistantEvent::StoreUpdated { issues_count } => {
                log::info!("NOTIFY_STORE_UPDATED issues_count={}", issues_count);
            }
            AssistantEvent::PersistentNotice(notice) => {
                log::info!(
                    "NOTIFY_NOTICE id={} title={:?}",
                    notice.notification_id,
                    notice.title
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AssistantEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AssistantEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<AssistantEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: AssistantEvent) {
        self.events.lock().push(event);
    }
}
