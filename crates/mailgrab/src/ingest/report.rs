//! Per-message outcomes and the run summary.

use std::fmt;
use std::path::PathBuf;

/// Why a message was not fully processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessFailure {
    /// The attachment listing could not be retrieved or decoded.
    ListAttachments(String),
    /// An attachment payload was not valid base64.
    Decode { attachment: String, reason: String },
    /// An attachment could not be written to disk.
    Write { attachment: String, reason: String },
    /// Attachments were written but the read flag was not set.
    MarkRead(String),
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessFailure::ListAttachments(reason) => {
                write!(f, "listing attachments failed: {}", reason)
            }
            ProcessFailure::Decode { attachment, reason } => {
                write!(f, "decoding '{}' failed: {}", attachment, reason)
            }
            ProcessFailure::Write { attachment, reason } => {
                write!(f, "writing '{}' failed: {}", attachment, reason)
            }
            ProcessFailure::MarkRead(reason) => write!(f, "marking as read failed: {}", reason),
        }
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub message_id: String,
    /// Files written for this message, in attachment order.
    pub written: Vec<PathBuf>,
    /// Attachments ignored because they are not file attachments.
    pub skipped: usize,
    pub marked_read: bool,
    pub failure: Option<ProcessFailure>,
}

impl MessageOutcome {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            written: Vec::new(),
            skipped: 0,
            marked_read: false,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.marked_read
    }
}

/// Summary of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Whether the run continued from a stored delta cursor.
    pub used_cursor: bool,
    /// Whether the fetch step had to fall back to an empty batch.
    pub fetch_degraded: bool,
    pub outcomes: Vec<MessageOutcome>,
    /// Whether a new cursor was persisted.
    pub cursor_saved: bool,
}

impl RunReport {
    pub fn messages_fetched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn files_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.written.len()).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MessageOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Ids of messages that remain unread after this run.
    pub fn not_marked_read(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.marked_read)
            .map(|o| o.message_id.as_str())
            .collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} message(s) fetched ({}), {} processed, {} failed, {} file(s) written, cursor {}",
            self.messages_fetched(),
            if self.used_cursor { "delta" } else { "full query" },
            self.succeeded(),
            self.messages_fetched() - self.succeeded(),
            self.files_written(),
            if self.cursor_saved { "advanced" } else { "unchanged" }
        )
    }
}
