//! Request URLs for the mailbox resources used by the pipeline.

use reqwest::Url;

use super::error::{GraphError, Result};

/// Page size of the first-run inbox query.
pub const INBOX_PAGE_SIZE: u32 = 50;

/// Builds mailbox-scoped Graph URLs.
#[derive(Debug, Clone)]
pub struct MailboxUrls {
    graph_base: String,
    mailbox: String,
}

impl MailboxUrls {
    pub fn new(graph_base: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            graph_base: graph_base.into(),
            mailbox: mailbox.into(),
        }
    }

    /// Unread inbox messages with exactly `subject`, ids only.
    pub fn unread_with_subject(&self, subject: &str) -> Result<String> {
        let mut url = self.mailbox_url(&["mailFolders", "Inbox", "messages"])?;
        url.query_pairs_mut()
            .append_pair("$filter", &unread_subject_filter(subject))
            .append_pair("$select", "id")
            .append_pair("$top", &INBOX_PAGE_SIZE.to_string());
        Ok(url.to_string())
    }

    /// The attachments collection of a message.
    pub fn attachments(&self, message_id: &str) -> Result<String> {
        self.mailbox_url(&["messages", message_id, "attachments"])
            .map(String::from)
    }

    /// The message resource itself.
    pub fn message(&self, message_id: &str) -> Result<String> {
        self.mailbox_url(&["messages", message_id]).map(String::from)
    }

    fn mailbox_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.graph_base)
            .map_err(|e| GraphError::InvalidUrl(format!("{}: {}", self.graph_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| GraphError::InvalidUrl(format!("{} cannot be a base", self.graph_base)))?
            .pop_if_empty()
            .push("users")
            .push(&self.mailbox)
            .extend(segments);
        Ok(url)
    }
}

/// OData filter for unread messages with an exact subject. Single quotes in
/// the subject are doubled.
pub fn unread_subject_filter(subject: &str) -> String {
    format!(
        "isRead eq false and subject eq '{}'",
        subject.replace('\'', "''")
    )
}
