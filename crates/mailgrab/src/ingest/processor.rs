//! Downloads a message's file attachments and marks the message read.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::graph::types::AttachmentPage;
use crate::graph::{
    decode_response, AccessToken, Attachment, AttachmentKind, GraphError, MailboxUrls, Transport,
};
use crate::sanitize::redact_path;
use crate::storage::AttachmentStorage;

use super::report::{MessageOutcome, ProcessFailure};

pub struct AttachmentProcessor {
    transport: Arc<dyn Transport>,
    urls: MailboxUrls,
    storage: AttachmentStorage,
}

impl AttachmentProcessor {
    pub fn new(transport: Arc<dyn Transport>, urls: MailboxUrls, storage: AttachmentStorage) -> Self {
        Self {
            transport,
            urls,
            storage,
        }
    }

    /// Writes every file attachment of `message_id`, then marks it read.
    ///
    /// The read flag is only set once all file attachments are on disk; a
    /// message whose attachments could not be listed, decoded, or written
    /// stays unread so a later run can retry it.
    pub async fn process(&self, token: &AccessToken, message_id: &str) -> MessageOutcome {
        let mut outcome = MessageOutcome::new(message_id);

        let attachments = match self.list_attachments(token, message_id).await {
            Ok(attachments) => attachments,
            Err(e) => {
                error!("Failed to list attachments of message {}: {}", message_id, e);
                outcome.failure = Some(ProcessFailure::ListAttachments(e.to_string()));
                return outcome;
            }
        };

        if attachments.is_empty() {
            info!("Message {} has no attachments", message_id);
        } else {
            debug!(
                "Message {} has {} attachment(s)",
                message_id,
                attachments.len()
            );
        }

        // Decode everything up front so a bad payload writes nothing.
        let mut files = Vec::new();
        for attachment in &attachments {
            match attachment.kind() {
                AttachmentKind::File => match decode(attachment) {
                    Ok(file) => files.push(file),
                    Err(failure) => {
                        error!("Message {}: {}", message_id, failure);
                        outcome.failure = Some(failure);
                        return outcome;
                    }
                },
                AttachmentKind::Other(odata_type) => {
                    debug!(
                        "Skipping non-file attachment '{}' ({})",
                        attachment.display_name(),
                        odata_type
                    );
                    outcome.skipped += 1;
                }
            }
        }

        for (name, content) in &files {
            match self.save(name, content) {
                Ok(path) => outcome.written.push(path),
                Err(failure) => {
                    error!("Message {}: {}", message_id, failure);
                    outcome.failure = Some(failure);
                    return outcome;
                }
            }
        }

        match self.mark_read(token, message_id).await {
            Ok(()) => {
                outcome.marked_read = true;
                debug!("Marked message {} as read", message_id);
            }
            Err(e) => {
                warn!("Failed to mark message {} as read: {}", message_id, e);
                outcome.failure = Some(ProcessFailure::MarkRead(e.to_string()));
            }
        }

        outcome
    }

    async fn list_attachments(
        &self,
        token: &AccessToken,
        message_id: &str,
    ) -> Result<Vec<Attachment>, GraphError> {
        let url = self.urls.attachments(message_id)?;
        let response = self.transport.get(&url, token).await?;
        debug!("Attachment listing returned HTTP {}", response.status);
        let page: AttachmentPage = decode_response(&response)?;
        Ok(page.value)
    }

    fn save(&self, name: &str, content: &[u8]) -> Result<PathBuf, ProcessFailure> {
        let path = self
            .storage
            .store(name, content)
            .map_err(|e| ProcessFailure::Write {
                attachment: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "Saved attachment '{}' ({} bytes) as {}",
            name,
            content.len(),
            redact_path(&path)
        );
        Ok(path)
    }

    async fn mark_read(&self, token: &AccessToken, message_id: &str) -> Result<(), GraphError> {
        let url = self.urls.message(message_id)?;
        let response = self
            .transport
            .patch_json(&url, token, &json!({ "isRead": true }))
            .await?;
        debug!("Mark-as-read returned HTTP {}", response.status);

        if response.is_success() {
            return Ok(());
        }
        // Non-success statuses always decode to an error.
        decode_response::<serde_json::Value>(&response).map(|_| ())
    }
}

/// Name and raw bytes of a file attachment.
fn decode(attachment: &Attachment) -> Result<(String, Vec<u8>), ProcessFailure> {
    let name = attachment.display_name().to_string();
    match attachment.decode_content() {
        Ok(content) => Ok((name, content)),
        Err(e) => Err(ProcessFailure::Decode {
            attachment: name,
            reason: e.to_string(),
        }),
    }
}
