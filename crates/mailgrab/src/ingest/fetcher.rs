//! Fetches the batch of candidate messages for a run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::graph::types::MessagePage;
use crate::graph::{decode_response, AccessToken, GraphError, MailboxUrls, MessageRef, Transport};
use crate::sanitize::redact_url;

/// Messages to process plus the cursor for the next run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub messages: Vec<MessageRef>,
    /// Server-issued delta link; `None` keeps the previous cursor.
    pub delta_link: Option<String>,
    /// Set when a response could not be used and the batch was cut short.
    pub degraded: bool,
}

impl Batch {
    fn unusable(messages: Vec<MessageRef>) -> Self {
        Self {
            messages,
            delta_link: None,
            degraded: true,
        }
    }
}

pub struct MessageFetcher {
    transport: Arc<dyn Transport>,
    urls: MailboxUrls,
    subject: String,
    max_pages: u32,
}

impl MessageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        urls: MailboxUrls,
        subject: String,
        max_pages: u32,
    ) -> Self {
        Self {
            transport,
            urls,
            subject,
            max_pages: max_pages.max(1),
        }
    }

    /// Fetches the next batch.
    ///
    /// With a cursor the stored delta link is requested as-is. Without one,
    /// the inbox is queried for unread messages with the configured subject.
    /// Unusable responses yield an empty batch without a cursor instead of an
    /// error.
    pub async fn fetch_batch(&self, token: &AccessToken, cursor: Option<&str>) -> Batch {
        let first_url = match cursor {
            Some(delta_link) => {
                info!("Continuing from delta link {}", redact_url(delta_link));
                delta_link.to_string()
            }
            None => match self.urls.unread_with_subject(&self.subject) {
                Ok(url) => {
                    info!(
                        "No delta cursor, querying inbox for unread messages with subject '{}'",
                        self.subject
                    );
                    url
                }
                Err(e) => {
                    warn!("Could not build inbox query: {}", e);
                    return Batch::unusable(Vec::new());
                }
            },
        };

        let mut messages = Vec::new();
        let mut next_url = Some(first_url);
        let mut pages = 0u32;

        while let Some(url) = next_url.take() {
            if pages == self.max_pages {
                warn!(
                    "Stopped after {} page(s) with more results pending ({}); \
                     remaining messages stay unread and are picked up by a later run",
                    pages,
                    redact_url(&url)
                );
                return Batch {
                    messages,
                    delta_link: None,
                    degraded: false,
                };
            }
            pages += 1;

            let page = match self.fetch_page(token, &url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Message fetch failed on page {}, treating as no new messages: {}",
                        pages, e
                    );
                    return Batch::unusable(messages);
                }
            };

            let count_before = messages.len();
            for entry in page.value {
                match (entry.id, entry.removed) {
                    (Some(id), None) => messages.push(MessageRef { id }),
                    (Some(id), Some(_)) => debug!("Skipping removed message {}", id),
                    (None, _) => debug!("Skipping message entry without id"),
                }
            }
            debug!(
                "Page {}: {} message(s)",
                pages,
                messages.len() - count_before
            );

            if let Some(delta_link) = page.delta_link {
                info!("Found {} new message(s), received new delta link", messages.len());
                return Batch {
                    messages,
                    delta_link: Some(delta_link),
                    degraded: false,
                };
            }
            next_url = page.next_link;
        }

        info!("Found {} new message(s), no delta link returned", messages.len());
        Batch {
            messages,
            delta_link: None,
            degraded: false,
        }
    }

    async fn fetch_page(&self, token: &AccessToken, url: &str) -> Result<MessagePage, GraphError> {
        debug!("GET {}", redact_url(url));
        let response = self.transport.get(url, token).await?;
        debug!("Message fetch returned HTTP {}", response.status);
        decode_response(&response)
    }
}
