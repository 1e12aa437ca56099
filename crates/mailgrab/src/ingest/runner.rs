use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::Result;
use crate::graph::{ClientCredentialsAuth, MailboxUrls, ReqwestTransport, Transport};
use crate::sanitize::redact_path;
use crate::state::{State, StateStore};
use crate::storage::AttachmentStorage;

use super::fetcher::MessageFetcher;
use super::processor::AttachmentProcessor;
use super::report::RunReport;

/// One ingestion pass over the configured mailbox.
pub struct Ingestor {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl Ingestor {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Builds an ingestor that talks to the configured endpoints over HTTPS.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.http_timeout)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Runs a single pass.
    ///
    /// Fails before any message is touched when the output directory, the
    /// state file, or authentication is unusable. Per-message problems are
    /// recorded in the report instead. The cursor is only replaced when the
    /// server handed out a new delta link.
    pub async fn run(&self) -> Result<RunReport> {
        let storage = AttachmentStorage::new(&self.config.output_directory);
        storage.ensure_directory()?;

        let store = StateStore::new(&self.config.state_file);
        let state = store.load()?;
        let mut report = RunReport {
            used_cursor: state.delta_link.is_some(),
            ..RunReport::default()
        };

        let auth = ClientCredentialsAuth::from_config(self.transport.clone(), &self.config);
        let token = auth.acquire().await?;

        let urls = MailboxUrls::new(&self.config.endpoints.graph_base, &self.config.mailbox);
        let fetcher = MessageFetcher::new(
            self.transport.clone(),
            urls.clone(),
            self.config.subject_filter.clone(),
            self.config.max_pages,
        );
        let batch = fetcher
            .fetch_batch(&token, state.delta_link.as_deref())
            .await;
        report.fetch_degraded = batch.degraded;

        let processor = AttachmentProcessor::new(self.transport.clone(), urls, storage);
        for (index, message) in batch.messages.iter().enumerate() {
            let span = info_span!("message", id = %message.id, index = index + 1);
            let outcome = processor
                .process(&token, &message.id)
                .instrument(span)
                .await;
            report.outcomes.push(outcome);
        }

        if let Some(delta_link) = batch.delta_link {
            store.save(&State::with_delta_link(delta_link))?;
            report.cursor_saved = true;
            info!("Saved delta cursor to {}", redact_path(store.path()));
        } else {
            info!("No new delta link, keeping previous cursor");
        }

        info!("Run complete: {}", report);
        for outcome in report.failures() {
            if let Some(failure) = &outcome.failure {
                warn!("Message {} not fully processed: {}", outcome.message_id, failure);
            }
        }
        let unread = report.not_marked_read();
        if !unread.is_empty() && report.cursor_saved {
            warn!(
                "{} message(s) remain unread but fall behind the new cursor: {}",
                unread.len(),
                unread.join(", ")
            );
        }

        Ok(report)
    }
}
