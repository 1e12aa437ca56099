//! The ingest pass: fetch candidate messages, save their attachments, and
//! advance the delta cursor.

pub mod fetcher;
pub mod processor;
pub mod report;
pub mod runner;

pub use fetcher::{Batch, MessageFetcher};
pub use processor::AttachmentProcessor;
pub use report::{MessageOutcome, ProcessFailure, RunReport};
pub use runner::Ingestor;
