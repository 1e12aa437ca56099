pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod sanitize;
pub mod secrets;
pub mod state;
pub mod storage;

pub use config::{Config, Credentials, Endpoints};
pub use error::{ConfigError, MailgrabError, Result, StateError, StorageError};
pub use graph::{AccessToken, ClientCredentialsAuth, HttpResponse, ReqwestTransport, Transport};
pub use ingest::{Ingestor, MessageOutcome, ProcessFailure, RunReport};
pub use secrets::{resolve_secret, SecretError};
pub use state::{State, StateStore};
pub use storage::AttachmentStorage;
