use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_MAX_PAGES: u32 = 1;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for one ingest run. Built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// User principal name of the mailbox to read.
    pub mailbox: String,
    /// Directory attachments are written into.
    pub output_directory: PathBuf,
    /// File holding the persisted delta cursor.
    pub state_file: PathBuf,
    /// Exact subject matched on the first (non-delta) query.
    pub subject_filter: String,
    pub endpoints: Endpoints,
    /// Upper bound on result pages followed per fetch.
    pub max_pages: u32,
    pub http_timeout: Duration,
}

/// Application credentials for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Graph API root, without trailing slash.
    pub graph_base: String,
    /// Identity provider host, without trailing slash.
    pub authority_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            graph_base: DEFAULT_GRAPH_API_BASE.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }
}

impl Endpoints {
    /// Token endpoint for the tenant's client-credentials exchange.
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, tenant_id)
    }
}
