use std::path::PathBuf;
use std::time::Duration;

use crate::config::schema::{
    Config, Credentials, Endpoints, DEFAULT_AUTHORITY_HOST, DEFAULT_GRAPH_API_BASE,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_PAGES,
};
use crate::error::ConfigError;
use crate::secrets::{file_key, resolve_secret};

pub const TENANT_ID: &str = "AZ_TENANT_ID";
pub const CLIENT_ID: &str = "AZ_CLIENT_ID";
pub const CLIENT_SECRET: &str = "AZ_CLIENT_SECRET";
pub const MAILBOX: &str = "CSV_INGEST_EMAIL";
pub const DATA_DIR: &str = "DATA_DIR";
pub const STATE_FILE: &str = "STATE_FILE";
pub const SUBJECT: &str = "R_SUBJECT";
pub const GRAPH_API_BASE: &str = "GRAPH_API_BASE";
pub const AUTHORITY_HOST: &str = "AZ_AUTHORITY_HOST";
pub const MAX_PAGES: &str = "MAILGRAB_MAX_PAGES";
pub const HTTP_TIMEOUT_SECS: &str = "MAILGRAB_HTTP_TIMEOUT_SECS";

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::Missing(key.to_string()))
        };

        let client_secret = resolve_secret(
            lookup(CLIENT_SECRET).as_deref(),
            lookup(&file_key(CLIENT_SECRET)).as_deref(),
        )
        .map_err(|e| match e {
            crate::secrets::SecretError::NoSourceProvided => {
                ConfigError::Missing(CLIENT_SECRET.to_string())
            }
            other => ConfigError::Secret {
                key: CLIENT_SECRET.to_string(),
                source: other,
            },
        })?;

        let credentials = Credentials {
            tenant_id: required(TENANT_ID)?,
            client_id: required(CLIENT_ID)?,
            client_secret,
        };

        let endpoints = Endpoints {
            graph_base: base_url(&lookup, GRAPH_API_BASE, DEFAULT_GRAPH_API_BASE),
            authority_host: base_url(&lookup, AUTHORITY_HOST, DEFAULT_AUTHORITY_HOST),
        };

        let max_pages = parse_number(&lookup, MAX_PAGES, DEFAULT_MAX_PAGES)?;
        if max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: MAX_PAGES.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let timeout_secs = parse_number(&lookup, HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: HTTP_TIMEOUT_SECS.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        // Used verbatim in the subject filter.
        let subject_filter = lookup(SUBJECT)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing(SUBJECT.to_string()))?;

        Ok(Config {
            credentials,
            mailbox: required(MAILBOX)?,
            output_directory: PathBuf::from(required(DATA_DIR)?),
            state_file: PathBuf::from(required(STATE_FILE)?),
            subject_filter,
            endpoints,
            max_pages,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn base_url<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::collections::HashMap;

    fn base_settings() -> HashMap<String, String> {
        [
            (TENANT_ID, "tenant-123"),
            (CLIENT_ID, "client-abc"),
            (CLIENT_SECRET, "s3cret"),
            (MAILBOX, "reports@example.com"),
            (DATA_DIR, "/var/lib/mailgrab/data"),
            (STATE_FILE, "/var/lib/mailgrab/state.json"),
            (SUBJECT, "Daily Report"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn load(settings: &HashMap<String, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| settings.get(key).cloned())
    }

    #[test]
    fn test_load_all_required() {
        let config = load(&base_settings()).unwrap();

        assert_eq!(config.credentials.tenant_id, "tenant-123");
        assert_eq!(config.credentials.client_id, "client-abc");
        assert_eq!(config.credentials.client_secret.expose_secret(), "s3cret");
        assert_eq!(config.mailbox, "reports@example.com");
        assert_eq!(config.output_directory, PathBuf::from("/var/lib/mailgrab/data"));
        assert_eq!(config.state_file, PathBuf::from("/var/lib/mailgrab/state.json"));
        assert_eq!(config.subject_filter, "Daily Report");
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.max_pages, 1);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_required_setting() {
        for key in [TENANT_ID, CLIENT_ID, MAILBOX, DATA_DIR, STATE_FILE, SUBJECT] {
            let mut settings = base_settings();
            settings.remove(key);
            match load(&settings) {
                Err(ConfigError::Missing(name)) => assert_eq!(name, key),
                other => panic!("expected Missing({}), got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_blank_setting_counts_as_missing() {
        let mut settings = base_settings();
        settings.insert(SUBJECT.to_string(), "   ".to_string());

        assert!(matches!(load(&settings), Err(ConfigError::Missing(k)) if k == SUBJECT));
    }

    #[test]
    fn test_missing_client_secret() {
        let mut settings = base_settings();
        settings.remove(CLIENT_SECRET);

        assert!(matches!(load(&settings), Err(ConfigError::Missing(k)) if k == CLIENT_SECRET));
    }

    #[test]
    fn test_client_secret_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let secret_path = dir.path().join("graph_secret");
        std::fs::write(&secret_path, "from-file\n").unwrap();

        let mut settings = base_settings();
        settings.remove(CLIENT_SECRET);
        settings.insert(
            file_key(CLIENT_SECRET),
            secret_path.to_string_lossy().into_owned(),
        );

        let config = load(&settings).unwrap();
        assert_eq!(config.credentials.client_secret.expose_secret(), "from-file");
    }

    #[test]
    fn test_unreadable_secret_file() {
        let mut settings = base_settings();
        settings.remove(CLIENT_SECRET);
        settings.insert(file_key(CLIENT_SECRET), "/nonexistent/secret".to_string());

        assert!(matches!(load(&settings), Err(ConfigError::Secret { .. })));
    }

    #[test]
    fn test_endpoint_overrides_strip_trailing_slash() {
        let mut settings = base_settings();
        settings.insert(GRAPH_API_BASE.to_string(), "http://127.0.0.1:9000/v1.0/".to_string());
        settings.insert(AUTHORITY_HOST.to_string(), "http://127.0.0.1:9001/".to_string());

        let config = load(&settings).unwrap();
        assert_eq!(config.endpoints.graph_base, "http://127.0.0.1:9000/v1.0");
        assert_eq!(config.endpoints.authority_host, "http://127.0.0.1:9001");
        assert_eq!(
            config.endpoints.token_url("tenant-123"),
            "http://127.0.0.1:9001/tenant-123/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_numeric_settings() {
        let mut settings = base_settings();
        settings.insert(MAX_PAGES.to_string(), "5".to_string());
        settings.insert(HTTP_TIMEOUT_SECS.to_string(), "90".to_string());

        let config = load(&settings).unwrap();
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.http_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_numeric_settings() {
        let mut settings = base_settings();
        settings.insert(MAX_PAGES.to_string(), "many".to_string());
        assert!(matches!(load(&settings), Err(ConfigError::Invalid { key, .. }) if key == MAX_PAGES));

        let mut settings = base_settings();
        settings.insert(MAX_PAGES.to_string(), "0".to_string());
        assert!(matches!(load(&settings), Err(ConfigError::Invalid { key, .. }) if key == MAX_PAGES));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut settings = base_settings();
        settings.insert(HTTP_TIMEOUT_SECS.to_string(), "0".to_string());
        assert!(matches!(
            load(&settings),
            Err(ConfigError::Invalid { key, .. }) if key == HTTP_TIMEOUT_SECS
        ));
    }

    #[test]
    fn test_subject_kept_verbatim() {
        let mut settings = base_settings();
        settings.insert(SUBJECT.to_string(), " Daily Report ".to_string());

        let config = load(&settings).unwrap();
        assert_eq!(config.subject_filter, " Daily Report ");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let settings = base_settings();
        for (key, value) in &settings {
            std::env::set_var(key, value);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.mailbox, "reports@example.com");
        assert_eq!(config.subject_filter, "Daily Report");

        for key in settings.keys() {
            std::env::remove_var(key);
        }
    }
}
