#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use serde_json::json;

use mailgrab::graph::fake::FakeTransport;
use mailgrab::graph::MailboxUrls;
use mailgrab::{Config, Ingestor, Result, RunReport};


pub const GRAPH_BASE: &str = "https://graph.test/v1.0";
pub const TOKEN_URL: &str = "https://login.test/tenant-1/oauth2/v2.0/token";
pub const MAILBOX: &str = "reports@example.com";
pub const SUBJECT: &str = "Daily Report";

/// Isolated environment for one ingest run.
pub struct IngestHarness {
    pub temp: TempDir,
    pub output_dir: PathBuf,
    pub state_file: PathBuf,
    pub transport: Arc<FakeTransport>,
}

impl IngestHarness {
    /// Harness with a working token endpoint and an existing output directory.
    pub fn new() -> Self {
        let harness = Self::without_token();
        harness.transport.respond_json(
            TOKEN_URL,
            json!({"token_type": "Bearer", "expires_in": 3599, "access_token": "token-1"}),
        );
        harness
    }

    /// Harness whose token endpoint is left for the test to script.
    pub fn without_token() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let output = temp.child("out");
        output.create_dir_all().unwrap();

        Self {
            output_dir: output.path().to_path_buf(),
            state_file: temp.child("state.json").path().to_path_buf(),
            temp,
            transport: Arc::new(FakeTransport::new()),
        }
    }

    pub fn config(&self) -> Config {
        let settings: HashMap<&str, String> = HashMap::from([
            ("AZ_TENANT_ID", "tenant-1".to_string()),
            ("AZ_CLIENT_ID", "client-1".to_string()),
            ("AZ_CLIENT_SECRET", "s3cret".to_string()),
            ("CSV_INGEST_EMAIL", MAILBOX.to_string()),
            ("DATA_DIR", self.output_dir.display().to_string()),
            ("STATE_FILE", self.state_file.display().to_string()),
            ("R_SUBJECT", SUBJECT.to_string()),
            ("GRAPH_API_BASE", format!("{}/", GRAPH_BASE)),
            ("AZ_AUTHORITY_HOST", "https://login.test".to_string()),
        ]);
        Config::from_lookup(|key| settings.get(key).cloned()).expect("valid test config")
    }

    pub async fn run(&self) -> Result<RunReport> {
        Ingestor::new(self.config(), self.transport.clone()).run().await
    }

    pub fn write_state(&self, content: &str) {
        self.temp.child("state.json").write_str(content).unwrap();
    }

    pub fn read_state(&self) -> Option<String> {
        std::fs::read_to_string(&self.state_file).ok()
    }

    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn inbox_url(&self) -> String {
        urls().unread_with_subject(SUBJECT).unwrap()
    }

    pub fn attachments_url(&self, message_id: &str) -> String {
        urls().attachments(message_id).unwrap()
    }

    pub fn message_url(&self, message_id: &str) -> String {
        urls().message(message_id).unwrap()
    }
}

fn urls() -> MailboxUrls {
    MailboxUrls::new(GRAPH_BASE, MAILBOX)
}
