//! Scripted in-memory [`Transport`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::auth::AccessToken;
use super::error::{GraphError, Result};
use super::transport::{HttpResponse, Transport};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: Option<String>,
    pub form: Option<Vec<(String, String)>>,
    pub body: Option<serde_json::Value>,
}

type Scripted = std::result::Result<HttpResponse, String>;

/// Replies by URL with scripted responses. The last scripted reply for a
/// URL repeats; unscripted URLs get a Graph-style 404.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.push(url, Ok(response));
    }

    pub fn respond_json(&self, url: &str, body: serde_json::Value) {
        self.respond(url, HttpResponse::new(200, body.to_string()));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.push(url, Err(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    fn push(&self, url: &str, reply: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    fn reply(&self, request: RecordedRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let mut scripts = self.scripts.lock().unwrap();
        let reply = match scripts.get_mut(&url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(GraphError::Request(reason)),
            None => Ok(HttpResponse::new(
                404,
                r#"{"error":{"code":"ErrorItemNotFound","message":"The specified object was not found in the store."}}"#,
            )),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse> {
        self.reply(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            bearer: Some(token.expose().to_string()),
            form: None,
            body: None,
        })
    }

    async fn patch_json(
        &self,
        url: &str,
        token: &AccessToken,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        self.reply(RecordedRequest {
            method: "PATCH",
            url: url.to_string(),
            bearer: Some(token.expose().to_string()),
            form: None,
            body: Some(body.clone()),
        })
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        self.reply(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            bearer: None,
            form: Some(
                form.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            body: None,
        })
    }
}
