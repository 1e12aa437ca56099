//! Graph API payloads and response decoding.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::sanitize::truncate_body;

use super::error::{GraphError, Result};
use super::transport::HttpResponse;

/// Suffix of the `@odata.type` discriminator for file attachments.
const FILE_ATTACHMENT_SUFFIX: &str = "fileAttachment";

/// Minimal handle to a mailbox message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
}

/// Entry of a message listing. Delta responses may include removal markers.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntry {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "@removed", default)]
    pub removed: Option<serde_json::Value>,
}

/// One page of a message listing or delta query.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub value: Vec<MessageEntry>,

    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,

    #[serde(rename = "@odata.deltaLink", default)]
    pub delta_link: Option<String>,
}

/// Response of a message's `attachments` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentPage {
    #[serde(default)]
    pub value: Vec<Attachment>,
}

/// Attachment as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Base64 payload; present on file attachments only.
    #[serde(rename = "contentBytes", default)]
    pub content_bytes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Literal file bytes.
    File,
    /// Item or reference attachment, carrying its discriminator.
    Other(String),
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        if self.odata_type.ends_with(FILE_ATTACHMENT_SUFFIX) {
            AttachmentKind::File
        } else {
            AttachmentKind::Other(self.odata_type.clone())
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    /// Decodes `contentBytes` into raw file bytes.
    pub fn decode_content(&self) -> Result<Vec<u8>> {
        let encoded = self.content_bytes.as_deref().ok_or_else(|| {
            GraphError::Decode(format!(
                "attachment '{}' has no contentBytes",
                self.display_name()
            ))
        })?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| {
                GraphError::Decode(format!(
                    "attachment '{}' is not valid base64: {}",
                    self.display_name(),
                    e
                ))
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a Graph response into `T`.
///
/// Non-JSON bodies, bodies carrying an `error` object, and non-success
/// statuses are all errors.
pub fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let value: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => {
            return Err(if response.is_success() {
                GraphError::Decode(format!(
                    "{} (body: {})",
                    e,
                    truncate_body(&response.body)
                ))
            } else {
                GraphError::Status {
                    status: response.status,
                    body: truncate_body(&response.body),
                }
            });
        }
    };

    if value.get("error").is_some() {
        let envelope: Option<ApiErrorEnvelope> = serde_json::from_value(value.clone()).ok();
        let (code, message) = envelope
            .map(|env| (env.error.code, env.error.message))
            .unwrap_or((None, None));
        return Err(GraphError::Api {
            status: response.status,
            code: code.unwrap_or_else(|| "unknown".to_string()),
            message: message
                .map(|m| truncate_body(&m))
                .unwrap_or_else(|| truncate_body(&value.to_string())),
        });
    }

    if !response.is_success() {
        return Err(GraphError::Status {
            status: response.status,
            body: truncate_body(&response.body),
        });
    }

    serde_json::from_value(value).map_err(|e| GraphError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_page() {
        let response = HttpResponse::new(
            200,
            r#"{
                "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('a')/messages(id)",
                "value": [{"id": "AAMkAD1"}, {"id": "AAMkAD2"}],
                "@odata.deltaLink": "https://graph.microsoft.com/v1.0/delta?$deltatoken=abc"
            }"#,
        );

        let page: MessagePage = decode_response(&response).unwrap();
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.value[0].id.as_deref(), Some("AAMkAD1"));
        assert!(page.next_link.is_none());
        assert_eq!(
            page.delta_link.as_deref(),
            Some("https://graph.microsoft.com/v1.0/delta?$deltatoken=abc")
        );
    }

    #[test]
    fn test_decode_page_without_value() {
        let page: MessagePage = decode_response(&HttpResponse::new(200, "{}")).unwrap();
        assert!(page.value.is_empty());
        assert!(page.delta_link.is_none());
    }

    #[test]
    fn test_decode_removed_entry() {
        let response = HttpResponse::new(
            200,
            r#"{"value":[{"id":"AAMkAD9","@removed":{"reason":"deleted"}}]}"#,
        );
        let page: MessagePage = decode_response(&response).unwrap();
        assert!(page.value[0].removed.is_some());
    }

    #[test]
    fn test_decode_html_error_page() {
        let response = HttpResponse::new(502, "<html><body>Bad Gateway</body></html>");
        let result: Result<MessagePage> = decode_response(&response);
        assert!(matches!(result, Err(GraphError::Status { status: 502, .. })));
    }

    #[test]
    fn test_decode_html_with_success_status() {
        let response = HttpResponse::new(200, "<html>maintenance</html>");
        let result: Result<MessagePage> = decode_response(&response);
        assert!(matches!(result, Err(GraphError::Decode(_))));
    }

    #[test]
    fn test_decode_api_error_object() {
        let response = HttpResponse::new(
            400,
            r#"{"error":{"code":"BadRequest","message":"Invalid filter clause"}}"#,
        );
        match decode_response::<MessagePage>(&response) {
            Err(GraphError::Api { status, code, message }) => {
                assert_eq!(status, 400);
                assert_eq!(code, "BadRequest");
                assert_eq!(message, "Invalid filter clause");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_api_error_with_success_status() {
        let response = HttpResponse::new(200, r#"{"error":"something odd"}"#);
        match decode_response::<MessagePage>(&response) {
            Err(GraphError::Api { code, .. }) => assert_eq!(code, "unknown"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_attachment_kind() {
        let file: Attachment = serde_json::from_str(
            r##"{"@odata.type":"#microsoft.graph.fileAttachment","name":"a.csv","contentBytes":"YQ=="}"##,
        )
        .unwrap();
        assert_eq!(file.kind(), AttachmentKind::File);

        let item: Attachment = serde_json::from_str(
            r##"{"@odata.type":"#microsoft.graph.itemAttachment","name":"Fwd: report"}"##,
        )
        .unwrap();
        assert_eq!(
            item.kind(),
            AttachmentKind::Other("#microsoft.graph.itemAttachment".to_string())
        );

        let untyped: Attachment = serde_json::from_str(r#"{"name":"mystery"}"#).unwrap();
        assert_eq!(untyped.kind(), AttachmentKind::Other(String::new()));
    }

    #[test]
    fn test_decode_content() {
        let attachment = Attachment {
            odata_type: "#microsoft.graph.fileAttachment".to_string(),
            name: Some("report.csv".to_string()),
            content_bytes: Some("ZGF0ZSxhbW91bnQKMjAyNC0wMS0xNSw0Mgo=".to_string()),
        };
        assert_eq!(
            attachment.decode_content().unwrap(),
            b"date,amount\n2024-01-15,42\n"
        );
    }

    #[test]
    fn test_decode_content_invalid() {
        let attachment = Attachment {
            odata_type: "#microsoft.graph.fileAttachment".to_string(),
            name: Some("report.csv".to_string()),
            content_bytes: Some("not base64!!".to_string()),
        };
        assert!(matches!(attachment.decode_content(), Err(GraphError::Decode(_))));

        let missing = Attachment {
            content_bytes: None,
            ..attachment
        };
        assert!(matches!(missing.decode_content(), Err(GraphError::Decode(_))));
    }
}
