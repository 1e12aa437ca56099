//! Microsoft Graph client pieces: authentication, transport, payloads.

pub mod auth;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod transport;
pub mod types;
pub mod urls;

pub use auth::{AccessToken, ClientCredentialsAuth, GRAPH_SCOPE};
pub use error::{AuthError, GraphError};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use types::{decode_response, Attachment, AttachmentKind, MessageRef};
pub use urls::MailboxUrls;
