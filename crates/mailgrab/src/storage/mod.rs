pub mod filesystem;

pub use filesystem::{AttachmentStorage, TIMESTAMP_FORMAT};
