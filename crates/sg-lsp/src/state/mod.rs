//! Server-side state: open documents, configuration, and the Document
//! Store that composes them (§4.1, §4.6).

pub mod config;
pub mod document;
pub mod store;

pub use config::ServerConfig;
pub use document::DocumentState;
pub use store::{DocumentSnapshot, DocumentStore};
