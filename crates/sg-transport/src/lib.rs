//! LSP transport layer for sg-lsp.
//!
//! Implements the Content-Length based message framing used by the LSP
//! Base Protocol over a byte-framed duplex channel (stdio in practice).
//!
//! - [`read_message`] - read and parse an incoming framed message
//! - [`write_message`] - write a response with proper framing
//! - [`write_notification`] - write a notification with proper framing
//! - [`log_response`] - debug logging for outgoing responses
//!
//! ```no_run
//! use std::io::{BufReader, stdin, stdout};
//! use sg_transport::{read_message, write_message};
//! use sg_protocol::JsonRpcResponse;
//!
//! let mut reader = BufReader::new(stdin());
//! let mut writer = stdout();
//!
//! if let Ok(Some(request)) = read_message(&mut reader) {
//!     let response = JsonRpcResponse::null(request.id);
//!     write_message(&mut writer, &response).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod framing;

pub use framing::{log_response, read_message, write_message, write_notification};
