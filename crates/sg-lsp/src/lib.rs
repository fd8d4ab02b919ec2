//! sg-lsp: incremental analysis and request-serving core
//!
//! This crate provides the runtime implementation for the `sg` Language
//! Server Protocol server. It handles protocol communication, message
//! framing, server state management, and LSP feature dispatching, while
//! the actual source analysis lives in `sg-analysis`.
//!
//! # Architecture
//!
//! - [`state`] - Document Store, Configuration, and per-document state
//! - [`scheduler`] - Analysis Scheduler (§4.3): debounce, scope, plan, run
//! - [`snapshot`] - Snapshot Manager (§4.4): published analysis state
//! - [`query`] - Query Routers (hover, definition, completion, ...)
//! - [`publisher`] - Publisher (§4.7): diagnostics notifications
//! - [`lifecycle`] - Lifecycle (§4.8): initialize/shutdown/exit
//! - [`cancellation`] - Per-request cancellation registry (§5)
//! - [`dispatch`] - Request routing and dispatch logic (§6)
//! - [`convert`] - Conversions between engine types and lsp_types
//! - [`util`] - URI handling and other small utilities
//! - [`server`] - Public server interface
//!
//! # Usage
//!
//! The primary entry point is [`run_stdio()`], which starts the LSP server
//! in stdio mode:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! sg_lsp::run_stdio()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(missing_docs)] // Temporarily allow until module-level docs catch up

pub mod cancellation;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod publisher;
pub mod query;
pub mod scheduler;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod util;

pub use error::ServerError;
pub use server::LspServer;
pub use sg_protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

use std::sync::Arc;

/// Run the LSP server in stdio mode.
///
/// This is the main entry point for the LSP server. It reads JSON-RPC
/// messages from stdin and writes responses to stdout, following the
/// Language Server Protocol specification (§6).
///
/// # Errors
///
/// Returns an error if the transport fails, a malformed envelope is
/// fatal to the run loop, or `exit` arrives before `shutdown` (§7).
pub fn run_stdio() -> Result<(), ServerError> {
    let server = Arc::new(LspServer::new());
    server.run()
}
