//! The server's internal error type (§7), kept distinct from
//! [`sg_protocol::JsonRpcError`] (the wire-level error shape): dispatch
//! handlers return `Result<Value, JsonRpcError>` for what goes on the
//! wire, while [`LspServer::run`](crate::server::LspServer::run) returns
//! `Result<(), ServerError>` describing why the process itself stopped.

use thiserror::Error;

/// Internal server failure modes (§7).
#[derive(Debug, Error)]
pub enum ServerError {
    /// A transport read or write failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed JSON-RPC envelope was received (distinct from a
    /// malformed *frame*, which the transport layer already logs and
    /// skips per §7's parse/decode handling).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// `exit` was received without a preceding `shutdown` (§4.8); the
    /// process should terminate non-zero.
    #[error("exit notification received before shutdown was requested")]
    ExitBeforeShutdown,

    /// The reference Analyzer reported a hard failure (§7: does not
    /// touch `last_good_snapshot`, logged and otherwise swallowed by the
    /// Scheduler — this variant exists for the rare caller, like a test
    /// harness, that wants to observe it directly).
    #[error("analyzer error: {0}")]
    Analyzer(#[from] sg_analysis::AnalyzeError),
}
