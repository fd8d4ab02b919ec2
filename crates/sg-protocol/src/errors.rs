//! Standard JSON-RPC / LSP error codes.
//!
//! These are the wire-level codes used in [`crate::JsonRpcError::code`].
//! They are distinct from any internal server error type: a handler
//! returning `Err(JsonRpcError)` is choosing what to put on the wire, not
//! describing why the server itself failed.

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;
/// LSP-specific: the server has not been initialized yet.
pub const SERVER_NOT_INITIALIZED: i32 = -32002;
/// LSP-specific: the request was canceled by the client.
pub const REQUEST_CANCELLED: i32 = -32800;
/// LSP-specific: the request failed but was syntactically correct.
pub const REQUEST_FAILED: i32 = -32803;
