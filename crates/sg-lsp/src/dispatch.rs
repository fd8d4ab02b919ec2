//! Request/notification routing (§6): a match on method name narrowed to
//! exactly the methods this server supports, plus `$/cancelRequest`
//! special-casing.

use std::sync::Arc;

use lsp_types::{DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams, InitializeParams, Uri};
use serde_json::Value;

use sg_protocol::{methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, SERVER_NOT_INITIALIZED};

use crate::cancellation::RequestCleanupGuard;
use crate::error::ServerError;
use crate::query::{self, QueryContext};
use crate::server::LspServer;
use crate::util::uri::parse_uri;

/// What the server loop should do after one `dispatch::handle` call.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Write this response to the transport.
    Response(JsonRpcResponse),
    /// A notification: nothing to write back.
    NoResponse,
    /// `exit` was received: stop the run loop with this result.
    Exit(Result<(), ServerError>),
}

fn ok(id: Option<Value>, result: Value) -> DispatchOutcome {
    DispatchOutcome::Response(JsonRpcResponse::success(id, result))
}

fn err(id: Option<Value>, error: JsonRpcError) -> DispatchOutcome {
    DispatchOutcome::Response(JsonRpcResponse::error(id, error))
}

fn invalid_params(id: Option<Value>, what: &str) -> DispatchOutcome {
    err(id, JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {what}")))
}

fn text_document_uri(params: &Value) -> Option<Uri> {
    params.get("textDocument")?.get("uri")?.as_str().map(parse_uri)
}

fn position_of(params: &Value) -> Option<lsp_types::Position> {
    serde_json::from_value(params.get("position")?.clone()).ok()
}

fn range_of(params: &Value) -> Option<lsp_types::Range> {
    serde_json::from_value(params.get("range")?.clone()).ok()
}

/// Builds a `QueryContext` for a query method: requires the document to
/// be open and the Snapshot Manager to have an analysis covering it at
/// the client's current view of the text (§4.4 `for_uri`).
fn with_query_context<R>(server: &LspServer, uri: &Uri, f: impl FnOnce(&QueryContext<'_>) -> R) -> Option<R> {
    server.with_state(|state| {
        let path = state.documents.canonical_path(uri)?;
        let doc = state.documents.get(uri)?;
        let snapshot = state.snapshots.for_uri(uri, &state.documents)?;
        let ctx = QueryContext {
            snapshot: &snapshot,
            project_root: &snapshot.project_root,
            path: &path,
            source: doc.text(),
            cache: doc.line_starts(),
        };
        Some(f(&ctx))
    })
}

/// Builds a `QueryContext` from the last-good snapshot without validating
/// freshness (§4.4 `current()`), for queries that don't care whether a
/// newer edit is still pending analysis (e.g. folding, which only needs
/// tokens).
fn with_query_context_current<R>(server: &LspServer, uri: &Uri, f: impl FnOnce(&QueryContext<'_>) -> R) -> Option<R> {
    server.with_state(|state| {
        let path = state.documents.canonical_path(uri)?;
        let doc = state.documents.get(uri)?;
        let snapshot = state.snapshots.current()?;
        let ctx = QueryContext {
            snapshot: &snapshot,
            project_root: &snapshot.project_root,
            path: &path,
            source: doc.text(),
            cache: doc.line_starts(),
        };
        Some(f(&ctx))
    })
}

/// Routes one incoming request/notification. Edit notifications
/// (`didOpen`/`didChange`/`didSave`) schedule background analysis via
/// `server.trigger_analysis()`; `didClose` publishes an immediate empty
/// diagnostics set for the closed document (§4.7).
pub fn handle(server: &Arc<LspServer>, request: JsonRpcRequest) -> DispatchOutcome {
    let JsonRpcRequest { id, method, params, .. } = request;
    let params = params.unwrap_or(Value::Null);

    if method == methods::CANCEL_REQUEST {
        if let Some(cancel_id) = params.get("id") {
            server.cancellation().cancel(cancel_id);
        }
        return DispatchOutcome::NoResponse;
    }

    let is_lifecycle_or_initializing =
        method == methods::INITIALIZE || method == methods::INITIALIZED || method == methods::SHUTDOWN || method == methods::EXIT;
    if !is_lifecycle_or_initializing {
        let initialized = server.with_state(|state| state.lifecycle.is_initialized());
        if !initialized {
            return err(id, JsonRpcError::new(SERVER_NOT_INITIALIZED, "server has not been initialized"));
        }
    }

    let _cleanup = match &id {
        Some(request_id) if methods::is_cancellable(&method) => {
            server.cancellation().register(request_id);
            Some(RequestCleanupGuard::new(server.cancellation(), request_id.clone()))
        }
        _ => None,
    };

    match method.as_str() {
        methods::INITIALIZE => {
            let Ok(init_params) = serde_json::from_value::<InitializeParams>(params) else {
                return invalid_params(id, "initialize");
            };
            let result = server.with_state(|state| state.lifecycle.initialize(&init_params));
            match serde_json::to_value(result) {
                Ok(value) => ok(id, value),
                Err(_) => err(id, JsonRpcError::new(sg_protocol::INTERNAL_ERROR, "failed to serialize InitializeResult")),
            }
        }
        methods::INITIALIZED => DispatchOutcome::NoResponse,
        methods::SHUTDOWN => {
            server.with_state(|state| state.lifecycle.shutdown());
            ok(id, Value::Null)
        }
        methods::EXIT => {
            let result = server.with_state(|state| state.lifecycle.exit());
            DispatchOutcome::Exit(result)
        }
        methods::WORKSPACE_DID_CHANGE_CONFIGURATION => {
            if let Some(settings) = params.get("settings") {
                server.with_state(|state| state.config.update_from_value(settings));
            }
            DispatchOutcome::NoResponse
        }
        methods::TEXT_DOCUMENT_DID_OPEN => {
            let Ok(p) = serde_json::from_value::<DidOpenTextDocumentParams>(params) else {
                return DispatchOutcome::NoResponse;
            };
            server.with_state(|state| {
                state.documents.open(p.text_document.uri, p.text_document.version, &p.text_document.text);
            });
            server.trigger_analysis();
            DispatchOutcome::NoResponse
        }
        methods::TEXT_DOCUMENT_DID_CHANGE => {
            let Ok(p) = serde_json::from_value::<DidChangeTextDocumentParams>(params) else {
                return DispatchOutcome::NoResponse;
            };
            server.with_state(|state| {
                state.documents.change(&p.text_document.uri, p.text_document.version, &p.content_changes);
            });
            server.trigger_analysis();
            DispatchOutcome::NoResponse
        }
        methods::TEXT_DOCUMENT_DID_SAVE => {
            let Ok(p) = serde_json::from_value::<DidSaveTextDocumentParams>(params) else {
                return DispatchOutcome::NoResponse;
            };
            let version = server.with_state(|state| state.documents.get(&p.text_document.uri).map(|d| d.version)).unwrap_or(0);
            server.with_state(|state| state.documents.save(&p.text_document.uri, version, p.text.as_deref()));
            server.trigger_analysis();
            DispatchOutcome::NoResponse
        }
        methods::TEXT_DOCUMENT_DID_CLOSE => {
            let Ok(p) = serde_json::from_value::<DidCloseTextDocumentParams>(params) else {
                return DispatchOutcome::NoResponse;
            };
            let existed = server.with_state(|state| {
                let existed = state.documents.close(&p.text_document.uri);
                state.published.remove(&p.text_document.uri);
                existed
            });
            if existed {
                server.send_notification(
                    methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS,
                    serde_json::json!({ "uri": p.text_document.uri.as_str(), "diagnostics": Vec::<Value>::new() }),
                );
            }
            DispatchOutcome::NoResponse
        }
        methods::TEXT_DOCUMENT_HOVER => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "hover") };
            let Some(position) = position_of(&params) else { return invalid_params(id, "hover") };
            let hover = with_query_context(server, &uri, |ctx| query::hover::hover(ctx, position)).flatten();
            ok(id, serde_json::to_value(hover).unwrap_or(Value::Null))
        }
        methods::TEXT_DOCUMENT_DEFINITION => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "definition") };
            let Some(position) = position_of(&params) else { return invalid_params(id, "definition") };
            let locations = with_query_context(server, &uri, |ctx| query::definition::definition(ctx, position)).unwrap_or_default();
            ok(id, serde_json::to_value(locations).unwrap_or(Value::Null))
        }
        methods::TEXT_DOCUMENT_COMPLETION => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "completion") };
            let Some(position) = position_of(&params) else { return invalid_params(id, "completion") };
            let items = with_query_context(server, &uri, |ctx| query::completion::completion(ctx, position)).unwrap_or_default();
            ok(id, serde_json::to_value(items).unwrap_or(Value::Null))
        }
        methods::TEXT_DOCUMENT_SIGNATURE_HELP => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "signatureHelp") };
            let Some(position) = position_of(&params) else { return invalid_params(id, "signatureHelp") };
            let help = with_query_context(server, &uri, |ctx| query::signature_help::signature_help(ctx, position)).flatten();
            ok(id, serde_json::to_value(help).unwrap_or(Value::Null))
        }
        methods::TEXT_DOCUMENT_INLAY_HINT => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "inlayHint") };
            let Some(range) = range_of(&params) else { return invalid_params(id, "inlayHint") };
            let config = server.with_state(|state| state.config.clone());
            let hints = with_query_context(server, &uri, |ctx| query::inlay_hints::inlay_hints(ctx, &config, range)).unwrap_or_default();
            ok(id, serde_json::to_value(hints).unwrap_or(Value::Null))
        }
        methods::TEXT_DOCUMENT_FOLDING_RANGE => {
            let Some(uri) = text_document_uri(&params) else { return invalid_params(id, "foldingRange") };
            let ranges = with_query_context_current(server, &uri, |ctx| query::folding::folding_ranges(ctx)).unwrap_or_default();
            ok(id, serde_json::to_value(ranges).unwrap_or(Value::Null))
        }
        _ if id.is_some() => err(id, JsonRpcError::new(METHOD_NOT_FOUND, format!("method not found: {method}"))),
        _ => DispatchOutcome::NoResponse,
    }
}
