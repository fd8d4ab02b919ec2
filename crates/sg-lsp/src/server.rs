//! The public server interface (§4, §5): composes the Document Store,
//! Analysis Scheduler, Snapshot Manager, Configuration, Lifecycle, and
//! Cancellation Registry under one state lock, and drives the stdio
//! request/response loop.

use std::io::{self, BufReader, Write};
use std::sync::Arc;

use lsp_types::Uri;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde_json::Value;

use sg_protocol::{JsonRpcRequest, JsonRpcResponse};
use sg_transport::{read_message, write_message, write_notification};

use crate::cancellation::CancellationRegistry;
use crate::dispatch::{self, DispatchOutcome};
use crate::error::ServerError;
use crate::lifecycle::Lifecycle;
use crate::publisher::DiagnosticsPublication;
use crate::scheduler::AnalysisScheduler;
use crate::snapshot::SnapshotManager;
use crate::state::{DocumentSnapshot, DocumentStore, ServerConfig};

/// All state guarded by the server's single lock (§5: one lock for
/// Document Store + Snapshot Manager + Configuration + Lifecycle; the
/// Scheduler's own clocks and the Cancellation Registry have their own
/// interior synchronization and are not part of this critical section).
pub struct ServerState {
    pub documents: DocumentStore,
    pub config: ServerConfig,
    pub lifecycle: Lifecycle,
    pub snapshots: SnapshotManager,
    /// URIs currently showing a non-empty `publishDiagnostics` to the
    /// client (§2.7/§4.7's published-set), tracked so a URI that drops
    /// out of a later analysis's plan still gets cleared.
    pub published: FxHashSet<Uri>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            documents: DocumentStore::new(),
            config: ServerConfig::default(),
            lifecycle: Lifecycle::new(),
            snapshots: SnapshotManager::new(),
            published: FxHashSet::default(),
        }
    }
}

/// Clears the Snapshot Manager and drains the published-set, returning an
/// empty publication for every URI that was showing diagnostics (§4.3
/// steps 2/4, §4.8).
fn clear_published(state: &mut ServerState) -> Vec<DiagnosticsPublication> {
    state.snapshots.clear();
    state.published.drain().map(crate::publisher::empty_publication).collect()
}

/// What `run_analysis` found under the state lock before releasing it to
/// run the Analyzer without holding it (§4.3 step 2).
enum RunStep {
    /// Either this sequence is already stale, or nothing needs doing.
    NoOp,
    /// No open documents: published state was cleared, nothing to run.
    Cleared(Vec<DiagnosticsPublication>),
    /// A consistent read of the Document Store to analyze.
    Snapshot(DocumentSnapshot),
}

/// The `sg-lsp` server. Cheap to share: background analysis threads hold
/// an `Arc<LspServer>` so they can publish diagnostics without blocking
/// the request loop.
pub struct LspServer {
    state: Mutex<ServerState>,
    scheduler: Arc<AnalysisScheduler>,
    cancellation: CancellationRegistry,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl LspServer {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            state: Mutex::new(ServerState::default()),
            scheduler: Arc::new(AnalysisScheduler::new()),
            cancellation: CancellationRegistry::new(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn scheduler(&self) -> &Arc<AnalysisScheduler> {
        &self.scheduler
    }

    pub fn cancellation(&self) -> &CancellationRegistry {
        &self.cancellation
    }

    /// Send a `textDocument/publishDiagnostics`-shaped notification (or
    /// any other server → client notification) over the transport.
    pub fn send_notification(&self, method: &str, params: Value) {
        let mut writer = self.writer.lock();
        if let Err(err) = write_notification(&mut *writer, method, params) {
            crate::log_line!("sg-lsp: failed to write notification: {err}");
        }
    }

    fn send_response(&self, response: JsonRpcResponse) {
        let mut writer = self.writer.lock();
        if let Err(err) = write_message(&mut *writer, &response) {
            crate::log_line!("sg-lsp: failed to write response: {err}");
        }
    }

    /// §4.3: after an edit notification, (re)schedule analysis. Cheap —
    /// only bumps atomics and arms a debounce thread, never blocks.
    pub fn trigger_analysis(self: &Arc<Self>) {
        let (seq, token) = self.scheduler.schedule();
        let server = Arc::clone(self);
        let debounce = self.scheduler.debounce_interval();
        std::thread::spawn(move || {
            std::thread::sleep(debounce);
            server.run_analysis(seq, token);
        });
    }

    fn run_analysis(self: &Arc<Self>, seq: u64, token: crate::cancellation::CancellationToken) {
        if token.is_cancelled() {
            return;
        }

        let step = self.with_state(|state| {
            crate::trace_line!(state.config.lsp_trace, "sg-lsp: running analysis seq={seq}");
            match self.scheduler.snapshot_for_run(seq, &state.documents) {
                Some(snapshot) => RunStep::Snapshot(snapshot),
                // §4.3 step 2: no open documents left — clear published
                // diagnostics and snapshot state rather than leaving the
                // last analysis's results in place.
                None if state.documents.is_empty() && self.scheduler.is_latest(seq) => {
                    RunStep::Cleared(clear_published(state))
                }
                None => RunStep::NoOp,
            }
        });
        let snapshot = match step {
            RunStep::NoOp => return,
            RunStep::Cleared(publications) => {
                self.send_publications(publications);
                return;
            }
            RunStep::Snapshot(snapshot) => snapshot,
        };

        let result = self.scheduler.run(seq, &snapshot);
        let Some(result) = result else { return };

        let publications = self.with_state(|state| {
            if !self.scheduler.accept(&result, &token, &state.documents) {
                crate::trace_line!(state.config.lsp_trace, "sg-lsp: discarding stale analysis seq={seq}");
                return Vec::new();
            }

            // §4.3 step 4: a scope change clears the old published-set
            // and stored snapshot before this result's own plan is
            // published below.
            let mut publications = if result.scope_changed { clear_published(state) } else { Vec::new() };

            if let Some(snapshot) = result.outcome.snapshot.clone() {
                if result.outcome.error.is_none() {
                    state.snapshots.apply(Arc::new(snapshot), result.plan.docs.clone());
                }
            }

            let plan_uris: FxHashSet<Uri> = result.plan.docs.keys().cloned().collect();
            let empty_for: Vec<Uri> = state.published.iter().filter(|uri| !plan_uris.contains(*uri)).cloned().collect();
            let fresh = crate::publisher::publications_for(&result, &state.documents, &empty_for);
            for publication in &fresh {
                if publication.diagnostics.is_empty() {
                    state.published.remove(&publication.uri);
                } else {
                    state.published.insert(publication.uri.clone());
                }
            }
            publications.extend(fresh);
            publications
        });

        self.send_publications(publications);
    }

    fn send_publications(&self, publications: Vec<DiagnosticsPublication>) {
        for publication in publications {
            let diagnostics: Vec<Value> = publication.diagnostics.iter().map(|d| serde_json::to_value(d).unwrap_or(Value::Null)).collect();
            let params = serde_json::json!({
                "uri": publication.uri.as_str(),
                "diagnostics": diagnostics,
            });
            self.send_notification(sg_protocol::methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS, params);
        }
    }

    /// Runs the stdio request/response loop until `exit` or EOF (§5, §7).
    pub fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());

        loop {
            let request = match read_message(&mut reader)? {
                Some(request) => request,
                None => return Ok(()),
            };

            match dispatch::handle(self, request) {
                DispatchOutcome::Response(response) => self.send_response(response),
                DispatchOutcome::NoResponse => {}
                DispatchOutcome::Exit(result) => return result,
            }
        }
    }
}

impl Default for LspServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(id: Option<Value>, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest { _jsonrpc: "2.0".to_string(), id, method: method.to_string(), params }
    }

    #[test]
    fn initialize_then_shutdown_then_exit_succeeds() {
        let server = Arc::new(LspServer::with_writer(Vec::new()));
        let init = dispatch::handle(&server, request(Some(json!(1)), "initialize", Some(json!({}))));
        assert!(matches!(init, DispatchOutcome::Response(_)));

        let shutdown = dispatch::handle(&server, request(Some(json!(2)), "shutdown", None));
        assert!(matches!(shutdown, DispatchOutcome::Response(_)));

        let exit = dispatch::handle(&server, request(None, "exit", None));
        assert!(matches!(exit, DispatchOutcome::Exit(Ok(()))));
    }

    #[test]
    fn exit_before_shutdown_reports_an_error() {
        let server = Arc::new(LspServer::with_writer(Vec::new()));
        let exit = dispatch::handle(&server, request(None, "exit", None));
        assert!(matches!(exit, DispatchOutcome::Exit(Err(_))));
    }

    #[test]
    fn run_analysis_with_no_open_documents_clears_the_published_set() {
        let server = Arc::new(LspServer::with_writer(Vec::new()));
        let stale_uri: Uri = "file:///proj/a.sg".parse().unwrap();
        server.with_state(|state| {
            state.published.insert(stale_uri);
        });

        let (seq, token) = server.scheduler().schedule();
        server.run_analysis(seq, token);

        server.with_state(|state| {
            assert!(state.published.is_empty());
            assert!(state.snapshots.current().is_none());
        });
    }

    #[test]
    fn a_uri_dropped_from_the_plan_is_removed_from_the_published_set() {
        let server = Arc::new(LspServer::with_writer(Vec::new()));
        let open_uri: Uri = "file:///proj/a.sg".parse().unwrap();
        let stray_uri: Uri = "file:///proj/stray.sg".parse().unwrap();

        server.with_state(|state| {
            state.documents.open(open_uri.clone(), 1, "let x = 1;");
        });

        // First run establishes a baseline scope (scope_changed is always
        // true the very first time, which would otherwise mask the
        // per-URI diff this test means to exercise).
        let (seq1, token1) = server.scheduler().schedule();
        server.run_analysis(seq1, token1);

        // A URI outside this scope's plan shows up in `published` as if
        // an earlier, differently-scoped analysis had reported it.
        server.with_state(|state| {
            state.published.insert(stray_uri.clone());
        });

        let (seq2, token2) = server.scheduler().schedule();
        server.run_analysis(seq2, token2);

        server.with_state(|state| {
            assert!(!state.published.contains(&stray_uri));
        });
    }

    #[test]
    fn unknown_method_returns_a_method_not_found_error() {
        let server = Arc::new(LspServer::with_writer(Vec::new()));
        let response = dispatch::handle(&server, request(Some(json!(3)), "textDocument/unknownThing", None));
        match response {
            DispatchOutcome::Response(resp) => {
                assert!(resp.error.is_some());
                assert_eq!(resp.error.unwrap().code, sg_protocol::METHOD_NOT_FOUND);
            }
            other => panic!("expected a response, got {other:?}"),
        }
    }
}
