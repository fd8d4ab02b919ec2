//! End-to-end scenarios wiring the Document Store, Analysis Scheduler,
//! Snapshot Manager, and Publisher together the way `LspServer::run_analysis`
//! does, without going through the stdio transport. Each test is grounded in
//! one of the literal scenarios this core must satisfy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use lsp_types::{TextDocumentContentChangeEvent, Uri};

use sg_analysis::{analyze, AnalysisMode, AnalysisOptions, DiagnosticSeverity, InjectedDiagnostic};
use sg_lsp::cancellation::CancellationToken;
use sg_lsp::publisher::publications_for;
use sg_lsp::scheduler::{AnalysisPlan, AnalysisResult, AnalysisScheduler, AnalysisScope};
use sg_lsp::snapshot::SnapshotManager;
use sg_lsp::state::DocumentStore;

fn uri(s: &str) -> Uri {
    s.parse().unwrap()
}

/// Scenario 1: Publish mapping.
///
/// Open `"one\ntwo\n"` at v1, apply a `didChange` inserting `"// "` at
/// (0,0) to reach v2, then run an analysis that injects a single
/// diagnostic at 1-based lines/cols 2..2, 3..6. The published
/// notification must carry the 0-based LSP range `{1,2}..{1,5}`.
#[test]
fn scenario_1_publish_mapping_converts_one_based_diagnostic_to_lsp_range() {
    let mut store = DocumentStore::new();
    let doc_uri = uri("file:///proj/a.sg");
    store.open(doc_uri.clone(), 1, "one\ntwo\n");
    store.change(
        &doc_uri,
        2,
        &[TextDocumentContentChangeEvent {
            range: Some(lsp_types::Range {
                start: lsp_types::Position { line: 0, character: 0 },
                end: lsp_types::Position { line: 0, character: 0 },
            }),
            range_length: None,
            text: "// ".to_string(),
        }],
    );
    assert_eq!(store.get(&doc_uri).unwrap().text(), "// one\ntwo\n");

    let path = store.canonical_path(&doc_uri).unwrap();
    let doc = store.get(&doc_uri).unwrap();
    let (version, snapshot_id) = (doc.version, doc.snapshot_id);

    let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
    let options = options_with_injected_diagnostic(options, &path);
    let mut overlay = BTreeMap::new();
    overlay.insert(path.clone(), store.get(&doc_uri).unwrap().text().to_string());
    let outcome = analyze(&options, &[path.clone()], &overlay);

    let mut docs = BTreeMap::new();
    docs.insert(doc_uri.clone(), (version, snapshot_id));
    let result = AnalysisResult {
        seq: 1,
        scope: AnalysisScope { mode: AnalysisMode::OpenFiles, root: PathBuf::from("/proj") },
        plan: AnalysisPlan { files: vec![path], overlay: BTreeMap::new(), docs },
        outcome,
        scope_changed: true,
    };

    let publications = publications_for(&result, &store, &[]);
    assert_eq!(publications.len(), 1);
    let diagnostics = &publications[0].diagnostics;
    assert_eq!(diagnostics.len(), 1);
    let diag = &diagnostics[0];
    assert_eq!(diag.range.start, lsp_types::Position { line: 1, character: 2 });
    assert_eq!(diag.range.end, lsp_types::Position { line: 1, character: 5 });
    assert_eq!(diag.message, "boom");
}

fn options_with_injected_diagnostic(options: AnalysisOptions, path: &std::path::Path) -> AnalysisOptions {
    let mut options = options;
    options.inject_diagnostic = Some(InjectedDiagnostic {
        path: path.to_path_buf(),
        line: 2,
        column: 3,
        end_line: 2,
        end_column: 6,
        severity: DiagnosticSeverity::Error,
        message: "boom".to_string(),
    });
    options
}

/// Scenario 2: Snapshot retained on failure.
///
/// A first analysis publishes a good snapshot S with no diagnostics.
/// A second analysis fails (`inject_error`); the manager's published
/// state must remain exactly S afterward.
#[test]
fn scenario_2_snapshot_survives_a_failed_follow_up_analysis() {
    let mut manager = SnapshotManager::new();
    let mut store = DocumentStore::new();
    let doc_uri = uri("file:///proj/a.sg");
    store.open(doc_uri.clone(), 1, "let n = 1;");
    let path = store.canonical_path(&doc_uri).unwrap();

    let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
    let mut overlay = BTreeMap::new();
    overlay.insert(path.clone(), "let n = 1;".to_string());
    let outcome = analyze(&options, &[path.clone()], &overlay);
    let snapshot = Arc::new(outcome.snapshot.unwrap());

    let mut docs = BTreeMap::new();
    docs.insert(doc_uri.clone(), (1, 1));
    manager.apply(snapshot.clone(), docs);
    assert!(manager.current().is_some());
    let before = manager.for_uri(&doc_uri, &store).unwrap();

    let mut failing_options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
    failing_options.inject_error = Some("boom".to_string());
    let failed_outcome = analyze(&failing_options, &[path], &overlay);
    assert!(failed_outcome.error.is_some());
    assert!(failed_outcome.snapshot.is_none());
    // The core never applies a failed outcome to the Snapshot Manager,
    // so `manager` is left untouched here.

    let after = manager.for_uri(&doc_uri, &store).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

/// Scenario 3: Scope change clears diagnostics.
///
/// A URI previously published with non-empty diagnostics must receive
/// an empty publish the moment a later analysis no longer covers it
/// (e.g. it fell out of scope after a project root change). This
/// exercises `publications_for`'s `empty_for` parameter directly; the
/// server's own tracking of which URIs are currently published (so it
/// can compute `empty_for` itself instead of being handed it) is
/// covered by `sg_lsp::server`'s own unit tests.
#[test]
fn scenario_3_a_uri_dropped_from_the_plan_gets_an_empty_publish() {
    let mut store = DocumentStore::new();
    let old_uri = uri("file:///a/main.sg");
    store.open(old_uri.clone(), 1, "let n = 1;");

    let mut docs = BTreeMap::new();
    docs.insert(old_uri.clone(), (1, 1));
    let previous_result = AnalysisResult {
        seq: 1,
        scope: AnalysisScope { mode: AnalysisMode::ProjectRoot, root: PathBuf::from("/a") },
        plan: AnalysisPlan { files: Vec::new(), overlay: BTreeMap::new(), docs },
        outcome: sg_analysis::AnalyzeOutcome { snapshot: None, diagnostics: Vec::new(), error: None },
        scope_changed: true,
    };
    let before = publications_for(&previous_result, &store, &[]);
    assert_eq!(before.len(), 1);

    // The new scope no longer covers `old_uri` at all.
    let next_result = AnalysisResult {
        seq: 2,
        scope: AnalysisScope { mode: AnalysisMode::ProjectRoot, root: PathBuf::from("/b") },
        plan: AnalysisPlan { files: Vec::new(), overlay: BTreeMap::new(), docs: BTreeMap::new() },
        outcome: sg_analysis::AnalyzeOutcome { snapshot: None, diagnostics: Vec::new(), error: None },
        scope_changed: true,
    };
    let after = publications_for(&next_result, &store, &[old_uri.clone()]);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].uri, old_uri);
    assert!(after[0].diagnostics.is_empty());
}

/// Scenario 4: Out-of-order completion.
///
/// Analysis N=1 starts on v1; a `didChange` to v2 starts N=2 before N=1
/// runs. N=2 runs and is accepted; N=1's `run` rejects itself on arrival
/// since a newer sequence has already been scheduled (§4.3 step 1: a run
/// is stale the instant a newer one exists, independent of finish
/// order). After both have had their chance, the store still carries v2
/// and the Scheduler's applied sequence is N=2's.
#[test]
fn scenario_4_a_superseded_sequence_never_overtakes_the_newer_one() {
    let scheduler = AnalysisScheduler::new();
    let mut store = DocumentStore::new();
    let doc_uri = uri("file:///proj/a.sg");
    store.open(doc_uri.clone(), 1, "let n = 1;");

    let (seq1, _token1) = scheduler.schedule();
    let snapshot1 = scheduler.snapshot_for_run(seq1, &store).unwrap();

    // The edit that starts N=2 lands before N=1's run observes it.
    store.change(
        &doc_uri,
        2,
        &[TextDocumentContentChangeEvent { range: None, range_length: None, text: "let n = 2;".to_string() }],
    );
    let (seq2, token2) = scheduler.schedule();
    let snapshot2 = scheduler.snapshot_for_run(seq2, &store).unwrap();

    // N=2 finishes and is accepted first.
    let result2 = scheduler.run(seq2, &snapshot2).unwrap();
    assert!(scheduler.accept(&result2, &token2, &store));
    assert_eq!(scheduler.applied_seq(), seq2);

    // N=1 runs late, after N=2 was already scheduled; it never even
    // produces a result to hand to `accept`.
    assert!(scheduler.run(seq1, &snapshot1).is_none());

    assert_eq!(store.get(&doc_uri).unwrap().version, 2);
    assert_eq!(scheduler.applied_seq(), seq2);
}

/// Scenario 5: Edit during analysis.
///
/// Analysis starts for v1; while it runs, a `didChange` to v2 arrives
/// and reschedules. v1's eventual result is discarded (`accept` is
/// `false`) and produces no publications.
#[test]
fn scenario_5_an_edit_mid_analysis_discards_the_stale_result() {
    let scheduler = AnalysisScheduler::new();
    let mut store = DocumentStore::new();
    let doc_uri = uri("file:///proj/a.sg");
    store.open(doc_uri.clone(), 1, "let n = 1;");

    let (seq1, token1) = scheduler.schedule();
    let snapshot1 = scheduler.snapshot_for_run(seq1, &store).unwrap();

    // Edit arrives while v1's analysis is still "in flight" (we haven't
    // called `run` on it yet), scheduling N=2 and cancelling N=1's token.
    store.change(
        &doc_uri,
        2,
        &[TextDocumentContentChangeEvent { range: None, range_length: None, text: "let n = 2;".to_string() }],
    );
    let (_seq2, _token2) = scheduler.schedule();
    assert!(token1.is_cancelled());

    // v1's result, once it does finish, must not be published.
    let result1 = scheduler.run(seq1, &snapshot1);
    assert!(result1.is_none(), "a superseded seq must not even produce a result");

    let publications = result1
        .map(|result| publications_for(&result, &store, &[]))
        .unwrap_or_default();
    assert!(publications.is_empty());
}

/// A request timing out on a cancelled token never reaches the point of
/// building a response (§5 cancellation contract), independent of the
/// scenarios above.
#[test]
fn a_cancelled_token_observed_before_work_starts_short_circuits() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}
