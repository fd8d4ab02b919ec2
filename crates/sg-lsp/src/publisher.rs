//! The Publisher (§4.7): turns an accepted analysis result's diagnostics
//! into `textDocument/publishDiagnostics` notifications, grouped by URI,
//! re-checking the acceptance gate before every send so a result that
//! stops matching mid-publish doesn't keep going.

use std::collections::BTreeMap;

use lsp_types::Uri;
use sg_analysis::AnalysisDiagnostic;

use crate::convert::diagnostic::to_lsp_diagnostic;
use crate::scheduler::AnalysisResult;
use crate::state::DocumentStore;
use crate::util::uri::path_to_uri;

/// One URI's diagnostics, ready to serialize as a
/// `textDocument/publishDiagnostics` notification payload.
pub struct DiagnosticsPublication {
    pub uri: Uri,
    pub diagnostics: Vec<lsp_types::Diagnostic>,
}

fn group_by_path(diagnostics: &[AnalysisDiagnostic]) -> BTreeMap<std::path::PathBuf, Vec<lsp_types::Diagnostic>> {
    let mut grouped: BTreeMap<std::path::PathBuf, Vec<lsp_types::Diagnostic>> = BTreeMap::new();
    for diag in diagnostics {
        grouped.entry(diag.path.clone()).or_default().push(to_lsp_diagnostic(diag));
    }
    grouped
}

/// Builds the set of publications for an accepted result (§4.3 step 9),
/// re-checking per-URI that the plan still matches the live store before
/// including it — a document that changed mid-publish is dropped from
/// this batch rather than sent a stale diagnostic list.
///
/// `empty_for` adds empty-diagnostics entries for URIs that must be
/// cleared even though the accepted result has nothing to say about them
/// (e.g. a file whose only diagnostic was fixed, or one covered by the
/// plan but outside the accepted scope).
pub fn publications_for(result: &AnalysisResult, store: &DocumentStore, empty_for: &[Uri]) -> Vec<DiagnosticsPublication> {
    let mut out = Vec::new();
    let grouped = group_by_path(&result.outcome.diagnostics);

    for uri in result.plan.docs.keys() {
        let path = match store.canonical_path(uri) {
            Some(path) => path,
            None => continue,
        };
        let (version, snapshot_id) = match result.plan.docs.get(uri) {
            Some(v) => *v,
            None => continue,
        };
        let still_matches = store
            .get(uri)
            .map(|doc| doc.version == version && doc.snapshot_id == snapshot_id)
            .unwrap_or(false);
        if !still_matches {
            continue;
        }
        let diagnostics = grouped.get(&path).cloned().unwrap_or_default();
        out.push(DiagnosticsPublication { uri: uri.clone(), diagnostics });
    }

    for uri in empty_for {
        if !out.iter().any(|p| &p.uri == uri) {
            out.push(DiagnosticsPublication { uri: uri.clone(), diagnostics: Vec::new() });
        }
    }

    out
}

/// An empty publication for one URI, used on `didClose` (§4.1/§4.7: a
/// closed document's diagnostics are cleared even though no new analysis
/// ran) and on scope changes (§4.3 steps 2/4).
pub fn empty_publication(uri: Uri) -> DiagnosticsPublication {
    DiagnosticsPublication { uri, diagnostics: Vec::new() }
}

/// Turns a URI's filesystem path into the best-effort `file://` form for
/// a publication when only the path (not the original client URI) is on
/// hand.
pub fn publication_for_path(path: &std::path::Path, diagnostics: Vec<lsp_types::Diagnostic>) -> Option<DiagnosticsPublication> {
    let uri = path_to_uri(path)?;
    Some(DiagnosticsPublication { uri, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{AnalysisPlan, AnalysisScope};
    use sg_analysis::{AnalyzeOutcome, AnalysisMode, DiagnosticSeverity};
    use std::path::PathBuf;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn make_result(plan_docs: BTreeMap<Uri, (i32, u64)>, diagnostics: Vec<AnalysisDiagnostic>) -> AnalysisResult {
        AnalysisResult {
            seq: 1,
            scope: AnalysisScope { mode: AnalysisMode::OpenFiles, root: PathBuf::from("/proj") },
            plan: AnalysisPlan { files: Vec::new(), overlay: BTreeMap::new(), docs: plan_docs },
            outcome: AnalyzeOutcome { snapshot: None, diagnostics, error: None },
            scope_changed: false,
        }
    }

    #[test]
    fn groups_diagnostics_by_their_own_uri() {
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "x");
        let mut docs = BTreeMap::new();
        docs.insert(uri("file:///proj/a.sg"), (1, 1));
        let diag = AnalysisDiagnostic {
            path: PathBuf::from("/proj/a.sg"),
            line: 1,
            column: 1,
            end_line: 1,
            end_column: 2,
            severity: DiagnosticSeverity::Error,
            message: "bad".to_string(),
        };
        let result = make_result(docs, vec![diag]);

        let pubs = publications_for(&result, &store, &[]);
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].diagnostics.len(), 1);
    }

    #[test]
    fn a_document_changed_after_the_plan_was_built_is_skipped() {
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "x");
        let mut docs = BTreeMap::new();
        docs.insert(uri("file:///proj/a.sg"), (1, 1));
        let result = make_result(docs, Vec::new());

        store.change(
            &uri("file:///proj/a.sg"),
            2,
            &[lsp_types::TextDocumentContentChangeEvent { range: None, range_length: None, text: "y".to_string() }],
        );
        let pubs = publications_for(&result, &store, &[]);
        assert!(pubs.is_empty());
    }

    #[test]
    fn a_document_with_no_diagnostics_still_gets_an_empty_publication() {
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "x");
        let mut docs = BTreeMap::new();
        docs.insert(uri("file:///proj/a.sg"), (1, 1));
        let result = make_result(docs, Vec::new());

        let pubs = publications_for(&result, &store, &[]);
        assert_eq!(pubs.len(), 1);
        assert!(pubs[0].diagnostics.is_empty());
    }

    #[test]
    fn empty_for_adds_a_clearing_publication_not_covered_by_the_plan() {
        let store = DocumentStore::new();
        let result = make_result(BTreeMap::new(), Vec::new());
        let pubs = publications_for(&result, &store, &[uri("file:///proj/closed.sg")]);
        assert_eq!(pubs.len(), 1);
        assert!(pubs[0].diagnostics.is_empty());
    }

    #[test]
    fn empty_publication_has_no_diagnostics() {
        let pub_ = empty_publication(uri("file:///proj/a.sg"));
        assert!(pub_.diagnostics.is_empty());
    }
}
