//! The Analysis Scheduler (§4.3): debounces edits, decides the analysis
//! scope, runs the Analyzer on a background thread, and gates whether
//! its result gets published.
//!
//! Grounded on the teacher's background-indexing pattern (a dedicated
//! worker thread coordinated through atomics) for the execution model,
//! and on a debounce-then-version-guard sequencing for discarding stale
//! results — re-expressed here with `std::thread`/`std::sync::atomic`
//! rather than an async runtime, since that is this crate's own
//! concurrency idiom (§5).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lsp_types::Uri;
use parking_lot::Mutex as PLMutex;
use sg_analysis::{analyze, AnalysisMode, AnalysisOptions, AnalyzeOutcome};

use crate::cancellation::CancellationToken;
use crate::state::store::DocumentSnapshot;
use crate::state::DocumentStore;

/// Which documents the next run should cover (mirrors
/// `sg_analysis::AnalysisMode` one-to-one, plus the resolved root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisScope {
    pub mode: AnalysisMode,
    pub root: PathBuf,
}

/// The filtered set of documents an analysis run will actually cover,
/// and the `(version, snapshot_id)` each was captured at (§4.3 step 5,
/// used by the acceptance gate in step 7).
pub struct AnalysisPlan {
    pub files: Vec<PathBuf>,
    pub overlay: BTreeMap<PathBuf, String>,
    pub docs: BTreeMap<Uri, (i32, u64)>,
}

fn is_sg_path(path: &PathBuf) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("sg")
}

/// §4.3 scope computation: a project root wins if any open document (or
/// its preferred/first) detects one; otherwise the scope is the open
/// files themselves, rooted at the first file's directory.
fn compute_scope(snapshot: &DocumentSnapshot) -> AnalysisScope {
    for (uri, project_root) in &snapshot.per_doc_projects {
        if let Some(root) = project_root {
            return AnalysisScope { mode: AnalysisMode::ProjectRoot, root: root.clone() };
        }
        let _ = uri;
    }
    let root = snapshot
        .paths
        .values()
        .next()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"));
    AnalysisScope { mode: AnalysisMode::OpenFiles, root }
}

/// §4.3 step 5 filtering rules.
fn build_plan(snapshot: &DocumentSnapshot, scope: &AnalysisScope) -> AnalysisPlan {
    let mut files = Vec::new();
    let mut overlay = BTreeMap::new();
    let mut docs = BTreeMap::new();

    for (uri, path) in &snapshot.paths {
        if !is_sg_path(path) {
            continue;
        }
        let include = match scope.mode {
            AnalysisMode::ProjectRoot => {
                let under_root = path.starts_with(&scope.root);
                let nested_subproject = snapshot
                    .per_doc_projects
                    .get(uri)
                    .and_then(|r| r.as_ref())
                    .map(|r| r != &scope.root)
                    .unwrap_or(false);
                under_root && !nested_subproject
            }
            AnalysisMode::OpenFiles => {
                let doc_root = snapshot.per_doc_projects.get(uri).cloned().flatten();
                doc_root.is_none() || doc_root.as_ref() == Some(&scope.root)
            }
        };
        if !include {
            continue;
        }
        if let Some(text) = snapshot.overlay.get(path) {
            overlay.insert(path.clone(), text.clone());
        }
        files.push(path.clone());
        if let Some(state) = snapshot.states.get(uri) {
            docs.insert(uri.clone(), *state);
        }
    }

    AnalysisPlan { files, overlay, docs }
}

/// Checks a just-finished plan's documents still match the live
/// Document Store (§4.3 step 7's per-URI part of the acceptance gate).
fn plan_matches_store(plan: &AnalysisPlan, store: &DocumentStore) -> bool {
    for (uri, (version, snapshot_id)) in &plan.docs {
        match store.get(uri) {
            Some(doc) if doc.version == *version && doc.snapshot_id == *snapshot_id => {}
            _ => return false,
        }
    }
    true
}

/// Outcome of one `run(seq)` firing, handed to the server's apply/publish
/// step so it can do so under the shared state lock (§4.3 steps 8-9).
pub struct AnalysisResult {
    pub seq: u64,
    pub scope: AnalysisScope,
    pub plan: AnalysisPlan,
    pub outcome: AnalyzeOutcome,
    /// Whether this run's scope differs from the previous run's (§4.3
    /// step 4): the caller clears published diagnostics and stored
    /// snapshot state before applying this result when set.
    pub scope_changed: bool,
}

/// The Scheduler's clocks and debounce machinery (§4.3). Does not itself
/// hold the Document Store or Snapshot Manager — `schedule`/`run`
/// callers supply those so the Scheduler stays a pure sequencing
/// component ("seq ⇒ scope ⇒ plan ⇒ analyze") that's easy to test in
/// isolation.
pub struct AnalysisScheduler {
    analysis_seq: AtomicU64,
    latest_seq: AtomicU64,
    applied_seq: AtomicU64,
    cancel_handle: PLMutex<Option<CancellationToken>>,
    last_scope: PLMutex<Option<AnalysisScope>>,
    debounce_interval: Duration,
}

impl AnalysisScheduler {
    pub fn new() -> Self {
        Self {
            analysis_seq: AtomicU64::new(0),
            latest_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
            cancel_handle: PLMutex::new(None),
            last_scope: PLMutex::new(None),
            debounce_interval: Duration::from_millis(300),
        }
    }

    pub fn with_debounce_interval(debounce_interval: Duration) -> Self {
        Self { debounce_interval, ..Self::new() }
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq.load(Ordering::Acquire)
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debounce_interval
    }

    /// §4.3 `schedule()`: bump the sequence, cancel any in-flight run,
    /// and return the new sequence number plus a fresh cancellation
    /// token the caller arms a debounce timer with.
    pub fn schedule(&self) -> (u64, CancellationToken) {
        let seq = self.analysis_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.latest_seq.store(seq, Ordering::Release);

        let mut handle = self.cancel_handle.lock();
        if let Some(previous) = handle.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *handle = Some(token.clone());
        (seq, token)
    }

    /// §4.3 step 1: a run is stale the instant a newer one has been
    /// scheduled.
    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest_seq.load(Ordering::Acquire) == seq
    }

    /// §4.3 step 2: under the state lock, either report "no open docs"
    /// (clearing published state) or take the one-pass snapshot the
    /// background run will work from. The lock is released as soon as
    /// the caller drops the returned snapshot — `run` itself never
    /// touches the live `DocumentStore`.
    pub fn snapshot_for_run(&self, seq: u64, store: &DocumentStore) -> Option<DocumentSnapshot> {
        if !self.is_latest(seq) {
            return None;
        }
        if store.is_empty() {
            *self.last_scope.lock() = None;
            return None;
        }
        Some(store.snapshot_all())
    }

    /// §4.3 steps 3-6: compute scope, build the filtered plan, and call
    /// the Analyzer against a snapshot taken in a prior critical section
    /// (`snapshot_for_run`). Runs with no lock held.
    pub fn run(&self, seq: u64, snapshot: &DocumentSnapshot) -> Option<AnalysisResult> {
        if !self.is_latest(seq) {
            return None;
        }

        let scope = compute_scope(snapshot);

        // §4.3 step 4: the caller clears published diagnostics and stored
        // snapshot state when this is set.
        let scope_changed = {
            let mut last = self.last_scope.lock();
            let changed = last.as_ref() != Some(&scope);
            *last = Some(scope.clone());
            changed
        };

        let plan = build_plan(snapshot, &scope);
        let stdlib_root = std::env::var_os("SG_STDLIB_ROOT").map(PathBuf::from);
        let options = AnalysisOptions::new(scope.root.clone(), scope.mode).with_stdlib_root(stdlib_root);
        let outcome = analyze(&options, &plan.files, &plan.overlay);

        Some(AnalysisResult { seq, scope, plan, outcome, scope_changed })
    }

    /// §4.3 step 7: discard a result that's no longer worth publishing.
    /// Returns `true` if it should be applied.
    pub fn accept(&self, result: &AnalysisResult, token: &CancellationToken, store: &DocumentStore) -> bool {
        if token.is_cancelled() {
            return false;
        }
        if !self.is_latest(result.seq) {
            return false;
        }
        if result.seq <= self.applied_seq() {
            return false;
        }
        if plan_matches_store(&result.plan, store) {
            self.applied_seq.store(result.seq, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub fn current_scope(&self) -> Option<AnalysisScope> {
        self.last_scope.lock().clone()
    }

    /// Spawn `run` against an already-taken snapshot plus the
    /// caller-supplied apply/publish callback on a dedicated background
    /// thread, matching the teacher's spawn-a-worker execution model for
    /// each debounce firing. The state lock is not held across this
    /// call (§4.3 step 2).
    pub fn spawn<F>(self: &Arc<Self>, seq: u64, snapshot: DocumentSnapshot, token: CancellationToken, on_result: F)
    where
        F: FnOnce(Option<AnalysisResult>, CancellationToken) + Send + 'static,
    {
        let scheduler = Arc::clone(self);
        std::thread::spawn(move || {
            let result = scheduler.run(seq, &snapshot);
            on_result(result, token);
        });
    }
}

impl Default for AnalysisScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn run_against(scheduler: &AnalysisScheduler, seq: u64, store: &DocumentStore) -> Option<AnalysisResult> {
        let snapshot = scheduler.snapshot_for_run(seq, store)?;
        scheduler.run(seq, &snapshot)
    }

    #[test]
    fn schedule_increments_sequence_and_cancels_the_previous_token() {
        let scheduler = AnalysisScheduler::new();
        let (seq1, token1) = scheduler.schedule();
        assert_eq!(seq1, 1);
        let (seq2, _token2) = scheduler.schedule();
        assert_eq!(seq2, 2);
        assert!(token1.is_cancelled());
    }

    #[test]
    fn run_with_no_open_documents_returns_none() {
        let scheduler = AnalysisScheduler::new();
        let (seq, _token) = scheduler.schedule();
        let store = DocumentStore::new();
        assert!(run_against(&scheduler, seq, &store).is_none());
    }

    #[test]
    fn stale_seq_is_rejected_before_doing_any_work() {
        let scheduler = AnalysisScheduler::new();
        let (seq1, _t1) = scheduler.schedule();
        let (_seq2, _t2) = scheduler.schedule();
        let mut store = DocumentStore::new();
        store.open(uri("file:///a.sg"), 1, "let x = 1;");
        assert!(run_against(&scheduler, seq1, &store).is_none());
    }

    #[test]
    fn open_files_mode_is_used_when_no_manifest_is_found() {
        let scheduler = AnalysisScheduler::new();
        let (seq, _token) = scheduler.schedule();
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "let x = 1;");
        let result = run_against(&scheduler, seq, &store).unwrap();
        assert_eq!(result.scope.mode, AnalysisMode::OpenFiles);
        assert_eq!(result.plan.files.len(), 1);
    }

    #[test]
    fn project_root_mode_is_used_when_a_manifest_is_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sg.toml"), "").unwrap();
        let file_path = dir.path().join("a.sg");
        fs::write(&file_path, "").unwrap();

        let scheduler = AnalysisScheduler::new();
        let (seq, _token) = scheduler.schedule();
        let mut store = DocumentStore::new();
        let file_uri = crate::util::uri::parse_uri(&format!("file://{}", file_path.display()));
        store.open(file_uri, 1, "let x = 1;");
        let result = run_against(&scheduler, seq, &store).unwrap();
        assert_eq!(result.scope.mode, AnalysisMode::ProjectRoot);
        assert_eq!(result.scope.root, dir.path());
    }

    #[test]
    fn accept_rejects_a_result_whose_plan_no_longer_matches_the_store() {
        let scheduler = AnalysisScheduler::new();
        let (seq, token) = scheduler.schedule();
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "let x = 1;");
        let result = run_against(&scheduler, seq, &store).unwrap();

        // Document changed after the snapshot was taken.
        store.change(
            &uri("file:///proj/a.sg"),
            2,
            &[lsp_types::TextDocumentContentChangeEvent { range: None, range_length: None, text: "let y = 2;".to_string() }],
        );
        assert!(!scheduler.accept(&result, &token, &store));
    }

    #[test]
    fn accept_approves_a_matching_unchanged_result() {
        let scheduler = AnalysisScheduler::new();
        let (seq, token) = scheduler.schedule();
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "let x = 1;");
        let result = run_against(&scheduler, seq, &store).unwrap();
        assert!(scheduler.accept(&result, &token, &store));
        assert_eq!(scheduler.applied_seq(), seq);
    }

    #[test]
    fn accept_rejects_a_cancelled_token() {
        let scheduler = AnalysisScheduler::new();
        let (seq, token) = scheduler.schedule();
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "let x = 1;");
        let result = run_against(&scheduler, seq, &store).unwrap();
        token.cancel();
        assert!(!scheduler.accept(&result, &token, &store));
    }

    #[test]
    fn scope_changed_is_set_on_the_first_run_and_cleared_on_a_repeat() {
        let scheduler = AnalysisScheduler::new();
        let mut store = DocumentStore::new();
        store.open(uri("file:///proj/a.sg"), 1, "let x = 1;");

        let (seq1, _token1) = scheduler.schedule();
        let first = run_against(&scheduler, seq1, &store).unwrap();
        assert!(first.scope_changed);

        let (seq2, _token2) = scheduler.schedule();
        let second = run_against(&scheduler, seq2, &store).unwrap();
        assert!(!second.scope_changed, "same open-files scope should not re-trigger a clear");
    }

    #[test]
    fn scope_changed_is_set_when_the_manifest_appears_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.sg");
        fs::write(&file_path, "").unwrap();
        let file_uri = crate::util::uri::parse_uri(&format!("file://{}", file_path.display()));

        let scheduler = AnalysisScheduler::new();
        let mut store = DocumentStore::new();
        store.open(file_uri.clone(), 1, "let x = 1;");

        let (seq1, _token1) = scheduler.schedule();
        let first = run_against(&scheduler, seq1, &store).unwrap();
        assert_eq!(first.scope.mode, AnalysisMode::OpenFiles);

        fs::write(dir.path().join("sg.toml"), "").unwrap();
        let (seq2, _token2) = scheduler.schedule();
        let second = run_against(&scheduler, seq2, &store).unwrap();
        assert_eq!(second.scope.mode, AnalysisMode::ProjectRoot);
        assert!(second.scope_changed);
    }
}
