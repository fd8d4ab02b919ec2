//! The Snapshot Manager (§4.4): published analysis state, swapped under
//! the server's `state_mu` and shared with readers by reference counting
//! so a snapshot obtained via `for_uri` outlives later swaps (§9).

use std::collections::BTreeMap;

use lsp_types::Uri;
use sg_analysis::SharedSnapshot;

use crate::state::DocumentStore;

/// Holds `last_snapshot`/`last_good_snapshot`/`snapshot_docs`/
/// `snapshot_version` (§4.4). This reference implementation never
/// produces a snapshot without an accompanying `AnalyzeOutcome::snapshot`
/// (the Analyzer's `error` case short-circuits before step 8), so
/// `last_snapshot` and `last_good_snapshot` are always equal here; the
/// spec still names them separately for a future Analyzer that could
/// report partial/degraded snapshots distinct from the last fully-good
/// one.
#[derive(Default)]
pub struct SnapshotManager {
    last_snapshot: Option<SharedSnapshot>,
    last_good_snapshot: Option<SharedSnapshot>,
    snapshot_docs: BTreeMap<Uri, (i32, u64)>,
    snapshot_version: u64,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    pub fn snapshot_docs(&self) -> &BTreeMap<Uri, (i32, u64)> {
        &self.snapshot_docs
    }

    /// §4.4 `current()`: no freshness validation.
    pub fn current(&self) -> Option<SharedSnapshot> {
        self.last_good_snapshot.clone()
    }

    /// §4.4 `for_uri(uri)`: only returns a snapshot that still agrees
    /// with the client's current view of every document it covers.
    pub fn for_uri(&self, uri: &Uri, store: &DocumentStore) -> Option<SharedSnapshot> {
        if !self.snapshot_docs.contains_key(uri) {
            return None;
        }
        for (doc_uri, (version, snapshot_id)) in &self.snapshot_docs {
            let doc = store.get(doc_uri)?;
            if doc.version != *version || doc.snapshot_id != *snapshot_id {
                return None;
            }
        }
        self.last_good_snapshot.clone()
    }

    /// §4.3 step 8: atomically replace published state after an accepted
    /// analysis.
    pub fn apply(&mut self, snapshot: SharedSnapshot, docs: BTreeMap<Uri, (i32, u64)>) {
        self.last_snapshot = Some(snapshot.clone());
        self.last_good_snapshot = Some(snapshot);
        self.snapshot_docs = docs;
        self.snapshot_version += 1;
    }

    /// Clears all published state (§4.3 steps 2/4's scope-change clear,
    /// and §4.8 `shutdown`).
    pub fn clear(&mut self) {
        self.last_snapshot = None;
        self.last_good_snapshot = None;
        self.snapshot_docs.clear();
    }
}
