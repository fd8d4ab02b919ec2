//! The Document Store (§4.1): authoritative state of open documents,
//! guarded by the server's `state_mu` (§5).

use std::collections::BTreeMap;
use std::path::PathBuf;

use lsp_types::{TextDocumentContentChangeEvent, Uri};

use crate::state::document::DocumentState;
use crate::util::project::find_project_root;
use crate::util::uri::canonicalize_uri_str;

/// A consistent read of the whole Document Store, produced by
/// `snapshot_all` under a single critical section (§4.1).
pub struct DocumentSnapshot {
    /// Canonical path → text, the input the Analyzer consumes.
    pub overlay: BTreeMap<PathBuf, String>,
    /// URI → `(version, snapshot_id)` at the moment of the snapshot, used
    /// by the Scheduler's acceptance gate (§4.3 step 7).
    pub states: BTreeMap<Uri, (i32, u64)>,
    /// URI → canonical filesystem path.
    pub paths: BTreeMap<Uri, PathBuf>,
    /// URI → detected project root, if any (§4.3 filtering rules).
    pub per_doc_projects: BTreeMap<Uri, Option<PathBuf>>,
}

/// Open-document state keyed by canonical URI string (two URIs that
/// decode to the same absolute, cleaned path are the same document,
/// §4.1).
#[derive(Default)]
pub struct DocumentStore {
    docs: BTreeMap<String, (Uri, PathBuf, DocumentState)>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_and_path(uri: &Uri) -> Option<(String, PathBuf)> {
        let raw = uri.as_str();
        let canonical = canonicalize_uri_str(raw)?;
        let path = crate::util::uri::uri_to_path(&canonical)?;
        Some((canonical, path))
    }

    /// `open(uri, version, text)`.
    pub fn open(&mut self, uri: Uri, version: i32, text: &str) {
        let Some((key, path)) = Self::key_and_path(&uri) else { return };
        let doc = DocumentState::new(text, version);
        self.docs.insert(key, (uri, path, doc));
    }

    /// `change(uri, version, changes)`.
    pub fn change(&mut self, uri: &Uri, version: i32, changes: &[TextDocumentContentChangeEvent]) {
        let Some((key, _)) = Self::key_and_path(uri) else { return };
        if let Some((_, _, doc)) = self.docs.get_mut(&key) {
            doc.apply_changes(version, changes);
        }
    }

    /// `save(uri, version, text?)`.
    pub fn save(&mut self, uri: &Uri, version: i32, text: Option<&str>) {
        let Some((key, _)) = Self::key_and_path(uri) else { return };
        if let Some((_, _, doc)) = self.docs.get_mut(&key) {
            match text {
                Some(text) => doc.replace_all(text, version),
                None => {
                    doc.version = version;
                }
            }
        }
    }

    /// `close(uri)`. Returns `true` if the document existed (the caller
    /// uses this to decide whether a follow-up empty publish is needed,
    /// §4.1/§4.7).
    pub fn close(&mut self, uri: &Uri) -> bool {
        let Some((key, _)) = Self::key_and_path(uri) else { return false };
        self.docs.remove(&key).is_some()
    }

    pub fn get(&self, uri: &Uri) -> Option<&DocumentState> {
        let (key, _) = Self::key_and_path(uri)?;
        self.docs.get(&key).map(|(_, _, doc)| doc)
    }

    pub fn canonical_path(&self, uri: &Uri) -> Option<PathBuf> {
        Self::key_and_path(uri).map(|(_, path)| path)
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn open_uris(&self) -> impl Iterator<Item = &Uri> + '_ {
        self.docs.values().map(|(uri, _, _)| uri)
    }

    /// `snapshot_all()` (§4.1): one pass over all open documents,
    /// producing the inputs an analysis needs.
    pub fn snapshot_all(&self) -> DocumentSnapshot {
        let mut overlay = BTreeMap::new();
        let mut states = BTreeMap::new();
        let mut paths = BTreeMap::new();
        let mut per_doc_projects = BTreeMap::new();

        for (uri, path, doc) in self.docs.values() {
            overlay.insert(path.clone(), doc.text().to_string());
            states.insert(uri.clone(), (doc.version, doc.snapshot_id));
            paths.insert(uri.clone(), path.clone());
            per_doc_projects.insert(uri.clone(), find_project_root(path));
        }

        DocumentSnapshot { overlay, states, paths, per_doc_projects }
    }
}
