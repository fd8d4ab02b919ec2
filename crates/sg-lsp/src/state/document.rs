//! In-memory state of one open document (§4.1 Document Store).
//!
//! Text storage uses a rope (`ropey`), not a plain `String`, so ranged
//! edits on large documents stay efficient — an ambient implementation
//! choice, not a spec requirement, but the reference codebase's own way
//! of storing document text.

use std::time::Instant;

use lsp_types::TextDocumentContentChangeEvent;
use sg_position_tracking::LineStartsCache;

use crate::convert::position::range_to_span;

/// One open document's authoritative state: its rope-backed text, LSP
/// `version`, and the per-document `snapshot_id` clock the Scheduler and
/// Snapshot Manager key off of.
#[derive(Clone)]
pub struct DocumentState {
    rope: ropey::Rope,
    /// Flattened text, kept in sync with `rope` for cheap whole-document
    /// reads by the tokenizer/analyzer.
    text: String,
    pub version: i32,
    /// Monotonically increasing per document; incremented by `open`,
    /// `change`, and `save` (§4.1), starting at 1.
    pub snapshot_id: u64,
    line_starts: LineStartsCache,
    pub last_touched: Instant,
}

impl DocumentState {
    pub fn new(content: &str, version: i32) -> Self {
        let rope = ropey::Rope::from_str(content);
        let line_starts = LineStartsCache::new(content);
        Self {
            rope,
            text: content.to_string(),
            version,
            snapshot_id: 1,
            line_starts,
            last_touched: Instant::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_starts(&self) -> &LineStartsCache {
        &self.line_starts
    }

    fn resync(&mut self) {
        self.text = self.rope.to_string();
        self.line_starts = LineStartsCache::new(&self.text);
        self.last_touched = Instant::now();
        self.snapshot_id += 1;
    }

    /// `save(uri, version, text?)` with text provided: overwrite whole
    /// content.
    pub fn replace_all(&mut self, content: &str, version: i32) {
        self.rope = ropey::Rope::from_str(content);
        self.version = version;
        self.resync();
    }

    /// `change(uri, version, changes)`: apply ordered content-change
    /// events, each either a full replacement (no range) or a ranged
    /// replace. Out-of-bounds ranges clamp via the Position Mapper.
    pub fn apply_changes(&mut self, version: i32, changes: &[TextDocumentContentChangeEvent]) {
        for change in changes {
            match change.range {
                None => {
                    self.rope = ropey::Rope::from_str(&change.text);
                    self.text = self.rope.to_string();
                    self.line_starts = LineStartsCache::new(&self.text);
                }
                Some(range) => {
                    let span = range_to_span(&self.text, &self.line_starts, range);
                    let len_bytes = self.rope.len_bytes();
                    let start_char = self.rope.byte_to_char(span.start.min(len_bytes));
                    let end_char = self.rope.byte_to_char(span.end.min(len_bytes));
                    self.rope.remove(start_char..end_char);
                    self.rope.insert(start_char, &change.text);
                    self.text = self.rope.to_string();
                    self.line_starts = LineStartsCache::new(&self.text);
                }
            }
        }
        self.version = version;
        self.last_touched = Instant::now();
        self.snapshot_id += 1;
    }
}
