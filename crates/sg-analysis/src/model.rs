//! The Analyzer's output shape (§3): an opaque-to-the-core
//! `AnalysisSnapshot` containing per-file analysis results plus a
//! module-export map, referenced by the Snapshot Manager and consumed
//! read-only by the query routers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ast::Item;
use crate::symbol::{Symbol, SymbolId};
use crate::token::Token;

/// Opaque per-file identifier, stable within one `AnalysisSnapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// One analyzed file: its tokens, parsed top-level items, and symbol
/// table.
#[derive(Debug, Clone)]
pub struct AnalysisFile {
    pub id: FileId,
    /// Canonical filesystem path (see URI canonicalization, §6).
    pub path: PathBuf,
    pub tokens: Vec<Token>,
    pub items: Vec<Item>,
    pub symbols: FxHashMap<SymbolId, Symbol>,
    /// Map from an identifier token's span start to the symbol it
    /// resolved to during collection, used by `resolve_symbol`'s first
    /// lookup tier.
    pub expr_symbols: FxHashMap<usize, SymbolId>,
    pub next_symbol_id: u32,
}

impl AnalysisFile {
    pub fn new(id: FileId, path: PathBuf) -> Self {
        Self {
            id,
            path,
            tokens: Vec::new(),
            items: Vec::new(),
            symbols: FxHashMap::default(),
            expr_symbols: FxHashMap::default(),
            next_symbol_id: 0,
        }
    }

    pub fn fresh_symbol_id(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol_id);
        self.next_symbol_id += 1;
        id
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Symbols declared at top level, in declaration order, matching `name`.
    pub fn lookup_top_level(&self, name: &str) -> Vec<SymbolId> {
        let mut ids = Vec::new();
        for item in &self.items {
            let sym = match item {
                Item::Let(l) if l.name == name => Some(l.symbol),
                Item::Enum(e) if e.name == name => Some(e.symbol),
                Item::Fn(f) if f.name == name => Some(f.symbol),
                Item::Struct(s) if s.name == name => Some(s.symbol),
                _ => None,
            };
            if let Some(id) = sym {
                ids.push(id);
            }
        }
        ids
    }
}

/// A module's exported symbols, keyed by name (a name may be overloaded,
/// e.g. multiple `fn` exports with the same name and different arity).
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    pub symbols: FxHashMap<String, Vec<(FileId, SymbolId)>>,
}

impl ModuleExports {
    pub fn resolve(&self, name: &str) -> &[(FileId, SymbolId)] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A diagnostic produced during analysis, 1-based line/column (converted
/// to 0-based UTF-16 by the Publisher, §4.7).
#[derive(Debug, Clone)]
pub struct AnalysisDiagnostic {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

/// The opaque product of the Analyzer (§3). Consumed read-only by the
/// Snapshot Manager and Query Routers; never mutated after construction.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub project_root: PathBuf,
    files: FxHashMap<FileId, AnalysisFile>,
    /// path → file id, for `snapshot_file` lookups by canonical path.
    by_path: BTreeMap<PathBuf, FileId>,
    pub module_exports: FxHashMap<String, ModuleExports>,
}

impl AnalysisSnapshot {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            files: FxHashMap::default(),
            by_path: BTreeMap::new(),
            module_exports: FxHashMap::default(),
        }
    }

    pub fn insert_file(&mut self, file: AnalysisFile) {
        self.by_path.insert(file.path.clone(), file.id);
        self.files.insert(file.id, file);
    }

    pub fn file(&self, id: FileId) -> Option<&AnalysisFile> {
        self.files.get(&id)
    }

    pub fn file_by_path(&self, path: &std::path::Path) -> Option<&AnalysisFile> {
        self.by_path.get(path).and_then(|id| self.files.get(id))
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Reference-counted handle to a published snapshot (§4.4): a reader
/// that obtained one via `for_uri` keeps it alive independent of later
/// swaps.
pub type SharedSnapshot = Arc<AnalysisSnapshot>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_looks_up_files_by_path() {
        let mut snap = AnalysisSnapshot::new(PathBuf::from("/proj"));
        let file = AnalysisFile::new(FileId(0), PathBuf::from("/proj/main.sg"));
        snap.insert_file(file);
        assert!(snap.file_by_path(&PathBuf::from("/proj/main.sg")).is_some());
        assert!(snap.file_by_path(&PathBuf::from("/proj/other.sg")).is_none());
    }

    #[test]
    fn module_exports_resolve_overloads() {
        let mut exports = ModuleExports::default();
        exports.symbols.insert("f".to_string(), vec![(FileId(0), SymbolId(1)), (FileId(0), SymbolId(2))]);
        assert_eq!(exports.resolve("f").len(), 2);
        assert!(exports.resolve("missing").is_empty());
    }
}
