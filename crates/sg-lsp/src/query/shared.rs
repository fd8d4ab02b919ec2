//! Helpers shared by every query router (§4.5): file lookup, offset
//! conversion, token/expression lookup under the cursor, and symbol
//! resolution.

use std::path::Path;

use sg_analysis::ast::{Expr, Item};
use sg_analysis::{AnalysisFile, AnalysisSnapshot, Symbol, SymbolId, Token};
use sg_position_tracking::LineStartsCache;

use crate::convert::position::position_to_offset;

/// Bundles what every router needs to answer one query: the analyzed
/// snapshot, the document's current text and line index, and the
/// project root used to format relative paths.
pub struct QueryContext<'a> {
    pub snapshot: &'a AnalysisSnapshot,
    pub project_root: &'a Path,
    pub path: &'a Path,
    pub source: &'a str,
    pub cache: &'a LineStartsCache,
}

impl<'a> QueryContext<'a> {
    pub fn file(&self) -> Option<&'a AnalysisFile> {
        snapshot_file(self.snapshot, self.path)
    }

    pub fn offset_for(&self, position: lsp_types::Position) -> usize {
        offset_for_position(self.source, self.cache, position)
    }
}

/// Look up an analyzed file by its canonical path (§4.5 `snapshot_file`).
pub fn snapshot_file<'a>(snapshot: &'a AnalysisSnapshot, path: &Path) -> Option<&'a AnalysisFile> {
    snapshot.file_by_path(path)
}

/// §4.5 `offset_for_position`, wired through the Position Mapper.
pub fn offset_for_position(text: &str, cache: &LineStartsCache, position: lsp_types::Position) -> usize {
    position_to_offset(text, cache, position)
}

pub use sg_analysis::token::token_at_offset as token_for_offset;

/// §4.5 `expression_at_offset`: the smallest expression node (across all
/// top-level items' initializers/bodies this reference Analyzer tracks)
/// whose span contains `offset`.
pub fn expression_at_offset(file: &AnalysisFile, offset: usize, skip_ident: bool) -> Option<&Expr> {
    for item in &file.items {
        if let Item::Let(let_item) = item {
            if let Some(init) = &let_item.initializer {
                if init.span().contains(offset) {
                    if let Some(found) = init.smallest_containing(offset, skip_ident) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// §4.5 `resolve_symbol`: (a) expression→symbol map lookup for the
/// identifier at this span, (b) declaration-at-offset (item whose name
/// span covers the cursor), (c) name lookup among top-level declarations
/// (this reference Analyzer's lexical scope is flat at module level).
pub fn resolve_symbol(file: &AnalysisFile, offset: usize, token: &Token) -> Option<SymbolId> {
    if let Some(id) = file.expr_symbols.get(&token.span.start) {
        return Some(*id);
    }

    for item in &file.items {
        let (name_span, symbol) = match item {
            Item::Let(l) => (l.name_span, l.symbol),
            Item::Enum(e) => (e.span, e.symbol),
            Item::Fn(f) => (f.span, f.symbol),
            Item::Struct(s) => (s.span, s.symbol),
            Item::Import(_) => continue,
        };
        if name_span.contains(offset) {
            return Some(symbol);
        }
    }

    let candidates = file.lookup_top_level(&token.text);
    candidates.first().copied()
}

/// The item that declares `id`, if any (used to read back structured
/// fields -- return type, fields, variants -- that don't fit on
/// [`Symbol`] itself).
pub fn find_item_for_symbol(file: &AnalysisFile, id: SymbolId) -> Option<&Item> {
    file.items.iter().find(|item| match item {
        Item::Let(l) => l.symbol == id,
        Item::Enum(e) => e.symbol == id || e.variants.iter().any(|v| v.symbol == id),
        Item::Fn(f) => f.symbol == id,
        Item::Struct(s) => s.symbol == id,
        Item::Import(_) => false,
    })
}

/// Best-effort static type label for an expression (§4.5.1's "Type:
/// `<type-label>`" hover line): literals resolve to their obvious
/// primitive key, identifiers and calls resolve through the symbol they
/// reference.
pub fn type_label_for_expr(file: &AnalysisFile, expr: &Expr) -> Option<String> {
    match expr {
        Expr::IntLit { .. } => Some("int".to_string()),
        Expr::FloatLit { .. } => Some("float".to_string()),
        Expr::StringLit { .. } => Some("string".to_string()),
        Expr::BoolLit { .. } => Some("bool".to_string()),
        Expr::Ident { name, span } => file
            .expr_symbols
            .get(&span.start)
            .and_then(|id| file.symbol(*id))
            .and_then(|sym| sym.type_key.clone())
            .or_else(|| file.lookup_top_level(name).first().and_then(|id| file.symbol(*id)).and_then(|s| s.type_key.clone())),
        Expr::Call { callee, .. } => {
            let Expr::Ident { span, .. } = callee.as_ref() else { return None };
            let id = file.expr_symbols.get(&span.start)?;
            match find_item_for_symbol(file, *id)? {
                Item::Fn(f) => f.return_type.clone(),
                _ => None,
            }
        }
        Expr::Member { .. } => None,
    }
}

/// Formats the signature line a router shows for a resolved symbol,
/// falling back to the bare name when no signature was collected.
pub fn format_signature(symbol: &Symbol) -> String {
    symbol.signature.clone().unwrap_or_else(|| symbol.name.clone())
}

/// `<relative-path>:<line>` for hover's "Defined in" line (§4.5.1),
/// 1-based line number derived from the declaration span's start offset
/// by counting newlines in `source` (the document's current text).
pub fn defined_in_line(project_root: &Path, file: &AnalysisFile, symbol: &Symbol, source: &str) -> String {
    let rel = file.path.strip_prefix(project_root).unwrap_or(&file.path).display().to_string();
    let offset = symbol.declaration_span.start.min(source.len());
    let line = source[..offset].bytes().filter(|&b| b == b'\n').count() + 1;
    format!("Defined in {rel}:{line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_analysis::{analyze, AnalysisMode, AnalysisOptions};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn resolve_symbol_finds_declaration_at_its_name_span() {
        let path = PathBuf::from("/proj/main.sg");
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), "let n = 1;".to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let outcome = analyze(&options, &[path.clone()], &overlay);
        let snapshot = outcome.snapshot.unwrap();
        let file = snapshot_file(&snapshot, &path).unwrap();

        let tokens = sg_analysis::token::tokenize(&overlay[&path]);
        let tok = token_for_offset(&tokens, 4).unwrap(); // inside "n"
        assert!(resolve_symbol(file, 4, tok).is_some());
    }
}
