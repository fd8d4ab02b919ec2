//! §4.5.2 Go-to-Definition.

use lsp_types::Location;

use super::shared::{token_for_offset, QueryContext};
use crate::convert::position::span_to_range;
use crate::util::uri::path_to_uri;

/// Answers `textDocument/definition`. Per §4.5.2, an empty vector unless
/// the cursor sits on an identifier that resolves to a symbol with a
/// non-empty declaration span.
pub fn definition(ctx: &QueryContext<'_>, position: lsp_types::Position) -> Vec<Location> {
    let Some(file) = ctx.file() else { return Vec::new() };
    let offset = ctx.offset_for(position);
    let Some(token) = token_for_offset(&file.tokens, offset) else { return Vec::new() };
    if token.kind != sg_analysis::TokenKind::Ident {
        return Vec::new();
    }
    let Some(symbol_id) = super::shared::resolve_symbol(file, offset, token) else { return Vec::new() };
    let Some(symbol) = file.symbol(symbol_id) else { return Vec::new() };
    if symbol.declaration_span.is_empty() {
        return Vec::new();
    }

    let Some(uri) = path_to_uri(&file.path) else { return Vec::new() };
    vec![Location { uri, range: span_to_range(ctx.source, ctx.cache, symbol.declaration_span) }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_analysis::{analyze, AnalysisMode, AnalysisOptions};
    use sg_position_tracking::LineStartsCache;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn definition_on_usage_resolves_to_declaration() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "let n = 1;\nlet m = n;";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let ctx = QueryContext { snapshot: &snapshot, project_root: &PathBuf::from("/proj"), path: &path, source, cache: &cache };

        // "n" on the right-hand side of the second `let`.
        let locations = definition(&ctx, lsp_types::Position { line: 1, character: 8 });
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn definition_off_an_identifier_is_empty() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "let n = 1;";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let ctx = QueryContext { snapshot: &snapshot, project_root: &PathBuf::from("/proj"), path: &path, source, cache: &cache };

        assert!(definition(&ctx, lsp_types::Position { line: 0, character: 6 }).is_empty());
    }
}
