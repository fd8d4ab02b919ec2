//! §4.5.7 Folding.

use lsp_types::{FoldingRange, FoldingRangeKind};

use sg_analysis::token::TokenKind;

use super::shared::QueryContext;

/// Answers `textDocument/foldingRange`: one fold per matched `{`/`}`
/// pair, tracked with a stack, spanning from the `{`'s line to the
/// matching `}`'s line. Single-line pairs are excluded.
pub fn folding_ranges(ctx: &QueryContext<'_>) -> Vec<FoldingRange> {
    let Some(file) = ctx.file() else { return Vec::new() };
    let mut stack = Vec::new();
    let mut ranges = Vec::new();

    for tok in &file.tokens {
        match tok.kind {
            TokenKind::LBrace => stack.push(tok.span.start),
            TokenKind::RBrace => {
                if let Some(open_offset) = stack.pop() {
                    let (start_line, _) = ctx.cache.offset_to_position(ctx.source, open_offset);
                    let (end_line, _) = ctx.cache.offset_to_position(ctx.source, tok.span.start);
                    if start_line != end_line {
                        ranges.push(FoldingRange {
                            start_line,
                            start_character: None,
                            end_line,
                            end_character: None,
                            kind: Some(FoldingRangeKind::Region),
                            collapsed_text: None,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_analysis::{analyze, AnalysisMode, AnalysisOptions};
    use sg_position_tracking::LineStartsCache;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn multiline_brace_pair_folds() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "fn f() {\n  let x = 1;\n}";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let project_root = PathBuf::from("/proj");
        let ctx = QueryContext { snapshot: &snapshot, project_root: &project_root, path: &path, source, cache: &cache };

        let ranges = folding_ranges(&ctx);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_line, 0);
        assert_eq!(ranges[0].end_line, 2);
    }

    #[test]
    fn single_line_brace_pair_does_not_fold() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "fn f() { let x = 1; }";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let project_root = PathBuf::from("/proj");
        let ctx = QueryContext { snapshot: &snapshot, project_root: &project_root, path: &path, source, cache: &cache };

        assert!(folding_ranges(&ctx).is_empty());
    }
}
