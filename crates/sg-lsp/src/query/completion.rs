//! §4.5.3 Completion.
//!
//! Trigger classification follows the spec's branching order exactly;
//! candidate gathering is necessarily shallower than a real type checker
//! since this reference Analyzer tracks canonical type keys but never
//! runs full inference (see the crate-level note in `sg-analysis`).

use lsp_types::{CompletionItem, CompletionItemKind};

use sg_analysis::ast::Item;
use sg_analysis::token::{Token, TokenKind};
use sg_analysis::{type_key, AnalysisFile, SymbolKind};

use super::shared::QueryContext;

fn completion_kind(kind: SymbolKind) -> CompletionItemKind {
    match kind {
        SymbolKind::Function => CompletionItemKind::FUNCTION,
        SymbolKind::Tag => CompletionItemKind::ENUM_MEMBER,
        SymbolKind::Let => CompletionItemKind::VARIABLE,
        SymbolKind::Const => CompletionItemKind::CONSTANT,
        SymbolKind::Param => CompletionItemKind::VARIABLE,
        SymbolKind::Type => CompletionItemKind::STRUCT,
        SymbolKind::Contract => CompletionItemKind::INTERFACE,
        SymbolKind::Module => CompletionItemKind::MODULE,
    }
}

/// `sort_text` prefixes a priority digit so the client's lexicographic
/// sort reproduces proximity-first ordering (§4.5.3): `0` for items in
/// the current file, `1` for everything else.
fn item(label: &str, kind: CompletionItemKind, detail: Option<String>, priority: u8) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        detail,
        sort_text: Some(format!("{priority}{label}")),
        ..Default::default()
    }
}

fn preceding_token<'a>(tokens: &'a [Token], offset: usize) -> Option<&'a Token> {
    let idx = tokens.partition_point(|t| t.span.end <= offset);
    idx.checked_sub(1).and_then(|i| tokens.get(i))
}

/// Finds the enclosing `import ...` form, if the cursor sits inside one:
/// scans backward from `offset` across non-`;` tokens until `import` is
/// found. Returns the tokens between `import` and `offset`.
fn import_form_tokens(tokens: &[Token], offset: usize) -> Option<&[Token]> {
    let upto = tokens.partition_point(|t| t.span.start < offset);
    let mut start = upto;
    while start > 0 {
        start -= 1;
        match tokens[start].kind {
            TokenKind::Semicolon => return None,
            TokenKind::KwImport => return Some(&tokens[start + 1..upto]),
            _ => {}
        }
    }
    None
}

fn module_completions(file: &AnalysisFile) -> Vec<CompletionItem> {
    // This reference Analyzer has no cross-file module graph beyond
    // per-file exports collected at analysis time, so module-path
    // completion offers the current file's own module name as the only
    // concretely known candidate.
    let name = file.path.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
    vec![item(name, CompletionItemKind::MODULE, None, 0)]
}

fn exported_member_completions(ctx: &QueryContext<'_>, module_path: &str) -> Vec<CompletionItem> {
    let Some(exports) = ctx.snapshot.module_exports.get(module_path) else { return Vec::new() };
    let mut items = Vec::new();
    for (name, entries) in &exports.symbols {
        for (file_id, sym_id) in entries {
            let Some(file) = ctx.snapshot.file(*file_id) else { continue };
            let Some(symbol) = file.symbol(*sym_id) else { continue };
            items.push(item(name, completion_kind(symbol.kind), symbol.signature.clone(), 0));
        }
    }
    items
}

fn type_kind_symbols(ctx: &QueryContext<'_>) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for file_id in ctx.snapshot.file_ids() {
        let Some(file) = ctx.snapshot.file(file_id) else { continue };
        for symbol in file.symbols.values() {
            if matches!(symbol.kind, SymbolKind::Type | SymbolKind::Contract | SymbolKind::Tag) {
                let priority = if file.path == ctx.path { 0 } else { 1 };
                items.push(item(&symbol.name, completion_kind(symbol.kind), symbol.signature.clone(), priority));
            }
        }
    }
    items
}

/// Struct fields and instance methods whose receiver key matches any
/// candidate key of `receiver_key` (§4.5.6).
fn member_completions(ctx: &QueryContext<'_>, receiver_key: &str) -> Vec<CompletionItem> {
    let candidates = type_key::candidate_keys(receiver_key);
    let mut items = Vec::new();

    for file_id in ctx.snapshot.file_ids() {
        let Some(file) = ctx.snapshot.file(file_id) else { continue };
        for it in &file.items {
            match it {
                Item::Struct(s) if candidates.iter().any(|c| type_key::keys_match(c, &s.name)) => {
                    for (fname, ftype) in &s.fields {
                        let detail = ftype.clone();
                        items.push(item(fname, CompletionItemKind::FIELD, detail, 0));
                    }
                }
                Item::Fn(f) => {
                    if let Some(receiver) = &f.receiver_type_key {
                        if candidates.iter().any(|c| type_key::keys_match(c, receiver)) {
                            items.push(item(&f.name, CompletionItemKind::METHOD, file.symbol(f.symbol).and_then(|s| s.signature.clone()), 0));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    items
}

fn static_completions(ctx: &QueryContext<'_>, base_name: &str) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for file_id in ctx.snapshot.file_ids() {
        let Some(file) = ctx.snapshot.file(file_id) else { continue };
        for it in &file.items {
            if let Item::Enum(e) = it {
                if e.name == base_name {
                    for variant in &e.variants {
                        items.push(item(&variant.name, CompletionItemKind::ENUM_MEMBER, Some(format!("{}::{}", e.name, variant.name)), 0));
                    }
                }
            }
            if let Item::Fn(f) = it {
                if f.receiver_type_key.as_deref() == Some(base_name) {
                    items.push(item(&f.name, CompletionItemKind::FUNCTION, file.symbol(f.symbol).and_then(|s| s.signature.clone()), 0));
                }
            }
        }
    }
    if let Some(exports) = ctx.snapshot.module_exports.get(base_name) {
        for (name, entries) in &exports.symbols {
            for (file_id, sym_id) in entries {
                let Some(file) = ctx.snapshot.file(*file_id) else { continue };
                let Some(symbol) = file.symbol(*sym_id) else { continue };
                items.push(item(name, completion_kind(symbol.kind), symbol.signature.clone(), 0));
            }
        }
    }
    items
}

fn general_completions(ctx: &QueryContext<'_>, file: &AnalysisFile) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for it in &file.items {
        let (name, sym) = match it {
            Item::Let(l) => (l.name.as_str(), l.symbol),
            Item::Enum(e) => (e.name.as_str(), e.symbol),
            Item::Fn(f) => (f.name.as_str(), f.symbol),
            Item::Struct(s) => (s.name.as_str(), s.symbol),
            Item::Import(_) => continue,
        };
        if let Some(symbol) = file.symbol(sym) {
            items.push(item(name, completion_kind(symbol.kind), symbol.signature.clone(), 0));
        }
    }
    for file_id in ctx.snapshot.file_ids() {
        if ctx.snapshot.file(file_id).map(|f| f.path == ctx.path).unwrap_or(true) {
            continue;
        }
        let Some(other) = ctx.snapshot.file(file_id) else { continue };
        for it in &other.items {
            let (name, sym) = match it {
                Item::Fn(f) => (f.name.as_str(), f.symbol),
                Item::Struct(s) => (s.name.as_str(), s.symbol),
                Item::Enum(e) => (e.name.as_str(), e.symbol),
                _ => continue,
            };
            if let Some(symbol) = other.symbol(sym) {
                items.push(item(name, completion_kind(symbol.kind), symbol.signature.clone(), 1));
            }
        }
    }
    items
}

/// Answers `textDocument/completion`.
pub fn completion(ctx: &QueryContext<'_>, position: lsp_types::Position) -> Vec<CompletionItem> {
    let Some(file) = ctx.file() else { return Vec::new() };
    let offset = ctx.offset_for(position);

    if let Some(import_tokens) = import_form_tokens(&file.tokens, offset) {
        if let Some(colon_colon_idx) = import_tokens.iter().position(|t| t.kind == TokenKind::ColonColon) {
            let module_path: String = import_tokens[..colon_colon_idx].iter().map(|t| t.text.as_str()).collect();
            return exported_member_completions(ctx, &module_path);
        }
        return module_completions(file);
    }

    match preceding_token(&file.tokens, offset).map(|t| &t.kind) {
        Some(TokenKind::Dot) => {
            let Some(dot_idx) = file.tokens.iter().rposition(|t| t.kind == TokenKind::Dot && t.span.end <= offset) else {
                return Vec::new();
            };
            let Some(receiver_tok) = dot_idx.checked_sub(1).and_then(|i| file.tokens.get(i)) else { return Vec::new() };
            let Some(symbol_id) = super::shared::resolve_symbol(file, receiver_tok.span.start, receiver_tok) else {
                return Vec::new();
            };
            let Some(symbol) = file.symbol(symbol_id) else { return Vec::new() };
            let Some(receiver_key) = &symbol.type_key else { return Vec::new() };
            member_completions(ctx, receiver_key)
        }
        Some(TokenKind::ColonColon) => {
            let Some(cc_idx) = file.tokens.iter().rposition(|t| t.kind == TokenKind::ColonColon && t.span.end <= offset) else {
                return Vec::new();
            };
            let Some(base_tok) = cc_idx.checked_sub(1).and_then(|i| file.tokens.get(i)) else { return Vec::new() };
            static_completions(ctx, &base_tok.text)
        }
        Some(TokenKind::Colon) | Some(TokenKind::Arrow) => type_kind_symbols(ctx),
        Some(kind) if kind.is_type_introducing_keyword() => type_kind_symbols(ctx),
        _ => general_completions(ctx, file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_analysis::{analyze, AnalysisMode, AnalysisOptions};
    use sg_position_tracking::LineStartsCache;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn ctx_for<'a>(
        path: &'a PathBuf,
        source: &'a str,
        snapshot: &'a sg_analysis::AnalysisSnapshot,
        cache: &'a LineStartsCache,
        project_root: &'a PathBuf,
    ) -> QueryContext<'a> {
        QueryContext { snapshot, project_root, path, source, cache }
    }

    #[test]
    fn general_completions_list_top_level_symbols() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "let n = 1;\nlet m = ";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let project_root = PathBuf::from("/proj");
        let ctx = ctx_for(&path, source, &snapshot, &cache, &project_root);

        let items = completion(&ctx, lsp_types::Position { line: 1, character: 8 });
        assert!(items.iter().any(|i| i.label == "n"));
    }

    #[test]
    fn colon_colon_on_enum_lists_variants() {
        let path = PathBuf::from("/proj/main.sg");
        let source = "enum Color { Red, Green }\nlet c = Color::";
        let mut overlay = BTreeMap::new();
        overlay.insert(path.clone(), source.to_string());
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::OpenFiles);
        let snapshot = analyze(&options, &[path.clone()], &overlay).snapshot.unwrap();
        let cache = LineStartsCache::new(source);
        let project_root = PathBuf::from("/proj");
        let ctx = ctx_for(&path, source, &snapshot, &cache, &project_root);

        let offset_line = 1;
        let col = "let c = Color::".len() as u32;
        let items = completion(&ctx, lsp_types::Position { line: offset_line, character: col });
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"Red"));
        assert!(labels.contains(&"Green"));
        for name in ["Red", "Green"] {
            let item = items.iter().find(|i| i.label == name).unwrap();
            assert_eq!(item.kind, Some(CompletionItemKind::ENUM_MEMBER));
        }
    }
}
