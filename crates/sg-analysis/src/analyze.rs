//! The `analyze(options, files, overlay) -> AnalyzeOutcome` entry point
//! (§3, §10.5): the one opaque function the core invokes. This reference
//! implementation tokenizes and parses `.sg` source into the data model
//! in `model.rs`; it is explicitly not a general `.sg` compiler, only the
//! minimum fixture needed to exercise the core faithfully.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ast::{Expr, Item};
use crate::model::{AnalysisDiagnostic, AnalysisFile, AnalysisSnapshot, DiagnosticSeverity, FileId, ModuleExports};
use crate::parser::parse_items;
use crate::token::tokenize;

/// Which documents the analysis covers (mirrors the Scheduler's
/// `AnalysisScope`, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    ProjectRoot,
    OpenFiles,
}

/// A diagnostic to inject verbatim instead of running real analysis,
/// for deterministic end-to-end tests (§8 scenario 1). Test-only control
/// surface; does not change the `analyze()` contract.
#[derive(Debug, Clone)]
pub struct InjectedDiagnostic {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

/// Inputs to one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub project_root: PathBuf,
    pub mode: AnalysisMode,
    /// `SG_STDLIB_ROOT`, forwarded untouched from the process environment;
    /// this reference implementation has no standard library to resolve
    /// against, so it is carried but never read.
    pub stdlib_root: Option<PathBuf>,
    /// When set, `analyze()` skips real work and returns exactly this
    /// diagnostic against an otherwise-empty snapshot (test hook, §10.5).
    pub inject_diagnostic: Option<InjectedDiagnostic>,
    /// When set, `analyze()` returns this message as a hard error instead
    /// of a snapshot (test hook, §10.5; exercises §8 scenario 2).
    pub inject_error: Option<String>,
}

impl AnalysisOptions {
    pub fn new(project_root: PathBuf, mode: AnalysisMode) -> Self {
        Self { project_root, mode, stdlib_root: None, inject_diagnostic: None, inject_error: None }
    }

    pub fn with_stdlib_root(mut self, stdlib_root: Option<PathBuf>) -> Self {
        self.stdlib_root = stdlib_root;
        self
    }
}

/// Failure reported by an `analyze()` call. The core logs it and leaves
/// `last_good_snapshot` untouched (§7) — it never surfaces as a failed
/// LSP request.
#[derive(Debug, Clone, Error)]
pub enum AnalyzeError {
    #[error("analysis failed: {0}")]
    Failed(String),
}

/// The result of one `analyze()` call: at most one of `snapshot` or
/// `error` is meaningful (§3 `AnalysisSnapshot` lifecycle; §7 Analyzer
/// error handling never touches `last_good_snapshot` on error).
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub snapshot: Option<AnalysisSnapshot>,
    pub diagnostics: Vec<AnalysisDiagnostic>,
    pub error: Option<AnalyzeError>,
}

/// Analyze `files` (canonical paths) using `overlay` for in-memory
/// content that shadows disk. Never panics: a file missing from the
/// overlay is simply skipped (the core only ever calls this with paths
/// whose text it already holds).
pub fn analyze(options: &AnalysisOptions, files: &[PathBuf], overlay: &BTreeMap<PathBuf, String>) -> AnalyzeOutcome {
    if let Some(message) = &options.inject_error {
        return AnalyzeOutcome {
            snapshot: None,
            diagnostics: Vec::new(),
            error: Some(AnalyzeError::Failed(message.clone())),
        };
    }

    let mut snapshot = AnalysisSnapshot::new(options.project_root.clone());

    for (idx, path) in files.iter().enumerate() {
        let Some(text) = overlay.get(path) else { continue };
        let file_id = FileId(idx as u32);
        let mut file = AnalysisFile::new(file_id, path.clone());
        let tokens = tokenize(text);
        let items = parse_items(&tokens, &mut file);
        infer_let_types(&items, &mut file);
        populate_signatures(&items, &mut file);
        link_identifier_expressions(&items, &mut file);
        file.tokens = tokens;
        file.items = items;
        snapshot.insert_file(file);
    }

    collect_module_exports(&mut snapshot);

    let diagnostics = match &options.inject_diagnostic {
        Some(d) => vec![AnalysisDiagnostic {
            path: d.path.clone(),
            line: d.line,
            column: d.column,
            end_line: d.end_line,
            end_column: d.end_column,
            severity: d.severity,
            message: d.message.clone(),
        }],
        None => Vec::new(),
    };

    AnalyzeOutcome { snapshot: Some(snapshot), diagnostics, error: None }
}

/// Literal-initializer type inference for untyped `let` bindings (§4.5.5
/// inlay hints need an inferred type to hint, and §GLOSSARY "obvious
/// literal" suppression needs to know it matches).
fn infer_let_types(items: &[Item], file: &mut AnalysisFile) {
    for item in items {
        let Item::Let(l) = item else { continue };
        if l.type_annotation.is_some() {
            continue;
        }
        let Some(init) = &l.initializer else { continue };
        let inferred = match init {
            Expr::IntLit { .. } => Some("int"),
            Expr::FloatLit { .. } => Some("float"),
            Expr::StringLit { .. } => Some("string"),
            Expr::BoolLit { .. } => Some("bool"),
            _ => None,
        };
        if let Some(key) = inferred {
            if let Some(sym) = file.symbols.get_mut(&l.symbol) {
                sym.type_key = Some(key.to_string());
            }
        }
    }
}

/// Formats a one-line signature for every declared symbol (§4.5.1 hover,
/// §4.5.4 signature help read `Symbol::signature` rather than re-deriving
/// it from the AST on every query).
fn populate_signatures(items: &[Item], file: &mut AnalysisFile) {
    let mut updates = Vec::new();

    for item in items {
        match item {
            Item::Fn(f) => {
                let params = f
                    .params
                    .iter()
                    .map(|p| match &p.type_key {
                        Some(t) => format!("{}: {}", p.name, t),
                        None => p.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let ret = f.return_type.as_deref().map(|r| format!(" -> {r}")).unwrap_or_default();
                updates.push((f.symbol, format!("fn {}({}){}", f.name, params, ret)));
            }
            Item::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|(name, ty)| match ty {
                        Some(t) => format!("{name}: {t}"),
                        None => name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                updates.push((s.symbol, format!("struct {} {{ {} }}", s.name, fields)));
            }
            Item::Enum(e) => {
                let variants = e.variants.iter().map(|v| v.name.as_str()).collect::<Vec<_>>().join(", ");
                updates.push((e.symbol, format!("enum {} {{ {} }}", e.name, variants)));
                for v in &e.variants {
                    updates.push((v.symbol, format!("{}::{}", e.name, v.name)));
                }
            }
            Item::Let(l) => {
                let ty = l.type_annotation.clone().or_else(|| file.symbols.get(&l.symbol).and_then(|s| s.type_key.clone()));
                let sig = match ty {
                    Some(t) => format!("let {}: {}", l.name, t),
                    None => format!("let {}", l.name),
                };
                updates.push((l.symbol, sig));
            }
            Item::Import(_) => {}
        }
    }

    for (id, sig) in updates {
        if let Some(sym) = file.symbols.get_mut(&id) {
            sym.signature = Some(sig);
        }
    }
}

/// Populate `expr_symbols`: for every identifier expression that names a
/// symbol visible at top level (a `let`/`fn`/`enum`/`struct`, or a
/// parameter within its own function), record the resolved symbol id,
/// keyed by the identifier's span start. This backs `resolve_symbol`'s
/// first lookup tier (§4.5 shared helpers).
fn link_identifier_expressions(items: &[Item], file: &mut AnalysisFile) {
    let mut links = Vec::new();
    for item in items {
        match item {
            Item::Let(l) => {
                if let Some(expr) = &l.initializer {
                    collect_ident_links(expr, &[], items, &mut links);
                }
            }
            // Function bodies are skipped as balanced-brace spans (the
            // parser doesn't parse statements yet), so there are no body
            // expressions to link identifiers within.
            _ => {}
        }
    }
    for (offset, sym) in links {
        file.expr_symbols.insert(offset, sym);
    }
}

fn collect_ident_links(
    expr: &Expr,
    local_scope: &[(&str, crate::symbol::SymbolId)],
    items: &[Item],
    out: &mut Vec<(usize, crate::symbol::SymbolId)>,
) {
    match expr {
        Expr::Ident { name, span } => {
            if let Some((_, sym)) = local_scope.iter().find(|(n, _)| n == name) {
                out.push((span.start, *sym));
                return;
            }
            if let Some(sym) = resolve_top_level(items, name) {
                out.push((span.start, sym));
            }
        }
        Expr::Member { base, .. } => collect_ident_links(base, local_scope, items, out),
        Expr::Call { callee, args, .. } => {
            collect_ident_links(callee, local_scope, items, out);
            for arg in args {
                collect_ident_links(arg, local_scope, items, out);
            }
        }
        _ => {}
    }
}

fn resolve_top_level(items: &[Item], name: &str) -> Option<crate::symbol::SymbolId> {
    for item in items {
        let sym = match item {
            Item::Let(l) if l.name == name => Some(l.symbol),
            Item::Enum(e) if e.name == name => Some(e.symbol),
            Item::Fn(f) if f.name == name => Some(f.symbol),
            Item::Struct(s) if s.name == name => Some(s.symbol),
            _ => None,
        };
        if sym.is_some() {
            return sym;
        }
    }
    None
}

/// Builds the module-export map (§3): one module per analyzed file,
/// keyed by its stem (the reference Analyzer's stand-in for a real
/// module-path resolver), exporting its top-level `fn`/`enum`/`struct`
/// declarations.
fn collect_module_exports(snapshot: &mut AnalysisSnapshot) {
    let ids: Vec<FileId> = snapshot.file_ids().collect();
    let mut exports_by_module: BTreeMap<String, ModuleExports> = BTreeMap::new();
    for id in ids {
        let Some(file) = snapshot.file(id) else { continue };
        let module_name = module_name_for(&file.path);
        let entry = exports_by_module.entry(module_name).or_default();
        for item in &file.items {
            let (name, sym) = match item {
                Item::Fn(f) => (f.name.clone(), f.symbol),
                Item::Enum(e) => (e.name.clone(), e.symbol),
                Item::Struct(s) => (s.name.clone(), s.symbol),
                _ => continue,
            };
            entry.symbols.entry(name).or_default().push((id, sym));
        }
    }
    for (name, exports) in exports_by_module {
        snapshot.module_exports.insert(name, exports);
    }
}

fn module_name_for(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("module").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_file(path: &str, text: &str) -> (Vec<PathBuf>, BTreeMap<PathBuf, String>) {
        let p = PathBuf::from(path);
        let mut overlay = BTreeMap::new();
        overlay.insert(p.clone(), text.to_string());
        (vec![p], overlay)
    }

    #[test]
    fn analyze_produces_a_snapshot_with_one_file() {
        let (files, overlay) = one_file("/proj/main.sg", "let x = 1;");
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        let outcome = analyze(&options, &files, &overlay);
        assert!(outcome.error.is_none());
        let snap = outcome.snapshot.unwrap();
        assert_eq!(snap.file_count(), 1);
    }

    #[test]
    fn infers_int_type_for_untyped_literal_let() {
        let (files, overlay) = one_file("/proj/main.sg", "let n = 1;");
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        let outcome = analyze(&options, &files, &overlay);
        let snap = outcome.snapshot.unwrap();
        let file = snap.file_by_path(Path::new("/proj/main.sg")).unwrap();
        let Item::Let(l) = &file.items[0] else { panic!("expected Let") };
        assert_eq!(file.symbol(l.symbol).unwrap().type_key.as_deref(), Some("int"));
    }

    #[test]
    fn injected_error_short_circuits_analysis() {
        let (files, overlay) = one_file("/proj/main.sg", "let n = 1;");
        let mut options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        options.inject_error = Some("boom".to_string());
        let outcome = analyze(&options, &files, &overlay);
        assert!(outcome.snapshot.is_none());
        assert_eq!(outcome.error.map(|e| e.to_string()), Some("analysis failed: boom".to_string()));
    }

    #[test]
    fn injected_diagnostic_is_returned_verbatim() {
        let (files, overlay) = one_file("/proj/main.sg", "let n = 1;");
        let mut options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        options.inject_diagnostic = Some(InjectedDiagnostic {
            path: PathBuf::from("/proj/main.sg"),
            line: 2,
            column: 2,
            end_line: 2,
            end_column: 5,
            severity: DiagnosticSeverity::Error,
            message: "boom".to_string(),
        });
        let outcome = analyze(&options, &files, &overlay);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].message, "boom");
    }

    #[test]
    fn module_exports_expose_top_level_functions() {
        let (files, overlay) = one_file("/proj/math.sg", "fn add(a: int, b: int) -> int { a }");
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        let outcome = analyze(&options, &files, &overlay);
        let snap = outcome.snapshot.unwrap();
        let exports = snap.module_exports.get("math").unwrap();
        assert!(!exports.resolve("add").is_empty());
    }

    #[test]
    fn function_signature_is_formatted_from_params_and_return_type() {
        let (files, overlay) = one_file("/proj/math.sg", "fn add(a: int, b: int) -> int { a }");
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        let outcome = analyze(&options, &files, &overlay);
        let snap = outcome.snapshot.unwrap();
        let file = snap.file_by_path(Path::new("/proj/math.sg")).unwrap();
        let Item::Fn(f) = &file.items[0] else { panic!("expected Fn") };
        assert_eq!(file.symbol(f.symbol).unwrap().signature.as_deref(), Some("fn add(a: int, b: int) -> int"));
    }

    #[test]
    fn missing_overlay_entry_is_skipped_not_panicked() {
        let files = vec![PathBuf::from("/proj/ghost.sg")];
        let overlay = BTreeMap::new();
        let options = AnalysisOptions::new(PathBuf::from("/proj"), AnalysisMode::ProjectRoot);
        let outcome = analyze(&options, &files, &overlay);
        assert_eq!(outcome.snapshot.unwrap().file_count(), 0);
    }
}
