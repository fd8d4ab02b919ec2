//! Reference Analyzer for `.sg` source (§10.5 of the sg-lsp spec).
//!
//! This crate is explicitly not a general `.sg` compiler: it is the
//! minimum tokenizer/parser/symbol-table fixture needed to satisfy the
//! core's opaque `analyze(options, files, overlay) -> AnalyzeOutcome`
//! contract and drive every end-to-end scenario the core is tested
//! against. The core (`sg-lsp`) never depends on any internal detail
//! beyond the types re-exported here.

pub mod analyze;
pub mod ast;
pub mod model;
pub mod parser;
pub mod symbol;
pub mod token;
pub mod type_key;

pub use analyze::{analyze, AnalysisMode, AnalysisOptions, AnalyzeError, AnalyzeOutcome, InjectedDiagnostic};
pub use model::{AnalysisDiagnostic, AnalysisFile, AnalysisSnapshot, DiagnosticSeverity, FileId, ModuleExports, SharedSnapshot};
pub use symbol::{Scope, ScopeChain, Symbol, SymbolId, SymbolKind};
pub use token::{token_at_offset, tokenize, Token, TokenKind};
