//! Minimal AST for `.sg` source: top-level items plus the small
//! expression grammar the query routers need (literals, identifiers,
//! member access, calls).

use crate::symbol::SymbolId;
use sg_position_tracking::ByteSpan;

/// An expression node. Kept intentionally small: this reference
/// implementation only parses the forms the spec's test scenarios and
/// query routers exercise (call targets, member chains, literals).
#[derive(Debug, Clone)]
pub enum Expr {
    Ident { name: String, span: ByteSpan },
    IntLit { value: i64, span: ByteSpan },
    FloatLit { value: f64, span: ByteSpan },
    StringLit { value: String, span: ByteSpan },
    BoolLit { value: bool, span: ByteSpan },
    /// `base.name` or `base::name`.
    Member { base: Box<Expr>, name: String, is_static: bool, span: ByteSpan },
    /// `callee(args...)`.
    Call { callee: Box<Expr>, args: Vec<Expr>, arg_commas: Vec<ByteSpan>, span: ByteSpan },
}

impl Expr {
    pub fn span(&self) -> ByteSpan {
        match self {
            Expr::Ident { span, .. }
            | Expr::IntLit { span, .. }
            | Expr::FloatLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::BoolLit { span, .. }
            | Expr::Member { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }

    /// Smallest node whose span contains `offset`, preferring the deepest
    /// match (§4.5 `expression_at_offset`). `skip_ident` asks for the
    /// enclosing non-identifier context instead of a bare identifier leaf.
    pub fn smallest_containing<'a>(&'a self, offset: usize, skip_ident: bool) -> Option<&'a Expr> {
        if !self.span().contains_span(ByteSpan::new(offset, offset)) {
            return None;
        }
        let children: Vec<&Expr> = match self {
            Expr::Member { base, .. } => vec![base.as_ref()],
            Expr::Call { callee, args, .. } => {
                let mut v = vec![callee.as_ref()];
                v.extend(args.iter());
                v
            }
            _ => vec![],
        };
        for child in children {
            if let Some(found) = child.smallest_containing(offset, skip_ident) {
                return Some(found);
            }
        }
        if skip_ident && matches!(self, Expr::Ident { .. }) {
            return None;
        }
        Some(self)
    }

    /// True if this expression is an "obvious literal" of its own type
    /// (§4.5.5, §GLOSSARY): integer/float/string/bool literal whose
    /// surface form already implies the type.
    pub fn is_obvious_literal(&self) -> bool {
        matches!(
            self,
            Expr::IntLit { .. } | Expr::FloatLit { .. } | Expr::StringLit { .. } | Expr::BoolLit { .. }
        )
    }
}

/// A `let` binding.
#[derive(Debug, Clone)]
pub struct LetItem {
    pub name: String,
    pub name_span: ByteSpan,
    pub symbol: SymbolId,
    pub type_annotation: Option<String>,
    pub type_span: Option<ByteSpan>,
    pub initializer: Option<Expr>,
    pub span: ByteSpan,
    /// Span of the terminating `;`, where default-init hints are placed.
    pub semicolon_span: ByteSpan,
}

/// An enum variant, with an explicit or implicit integer value.
#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    pub name_span: ByteSpan,
    pub symbol: SymbolId,
    pub explicit_value: Option<i64>,
    /// Position immediately after the variant name, where an implicit
    /// value hint is placed when `explicit_value` is `None`.
    pub value_hint_pos: usize,
}

/// An `enum` declaration.
#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: String,
    pub symbol: SymbolId,
    pub variants: Vec<EnumVariant>,
    pub span: ByteSpan,
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_key: Option<String>,
    pub symbol: SymbolId,
}

/// A `fn` declaration.
#[derive(Debug, Clone)]
pub struct FnItem {
    pub name: String,
    pub symbol: SymbolId,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub receiver_type_key: Option<String>,
    pub span: ByteSpan,
}

/// A `struct` declaration.
#[derive(Debug, Clone)]
pub struct StructItem {
    pub name: String,
    pub symbol: SymbolId,
    pub fields: Vec<(String, Option<String>)>,
    pub span: ByteSpan,
}

/// An `import` declaration.
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub module_path: String,
    pub span: ByteSpan,
}

/// Top-level item.
#[derive(Debug, Clone)]
pub enum Item {
    Let(LetItem),
    Enum(EnumItem),
    Fn(FnItem),
    Struct(StructItem),
    Import(ImportItem),
}

impl Item {
    pub fn span(&self) -> ByteSpan {
        match self {
            Item::Let(l) => l.span,
            Item::Enum(e) => e.span,
            Item::Fn(f) => f.span,
            Item::Struct(s) => s.span,
            Item::Import(i) => i.span,
        }
    }
}
