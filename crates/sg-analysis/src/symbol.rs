//! Symbol table types.
//!
//! `SymbolKind` is a closed variant set (§9 design notes): completion
//! kind and detail formatting dispatch on it, so new kinds are never
//! added ad hoc by a query router.

use rustc_hash::FxHashMap;
use sg_position_tracking::ByteSpan;

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Tag,
    Let,
    Const,
    Param,
    Type,
    Contract,
    Module,
}

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub declaration_span: ByteSpan,
    /// Canonical type key (§4.5.6), if statically known at collection time.
    pub type_key: Option<String>,
    /// One-line formatted signature, shown in hover/signature-help.
    pub signature: Option<String>,
}

/// Opaque handle into a file's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// A lexical scope: name → overload set, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    names: FxHashMap<String, Vec<SymbolId>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, id: SymbolId) {
        self.names.entry(name.to_string()).or_default().push(id);
    }

    pub fn lookup(&self, name: &str) -> &[SymbolId] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A chain of lexical scopes, innermost last.
#[derive(Debug, Clone, Default)]
pub struct ScopeChain {
    pub frames: Vec<Scope>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self { frames: vec![Scope::new()] }
    }

    pub fn push(&mut self) {
        self.frames.push(Scope::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn insert(&mut self, name: &str, id: SymbolId) {
        if let Some(top) = self.frames.last_mut() {
            top.insert(name, id);
        }
    }

    /// Resolve `name` starting from the innermost frame outward, returning
    /// the first frame's overload set that defines it (all frames are
    /// enumerable in insertion order within that frame).
    pub fn resolve(&self, name: &str) -> &[SymbolId] {
        for frame in self.frames.iter().rev() {
            let ids = frame.lookup(name);
            if !ids.is_empty() {
                return ids;
            }
        }
        &[]
    }
}
