//! Top-level item parser: turns a token stream into the `Item` list plus
//! a populated `AnalysisFile` symbol table.
//!
//! Recursive-descent over a flat token slice. Recovers from malformed
//! input the same way the tokenizer does: skip to the next token that
//! looks like the start of a new top-level item rather than aborting.

use sg_position_tracking::ByteSpan;

use crate::ast::{EnumItem, EnumVariant, Expr, FnItem, ImportItem, Item, LetItem, Param, StructItem};
use crate::model::AnalysisFile;
use crate::symbol::{Symbol, SymbolKind};
use crate::token::{Token, TokenKind};

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a mut AnalysisFile,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Skip forward until a token that plausibly starts a new item, so one
    /// malformed declaration doesn't poison the rest of the file.
    fn recover(&mut self) {
        self.pos += 1;
        while let Some(tok) = self.peek() {
            if matches!(
                tok.kind,
                TokenKind::KwLet | TokenKind::KwEnum | TokenKind::KwFn | TokenKind::KwStruct | TokenKind::KwImport
            ) {
                return;
            }
            self.pos += 1;
        }
    }

    fn declare(&mut self, name: &str, kind: SymbolKind, span: ByteSpan, type_key: Option<String>, signature: Option<String>) -> crate::symbol::SymbolId {
        let id = self.file.fresh_symbol_id();
        self.file.symbols.insert(
            id,
            Symbol { id, name: name.to_string(), kind, declaration_span: span, type_key, signature },
        );
        id
    }

    fn parse_item(&mut self) -> Option<Item> {
        match self.peek_kind()? {
            TokenKind::KwLet => self.parse_let(),
            TokenKind::KwEnum => self.parse_enum(),
            TokenKind::KwFn => self.parse_fn(),
            TokenKind::KwStruct => self.parse_struct(),
            TokenKind::KwImport => self.parse_import(),
            _ => {
                self.recover();
                None
            }
        }
    }

    fn parse_let(&mut self) -> Option<Item> {
        let start = self.advance()?.span.start; // `let`
        let name_tok = self.peek()?;
        if name_tok.kind != TokenKind::Ident {
            self.recover();
            return None;
        }
        let name = name_tok.text.clone();
        let name_span = name_tok.span;
        self.advance();

        let mut type_annotation = None;
        let mut type_span = None;
        if matches!(self.peek_kind(), Some(TokenKind::Colon)) {
            self.advance();
            if let Some(tok) = self.peek() {
                if tok.kind == TokenKind::Ident {
                    type_annotation = Some(tok.text.clone());
                    type_span = Some(tok.span);
                    self.advance();
                }
            }
        }

        let mut initializer = None;
        if matches!(self.peek_kind(), Some(TokenKind::Eq)) {
            self.advance();
            initializer = self.parse_expr();
        }

        let semicolon_span = if matches!(self.peek_kind(), Some(TokenKind::Semicolon)) {
            let span = self.peek().map(|t| t.span).unwrap_or(ByteSpan::empty(start));
            self.advance();
            span
        } else {
            ByteSpan::empty(self.peek().map(|t| t.span.start).unwrap_or(start))
        };

        let end = semicolon_span.end;
        let span = ByteSpan::new(start, end.max(start));
        let symbol = self.declare(&name, SymbolKind::Let, name_span, type_annotation.clone(), None);

        Some(Item::Let(LetItem { name, name_span, symbol, type_annotation, type_span, initializer, span, semicolon_span }))
    }

    fn parse_enum(&mut self) -> Option<Item> {
        let start = self.advance()?.span.start; // `enum`
        let name_tok = self.peek()?;
        if name_tok.kind != TokenKind::Ident {
            self.recover();
            return None;
        }
        let name = name_tok.text.clone();
        let name_span = name_tok.span;
        self.advance();

        let enum_symbol = self.declare(&name, SymbolKind::Type, name_span, None, None);

        let mut variants = Vec::new();
        let mut end = name_span.end;
        if matches!(self.peek_kind(), Some(TokenKind::LBrace)) {
            self.advance();
            while let Some(tok) = self.peek() {
                if tok.kind == TokenKind::RBrace {
                    end = tok.span.end;
                    self.advance();
                    break;
                }
                if tok.kind != TokenKind::Ident {
                    self.advance();
                    continue;
                }
                let vname = tok.text.clone();
                let vspan = tok.span;
                let mut value_hint_pos = vspan.end;
                self.advance();
                let mut explicit_value = None;
                if matches!(self.peek_kind(), Some(TokenKind::Eq)) {
                    self.advance();
                    if let Some(lit) = self.peek() {
                        if lit.kind == TokenKind::IntLit {
                            explicit_value = lit.text.parse::<i64>().ok();
                            self.advance();
                        }
                    }
                } else {
                    value_hint_pos = vspan.end;
                }
                let vsym = self.declare(&vname, SymbolKind::Const, vspan, Some(name.clone()), None);
                variants.push(EnumVariant { name: vname, name_span: vspan, symbol: vsym, explicit_value, value_hint_pos });
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                }
            }
        }

        Some(Item::Enum(EnumItem { name, symbol: enum_symbol, variants, span: ByteSpan::new(start, end) }))
    }

    fn parse_fn(&mut self) -> Option<Item> {
        let start = self.advance()?.span.start; // `fn`
        let name_tok = self.peek()?;
        if name_tok.kind != TokenKind::Ident {
            self.recover();
            return None;
        }
        let name = name_tok.text.clone();
        let name_span = name_tok.span;
        self.advance();

        let fn_symbol = self.declare(&name, SymbolKind::Function, name_span, None, None);

        let mut params = Vec::new();
        let mut receiver_type_key = None;
        if matches!(self.peek_kind(), Some(TokenKind::LParen)) {
            self.advance();
            let mut first = true;
            while let Some(tok) = self.peek() {
                if tok.kind == TokenKind::RParen {
                    self.advance();
                    break;
                }
                if tok.kind != TokenKind::Ident {
                    self.advance();
                    continue;
                }
                let pname = tok.text.clone();
                let pspan = tok.span;
                self.advance();
                let mut type_key = None;
                if matches!(self.peek_kind(), Some(TokenKind::Colon)) {
                    self.advance();
                    if let Some(t) = self.peek() {
                        if t.kind == TokenKind::Ident {
                            type_key = Some(t.text.clone());
                            self.advance();
                        }
                    }
                }
                if first && pname == "self" {
                    receiver_type_key = type_key.clone();
                }
                first = false;
                let psym = self.declare(&pname, SymbolKind::Param, pspan, type_key.clone(), None);
                params.push(Param { name: pname, type_key, symbol: psym });
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                }
            }
        }

        let mut return_type = None;
        if matches!(self.peek_kind(), Some(TokenKind::Arrow)) {
            self.advance();
            if let Some(t) = self.peek() {
                if t.kind == TokenKind::Ident {
                    return_type = Some(t.text.clone());
                    self.advance();
                }
            }
        }

        let end = self.skip_balanced_body(name_span.end);

        Some(Item::Fn(FnItem { name, symbol: fn_symbol, params, return_type, receiver_type_key, span: ByteSpan::new(start, end) }))
    }

    fn parse_struct(&mut self) -> Option<Item> {
        let start = self.advance()?.span.start; // `struct`
        let name_tok = self.peek()?;
        if name_tok.kind != TokenKind::Ident {
            self.recover();
            return None;
        }
        let name = name_tok.text.clone();
        let name_span = name_tok.span;
        self.advance();

        let struct_symbol = self.declare(&name, SymbolKind::Type, name_span, None, None);

        let mut fields = Vec::new();
        let mut end = name_span.end;
        if matches!(self.peek_kind(), Some(TokenKind::LBrace)) {
            self.advance();
            while let Some(tok) = self.peek() {
                if tok.kind == TokenKind::RBrace {
                    end = tok.span.end;
                    self.advance();
                    break;
                }
                if tok.kind != TokenKind::Ident {
                    self.advance();
                    continue;
                }
                let fname = tok.text.clone();
                self.advance();
                let mut ftype = None;
                if matches!(self.peek_kind(), Some(TokenKind::Colon)) {
                    self.advance();
                    if let Some(t) = self.peek() {
                        if t.kind == TokenKind::Ident {
                            ftype = Some(t.text.clone());
                            self.advance();
                        }
                    }
                }
                fields.push((fname, ftype));
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                }
            }
        }

        Some(Item::Struct(StructItem { name, symbol: struct_symbol, fields, span: ByteSpan::new(start, end) }))
    }

    fn parse_import(&mut self) -> Option<Item> {
        let start = self.advance()?.span.start; // `import`
        let mut path_parts = Vec::new();
        let mut end = start;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Ident => {
                    path_parts.push(tok.text.clone());
                    end = tok.span.end;
                    self.advance();
                }
                TokenKind::ColonColon => {
                    end = tok.span.end;
                    self.advance();
                }
                TokenKind::Semicolon => {
                    end = tok.span.end;
                    self.advance();
                    break;
                }
                _ => break,
            }
        }
        Some(Item::Import(ImportItem { module_path: path_parts.join("::"), span: ByteSpan::new(start, end) }))
    }

    /// Skip a `{ ... }` body if present, tracking brace depth; returns the
    /// end offset of the item (body close, or `fallback` if there's no body).
    fn skip_balanced_body(&mut self, fallback: usize) -> usize {
        if !matches!(self.peek_kind(), Some(TokenKind::LBrace)) {
            if matches!(self.peek_kind(), Some(TokenKind::Semicolon)) {
                let end = self.peek().map(|t| t.span.end).unwrap_or(fallback);
                self.advance();
                return end;
            }
            return fallback;
        }
        let mut depth = 0i32;
        let mut end = fallback;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            end = tok.span.end;
            self.advance();
            if depth == 0 {
                break;
            }
        }
        end
    }

    /// A small expression grammar: identifier/literal primaries, then any
    /// chain of `.name`, `::name`, and `(args)` suffixes.
    fn parse_expr(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) | Some(TokenKind::ColonColon) => {
                    let is_static = matches!(self.peek_kind(), Some(TokenKind::ColonColon));
                    self.advance();
                    let name_tok = self.peek()?;
                    if name_tok.kind != TokenKind::Ident {
                        break;
                    }
                    let name = name_tok.text.clone();
                    let name_end = name_tok.span.end;
                    self.advance();
                    let span = ByteSpan::new(expr.span().start, name_end);
                    expr = Expr::Member { base: Box::new(expr), name, is_static, span };
                }
                Some(TokenKind::LParen) => {
                    self.advance();
                    let mut args = Vec::new();
                    let mut arg_commas = Vec::new();
                    while let Some(tok) = self.peek() {
                        if tok.kind == TokenKind::RParen {
                            break;
                        }
                        if let Some(arg) = self.parse_expr() {
                            args.push(arg);
                        } else {
                            self.advance();
                        }
                        if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                            arg_commas.push(self.peek().map(|t| t.span).unwrap_or(ByteSpan::empty(0)));
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    let end = if matches!(self.peek_kind(), Some(TokenKind::RParen)) {
                        let e = self.peek().map(|t| t.span.end).unwrap_or(expr.span().end);
                        self.advance();
                        e
                    } else {
                        expr.span().end
                    };
                    let span = ByteSpan::new(expr.span().start, end);
                    expr = Expr::Call { callee: Box::new(expr), args, arg_commas, span };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokenKind::Ident => {
                self.advance();
                Some(Expr::Ident { name: tok.text, span: tok.span })
            }
            TokenKind::IntLit => {
                self.advance();
                Some(Expr::IntLit { value: tok.text.parse().unwrap_or(0), span: tok.span })
            }
            TokenKind::FloatLit => {
                self.advance();
                Some(Expr::FloatLit { value: tok.text.parse().unwrap_or(0.0), span: tok.span })
            }
            TokenKind::StringLit => {
                self.advance();
                let value = tok.text.trim_matches('"').to_string();
                Some(Expr::StringLit { value, span: tok.span })
            }
            TokenKind::BoolLit => {
                self.advance();
                Some(Expr::BoolLit { value: tok.text == "true", span: tok.span })
            }
            _ => None,
        }
    }
}

/// Parse a full token stream into top-level items, populating `file`'s
/// symbol table as a side effect.
pub fn parse_items(tokens: &[Token], file: &mut AnalysisFile) -> Vec<Item> {
    let mut parser = Parser { tokens, pos: 0, file };
    let mut items = Vec::new();
    while !parser.at_end() {
        if let Some(item) = parser.parse_item() {
            items.push(item);
        }
    }
    items
}
