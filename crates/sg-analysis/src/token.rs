//! Tokenizer for `.sg` source.
//!
//! Minimal but complete enough to drive the query routers: identifiers,
//! numeric/string/bool literals, the punctuation the completion/signature
//! help/folding routers key off of (`{` `}` `(` `)` `.` `::` `:` `->` `,`
//! `;`), and the keywords that introduce declarations.

use sg_position_tracking::ByteSpan;

/// Classification of a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLit,
    FloatLit,
    StringLit,
    BoolLit,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Dot,
    ColonColon,
    Colon,
    Arrow,
    Comma,
    Semicolon,
    Eq,
    KwLet,
    KwEnum,
    KwFn,
    KwStruct,
    KwImport,
    Other,
}

impl TokenKind {
    /// Keywords that introduce a top-level declaration, or `let`.
    pub fn is_type_introducing_keyword(&self) -> bool {
        matches!(self, TokenKind::KwEnum | TokenKind::KwStruct)
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: ByteSpan,
    pub text: String,
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    match word {
        "let" => Some(TokenKind::KwLet),
        "enum" => Some(TokenKind::KwEnum),
        "fn" => Some(TokenKind::KwFn),
        "struct" => Some(TokenKind::KwStruct),
        "import" => Some(TokenKind::KwImport),
        "true" | "false" => Some(TokenKind::BoolLit),
        _ => None,
    }
}

/// Tokenize `.sg` source text into a flat, offset-ordered token list.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut i = 0usize;
    let mut tokens = Vec::new();

    while i < len {
        let c = bytes[i];

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Line comment.
        if c == b'/' && i + 1 < len && bytes[i + 1] == b'/' {
            while i < len && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        // Identifiers and keywords.
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let text = source[start..i].to_string();
            let kind = keyword_kind(&text).unwrap_or(TokenKind::Ident);
            tokens.push(Token { kind, span: ByteSpan::new(start, i), text });
            continue;
        }

        // Numbers.
        if c.is_ascii_digit() {
            let start = i;
            let mut is_float = false;
            while i < len && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < len && bytes[i] == b'.' && i + 1 < len && bytes[i + 1].is_ascii_digit() {
                is_float = true;
                i += 1;
                while i < len && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text = source[start..i].to_string();
            let kind = if is_float { TokenKind::FloatLit } else { TokenKind::IntLit };
            tokens.push(Token { kind, span: ByteSpan::new(start, i), text });
            continue;
        }

        // String literals (no escape processing beyond `\"`).
        if c == b'"' {
            let start = i;
            i += 1;
            while i < len && bytes[i] != b'"' {
                if bytes[i] == b'\\' && i + 1 < len {
                    i += 2;
                } else {
                    i += 1;
                }
            }
            if i < len {
                i += 1; // closing quote
            }
            let text = source[start..i].to_string();
            tokens.push(Token { kind: TokenKind::StringLit, span: ByteSpan::new(start, i), text });
            continue;
        }

        // Multi-char punctuation.
        if c == b':' && i + 1 < len && bytes[i + 1] == b':' {
            tokens.push(Token {
                kind: TokenKind::ColonColon,
                span: ByteSpan::new(i, i + 2),
                text: "::".to_string(),
            });
            i += 2;
            continue;
        }
        if c == b'-' && i + 1 < len && bytes[i + 1] == b'>' {
            tokens.push(Token {
                kind: TokenKind::Arrow,
                span: ByteSpan::new(i, i + 2),
                text: "->".to_string(),
            });
            i += 2;
            continue;
        }

        let single = match c {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'.' => Some(TokenKind::Dot),
            b':' => Some(TokenKind::Colon),
            b',' => Some(TokenKind::Comma),
            b';' => Some(TokenKind::Semicolon),
            b'=' => Some(TokenKind::Eq),
            _ => None,
        };

        if let Some(kind) = single {
            tokens.push(Token {
                kind,
                span: ByteSpan::new(i, i + 1),
                text: (c as char).to_string(),
            });
            i += 1;
            continue;
        }

        // Unrecognized byte: emit as Other and move on, never fail the tokenizer.
        let start = i;
        i += 1;
        tokens.push(Token {
            kind: TokenKind::Other,
            span: ByteSpan::new(start, i),
            text: source[start..i].to_string(),
        });
    }

    tokens
}

/// Binary search for the token covering `offset`, or the immediately
/// preceding token when `offset == token.end` (§4.5 shared helper).
pub fn token_at_offset(tokens: &[Token], offset: usize) -> Option<&Token> {
    let idx = tokens.partition_point(|t| t.span.end <= offset);
    if idx < tokens.len() && tokens[idx].span.contains(offset) {
        return Some(&tokens[idx]);
    }
    if idx > 0 && tokens[idx - 1].span.end == offset {
        return Some(&tokens[idx - 1]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_let_binding() {
        let toks = tokenize("let n = 1;");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwLet,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLit,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn tokenizes_enum_with_double_colon() {
        let toks = tokenize("Color::");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[1].kind, TokenKind::ColonColon);
    }

    #[test]
    fn token_at_offset_hits_trailing_edge() {
        let toks = tokenize("abc");
        // offset 3 is one past 'c' (the identifier's end) -- should still resolve to it.
        let tok = token_at_offset(&toks, 3).unwrap();
        assert_eq!(tok.text, "abc");
    }

    #[test]
    fn token_at_offset_none_in_whitespace_gap_past_end() {
        let toks = tokenize("abc");
        assert!(token_at_offset(&toks, 10).is_none());
    }
}
