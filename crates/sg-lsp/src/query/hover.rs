//! §4.5.1 Hover.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

use sg_position_tracking::ByteSpan;

use super::shared::{defined_in_line, expression_at_offset, format_signature, token_for_offset, type_label_for_expr, QueryContext};
use crate::convert::position::span_to_range;

/// Answers `textDocument/hover`. Returns `None` when the cursor isn't on
/// an identifier with anything to say.
pub fn hover(ctx: &QueryContext<'_>, position: lsp_types::Position) -> Option<Hover> {
    let file = ctx.file()?;
    let offset = ctx.offset_for(position);
    let token = token_for_offset(&file.tokens, offset)?;

    let mut lines = Vec::new();
    let mut range_span: Option<ByteSpan> = None;

    let resolved_symbol = if token.kind == sg_analysis::TokenKind::Ident {
        super::shared::resolve_symbol(file, offset, token)
    } else {
        None
    };

    if let Some(id) = resolved_symbol {
        if let Some(symbol) = file.symbol(id) {
            lines.push(format!("```\n{}\n```", format_signature(symbol)));
            lines.push(defined_in_line(ctx.project_root, file, symbol, ctx.source));
            range_span = Some(token.span);
        }
    }

    let enclosing = expression_at_offset(file, offset, false);
    let is_call = matches!(enclosing, Some(sg_analysis::ast::Expr::Call { .. }));
    if resolved_symbol.is_none() || is_call {
        if let Some(expr) = enclosing {
            if let Some(label) = type_label_for_expr(file, expr) {
                lines.push(format!("Type: `{label}`"));
                if range_span.is_none() {
                    range_span = Some(expr.span());
                }
            }
        }
    }

    if lines.is_empty() {
        return None;
    }

    let range_span = range_span.unwrap_or(token.span);
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value: lines.join("\n\n") }),
        range: Some(span_to_range(ctx.source, ctx.cache, range_span)),
    })
}
