//! §4.5.5 Inlay Hints.

use lsp_types::{InlayHint, InlayHintLabel, InlayHintTooltip};

use sg_analysis::ast::Item;

use super::shared::QueryContext;
use crate::convert::position::offset_to_position;
use crate::state::ServerConfig;

fn hint(ctx: &QueryContext<'_>, offset: usize, label: String, padding_left: bool) -> InlayHint {
    InlayHint {
        position: offset_to_position(ctx.source, ctx.cache, offset),
        label: InlayHintLabel::String(label),
        kind: None,
        text_edits: None,
        tooltip: None::<InlayHintTooltip>,
        padding_left: Some(padding_left),
        padding_right: Some(false),
        data: None,
    }
}

/// Answers `textDocument/inlayHint` for `range`. Walks items whose span
/// intersects the range, emitting `let`-type, default-init, and
/// enum-implicit-value hints per the configured toggles, then sorts by
/// (line, column).
pub fn inlay_hints(ctx: &QueryContext<'_>, config: &ServerConfig, range: lsp_types::Range) -> Vec<InlayHint> {
    let Some(file) = ctx.file() else { return Vec::new() };
    let range_span = crate::convert::position::range_to_span(ctx.source, ctx.cache, range);

    let mut hints = Vec::new();

    for item in &file.items {
        match item {
            Item::Let(l) if l.span.overlaps(range_span) => {
                if l.type_annotation.is_none() {
                    if let Some(symbol) = file.symbol(l.symbol) {
                        if let Some(type_key) = &symbol.type_key {
                            let suppress = config.inlay_hints_hide_obvious
                                && l.initializer.as_ref().map(|e| e.is_obvious_literal()).unwrap_or(false);
                            if config.inlay_hints_let_types && !suppress {
                                hints.push(hint(ctx, l.name_span.end, format!(": {type_key}"), false));
                            }
                        }
                    }
                }
                if config.inlay_hints_default_init && l.type_annotation.is_some() && l.initializer.is_none() {
                    if let Some(type_key) = &l.type_annotation {
                        let pos = if l.semicolon_span.is_empty() { l.span.end } else { l.semicolon_span.start };
                        hints.push(hint(ctx, pos, format!("= default::<{type_key}>();"), true));
                    }
                }
            }
            Item::Enum(e) if e.span.overlaps(range_span) && config.inlay_hints_enum_implicit_values => {
                for variant in &e.variants {
                    if variant.explicit_value.is_none() {
                        hints.push(hint(ctx, variant.value_hint_pos, format!("= {}", implicit_value(e, variant)), false));
                    }
                }
            }
            _ => {}
        }
    }

    hints.sort_by_key(|h| (h.position.line, h.position.character));
    hints
}

/// The implicit integer value of a variant: one more than the previous
/// explicit-or-implicit value, or 0 for the first variant.
fn implicit_value(e: &sg_analysis::ast::EnumItem, variant: &sg_analysis::ast::EnumVariant) -> i64 {
    let idx = e.variants.iter().position(|v| v.name == variant.name).unwrap_or(0);
    let mut value = 0i64;
    for v in &e.variants[..idx] {
        value = v.explicit_value.unwrap_or(value) + 1;
    }
    if idx == 0 {
        variant.explicit_value.unwrap_or(0)
    } else {
        value
    }
}
