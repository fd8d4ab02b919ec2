//! §4.5.4 Signature Help.

use lsp_types::{ParameterInformation, ParameterLabel, SignatureHelp, SignatureInformation};

use sg_analysis::ast::{Expr, Item};
use sg_analysis::token::TokenKind;
use sg_analysis::{type_key, AnalysisFile};

use super::shared::QueryContext;

struct Candidate {
    label: String,
    params: Vec<String>,
    /// `true` when the first declared parameter is an implicit receiver
    /// dropped from the displayed list (§4.5.4's `recv.m(args)` case).
    receiver_call: bool,
}

/// Smallest enclosing `Call` expression (across `let` initializers, the
/// only expression trees this reference Analyzer builds).
fn enclosing_call<'a>(file: &'a AnalysisFile, offset: usize) -> Option<&'a Expr> {
    for it in &file.items {
        if let Item::Let(l) = it {
            if let Some(init) = &l.initializer {
                if let Some(found) = find_call(init, offset) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn find_call(expr: &Expr, offset: usize) -> Option<&Expr> {
    if !expr.span().contains_span(sg_position_tracking::ByteSpan::new(offset, offset)) {
        return None;
    }
    match expr {
        Expr::Call { callee, args, .. } => {
            for arg in args {
                if let Some(found) = find_call(arg, offset) {
                    return Some(found);
                }
            }
            find_call(callee, offset).or(Some(expr))
        }
        Expr::Member { base, .. } => find_call(base, offset),
        _ => None,
    }
}

/// Active-parameter index: the count of argument-separator commas whose
/// span ends at or before `offset`.
fn active_parameter(call: &Expr, offset: usize) -> u32 {
    let Expr::Call { arg_commas, .. } = call else { return 0 };
    arg_commas.iter().filter(|c| c.end <= offset).count() as u32
}

fn callee_name_and_receiver<'a>(call: &'a Expr) -> (&'a str, Option<&'a str>) {
    let Expr::Call { callee, .. } = call else { return ("", None) };
    match callee.as_ref() {
        Expr::Ident { name, .. } => (name, None),
        Expr::Member { name, base, is_static: false, .. } => {
            let recv = if let Expr::Ident { name: rn, .. } = base.as_ref() { Some(rn.as_str()) } else { None };
            (name, recv)
        }
        Expr::Member { name, .. } => (name, None),
        _ => ("", None),
    }
}

fn candidates_for(ctx: &QueryContext<'_>, call: &Expr) -> Vec<Candidate> {
    let (name, receiver) = callee_name_and_receiver(call);
    if name.is_empty() {
        return Vec::new();
    }

    let receiver_key = receiver.and_then(|r| {
        let file = ctx.file()?;
        let sym_id = file.lookup_top_level(r).first().copied()?;
        file.symbol(sym_id)?.type_key.clone()
    });

    let mut out = Vec::new();
    for file_id in ctx.snapshot.file_ids() {
        let Some(file) = ctx.snapshot.file(file_id) else { continue };
        for it in &file.items {
            let Item::Fn(f) = it else { continue };
            if f.name != name {
                continue;
            }
            let matches_receiver = match (&receiver_key, &f.receiver_type_key) {
                (Some(rk), Some(recv)) => type_key::candidate_keys(rk).iter().any(|c| type_key::keys_match(c, recv)),
                (None, None) => true,
                _ => false,
            };
            if !matches_receiver {
                continue;
            }
            let params: Vec<String> = f
                .params
                .iter()
                .map(|p| match &p.type_key {
                    Some(t) => format!("{}: {}", p.name, t),
                    None => p.name.clone(),
                })
                .collect();
            let label = file.symbol(f.symbol).and_then(|s| s.signature.clone()).unwrap_or_else(|| f.name.clone());
            out.push(Candidate { label, params, receiver_call: f.receiver_type_key.is_some() });
        }
    }
    out
}

/// Scores a candidate's parameter list against the call's argument
/// count: exact arity match scores `+2`, any mismatch `-1` (§4.5.4's
/// scoring is defined in terms of argument *types*; this reference
/// Analyzer only tracks arity reliably across files, so arity stands in
/// for the full type-compatibility check).
fn score(candidate: &Candidate, call: &Expr) -> i32 {
    let Expr::Call { args, .. } = call else { return 0 };
    let expected = if candidate.receiver_call { candidate.params.len() } else { candidate.params.len() };
    if expected == args.len() {
        2
    } else {
        -1
    }
}

/// Answers `textDocument/signatureHelp`.
pub fn signature_help(ctx: &QueryContext<'_>, position: lsp_types::Position) -> Option<SignatureHelp> {
    let file = ctx.file()?;
    let offset = ctx.offset_for(position);

    // Cheap guard: only bother if we're textually inside an unmatched
    // `(...)` region (the closing paren may not have been typed yet).
    let mut depth = 0i32;
    for t in &file.tokens {
        if t.span.start >= offset {
            break;
        }
        match t.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            _ => {}
        }
    }
    if depth <= 0 {
        return None;
    }

    let call = enclosing_call(file, offset)?;
    let mut candidates = candidates_for(ctx, call);
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| score(b, call).cmp(&score(a, call)));

    let active_param = active_parameter(call, offset);
    let adjusted_active = active_param;

    let signatures: Vec<SignatureInformation> = candidates
        .iter()
        .map(|c| SignatureInformation {
            label: c.label.clone(),
            documentation: None,
            parameters: Some(
                c.params
                    .iter()
                    .map(|p| ParameterInformation { label: ParameterLabel::Simple(p.clone()), documentation: None })
                    .collect(),
            ),
            active_parameter: None,
        })
        .collect();

    Some(SignatureHelp { signatures, active_signature: Some(0), active_parameter: Some(adjusted_active) })
}
