//! `sg_analysis::AnalysisDiagnostic` → `lsp_types::Diagnostic` (§4.7
//! Publisher): 1-based line/column → 0-based UTF-16, severity mapping.

use sg_analysis::{AnalysisDiagnostic, DiagnosticSeverity};

fn severity_to_lsp(severity: DiagnosticSeverity) -> lsp_types::DiagnosticSeverity {
    match severity {
        DiagnosticSeverity::Error => lsp_types::DiagnosticSeverity::ERROR,
        DiagnosticSeverity::Warning => lsp_types::DiagnosticSeverity::WARNING,
        DiagnosticSeverity::Information => lsp_types::DiagnosticSeverity::INFORMATION,
        DiagnosticSeverity::Hint => lsp_types::DiagnosticSeverity::HINT,
    }
}

/// Convert one analyzer diagnostic to its LSP wire form. The analyzer
/// reports 1-based line/column; LSP wants 0-based.
pub fn to_lsp_diagnostic(diag: &AnalysisDiagnostic) -> lsp_types::Diagnostic {
    let start = lsp_types::Position {
        line: diag.line.saturating_sub(1),
        character: diag.column.saturating_sub(1),
    };
    let end = lsp_types::Position {
        line: diag.end_line.saturating_sub(1),
        character: diag.end_column.saturating_sub(1),
    };
    lsp_types::Diagnostic {
        range: lsp_types::Range { start, end },
        severity: Some(severity_to_lsp(diag.severity)),
        source: Some("sg-lsp".to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn converts_one_based_to_zero_based_position() {
        let diag = AnalysisDiagnostic {
            path: PathBuf::from("/proj/main.sg"),
            line: 1,
            column: 1,
            end_line: 1,
            end_column: 4,
            severity: DiagnosticSeverity::Error,
            message: "unexpected token".to_string(),
        };
        let lsp = to_lsp_diagnostic(&diag);
        assert_eq!(lsp.range.start, lsp_types::Position { line: 0, character: 0 });
        assert_eq!(lsp.range.end, lsp_types::Position { line: 0, character: 3 });
        assert_eq!(lsp.severity, Some(lsp_types::DiagnosticSeverity::ERROR));
    }

    #[test]
    fn maps_all_severities() {
        let base = AnalysisDiagnostic {
            path: PathBuf::from("/proj/main.sg"),
            line: 2,
            column: 1,
            end_line: 2,
            end_column: 2,
            severity: DiagnosticSeverity::Hint,
            message: "note".to_string(),
        };
        assert_eq!(to_lsp_diagnostic(&base).severity, Some(lsp_types::DiagnosticSeverity::HINT));
        let warn = AnalysisDiagnostic { severity: DiagnosticSeverity::Warning, ..base.clone() };
        assert_eq!(to_lsp_diagnostic(&warn).severity, Some(lsp_types::DiagnosticSeverity::WARNING));
        let info = AnalysisDiagnostic { severity: DiagnosticSeverity::Information, ..base };
        assert_eq!(to_lsp_diagnostic(&info).severity, Some(lsp_types::DiagnosticSeverity::INFORMATION));
    }
}
