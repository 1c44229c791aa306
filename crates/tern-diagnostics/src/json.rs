// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Structured JSON output for machine consumption.
//!
//! Every label is enriched with 1-based line/column and its source line, so
//! a consumer never needs the original text to display the error.

use serde::Serialize;
use tern_ast::{LineMap, Span};

use crate::{Diagnostic, LabelStyle, Severity};

/// A complete report for one compilation run.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Schema version, bumped on incompatible changes.
    pub version: u32,
    pub file: String,
    pub success: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    pub role: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub span: Span,
    /// 1-based position of the span's start.
    pub line: u32,
    pub column: u32,
    pub source_line: String,
}

/// Build a report from one run's diagnostics.
pub fn report(diagnostics: &[Diagnostic], source: &str, file: &str) -> Report {
    let line_map = LineMap::new(source);
    let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warning_count = diagnostics.len() - error_count;

    let diagnostics = diagnostics
        .iter()
        .map(|diag| JsonDiagnostic {
            severity: diag.severity,
            code: diag.code,
            message: diag.message.clone(),
            labels: diag
                .labels
                .iter()
                .map(|label| {
                    let (line, column) = line_map.location(label.span.start);
                    JsonLabel {
                        role: label.style,
                        message: label.message.clone(),
                        span: label.span,
                        line,
                        column,
                        source_line: line_map
                            .line_text(source, line)
                            .unwrap_or("")
                            .to_string(),
                    }
                })
                .collect(),
            notes: diag.notes.clone(),
            help: diag.help.clone(),
        })
        .collect();

    Report {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        error_count,
        warning_count,
        diagnostics,
    }
}

/// Serialize a report to pretty JSON.
pub fn to_string(report: &Report) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("{{\"error\": {:?}}}", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToDiagnostic;
    use tern_codegen::LowerError;

    #[test]
    fn report_carries_locations_and_source_lines() {
        let src = "var n = 1\nn = true\n";
        let err = LowerError::AssignType {
            name: "n".to_string(),
            expected: "int",
            found: "bool",
            span: Span::new(14, 18),
        };
        let report = report(&[err.to_diagnostic()], src, "demo.tn");
        assert!(!report.success);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.diagnostics.len(), 1);
        let label = &report.diagnostics[0].labels[0];
        assert_eq!((label.line, label.column), (2, 5));
        assert_eq!(label.source_line, "n = true");

        let parsed: serde_json::Value =
            serde_json::from_str(&to_string(&report)).expect("invalid json");
        assert_eq!(parsed["diagnostics"][0]["code"], "E0322");
        assert_eq!(parsed["diagnostics"][0]["labels"][0]["role"], "primary");
    }

    #[test]
    fn clean_runs_report_success() {
        let report = report(&[], "", "demo.tn");
        assert!(report.success);
        assert_eq!(report.error_count + report.warning_count, 0);
    }
}
