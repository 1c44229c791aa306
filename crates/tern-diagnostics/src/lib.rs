// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tern compiler diagnostics.
//!
//! One diagnostic type for every phase. Each phase's error enum converts to
//! [`Diagnostic`] through the [`ToDiagnostic`] trait ([`convert`]), and two
//! renderers consume the result: [`formatter`] for color terminal output and
//! [`json`] for machine consumption.

pub mod convert;
pub mod formatter;
pub mod json;

use serde::Serialize;
use tern_ast::Span;

/// A diagnostic ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code like `E0301`; one prefix block per compiler phase.
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source span within a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: Span,
    pub style: LabelStyle,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// The error location itself.
    Primary,
    /// A related location, such as an earlier declaration.
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, ..Diagnostic::error(message) }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_primary(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            style: LabelStyle::Primary,
            message: Some(message.into()),
        });
        self
    }

    pub fn with_secondary(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            style: LabelStyle::Secondary,
            message: Some(message.into()),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The first primary label's span, falling back to any label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .or(self.labels.first())
            .map(|l| l.span)
    }
}

/// Convert a phase error into a displayable diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_parts() {
        let diag = Diagnostic::error("bad thing")
            .with_code("E9999")
            .with_secondary(Span::new(0, 2), "related")
            .with_primary(Span::new(4, 6), "here")
            .with_note("a note")
            .with_help("try the other thing");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, Some("E9999"));
        assert_eq!(diag.labels.len(), 2);
        assert_eq!(diag.primary_span(), Some(Span::new(4, 6)));
        assert_eq!(diag.notes.len(), 1);
        assert!(diag.help.is_some());
    }

    #[test]
    fn primary_span_falls_back_to_first_label() {
        let diag = Diagnostic::error("x").with_secondary(Span::new(1, 3), "only label");
        assert_eq!(diag.primary_span(), Some(Span::new(1, 3)));
        assert_eq!(Diagnostic::error("y").primary_span(), None);
    }
}
