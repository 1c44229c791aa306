// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Color terminal rendering.
//!
//! ```text
//! error[E0300]: the right operand of bitwise and ('&') must be int, but it is bool
//!   --> demo.tn:3:9
//!    |
//!  3 | var m = 1 & true
//!    |             ^^^^ this is bool
//!    |
//!    = note: values are never converted implicitly
//! ```

use colored::Colorize;
use tern_ast::{LineMap, Span};

use crate::{Diagnostic, Label, LabelStyle, Severity};

/// Renders diagnostics against one source text.
pub struct Renderer<'a> {
    source: &'a str,
    file_name: &'a str,
    line_map: LineMap,
}

impl<'a> Renderer<'a> {
    pub fn new(source: &'a str) -> Self {
        Renderer { source, file_name: "<source>", line_map: LineMap::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = name;
        self
    }

    pub fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();
        self.header(&mut out, diag);

        let gutter = self.gutter_width(diag);
        if let Some(span) = diag.primary_span() {
            let (line, col) = self.line_map.location(span.start);
            out.push_str(&format!(
                "{}{} {}:{}:{}\n",
                " ".repeat(gutter),
                "-->".blue(),
                self.file_name,
                line,
                col
            ));
            out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
        }
        for label in &diag.labels {
            self.label(&mut out, label, gutter);
        }

        if !diag.notes.is_empty() || diag.help.is_some() {
            out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
        }
        for note in &diag.notes {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter + 1),
                "=".cyan(),
                "note".cyan().bold(),
                note
            ));
        }
        if let Some(help) = &diag.help {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter + 1),
                "=".cyan(),
                "help".cyan().bold(),
                help
            ));
        }
        out
    }

    fn header(&self, out: &mut String, diag: &Diagnostic) {
        let severity = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        match diag.code {
            Some(code) => out.push_str(&format!(
                "{}{}{}{}: {}\n",
                severity,
                "[".bold(),
                code.red().bold(),
                "]".bold(),
                diag.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity, diag.message.bold())),
        }
    }

    /// One source line plus the marker line beneath it.
    fn label(&self, out: &mut String, label: &Label, gutter: usize) {
        let (line, col) = self.line_map.location(label.span.start);
        let Some(text) = self.line_map.line_text(self.source, line) else { return };

        out.push_str(&format!(
            "{:>width$} {} {}\n",
            line.to_string().blue().bold(),
            "|".blue(),
            text,
            width = gutter + 1,
        ));

        let (pad, width) = self.marker_geometry(label.span, col, text);
        let marker = match label.style {
            LabelStyle::Primary => "^".repeat(width).red().bold().to_string(),
            LabelStyle::Secondary => "-".repeat(width).blue().to_string(),
        };
        let message = match (&label.message, label.style) {
            (Some(m), LabelStyle::Primary) => format!(" {}", m.red().bold()),
            (Some(m), LabelStyle::Secondary) => format!(" {}", m.blue()),
            (None, _) => String::new(),
        };
        out.push_str(&format!(
            "{} {} {}{}{}\n",
            " ".repeat(gutter + 1),
            "|".blue(),
            " ".repeat(pad),
            marker,
            message,
        ));
    }

    /// Marker placement as (leading pad, caret count), both in display
    /// characters rather than bytes, with the span clipped to its first line.
    /// Spans and columns are byte-based, so the byte offsets are translated
    /// by counting characters in the line's prefix and in the spanned slice.
    fn marker_geometry(&self, span: Span, col: u32, text: &str) -> (usize, usize) {
        let start = (col as usize - 1).min(text.len());
        let end = start.saturating_add(span.end.saturating_sub(span.start)).min(text.len());
        let pad = text.get(..start).map_or(start, |s| s.chars().count());
        let width = text.get(start..end).map_or(1, |s| s.chars().count()).max(1);
        (pad, width)
    }

    fn gutter_width(&self, diag: &Diagnostic) -> usize {
        diag.labels
            .iter()
            .map(|l| self.line_map.location(l.span.start).0.to_string().len())
            .max()
            .unwrap_or(1)
            .max(2)
    }
}
