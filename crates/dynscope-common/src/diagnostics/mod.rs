//! Diagnostic types and message lookup for name resolution.
//!
//! Message templates live in `data.rs` and use `{0}`, `{1}`, ... placeholders
//! that `format_message` fills in. Codes are stable across releases so that
//! tooling can match on them.

use crate::span::Span;
use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A compile-time diagnostic with a stable code and a source location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., where the conflicting local was declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a diagnostic from a registered message template.
    ///
    /// The category comes from the template table; unknown codes fall back to
    /// an error with the raw arguments joined as the message.
    #[must_use]
    pub fn from_code(file: &str, span: Span, code: u32, args: &[&str]) -> Self {
        let (category, message_text) = match get_diagnostic_message(code) {
            Some(msg) => (msg.category, format_message(msg.message, args)),
            None => (DiagnosticCategory::Error, args.join(" ")),
        };
        Self {
            file: file.to_string(),
            start: span.start,
            length: span.len(),
            message_text,
            category,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, span: Span, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start: span.start,
            length: span.len(),
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    pub fn span(&self) -> Span {
        Span::at(self.start, self.length)
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

// =============================================================================
// Diagnostic Sink
// =============================================================================

/// Receiver for diagnostics produced while compiling a member body.
///
/// Resolution of one identifier failing never stops the caller; it reports
/// into the sink and moves on to the next expression.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A collection of diagnostics for one compilation phase.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostic codes in report order.
    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticBag {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
#[path = "../../tests/diagnostics_tests.rs"]
mod tests;
