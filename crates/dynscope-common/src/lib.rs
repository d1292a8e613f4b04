//! Common types and utilities for the dynscope front end.
//!
//! This crate provides foundational types used across all dynscope crates:
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, `DiagnosticBag`, message templates)
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics - compile-time errors and warnings with stable codes
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticBag, DiagnosticCategory, DiagnosticRelatedInformation, DiagnosticSink,
    diagnostic_codes, diagnostic_messages, format_message,
};

// Centralized limits and thresholds
pub mod limits;
