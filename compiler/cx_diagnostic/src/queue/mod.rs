//! Diagnostic queue for collecting, deduplicating, and sorting diagnostics.
//!
//! Features:
//! - Error limits so one corrupt file does not flood the output
//! - Deduplication of identical reports at the same location
//! - `ErrorGuaranteed` proof that errors were emitted

use cx_ir::SourceLocation;

use crate::{Diagnostic, ErrorCode, ErrorGuaranteed};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited).
    pub error_limit: usize,
    /// Drop a diagnostic identical in code, message and location to one
    /// already queued.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 20,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// No limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Queue for collecting, deduplicating, and sorting diagnostics.
///
/// Diagnostics sort by primary location. Locations share one address
/// space across files, so this orders by file registration and then by
/// offset; diagnostics without a location sort first.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            config,
        }
    }

    /// Add a diagnostic. Returns `false` if it was filtered out.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();
        if is_error && self.limit_reached() {
            return false;
        }
        if self.config.deduplicate && self.diagnostics.contains(&diag) {
            return false;
        }
        self.diagnostics.push(diag);
        if is_error {
            self.error_count += 1;
        }
        true
    }

    /// Emit an error diagnostic and get proof it was emitted.
    ///
    /// The proof is returned even when the error limit swallowed the
    /// diagnostic: an earlier error was reported in its place.
    pub fn emit_error(&mut self, diag: Diagnostic) -> ErrorGuaranteed {
        debug_assert!(diag.is_error(), "emit_error called with a {}", diag.severity);
        self.add(diag);
        ErrorGuaranteed::new()
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Proof that an error was emitted, if one was.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    /// Sort diagnostics by location and return them, clearing the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| d.primary_location().unwrap_or(SourceLocation::INVALID));
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Diagnostics in insertion order, without clearing.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

/// Create a "too many errors" diagnostic.
#[cold]
pub fn too_many_errors(limit: usize) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9099)
        .with_message(format!("aborting after {limit} errors"))
        .with_note("later errors were not reported")
}
