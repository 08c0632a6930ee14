//! Core diagnostic types for structured error reporting.
//!
//! Defines [`Diagnostic`], [`Label`] and [`Severity`], the building blocks
//! that evaluation and AST file loading use to report problems.

use std::fmt;

use cx_ir::{SourceLocation, SourceRange};

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled source range with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub range: SourceRange,
    pub message: String,
    /// Whether this is the main location of the diagnostic.
    pub is_primary: bool,
}

impl Label {
    pub fn primary(range: SourceRange, message: impl Into<String>) -> Self {
        Label {
            range,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(range: SourceRange, message: impl Into<String>) -> Self {
        Label {
            range,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A diagnostic with everything needed to render it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    /// Human-readable hints for fixing the problem.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Create a diagnostic at the severity the code implies.
    pub fn for_code(code: ErrorCode) -> Self {
        if code.is_warning() {
            Self::warning(code)
        } else {
            Self::error(code)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a primary label. Invalid locations are dropped: a diagnostic
    /// about a whole file has nowhere to point.
    pub fn with_label(mut self, range: SourceRange, message: impl Into<String>) -> Self {
        if range.begin.is_valid() {
            self.labels.push(Label::primary(range, message));
        }
        self
    }

    /// Primary label at a single location.
    pub fn with_label_at(self, loc: SourceLocation, message: impl Into<String>) -> Self {
        self.with_label(SourceRange::point(loc), message)
    }

    pub fn with_secondary_label(mut self, range: SourceRange, message: impl Into<String>) -> Self {
        if range.begin.is_valid() {
            self.labels.push(Label::secondary(range, message));
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Location of the first primary label.
    pub fn primary_location(&self) -> Option<SourceLocation> {
        self.labels
            .iter()
            .find(|l| l.is_primary)
            .map(|l| l.range.begin)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;

        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            write!(f, "\n  {marker} {:?}: {}", label.range.begin, label.message)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        for suggestion in &self.suggestions {
            write!(f, "\n  = help: {suggestion}")?;
        }

        Ok(())
    }
}
