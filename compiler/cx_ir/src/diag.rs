//! Diagnostics produced by constant evaluation.
//!
//! These are plain values; turning them into user-facing reports is the
//! job of the diagnostic crate.

use std::fmt;

use crate::source::SourceLocation;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DiagKind {
    /// Generic: the expression is not a constant expression.
    NotConstant,
    DivideByZero,
    /// Shift by a negative amount or by at least the operand width.
    ShiftOutOfRange,
    /// Call to a function that cannot be evaluated.
    NonConstexprCall,
    /// Evaluation would modify an object.
    SideEffects,
    ReadOfNonConstVariable,
    /// A comma operator inside an integer constant expression.
    CommaInIce,
    /// A floating-point operand inside an integer constant expression.
    FloatInIce,
    /// A cast an integer constant expression may not contain.
    InvalidCastInIce,
    /// The value depends on a template parameter.
    Dependent,
    /// The expression does not have integral type.
    NotIntegral,
}

impl DiagKind {
    pub fn message(self) -> &'static str {
        match self {
            DiagKind::NotConstant => "expression is not a constant expression",
            DiagKind::DivideByZero => "division by zero",
            DiagKind::ShiftOutOfRange => "shift count is negative or too large",
            DiagKind::NonConstexprCall => "call to a function that is not constant-evaluable",
            DiagKind::SideEffects => "expression has side effects",
            DiagKind::ReadOfNonConstVariable => "read of a non-const variable",
            DiagKind::CommaInIce => "comma operator in an integer constant expression",
            DiagKind::FloatInIce => "floating-point value in an integer constant expression",
            DiagKind::InvalidCastInIce => "cast not allowed in an integer constant expression",
            DiagKind::Dependent => "value depends on a template parameter",
            DiagKind::NotIntegral => "expression does not have integral type",
        }
    }
}

/// A note explaining why an expression could not be evaluated.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PartialDiagnostic {
    pub kind: DiagKind,
    pub loc: SourceLocation,
}

impl PartialDiagnostic {
    pub fn new(kind: DiagKind, loc: SourceLocation) -> Self {
        PartialDiagnostic { kind, loc }
    }
}

impl fmt::Display for PartialDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.message())
    }
}
