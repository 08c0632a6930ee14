//! Reports for constant evaluation and integer constant expression checks.

use cx_ir::{DiagKind, IceDiag, IceKind, PartialDiagnostic};

use crate::{Diagnostic, ErrorCode};

/// Error code for an evaluation note.
pub fn error_code_for(kind: DiagKind) -> ErrorCode {
    match kind {
        DiagKind::NotConstant => ErrorCode::E1001,
        DiagKind::DivideByZero => ErrorCode::E1002,
        DiagKind::ShiftOutOfRange => ErrorCode::E1003,
        DiagKind::NonConstexprCall => ErrorCode::E1004,
        DiagKind::SideEffects => ErrorCode::E1005,
        DiagKind::ReadOfNonConstVariable => ErrorCode::E1006,
        DiagKind::Dependent => ErrorCode::E1007,
        DiagKind::NotIntegral => ErrorCode::E1008,
        DiagKind::CommaInIce => ErrorCode::E2002,
        DiagKind::FloatInIce => ErrorCode::E2003,
        DiagKind::InvalidCastInIce => ErrorCode::E2004,
    }
}

impl From<PartialDiagnostic> for Diagnostic {
    fn from(note: PartialDiagnostic) -> Self {
        Diagnostic::error(error_code_for(note.kind))
            .with_message(note.kind.message())
            .with_label_at(note.loc, "evaluation stopped here")
    }
}

/// Report for an expression that had to be an integer constant
/// expression. `None` when it is one.
///
/// An expression that is an ICE only if its offending part goes
/// unevaluated still folds; it gets a warning instead of an error.
pub fn ice_diagnostic(diag: IceDiag) -> Option<Diagnostic> {
    let reason = diag.reason.message();
    match diag.kind {
        IceKind::Ice => None,
        IceKind::IceIfUnevaluated => Some(
            Diagnostic::warning(ErrorCode::W1001)
                .with_message(
                    "expression is not an integer constant expression; folding it to a constant",
                )
                .with_label_at(diag.loc, reason),
        ),
        IceKind::NotIce => Some(
            Diagnostic::error(ErrorCode::E2001)
                .with_message("expression is not an integer constant expression")
                .with_label_at(diag.loc, reason)
                .with_note(format!("[{}] {reason}", error_code_for(diag.reason))),
        ),
    }
}

#[cfg(test)]
mod tests;
