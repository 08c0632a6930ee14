use pretty_assertions::assert_eq;

use cx_ir::expr::BinaryOp;
use cx_ir::{check_ice, evaluate, AstContext, LangOptions, SourceLocation, TargetInfo, TypeId};

use super::*;
use crate::Severity;

#[test]
fn evaluation_note_becomes_an_error() {
    let mut ctx = AstContext::default();
    let one = ctx.create_integer_literal(1, TypeId::INT.into(), SourceLocation::from_raw(1));
    let zero = ctx.create_integer_literal(0, TypeId::INT.into(), SourceLocation::from_raw(5));
    let div = ctx.create_binary(
        BinaryOp::Div,
        one,
        zero,
        TypeId::INT.into(),
        SourceLocation::from_raw(3),
    );

    let note = evaluate(&ctx, div).diag;
    let diag = note.map(Diagnostic::from);
    assert_eq!(diag.as_ref().map(|d| d.code), Some(ErrorCode::E1002));
    assert_eq!(diag.as_ref().map(|d| d.message.as_str()), Some("division by zero"));
    assert_eq!(
        diag.and_then(|d| d.primary_location()),
        Some(SourceLocation::from_raw(3))
    );
}

#[test]
fn every_kind_has_a_code_in_range() {
    let kinds = [
        DiagKind::NotConstant,
        DiagKind::DivideByZero,
        DiagKind::ShiftOutOfRange,
        DiagKind::NonConstexprCall,
        DiagKind::SideEffects,
        DiagKind::ReadOfNonConstVariable,
        DiagKind::CommaInIce,
        DiagKind::FloatInIce,
        DiagKind::InvalidCastInIce,
        DiagKind::Dependent,
        DiagKind::NotIntegral,
    ];
    for kind in kinds {
        let code = error_code_for(kind);
        assert!(code.is_eval_error() || code.is_ice_error(), "{kind:?} -> {code}");
    }
}

#[test]
fn ice_reports_by_kind() {
    let ok = IceDiag {
        kind: IceKind::Ice,
        loc: SourceLocation::INVALID,
        reason: DiagKind::NotConstant,
    };
    assert_eq!(ice_diagnostic(ok), None);

    let mut ctx = AstContext::new(LangOptions::c99(), TargetInfo::default());
    let a = ctx.create_integer_literal(1, TypeId::INT.into(), SourceLocation::from_raw(1));
    let b = ctx.create_integer_literal(2, TypeId::INT.into(), SourceLocation::from_raw(2));
    let comma = ctx.create_binary(
        BinaryOp::Comma,
        a,
        b,
        TypeId::INT.into(),
        SourceLocation::from_raw(7),
    );
    let warning = ice_diagnostic(check_ice(&ctx, comma));
    assert_eq!(warning.as_ref().map(|d| d.severity), Some(Severity::Warning));
    assert_eq!(warning.as_ref().map(|d| d.code), Some(ErrorCode::W1001));

    let not_ice = IceDiag {
        kind: IceKind::NotIce,
        loc: SourceLocation::from_raw(4),
        reason: DiagKind::NonConstexprCall,
    };
    let error = ice_diagnostic(not_ice);
    assert_eq!(error.as_ref().map(|d| d.code), Some(ErrorCode::E2001));
    assert_eq!(
        error.map(|d| d.notes),
        Some(vec![
            "[E1004] call to a function that is not constant-evaluable".to_string()
        ])
    );
}
