//! Looking through wrapper nodes.
//!
//! Each helper strips its wrapper set repeatedly until nothing changes,
//! so applying one twice gives the same node as applying it once.

use crate::expr::{CastKind, ExprKind, UnaryOp};
use crate::{AstContext, ExprId};

impl AstContext {
    fn strip_parens_once(&self, e: ExprId) -> Option<ExprId> {
        match &self.expr(e).kind {
            ExprKind::Paren { sub, .. }
            | ExprKind::Unary {
                op: UnaryOp::Extension,
                sub,
            } => Some(*sub),
            ExprKind::GenericSelection { .. } => self.generic_result(e),
            ExprKind::Choose {
                lhs, rhs, cond_true, ..
            } => Some(if *cond_true { *lhs } else { *rhs }),
            _ => None,
        }
    }

    fn strip_imp_cast_once(&self, e: ExprId) -> Option<ExprId> {
        match &self.expr(e).kind {
            ExprKind::ImplicitCast(c) => Some(c.sub),
            _ => None,
        }
    }

    fn strip_cast_once(&self, e: ExprId) -> Option<ExprId> {
        match &self.expr(e).kind {
            ExprKind::ImplicitCast(c) | ExprKind::ExplicitCast { cast: c, .. } => Some(c.sub),
            ExprKind::MaterializeTemporary { sub, .. } => Some(*sub),
            _ => None,
        }
    }

    fn strip_implicit_once(&self, e: ExprId) -> Option<ExprId> {
        match &self.expr(e).kind {
            ExprKind::ImplicitCast(c) => Some(c.sub),
            ExprKind::MaterializeTemporary { sub, .. } => Some(*sub),
            _ => None,
        }
    }

    fn strip_lvalue_cast_once(&self, e: ExprId) -> Option<ExprId> {
        match self.expr(e).as_cast() {
            Some(c) if c.kind == CastKind::LValueToRValue => Some(c.sub),
            _ => None,
        }
    }

    /// A cast that changes nothing about the bits: `NoOp`, or a
    /// conversion between integers and pointers of the same size.
    fn strip_noop_cast_once(&self, e: ExprId) -> Option<ExprId> {
        let expr = self.expr(e);
        let c = expr.as_cast()?;
        if c.kind == CastKind::NoOp {
            return Some(c.sub);
        }
        let (to, from) = (expr.ty(), self.expr(c.sub).ty());
        if self.types.canonical(to).unqualified_type()
            == self.types.canonical(from).unqualified_type()
        {
            return Some(c.sub);
        }
        let scalar = |qt| self.types.is_integer_type(qt) || self.types.is_pointer(qt);
        if scalar(to) && scalar(from) && self.type_size(to) == self.type_size(from) {
            return Some(c.sub);
        }
        None
    }

    fn fixpoint(&self, mut e: ExprId, steps: &[fn(&Self, ExprId) -> Option<ExprId>]) -> ExprId {
        loop {
            match steps.iter().find_map(|step| step(self, e)) {
                Some(next) => e = next,
                None => return e,
            }
        }
    }

    pub fn ignore_imp_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_imp_cast_once])
    }

    /// Strips every cast, implicit or explicit, and temporaries.
    pub fn ignore_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_cast_once])
    }

    /// Strips parentheses, `__extension__`, and resolved `_Generic` and
    /// `__builtin_choose_expr` nodes.
    pub fn ignore_parens(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_parens_once])
    }

    pub fn ignore_paren_imp_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_parens_once, Self::strip_imp_cast_once])
    }

    pub fn ignore_paren_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_parens_once, Self::strip_cast_once])
    }

    pub fn ignore_paren_lvalue_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_parens_once, Self::strip_lvalue_cast_once])
    }

    pub fn ignore_paren_noop_casts(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_parens_once, Self::strip_noop_cast_once])
    }

    /// Strips implicit casts and materialized temporaries.
    pub fn ignore_implicit(&self, e: ExprId) -> ExprId {
        self.fixpoint(e, &[Self::strip_implicit_once])
    }
}
