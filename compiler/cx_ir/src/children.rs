//! Direct sub-nodes of statements and expressions.
//!
//! Fixed-arity children are collected into a small inline buffer; the
//! variable-length tail (call arguments, initializers, compound bodies)
//! is borrowed straight from the trailing pools and only walked when the
//! iterator gets there.

use std::slice;

use smallvec::SmallVec;

use crate::expr::{ExprKind, TraitArg};
use crate::stmt::StmtKind;
use crate::trailing::TrailingStorage;
use crate::{AstContext, ExprId, NodeRef, StmtId};

#[derive(Clone, Debug)]
enum Tail<'a> {
    None,
    Exprs(slice::Iter<'a, ExprId>),
    Stmts(slice::Iter<'a, StmtId>),
}

/// Iterator over the direct children of one node, in source order.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    fixed: SmallVec<[NodeRef; 4]>,
    pos: usize,
    tail: Tail<'a>,
}

impl<'a> Children<'a> {
    fn new(fixed: SmallVec<[NodeRef; 4]>, tail: Tail<'a>) -> Self {
        Children { fixed, pos: 0, tail }
    }

    fn empty() -> Self {
        Self::new(SmallVec::new(), Tail::None)
    }
}

impl Iterator for Children<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        if let Some(&node) = self.fixed.get(self.pos) {
            self.pos += 1;
            return Some(node);
        }
        match &mut self.tail {
            Tail::None => None,
            Tail::Exprs(it) => it.next().map(|&e| NodeRef::Expr(e)),
            Tail::Stmts(it) => it.next().map(|&s| NodeRef::Stmt(s)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let tail = match &self.tail {
            Tail::None => 0,
            Tail::Exprs(it) => it.len(),
            Tail::Stmts(it) => it.len(),
        };
        let n = self.fixed.len() - self.pos + tail;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Children<'_> {}

macro_rules! nodes {
    ($($e:expr),* $(,)?) => {{
        let mut v: SmallVec<[NodeRef; 4]> = SmallVec::new();
        $(v.push(NodeRef::from($e));)*
        v
    }};
}

fn push_opt<T: Into<NodeRef>>(v: &mut SmallVec<[NodeRef; 4]>, node: Option<T>) {
    if let Some(n) = node {
        v.push(n.into());
    }
}

/// Children of an expression that may not be allocated yet.
pub(crate) fn expr_children<'a>(trailing: &'a TrailingStorage, kind: &ExprKind) -> Children<'a> {
    let exprs = |r| Tail::Exprs(trailing.exprs(r).iter());
    match kind {
        ExprKind::IntegerLiteral { .. }
        | ExprKind::CharacterLiteral { .. }
        | ExprKind::FloatingLiteral { .. }
        | ExprKind::StringLiteral { .. }
        | ExprKind::BoolLiteral { .. }
        | ExprKind::NullPtrLiteral
        | ExprKind::Predefined { .. }
        | ExprKind::DeclRef(_)
        | ExprKind::This { .. }
        | ExprKind::ObjCSelector { .. }
        | ExprKind::ImplicitValueInit
        | ExprKind::AddrLabel { .. }
        | ExprKind::DefaultArg { .. }
        | ExprKind::OpaqueValue { .. }
        | ExprKind::SizeOfPack { .. } => Children::empty(),

        ExprKind::Paren { sub, .. }
        | ExprKind::Unary { sub, .. }
        | ExprKind::VAArg { sub, .. }
        | ExprKind::MaterializeTemporary { sub, .. } => Children::new(nodes![*sub], Tail::None),
        ExprKind::ConvertVector { src, .. } => Children::new(nodes![*src], Tail::None),
        ExprKind::ExtVectorElement { base, .. } => Children::new(nodes![*base], Tail::None),
        ExprKind::CompoundLiteral { init, .. } => Children::new(nodes![*init], Tail::None),
        ExprKind::PackExpansion { pattern, .. } => Children::new(nodes![*pattern], Tail::None),
        ExprKind::StmtExpr { body } => Children::new(nodes![*body], Tail::None),
        ExprKind::Member(m) => Children::new(nodes![m.base], Tail::None),

        ExprKind::Binary { lhs, rhs, .. }
        | ExprKind::CompoundAssign { lhs, rhs, .. }
        | ExprKind::ArraySubscript { lhs, rhs, .. } => {
            Children::new(nodes![*lhs, *rhs], Tail::None)
        }
        ExprKind::Conditional { cond, lhs, rhs } | ExprKind::Choose { cond, lhs, rhs, .. } => {
            Children::new(nodes![*cond, *lhs, *rhs], Tail::None)
        }

        ExprKind::UnaryExprOrTypeTrait { arg, .. } => match arg {
            TraitArg::Expr(e) => Children::new(nodes![*e], Tail::None),
            TraitArg::Type(_) => Children::empty(),
        },

        ExprKind::ImplicitCast(c) | ExprKind::ExplicitCast { cast: c, .. } => {
            Children::new(nodes![c.sub], Tail::None)
        }

        ExprKind::Call(c) | ExprKind::MemberCall(c) | ExprKind::OperatorCall { call: c, .. } => {
            Children::new(nodes![c.callee], exprs(c.args))
        }

        ExprKind::InitList { inits, .. } => Children::new(SmallVec::new(), exprs(*inits)),
        ExprKind::DesignatedInit { subexprs, .. }
        | ExprKind::Atomic { subexprs, .. }
        | ExprKind::ShuffleVector { subexprs, .. } => {
            Children::new(SmallVec::new(), exprs(*subexprs))
        }
        ExprKind::Construct { args, .. } => Children::new(SmallVec::new(), exprs(*args)),
        ExprKind::GenericSelection {
            controlling,
            assoc_exprs,
            ..
        } => Children::new(nodes![*controlling], exprs(*assoc_exprs)),
    }
}

fn stmt_children<'a>(trailing: &'a TrailingStorage, kind: &StmtKind) -> Children<'a> {
    let mut v: SmallVec<[NodeRef; 4]> = SmallVec::new();
    match kind {
        StmtKind::Null
        | StmtKind::Decl { .. }
        | StmtKind::Goto { .. }
        | StmtKind::Continue
        | StmtKind::Break => {}
        StmtKind::Compound { body, .. } => {
            return Children::new(v, Tail::Stmts(trailing.stmts(*body).iter()));
        }
        StmtKind::Expr(e) => v.push((*e).into()),
        StmtKind::Label { sub, .. } | StmtKind::Default { sub } => v.push((*sub).into()),
        StmtKind::If {
            cond, then, else_, ..
        } => {
            v.push((*cond).into());
            v.push((*then).into());
            push_opt(&mut v, *else_);
        }
        StmtKind::Switch { cond, body, .. } | StmtKind::While { cond, body, .. } => {
            v.push((*cond).into());
            v.push((*body).into());
        }
        StmtKind::Case { lhs, rhs, sub } => {
            v.push((*lhs).into());
            push_opt(&mut v, *rhs);
            v.push((*sub).into());
        }
        StmtKind::Do { body, cond } => {
            v.push((*body).into());
            v.push((*cond).into());
        }
        StmtKind::For {
            init,
            cond,
            inc,
            body,
            ..
        } => {
            push_opt(&mut v, *init);
            push_opt(&mut v, *cond);
            push_opt(&mut v, *inc);
            v.push((*body).into());
        }
        StmtKind::Return { value, .. } => push_opt(&mut v, *value),
    }
    Children::new(v, Tail::None)
}

impl AstContext {
    /// Direct children of `node`.
    pub fn children(&self, node: NodeRef) -> Children<'_> {
        match node {
            NodeRef::Expr(e) => expr_children(&self.trailing, &self.expr(e).kind),
            NodeRef::Stmt(s) => stmt_children(&self.trailing, &self.stmt(s).kind),
        }
    }
}
