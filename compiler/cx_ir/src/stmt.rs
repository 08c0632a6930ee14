//! Statement nodes.
//!
//! Expressions in statement position are wrapped in [`StmtKind::Expr`];
//! the two live in separate arenas and [`NodeRef`](crate::NodeRef) names
//! either.

use crate::node_class::StmtClass;
use crate::source::SourceLocation;
use crate::{DeclId, ExprId, StmtId, StmtRange};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StmtKind {
    Null,
    Compound {
        body: StmtRange,
        rbrace: SourceLocation,
    },
    Decl {
        decls: Vec<DeclId>,
    },
    Expr(ExprId),
    Label {
        decl: DeclId,
        sub: StmtId,
    },
    If {
        cond_var: Option<DeclId>,
        cond: ExprId,
        then: StmtId,
        else_: Option<StmtId>,
    },
    Switch {
        cond_var: Option<DeclId>,
        cond: ExprId,
        body: StmtId,
    },
    /// `case lhs:` or the GNU range `case lhs ... rhs:`.
    Case {
        lhs: ExprId,
        rhs: Option<ExprId>,
        sub: StmtId,
    },
    Default {
        sub: StmtId,
    },
    While {
        cond_var: Option<DeclId>,
        cond: ExprId,
        body: StmtId,
    },
    Do {
        body: StmtId,
        cond: ExprId,
    },
    For {
        init: Option<StmtId>,
        cond_var: Option<DeclId>,
        cond: Option<ExprId>,
        inc: Option<ExprId>,
        body: StmtId,
    },
    Goto {
        label: DeclId,
    },
    Continue,
    Break,
    Return {
        value: Option<ExprId>,
        nrvo_candidate: Option<DeclId>,
    },
}

impl StmtKind {
    pub fn class(&self) -> StmtClass {
        match self {
            StmtKind::Null => StmtClass::NullStmt,
            StmtKind::Compound { .. } => StmtClass::CompoundStmt,
            StmtKind::Decl { .. } => StmtClass::DeclStmt,
            StmtKind::Expr(_) => StmtClass::ExprStmt,
            StmtKind::Label { .. } => StmtClass::LabelStmt,
            StmtKind::If { .. } => StmtClass::IfStmt,
            StmtKind::Switch { .. } => StmtClass::SwitchStmt,
            StmtKind::Case { .. } => StmtClass::CaseStmt,
            StmtKind::Default { .. } => StmtClass::DefaultStmt,
            StmtKind::While { .. } => StmtClass::WhileStmt,
            StmtKind::Do { .. } => StmtClass::DoStmt,
            StmtKind::For { .. } => StmtClass::ForStmt,
            StmtKind::Goto { .. } => StmtClass::GotoStmt,
            StmtKind::Continue => StmtClass::ContinueStmt,
            StmtKind::Break => StmtClass::BreakStmt,
            StmtKind::Return { .. } => StmtClass::ReturnStmt,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: SourceLocation) -> Self {
        Stmt { kind, loc }
    }

    #[inline]
    pub fn class(&self) -> StmtClass {
        self.kind.class()
    }
}
