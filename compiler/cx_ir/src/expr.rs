//! Expression nodes.
//!
//! Every expression shares one header: result type, value kind, object
//! kind and dependence. The node-specific part is an [`ExprKind`] variant
//! whose variable-length data lives in [`TrailingStorage`](crate::TrailingStorage).
//!
//! The header fields are private to this crate.
//! [`AstContext::alloc_expr`](crate::AstContext::alloc_expr) is the only
//! way to build one, which keeps two invariants in a single place: the
//! type is never a reference type, and type- or value-dependence always
//! implies instantiation-dependence.

mod operators;

use bitflags::bitflags;

pub use operators::{
    AtomicOp, BinaryOp, CastKind, CharacterKind, ExplicitCastStyle, OverloadedOperator,
    PredefinedIdent, UnaryOp, UnaryTrait,
};

use crate::node_class::StmtClass;
use crate::source::SourceLocation;
use crate::trailing::TrailingLayout;
use crate::{
    BasePathRange, DeclId, DesignatorRange, ExprId, ExprRange, Name, QualType, SelectorId, StmtId,
    TypeRange,
};

raw_enum! {
    pub enum ExprValueKind {
        /// Pure rvalue.
        RValue,
        LValue,
        /// Expiring value (`std::move(x)`).
        XValue,
    }
}

raw_enum! {
    pub enum ExprObjectKind {
        Ordinary,
        BitField,
        VectorComponent,
        /// An Objective-C property reference that can only be assigned
        /// through a setter.
        PropertySetter,
    }
}

bitflags! {
    /// How an expression depends on template parameters.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ExprDependence: u8 {
        const TYPE = 1 << 0;
        const VALUE = 1 << 1;
        const INSTANTIATION = 1 << 2;
        const UNEXPANDED_PACK = 1 << 3;

        const TYPE_VALUE_INSTANTIATION = Self::TYPE.bits()
            | Self::VALUE.bits()
            | Self::INSTANTIATION.bits();
    }
}

impl ExprDependence {
    /// Add `INSTANTIATION` wherever `TYPE` or `VALUE` is set.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.intersects(Self::TYPE | Self::VALUE) {
            self | Self::INSTANTIATION
        } else {
            self
        }
    }

    /// Whether the implication invariant holds.
    pub fn is_consistent(self) -> bool {
        !self.intersects(Self::TYPE | Self::VALUE) || self.contains(Self::INSTANTIATION)
    }

    /// What a parent inherits from one child: a dependent child makes the
    /// parent's value dependent, not necessarily its type.
    #[must_use]
    pub fn as_child(self) -> Self {
        let mut d = self & (Self::INSTANTIATION | Self::UNEXPANDED_PACK);
        if self.intersects(Self::TYPE | Self::VALUE) {
            d |= Self::VALUE;
        }
        d
    }
}

/// Operand and path of a cast.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CastData {
    pub kind: CastKind,
    pub sub: ExprId,
    pub path: BasePathRange,
}

/// Callee and arguments of a call.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CallData {
    pub callee: ExprId,
    pub args: ExprRange,
    pub rparen: SourceLocation,
}

/// Reference to a declared entity by name.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DeclRefData {
    pub decl: DeclId,
    pub trailing: TrailingLayout,
    /// Names a local of an enclosing function (lambda/block capture).
    pub refers_to_enclosing_local: bool,
    pub had_multiple_candidates: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct MemberData {
    pub base: ExprId,
    pub member: DeclId,
    pub is_arrow: bool,
    pub trailing: TrailingLayout,
}

/// Operand of `sizeof`/`alignof`/`vec_step`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TraitArg {
    Type(QualType),
    Expr(ExprId),
}

/// Node-specific part of an expression.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// Value bits; the width comes from the type.
    IntegerLiteral {
        value: u64,
    },
    CharacterLiteral {
        value: u32,
        kind: CharacterKind,
    },
    FloatingLiteral {
        value: f64,
        exact: bool,
    },
    StringLiteral {
        bytes: Box<[u8]>,
        kind: CharacterKind,
    },
    BoolLiteral {
        value: bool,
    },
    NullPtrLiteral,
    Predefined {
        ident: PredefinedIdent,
    },
    DeclRef(DeclRefData),
    This {
        implicit: bool,
    },
    ObjCSelector {
        selector: SelectorId,
    },
    Paren {
        sub: ExprId,
        rparen: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        sub: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    CompoundAssign {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        computation_lhs: QualType,
        computation_result: QualType,
    },
    Conditional {
        cond: ExprId,
        lhs: ExprId,
        rhs: ExprId,
    },
    ArraySubscript {
        lhs: ExprId,
        rhs: ExprId,
        rbracket: SourceLocation,
    },
    UnaryExprOrTypeTrait {
        kind: UnaryTrait,
        arg: TraitArg,
    },
    ImplicitCast(CastData),
    ExplicitCast {
        style: ExplicitCastStyle,
        cast: CastData,
        written: QualType,
    },
    Call(CallData),
    MemberCall(CallData),
    OperatorCall {
        op: OverloadedOperator,
        call: CallData,
    },
    Member(MemberData),
    InitList {
        inits: ExprRange,
        filler: Option<ExprId>,
        union_field: Option<DeclId>,
        lbrace: SourceLocation,
        rbrace: SourceLocation,
    },
    /// `subexprs[0]` is the initializer, the rest are designator indices.
    DesignatedInit {
        designators: DesignatorRange,
        subexprs: ExprRange,
        eq_loc: SourceLocation,
        gnu_syntax: bool,
    },
    ImplicitValueInit,
    CompoundLiteral {
        init: ExprId,
        written: QualType,
        file_scope: bool,
    },
    /// `_Generic`. `assoc_types[i]` is null for the `default` association.
    GenericSelection {
        controlling: ExprId,
        assoc_types: TypeRange,
        assoc_exprs: ExprRange,
        result_index: Option<u32>,
    },
    Atomic {
        op: AtomicOp,
        subexprs: ExprRange,
        rparen: SourceLocation,
    },
    ShuffleVector {
        subexprs: ExprRange,
        rparen: SourceLocation,
    },
    ConvertVector {
        src: ExprId,
        written: QualType,
    },
    ExtVectorElement {
        base: ExprId,
        accessor: Name,
    },
    Choose {
        cond: ExprId,
        lhs: ExprId,
        rhs: ExprId,
        cond_true: bool,
    },
    VAArg {
        sub: ExprId,
        written: QualType,
    },
    StmtExpr {
        body: StmtId,
    },
    AddrLabel {
        label: DeclId,
    },
    Construct {
        ctor: DeclId,
        args: ExprRange,
        elidable: bool,
        zero_init: bool,
    },
    DefaultArg {
        param: DeclId,
    },
    MaterializeTemporary {
        sub: ExprId,
        extended_by: Option<DeclId>,
    },
    OpaqueValue {
        source: Option<ExprId>,
    },
    PackExpansion {
        pattern: ExprId,
        num_expansions: Option<u32>,
    },
    SizeOfPack {
        pack: DeclId,
        length: Option<u32>,
    },
}

impl ExprKind {
    pub fn class(&self) -> StmtClass {
        match self {
            ExprKind::IntegerLiteral { .. } => StmtClass::IntegerLiteral,
            ExprKind::CharacterLiteral { .. } => StmtClass::CharacterLiteral,
            ExprKind::FloatingLiteral { .. } => StmtClass::FloatingLiteral,
            ExprKind::StringLiteral { .. } => StmtClass::StringLiteral,
            ExprKind::BoolLiteral { .. } => StmtClass::CXXBoolLiteral,
            ExprKind::NullPtrLiteral => StmtClass::CXXNullPtrLiteral,
            ExprKind::Predefined { .. } => StmtClass::PredefinedExpr,
            ExprKind::DeclRef(_) => StmtClass::DeclRefExpr,
            ExprKind::This { .. } => StmtClass::CXXThisExpr,
            ExprKind::ObjCSelector { .. } => StmtClass::ObjCSelectorExpr,
            ExprKind::Paren { .. } => StmtClass::ParenExpr,
            ExprKind::Unary { .. } => StmtClass::UnaryOperator,
            ExprKind::Binary { .. } => StmtClass::BinaryOperator,
            ExprKind::CompoundAssign { .. } => StmtClass::CompoundAssignOperator,
            ExprKind::Conditional { .. } => StmtClass::ConditionalOperator,
            ExprKind::ArraySubscript { .. } => StmtClass::ArraySubscriptExpr,
            ExprKind::UnaryExprOrTypeTrait { .. } => StmtClass::UnaryExprOrTypeTraitExpr,
            ExprKind::ImplicitCast(_) => StmtClass::ImplicitCastExpr,
            ExprKind::ExplicitCast { style, .. } => match style {
                ExplicitCastStyle::CStyle => StmtClass::CStyleCastExpr,
                ExplicitCastStyle::Functional => StmtClass::CXXFunctionalCastExpr,
                ExplicitCastStyle::Static => StmtClass::CXXStaticCastExpr,
                ExplicitCastStyle::Reinterpret => StmtClass::CXXReinterpretCastExpr,
                ExplicitCastStyle::Const => StmtClass::CXXConstCastExpr,
            },
            ExprKind::Call(_) => StmtClass::CallExpr,
            ExprKind::MemberCall(_) => StmtClass::CXXMemberCallExpr,
            ExprKind::OperatorCall { .. } => StmtClass::CXXOperatorCallExpr,
            ExprKind::Member(_) => StmtClass::MemberExpr,
            ExprKind::InitList { .. } => StmtClass::InitListExpr,
            ExprKind::DesignatedInit { .. } => StmtClass::DesignatedInitExpr,
            ExprKind::ImplicitValueInit => StmtClass::ImplicitValueInitExpr,
            ExprKind::CompoundLiteral { .. } => StmtClass::CompoundLiteralExpr,
            ExprKind::GenericSelection { .. } => StmtClass::GenericSelectionExpr,
            ExprKind::Atomic { .. } => StmtClass::AtomicExpr,
            ExprKind::ShuffleVector { .. } => StmtClass::ShuffleVectorExpr,
            ExprKind::ConvertVector { .. } => StmtClass::ConvertVectorExpr,
            ExprKind::ExtVectorElement { .. } => StmtClass::ExtVectorElementExpr,
            ExprKind::Choose { .. } => StmtClass::ChooseExpr,
            ExprKind::VAArg { .. } => StmtClass::VAArgExpr,
            ExprKind::StmtExpr { .. } => StmtClass::StmtExpr,
            ExprKind::AddrLabel { .. } => StmtClass::AddrLabelExpr,
            ExprKind::Construct { .. } => StmtClass::CXXConstructExpr,
            ExprKind::DefaultArg { .. } => StmtClass::CXXDefaultArgExpr,
            ExprKind::MaterializeTemporary { .. } => StmtClass::MaterializeTemporaryExpr,
            ExprKind::OpaqueValue { .. } => StmtClass::OpaqueValueExpr,
            ExprKind::PackExpansion { .. } => StmtClass::PackExpansionExpr,
            ExprKind::SizeOfPack { .. } => StmtClass::SizeOfPackExpr,
        }
    }

    /// Cast operand, for any cast kind.
    pub fn as_cast(&self) -> Option<&CastData> {
        match self {
            ExprKind::ImplicitCast(c) | ExprKind::ExplicitCast { cast: c, .. } => Some(c),
            _ => None,
        }
    }

    /// Callee and arguments, for any call kind.
    pub fn as_call(&self) -> Option<&CallData> {
        match self {
            ExprKind::Call(c)
            | ExprKind::MemberCall(c)
            | ExprKind::OperatorCall { call: c, .. } => Some(c),
            _ => None,
        }
    }

    /// Optional-section layout of a name reference.
    pub fn trailing_layout(&self) -> Option<TrailingLayout> {
        match self {
            ExprKind::DeclRef(d) => Some(d.trailing),
            ExprKind::Member(m) => Some(m.trailing),
            _ => None,
        }
    }
}

/// An expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub(crate) ty: QualType,
    pub(crate) loc: SourceLocation,
    pub(crate) value_kind: ExprValueKind,
    pub(crate) object_kind: ExprObjectKind,
    pub(crate) dependence: ExprDependence,
}

impl Expr {
    /// Reassemble a node from stored header fields. Only
    /// [`AstContext::restore_expr`](crate::AstContext::restore_expr) accepts
    /// the result.
    pub fn from_parts(
        kind: ExprKind,
        ty: QualType,
        loc: SourceLocation,
        value_kind: ExprValueKind,
        object_kind: ExprObjectKind,
        dependence: ExprDependence,
    ) -> Self {
        Expr {
            kind,
            ty,
            loc,
            value_kind,
            object_kind,
            dependence,
        }
    }

    #[inline]
    pub fn class(&self) -> StmtClass {
        self.kind.class()
    }

    /// Result type. Never a reference type.
    #[inline]
    pub fn ty(&self) -> QualType {
        self.ty
    }

    #[inline]
    pub fn loc(&self) -> SourceLocation {
        self.loc
    }

    #[inline]
    pub fn value_kind(&self) -> ExprValueKind {
        self.value_kind
    }

    #[inline]
    pub fn object_kind(&self) -> ExprObjectKind {
        self.object_kind
    }

    #[inline]
    pub fn dependence(&self) -> ExprDependence {
        self.dependence
    }

    pub fn set_value_kind(&mut self, vk: ExprValueKind) {
        self.value_kind = vk;
    }

    pub fn set_object_kind(&mut self, ok: ExprObjectKind) {
        self.object_kind = ok;
    }

    #[inline]
    pub fn is_lvalue(&self) -> bool {
        self.value_kind == ExprValueKind::LValue
    }

    #[inline]
    pub fn is_xvalue(&self) -> bool {
        self.value_kind == ExprValueKind::XValue
    }

    #[inline]
    pub fn is_prvalue(&self) -> bool {
        self.value_kind == ExprValueKind::RValue
    }

    #[inline]
    pub fn is_glvalue(&self) -> bool {
        !self.is_prvalue()
    }

    #[inline]
    pub fn is_type_dependent(&self) -> bool {
        self.dependence.contains(ExprDependence::TYPE)
    }

    #[inline]
    pub fn is_value_dependent(&self) -> bool {
        self.dependence.contains(ExprDependence::VALUE)
    }

    #[inline]
    pub fn is_instantiation_dependent(&self) -> bool {
        self.dependence.contains(ExprDependence::INSTANTIATION)
    }

    #[inline]
    pub fn contains_unexpanded_parameter_pack(&self) -> bool {
        self.dependence.contains(ExprDependence::UNEXPANDED_PACK)
    }

    /// Setting type-dependence also sets instantiation-dependence.
    pub fn set_type_dependent(&mut self, on: bool) {
        self.dependence.set(ExprDependence::TYPE, on);
        if on {
            self.dependence |= ExprDependence::INSTANTIATION;
        }
    }

    /// Setting value-dependence also sets instantiation-dependence.
    pub fn set_value_dependent(&mut self, on: bool) {
        self.dependence.set(ExprDependence::VALUE, on);
        if on {
            self.dependence |= ExprDependence::INSTANTIATION;
        }
    }

    /// # Panics
    /// Panics when clearing the flag while the expression is still type-
    /// or value-dependent.
    pub fn set_instantiation_dependent(&mut self, on: bool) {
        assert!(
            on || !self
                .dependence
                .intersects(ExprDependence::TYPE | ExprDependence::VALUE),
            "a type- or value-dependent expression is always instantiation-dependent"
        );
        self.dependence.set(ExprDependence::INSTANTIATION, on);
    }

    pub fn set_contains_unexpanded_parameter_pack(&mut self, on: bool) {
        self.dependence.set(ExprDependence::UNEXPANDED_PACK, on);
    }

    pub fn as_call(&self) -> Option<&CallData> {
        self.kind.as_call()
    }

    pub fn as_cast(&self) -> Option<&CastData> {
        self.kind.as_cast()
    }

    pub fn as_decl_ref(&self) -> Option<&DeclRefData> {
        match &self.kind {
            ExprKind::DeclRef(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&MemberData> {
        match &self.kind {
            ExprKind::Member(m) => Some(m),
            _ => None,
        }
    }
}
