//! Operator, cast and small field-level enumerations used by expressions.

raw_enum! {
    pub enum UnaryOp {
        PostInc,
        PostDec,
        PreInc,
        PreDec,
        AddrOf,
        Deref,
        Plus,
        Minus,
        Not,
        LNot,
        Real,
        Imag,
        Extension,
    }
}

impl UnaryOp {
    pub const fn is_increment_decrement(self) -> bool {
        matches!(
            self,
            UnaryOp::PostInc | UnaryOp::PostDec | UnaryOp::PreInc | UnaryOp::PreDec
        )
    }

    pub const fn is_prefix(self) -> bool {
        !matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    pub const fn spelling(self) -> &'static str {
        match self {
            UnaryOp::PostInc | UnaryOp::PreInc => "++",
            UnaryOp::PostDec | UnaryOp::PreDec => "--",
            UnaryOp::AddrOf => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "~",
            UnaryOp::LNot => "!",
            UnaryOp::Real => "__real",
            UnaryOp::Imag => "__imag",
            UnaryOp::Extension => "__extension__",
        }
    }
}

raw_enum! {
    pub enum BinaryOp {
        PtrMemD,
        PtrMemI,
        Mul,
        Div,
        Rem,
        Add,
        Sub,
        Shl,
        Shr,
        Lt,
        Gt,
        Le,
        Ge,
        Eq,
        Ne,
        And,
        Xor,
        Or,
        LAnd,
        LOr,
        Assign,
        MulAssign,
        DivAssign,
        RemAssign,
        AddAssign,
        SubAssign,
        ShlAssign,
        ShrAssign,
        AndAssign,
        XorAssign,
        OrAssign,
        Comma,
    }
}

impl BinaryOp {
    pub const fn is_assignment(self) -> bool {
        self as u8 >= BinaryOp::Assign as u8 && self as u8 <= BinaryOp::OrAssign as u8
    }

    pub const fn is_compound_assignment(self) -> bool {
        self as u8 > BinaryOp::Assign as u8 && self as u8 <= BinaryOp::OrAssign as u8
    }

    pub const fn is_comparison(self) -> bool {
        self as u8 >= BinaryOp::Lt as u8 && self as u8 <= BinaryOp::Ne as u8
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LAnd | BinaryOp::LOr)
    }

    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub const fn is_ptr_mem(self) -> bool {
        matches!(self, BinaryOp::PtrMemD | BinaryOp::PtrMemI)
    }

    /// The arithmetic operation a compound assignment performs
    /// (`+=` → `+`).
    pub const fn compound_to_arithmetic(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            BinaryOp::RemAssign => BinaryOp::Rem,
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::ShlAssign => BinaryOp::Shl,
            BinaryOp::ShrAssign => BinaryOp::Shr,
            BinaryOp::AndAssign => BinaryOp::And,
            BinaryOp::XorAssign => BinaryOp::Xor,
            BinaryOp::OrAssign => BinaryOp::Or,
            _ => return None,
        })
    }

    pub const fn spelling(self) -> &'static str {
        match self {
            BinaryOp::PtrMemD => ".*",
            BinaryOp::PtrMemI => "->*",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&",
            BinaryOp::Xor => "^",
            BinaryOp::Or => "|",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
            BinaryOp::Assign => "=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::OrAssign => "|=",
            BinaryOp::Comma => ",",
        }
    }
}

raw_enum! {
    /// What a cast does to its operand.
    pub enum CastKind {
        Dependent,
        BitCast,
        LValueBitCast,
        LValueToRValue,
        NoOp,
        BaseToDerived,
        DerivedToBase,
        UncheckedDerivedToBase,
        Dynamic,
        ToUnion,
        ArrayToPointerDecay,
        FunctionToPointerDecay,
        NullToPointer,
        IntegralToPointer,
        PointerToIntegral,
        PointerToBoolean,
        ToVoid,
        VectorSplat,
        IntegralCast,
        IntegralToBoolean,
        IntegralToFloating,
        FloatingToIntegral,
        FloatingToBoolean,
        FloatingCast,
        UserDefinedConversion,
        ConstructorConversion,
        AtomicToNonAtomic,
        NonAtomicToAtomic,
    }
}

impl CastKind {
    /// Casts that carry a base-class path.
    pub const fn has_base_path(self) -> bool {
        matches!(
            self,
            CastKind::BaseToDerived | CastKind::DerivedToBase | CastKind::UncheckedDerivedToBase
        )
    }
}

raw_enum! {
    /// Spelling of an explicit cast.
    pub enum ExplicitCastStyle {
        CStyle,
        Functional,
        Static,
        Reinterpret,
        Const,
    }
}

raw_enum! {
    pub enum CharacterKind {
        Ascii,
        Wide,
        Utf8,
        Utf16,
        Utf32,
    }
}

raw_enum! {
    pub enum PredefinedIdent {
        Func,
        Function,
        PrettyFunction,
    }
}

raw_enum! {
    pub enum UnaryTrait {
        SizeOf,
        AlignOf,
        VecStep,
    }
}

raw_enum! {
    pub enum AtomicOp {
        Init,
        Load,
        Store,
        Exchange,
        CompareExchangeStrong,
        CompareExchangeWeak,
        FetchAdd,
        FetchSub,
        FetchAnd,
        FetchOr,
        FetchXor,
    }
}

impl AtomicOp {
    /// Number of operands, counting memory orders.
    pub const fn num_subexprs(self) -> usize {
        match self {
            AtomicOp::Init | AtomicOp::Load => 2,
            AtomicOp::CompareExchangeStrong | AtomicOp::CompareExchangeWeak => 5,
            _ => 3,
        }
    }
}

raw_enum! {
    /// Operator named by a `CXXOperatorCallExpr`.
    pub enum OverloadedOperator {
        Plus,
        Minus,
        Star,
        Slash,
        Percent,
        Amp,
        Pipe,
        Equal,
        EqualEqual,
        ExclaimEqual,
        Less,
        Greater,
        LessLess,
        GreaterGreater,
        PlusPlus,
        MinusMinus,
        Arrow,
        Call,
        Subscript,
    }
}
