//! Node class registry: closed, linearly ordered kind tags.
//!
//! Every concrete statement, expression, declaration and type kind has a
//! small-integer tag. Tags are numbered densely and grouped so that each
//! abstract category ("all casts", "all calls", "all function decls")
//! occupies one contiguous range. A dynamic-type test is then a pair of
//! integer comparisons instead of a match over every member.
//!
//! # Stmt/Expr tag layout
//!
//! - 0-15: statements
//! - 16-21: literals
//! - 27-30: operators (28-29 binary operators)
//! - 33-38: casts (34-38 explicit, 36-38 named C++ casts)
//! - 39-41: calls
//! - 16-61: all expressions
//!
//! The numbering is also the on-disk record numbering, so reordering a
//! variant invalidates every previously written AST file.

use std::fmt;

macro_rules! class_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $value:literal => $text:literal,)* }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value,)*
        }

        impl $name {
            /// Every tag, indexed by its numeric value.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Number of tags.
            pub const COUNT: usize = Self::ALL.len();

            /// Decode a raw tag; `None` if no such kind exists.
            #[inline]
            pub fn from_raw(raw: u8) -> Option<Self> {
                Self::ALL.get(raw as usize).copied()
            }

            #[inline]
            pub const fn raw(self) -> u8 {
                self as u8
            }

            /// Name of the concrete node kind.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

class_enum! {
    /// Concrete statement and expression kinds.
    pub enum StmtClass {
        NullStmt = 0 => "NullStmt",
        CompoundStmt = 1 => "CompoundStmt",
        DeclStmt = 2 => "DeclStmt",
        ExprStmt = 3 => "ExprStmt",
        LabelStmt = 4 => "LabelStmt",
        IfStmt = 5 => "IfStmt",
        SwitchStmt = 6 => "SwitchStmt",
        CaseStmt = 7 => "CaseStmt",
        DefaultStmt = 8 => "DefaultStmt",
        WhileStmt = 9 => "WhileStmt",
        DoStmt = 10 => "DoStmt",
        ForStmt = 11 => "ForStmt",
        GotoStmt = 12 => "GotoStmt",
        ContinueStmt = 13 => "ContinueStmt",
        BreakStmt = 14 => "BreakStmt",
        ReturnStmt = 15 => "ReturnStmt",
        IntegerLiteral = 16 => "IntegerLiteral",
        CharacterLiteral = 17 => "CharacterLiteral",
        FloatingLiteral = 18 => "FloatingLiteral",
        StringLiteral = 19 => "StringLiteral",
        CXXBoolLiteral = 20 => "CXXBoolLiteralExpr",
        CXXNullPtrLiteral = 21 => "CXXNullPtrLiteralExpr",
        PredefinedExpr = 22 => "PredefinedExpr",
        DeclRefExpr = 23 => "DeclRefExpr",
        CXXThisExpr = 24 => "CXXThisExpr",
        ObjCSelectorExpr = 25 => "ObjCSelectorExpr",
        ParenExpr = 26 => "ParenExpr",
        UnaryOperator = 27 => "UnaryOperator",
        BinaryOperator = 28 => "BinaryOperator",
        CompoundAssignOperator = 29 => "CompoundAssignOperator",
        ConditionalOperator = 30 => "ConditionalOperator",
        ArraySubscriptExpr = 31 => "ArraySubscriptExpr",
        UnaryExprOrTypeTraitExpr = 32 => "UnaryExprOrTypeTraitExpr",
        ImplicitCastExpr = 33 => "ImplicitCastExpr",
        CStyleCastExpr = 34 => "CStyleCastExpr",
        CXXFunctionalCastExpr = 35 => "CXXFunctionalCastExpr",
        CXXStaticCastExpr = 36 => "CXXStaticCastExpr",
        CXXReinterpretCastExpr = 37 => "CXXReinterpretCastExpr",
        CXXConstCastExpr = 38 => "CXXConstCastExpr",
        CallExpr = 39 => "CallExpr",
        CXXMemberCallExpr = 40 => "CXXMemberCallExpr",
        CXXOperatorCallExpr = 41 => "CXXOperatorCallExpr",
        MemberExpr = 42 => "MemberExpr",
        InitListExpr = 43 => "InitListExpr",
        DesignatedInitExpr = 44 => "DesignatedInitExpr",
        ImplicitValueInitExpr = 45 => "ImplicitValueInitExpr",
        CompoundLiteralExpr = 46 => "CompoundLiteralExpr",
        GenericSelectionExpr = 47 => "GenericSelectionExpr",
        AtomicExpr = 48 => "AtomicExpr",
        ShuffleVectorExpr = 49 => "ShuffleVectorExpr",
        ConvertVectorExpr = 50 => "ConvertVectorExpr",
        ExtVectorElementExpr = 51 => "ExtVectorElementExpr",
        ChooseExpr = 52 => "ChooseExpr",
        VAArgExpr = 53 => "VAArgExpr",
        StmtExpr = 54 => "StmtExpr",
        AddrLabelExpr = 55 => "AddrLabelExpr",
        CXXConstructExpr = 56 => "CXXConstructExpr",
        CXXDefaultArgExpr = 57 => "CXXDefaultArgExpr",
        MaterializeTemporaryExpr = 58 => "MaterializeTemporaryExpr",
        OpaqueValueExpr = 59 => "OpaqueValueExpr",
        PackExpansionExpr = 60 => "PackExpansionExpr",
        SizeOfPackExpr = 61 => "SizeOfPackExpr",
    }
}

impl StmtClass {
    pub const FIRST_STMT: Self = Self::NullStmt;
    pub const LAST_STMT: Self = Self::ReturnStmt;
    pub const FIRST_SWITCH_CASE: Self = Self::CaseStmt;
    pub const LAST_SWITCH_CASE: Self = Self::DefaultStmt;
    pub const FIRST_EXPR: Self = Self::IntegerLiteral;
    pub const LAST_EXPR: Self = Self::SizeOfPackExpr;
    pub const FIRST_LITERAL: Self = Self::IntegerLiteral;
    pub const LAST_LITERAL: Self = Self::CXXNullPtrLiteral;
    pub const FIRST_OPERATOR: Self = Self::UnaryOperator;
    pub const LAST_OPERATOR: Self = Self::ConditionalOperator;
    pub const FIRST_BINARY_OPERATOR: Self = Self::BinaryOperator;
    pub const LAST_BINARY_OPERATOR: Self = Self::CompoundAssignOperator;
    pub const FIRST_CAST: Self = Self::ImplicitCastExpr;
    pub const LAST_CAST: Self = Self::CXXConstCastExpr;
    pub const FIRST_EXPLICIT_CAST: Self = Self::CStyleCastExpr;
    pub const LAST_EXPLICIT_CAST: Self = Self::CXXConstCastExpr;
    pub const FIRST_NAMED_CAST: Self = Self::CXXStaticCastExpr;
    pub const LAST_NAMED_CAST: Self = Self::CXXConstCastExpr;
    pub const FIRST_CALL: Self = Self::CallExpr;
    pub const LAST_CALL: Self = Self::CXXOperatorCallExpr;

    #[inline]
    const fn in_range(self, first: Self, last: Self) -> bool {
        let v = self as u8;
        v >= first as u8 && v <= last as u8
    }

    #[inline]
    pub const fn is_expr(self) -> bool {
        self.in_range(Self::FIRST_EXPR, Self::LAST_EXPR)
    }

    #[inline]
    pub const fn is_switch_case(self) -> bool {
        self.in_range(Self::FIRST_SWITCH_CASE, Self::LAST_SWITCH_CASE)
    }

    #[inline]
    pub const fn is_literal(self) -> bool {
        self.in_range(Self::FIRST_LITERAL, Self::LAST_LITERAL)
    }

    #[inline]
    pub const fn is_operator(self) -> bool {
        self.in_range(Self::FIRST_OPERATOR, Self::LAST_OPERATOR)
    }

    #[inline]
    pub const fn is_binary_operator(self) -> bool {
        self.in_range(Self::FIRST_BINARY_OPERATOR, Self::LAST_BINARY_OPERATOR)
    }

    #[inline]
    pub const fn is_cast(self) -> bool {
        self.in_range(Self::FIRST_CAST, Self::LAST_CAST)
    }

    #[inline]
    pub const fn is_explicit_cast(self) -> bool {
        self.in_range(Self::FIRST_EXPLICIT_CAST, Self::LAST_EXPLICIT_CAST)
    }

    #[inline]
    pub const fn is_named_cast(self) -> bool {
        self.in_range(Self::FIRST_NAMED_CAST, Self::LAST_NAMED_CAST)
    }

    #[inline]
    pub const fn is_call(self) -> bool {
        self.in_range(Self::FIRST_CALL, Self::LAST_CALL)
    }
}

class_enum! {
    /// Concrete declaration kinds.
    pub enum DeclClass {
        TranslationUnit = 0 => "TranslationUnit",
        StaticAssert = 1 => "StaticAssert",
        Namespace = 2 => "Namespace",
        Label = 3 => "Label",
        Typedef = 4 => "Typedef",
        Enum = 5 => "Enum",
        Record = 6 => "CXXRecord",
        TemplateTypeParm = 7 => "TemplateTypeParm",
        FunctionTemplate = 8 => "FunctionTemplate",
        ClassTemplate = 9 => "ClassTemplate",
        EnumConstant = 10 => "EnumConstant",
        Field = 11 => "Field",
        NonTypeTemplateParm = 12 => "NonTypeTemplateParm",
        Function = 13 => "Function",
        CXXMethod = 14 => "CXXMethod",
        CXXConstructor = 15 => "CXXConstructor",
        CXXDestructor = 16 => "CXXDestructor",
        CXXConversion = 17 => "CXXConversion",
        Var = 18 => "Var",
        ParmVar = 19 => "ParmVar",
    }
}

impl DeclClass {
    pub const FIRST_NAMED: Self = Self::Namespace;
    pub const LAST_NAMED: Self = Self::ParmVar;
    pub const FIRST_TYPE: Self = Self::Typedef;
    pub const LAST_TYPE: Self = Self::TemplateTypeParm;
    pub const FIRST_TAG: Self = Self::Enum;
    pub const LAST_TAG: Self = Self::Record;
    pub const FIRST_TEMPLATE: Self = Self::FunctionTemplate;
    pub const LAST_TEMPLATE: Self = Self::ClassTemplate;
    pub const FIRST_VALUE: Self = Self::EnumConstant;
    pub const LAST_VALUE: Self = Self::ParmVar;
    pub const FIRST_DECLARATOR: Self = Self::Field;
    pub const LAST_DECLARATOR: Self = Self::ParmVar;
    pub const FIRST_FUNCTION: Self = Self::Function;
    pub const LAST_FUNCTION: Self = Self::CXXConversion;
    pub const FIRST_CXX_METHOD: Self = Self::CXXMethod;
    pub const LAST_CXX_METHOD: Self = Self::CXXConversion;
    pub const FIRST_VAR: Self = Self::Var;
    pub const LAST_VAR: Self = Self::ParmVar;

    #[inline]
    const fn in_range(self, first: Self, last: Self) -> bool {
        let v = self as u8;
        v >= first as u8 && v <= last as u8
    }

    #[inline]
    pub const fn is_named(self) -> bool {
        self.in_range(Self::FIRST_NAMED, Self::LAST_NAMED)
    }

    #[inline]
    pub const fn is_type_decl(self) -> bool {
        self.in_range(Self::FIRST_TYPE, Self::LAST_TYPE)
    }

    #[inline]
    pub const fn is_tag(self) -> bool {
        self.in_range(Self::FIRST_TAG, Self::LAST_TAG)
    }

    #[inline]
    pub const fn is_template(self) -> bool {
        self.in_range(Self::FIRST_TEMPLATE, Self::LAST_TEMPLATE)
    }

    #[inline]
    pub const fn is_value(self) -> bool {
        self.in_range(Self::FIRST_VALUE, Self::LAST_VALUE)
    }

    #[inline]
    pub const fn is_declarator(self) -> bool {
        self.in_range(Self::FIRST_DECLARATOR, Self::LAST_DECLARATOR)
    }

    #[inline]
    pub const fn is_function(self) -> bool {
        self.in_range(Self::FIRST_FUNCTION, Self::LAST_FUNCTION)
    }

    #[inline]
    pub const fn is_cxx_method(self) -> bool {
        self.in_range(Self::FIRST_CXX_METHOD, Self::LAST_CXX_METHOD)
    }

    #[inline]
    pub const fn is_var(self) -> bool {
        self.in_range(Self::FIRST_VAR, Self::LAST_VAR)
    }

    #[inline]
    pub const fn is_template_parameter(self) -> bool {
        matches!(self, Self::TemplateTypeParm | Self::NonTypeTemplateParm)
    }

    /// Kinds that participate in redeclaration chains.
    #[inline]
    pub const fn is_redeclarable(self) -> bool {
        matches!(
            self,
            Self::Namespace | Self::Typedef | Self::Var
        ) || self.is_tag()
            || self.is_template()
            || self.is_function()
    }

    /// Kinds that own a list of lexically nested declarations.
    #[inline]
    pub const fn is_decl_context(self) -> bool {
        matches!(self, Self::TranslationUnit | Self::Namespace)
            || self.is_tag()
            || self.is_function()
    }
}

class_enum! {
    /// Type node kinds.
    pub enum TypeClass {
        Builtin = 0 => "Builtin",
        Pointer = 1 => "Pointer",
        LValueReference = 2 => "LValueReference",
        RValueReference = 3 => "RValueReference",
        ConstantArray = 4 => "ConstantArray",
        IncompleteArray = 5 => "IncompleteArray",
        Vector = 6 => "Vector",
        ExtVector = 7 => "ExtVector",
        FunctionProto = 8 => "FunctionProto",
        Record = 9 => "Record",
        Enum = 10 => "Enum",
        Typedef = 11 => "Typedef",
        TemplateTypeParm = 12 => "TemplateTypeParm",
        Atomic = 13 => "Atomic",
        PackExpansion = 14 => "PackExpansion",
    }
}

impl TypeClass {
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::LValueReference | Self::RValueReference)
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::ConstantArray | Self::IncompleteArray)
    }

    #[inline]
    pub const fn is_vector(self) -> bool {
        matches!(self, Self::Vector | Self::ExtVector)
    }
}

const _: () = assert!(std::mem::size_of::<StmtClass>() == 1);
