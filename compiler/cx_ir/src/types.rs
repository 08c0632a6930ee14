//! Type representation: interned type nodes plus qualifiers.
//!
//! Every distinct type is interned once into the [`TypePool`] and named
//! by a [`TypeId`]. Qualifiers live outside the pool in [`QualType`] so
//! `const int` and `int` share one node. Builtins occupy fixed indices
//! below [`TypeId::FIRST_DYNAMIC`]; the AST file format relies on that to
//! encode them without a type record.

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::ids::to_u32;
use crate::node_class::TypeClass;
use crate::DeclId;

/// Index of an interned type node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: Self = Self(0);
    pub const BOOL: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const SCHAR: Self = Self(3);
    pub const UCHAR: Self = Self(4);
    pub const SHORT: Self = Self(5);
    pub const USHORT: Self = Self(6);
    pub const INT: Self = Self(7);
    pub const UINT: Self = Self(8);
    pub const LONG: Self = Self(9);
    pub const ULONG: Self = Self(10);
    pub const LONG_LONG: Self = Self(11);
    pub const ULONG_LONG: Self = Self(12);
    pub const FLOAT: Self = Self(13);
    pub const DOUBLE: Self = Self(14);
    pub const LONG_DOUBLE: Self = Self(15);
    pub const NULLPTR: Self = Self(16);
    /// Placeholder for a type that depends on a template parameter.
    pub const DEPENDENT: Self = Self(17);
    pub const OBJC_SEL: Self = Self(18);

    /// First index handed out for non-builtin types.
    pub const FIRST_DYNAMIC: u32 = 19;

    pub const INVALID: Self = Self(u32::MAX);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match BuiltinKind::from_type_id(*self) {
            Some(b) => write!(f, "TypeId({})", b.name()),
            None if self.is_valid() => write!(f, "TypeId({})", self.0),
            None => f.write_str("TypeId::INVALID"),
        }
    }
}

/// Builtin scalar types, in [`TypeId`] order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum BuiltinKind {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    NullPtr,
    Dependent,
    ObjCSel,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; TypeId::FIRST_DYNAMIC as usize] = [
        BuiltinKind::Void,
        BuiltinKind::Bool,
        BuiltinKind::Char,
        BuiltinKind::SChar,
        BuiltinKind::UChar,
        BuiltinKind::Short,
        BuiltinKind::UShort,
        BuiltinKind::Int,
        BuiltinKind::UInt,
        BuiltinKind::Long,
        BuiltinKind::ULong,
        BuiltinKind::LongLong,
        BuiltinKind::ULongLong,
        BuiltinKind::Float,
        BuiltinKind::Double,
        BuiltinKind::LongDouble,
        BuiltinKind::NullPtr,
        BuiltinKind::Dependent,
        BuiltinKind::ObjCSel,
    ];

    #[inline]
    pub const fn type_id(self) -> TypeId {
        TypeId(self as u32)
    }

    pub fn from_type_id(id: TypeId) -> Option<Self> {
        Self::ALL.get(id.index()).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            BuiltinKind::Void => "void",
            BuiltinKind::Bool => "bool",
            BuiltinKind::Char => "char",
            BuiltinKind::SChar => "signed char",
            BuiltinKind::UChar => "unsigned char",
            BuiltinKind::Short => "short",
            BuiltinKind::UShort => "unsigned short",
            BuiltinKind::Int => "int",
            BuiltinKind::UInt => "unsigned int",
            BuiltinKind::Long => "long",
            BuiltinKind::ULong => "unsigned long",
            BuiltinKind::LongLong => "long long",
            BuiltinKind::ULongLong => "unsigned long long",
            BuiltinKind::Float => "float",
            BuiltinKind::Double => "double",
            BuiltinKind::LongDouble => "long double",
            BuiltinKind::NullPtr => "nullptr_t",
            BuiltinKind::Dependent => "<dependent type>",
            BuiltinKind::ObjCSel => "SEL",
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            BuiltinKind::Bool
                | BuiltinKind::Char
                | BuiltinKind::SChar
                | BuiltinKind::UChar
                | BuiltinKind::Short
                | BuiltinKind::UShort
                | BuiltinKind::Int
                | BuiltinKind::UInt
                | BuiltinKind::Long
                | BuiltinKind::ULong
                | BuiltinKind::LongLong
                | BuiltinKind::ULongLong
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(
            self,
            BuiltinKind::Float | BuiltinKind::Double | BuiltinKind::LongDouble
        )
    }
}

bitflags! {
    /// CVR qualifiers. The low three bits double as the "fast" qualifiers
    /// packed beside a type index in the AST file.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Qualifiers: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
    }
}

/// A type node plus its qualifiers.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct QualType {
    pub ty: TypeId,
    pub quals: Qualifiers,
}

impl QualType {
    /// Absent type (e.g. the default association of a generic selection).
    pub const NULL: Self = Self {
        ty: TypeId::INVALID,
        quals: Qualifiers::empty(),
    };

    #[inline]
    pub const fn new(ty: TypeId, quals: Qualifiers) -> Self {
        Self { ty, quals }
    }

    #[inline]
    pub const fn unqualified(ty: TypeId) -> Self {
        Self {
            ty,
            quals: Qualifiers::empty(),
        }
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        !self.ty.is_valid()
    }

    #[inline]
    pub const fn is_const_qualified(self) -> bool {
        self.quals.contains(Qualifiers::CONST)
    }

    #[inline]
    #[must_use]
    pub fn with_const(self) -> Self {
        Self {
            ty: self.ty,
            quals: self.quals | Qualifiers::CONST,
        }
    }

    #[inline]
    #[must_use]
    pub const fn unqualified_type(self) -> Self {
        Self::unqualified(self.ty)
    }
}

impl Default for QualType {
    fn default() -> Self {
        QualType::NULL
    }
}

impl From<TypeId> for QualType {
    fn from(ty: TypeId) -> Self {
        QualType::unqualified(ty)
    }
}

impl fmt::Debug for QualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quals.is_empty() {
            write!(f, "{:?}", self.ty)
        } else {
            write!(f, "{:?} {:?}", self.quals, self.ty)
        }
    }
}

/// Structure of one interned type node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Builtin(BuiltinKind),
    Pointer(QualType),
    LValueReference(QualType),
    RValueReference(QualType),
    ConstantArray { element: QualType, size: u64 },
    IncompleteArray { element: QualType },
    Vector { element: QualType, len: u32 },
    ExtVector { element: QualType, len: u32 },
    FunctionProto {
        result: QualType,
        params: Box<[QualType]>,
        variadic: bool,
    },
    Record(DeclId),
    Enum(DeclId),
    Typedef { decl: DeclId, canonical: QualType },
    TemplateTypeParm {
        depth: u32,
        index: u32,
        pack: bool,
        decl: DeclId,
    },
    Atomic(QualType),
    PackExpansion(QualType),
}

impl TypeKind {
    pub const fn class(&self) -> TypeClass {
        match self {
            TypeKind::Builtin(_) => TypeClass::Builtin,
            TypeKind::Pointer(_) => TypeClass::Pointer,
            TypeKind::LValueReference(_) => TypeClass::LValueReference,
            TypeKind::RValueReference(_) => TypeClass::RValueReference,
            TypeKind::ConstantArray { .. } => TypeClass::ConstantArray,
            TypeKind::IncompleteArray { .. } => TypeClass::IncompleteArray,
            TypeKind::Vector { .. } => TypeClass::Vector,
            TypeKind::ExtVector { .. } => TypeClass::ExtVector,
            TypeKind::FunctionProto { .. } => TypeClass::FunctionProto,
            TypeKind::Record(_) => TypeClass::Record,
            TypeKind::Enum(_) => TypeClass::Enum,
            TypeKind::Typedef { .. } => TypeClass::Typedef,
            TypeKind::TemplateTypeParm { .. } => TypeClass::TemplateTypeParm,
            TypeKind::Atomic(_) => TypeClass::Atomic,
            TypeKind::PackExpansion(_) => TypeClass::PackExpansion,
        }
    }
}

bitflags! {
    /// Type properties computed once at interning.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        /// Depends on a template parameter.
        const DEPENDENT = 1 << 0;
        /// Mentions a template parameter somewhere, even if the type
        /// itself is known.
        const INSTANTIATION_DEPENDENT = 1 << 1;
        /// Names a parameter pack that is not yet expanded.
        const CONTAINS_UNEXPANDED_PACK = 1 << 2;

        const IS_REFERENCE = 1 << 4;
        const IS_INTEGER = 1 << 5;
        const IS_FLOATING = 1 << 6;
        const IS_SCALAR = 1 << 7;
        const IS_ARITHMETIC = 1 << 8;

        /// Bits inherited from component types.
        const PROPAGATED = Self::DEPENDENT.bits()
            | Self::INSTANTIATION_DEPENDENT.bits()
            | Self::CONTAINS_UNEXPANDED_PACK.bits();
    }
}

impl TypeFlags {
    #[inline]
    pub const fn is_dependent(self) -> bool {
        self.contains(Self::DEPENDENT)
    }
}

/// Interned type storage.
#[derive(Clone, Debug)]
pub struct TypePool {
    kinds: Vec<TypeKind>,
    flags: Vec<TypeFlags>,
    map: FxHashMap<TypeKind, TypeId>,
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    pub fn new() -> Self {
        let mut pool = TypePool {
            kinds: Vec::with_capacity(64),
            flags: Vec::with_capacity(64),
            map: FxHashMap::default(),
        };
        for builtin in BuiltinKind::ALL {
            let id = pool.intern(TypeKind::Builtin(builtin));
            debug_assert_eq!(id, builtin.type_id());
        }
        pool
    }

    /// Intern `kind`, returning the existing node if one matches.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.map.get(&kind) {
            return id;
        }
        let flags = self.compute_flags(&kind);
        let id = TypeId(to_u32(self.kinds.len(), "types"));
        self.kinds.push(kind.clone());
        self.flags.push(flags);
        self.map.insert(kind, id);
        id
    }

    fn component_flags(&self, qt: QualType) -> TypeFlags {
        if qt.is_null() {
            TypeFlags::empty()
        } else {
            self.flags(qt.ty) & TypeFlags::PROPAGATED
        }
    }

    fn compute_flags(&self, kind: &TypeKind) -> TypeFlags {
        match kind {
            TypeKind::Builtin(b) => {
                let mut f = TypeFlags::empty();
                if b.is_integer() {
                    f |= TypeFlags::IS_INTEGER | TypeFlags::IS_ARITHMETIC | TypeFlags::IS_SCALAR;
                }
                if b.is_floating() {
                    f |= TypeFlags::IS_FLOATING | TypeFlags::IS_ARITHMETIC | TypeFlags::IS_SCALAR;
                }
                if matches!(b, BuiltinKind::NullPtr | BuiltinKind::ObjCSel) {
                    f |= TypeFlags::IS_SCALAR;
                }
                if *b == BuiltinKind::Dependent {
                    f |= TypeFlags::DEPENDENT | TypeFlags::INSTANTIATION_DEPENDENT;
                }
                f
            }
            TypeKind::Pointer(p) => self.component_flags(*p) | TypeFlags::IS_SCALAR,
            TypeKind::LValueReference(p) | TypeKind::RValueReference(p) => {
                self.component_flags(*p) | TypeFlags::IS_REFERENCE
            }
            TypeKind::ConstantArray { element, .. }
            | TypeKind::IncompleteArray { element }
            | TypeKind::Vector { element, .. }
            | TypeKind::ExtVector { element, .. } => self.component_flags(*element),
            TypeKind::FunctionProto { result, params, .. } => params
                .iter()
                .fold(self.component_flags(*result), |acc, p| {
                    acc | self.component_flags(*p)
                }),
            // Scoped enumerations are not arithmetic; plain ones are
            // treated as integers for folding purposes.
            TypeKind::Enum(_) => TypeFlags::IS_INTEGER | TypeFlags::IS_SCALAR,
            TypeKind::Record(_) => TypeFlags::empty(),
            TypeKind::Typedef { canonical, .. } => self.flags(canonical.ty),
            TypeKind::TemplateTypeParm { pack, .. } => {
                let mut f = TypeFlags::DEPENDENT | TypeFlags::INSTANTIATION_DEPENDENT;
                if *pack {
                    f |= TypeFlags::CONTAINS_UNEXPANDED_PACK;
                }
                f
            }
            TypeKind::Atomic(v) => self.flags(v.ty),
            TypeKind::PackExpansion(pattern) => {
                (self.component_flags(*pattern) - TypeFlags::CONTAINS_UNEXPANDED_PACK)
                    | TypeFlags::DEPENDENT
                    | TypeFlags::INSTANTIATION_DEPENDENT
            }
        }
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.index()]
    }

    #[inline]
    pub fn class(&self, id: TypeId) -> TypeClass {
        self.kind(id).class()
    }

    #[inline]
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.flags[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Every interned type, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeKind)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(i, k)| (TypeId(i as u32), k))
    }

    // === Constructors ===

    pub fn pointer(&mut self, pointee: QualType) -> QualType {
        self.intern(TypeKind::Pointer(pointee)).into()
    }

    pub fn lvalue_reference(&mut self, pointee: QualType) -> QualType {
        self.intern(TypeKind::LValueReference(pointee)).into()
    }

    pub fn rvalue_reference(&mut self, pointee: QualType) -> QualType {
        self.intern(TypeKind::RValueReference(pointee)).into()
    }

    pub fn constant_array(&mut self, element: QualType, size: u64) -> QualType {
        self.intern(TypeKind::ConstantArray { element, size }).into()
    }

    pub fn incomplete_array(&mut self, element: QualType) -> QualType {
        self.intern(TypeKind::IncompleteArray { element }).into()
    }

    pub fn vector(&mut self, element: QualType, len: u32) -> QualType {
        self.intern(TypeKind::Vector { element, len }).into()
    }

    pub fn ext_vector(&mut self, element: QualType, len: u32) -> QualType {
        self.intern(TypeKind::ExtVector { element, len }).into()
    }

    pub fn function(&mut self, result: QualType, params: &[QualType], variadic: bool) -> QualType {
        self.intern(TypeKind::FunctionProto {
            result,
            params: params.into(),
            variadic,
        })
        .into()
    }

    pub fn record(&mut self, decl: DeclId) -> QualType {
        self.intern(TypeKind::Record(decl)).into()
    }

    pub fn enum_type(&mut self, decl: DeclId) -> QualType {
        self.intern(TypeKind::Enum(decl)).into()
    }

    pub fn typedef(&mut self, decl: DeclId, underlying: QualType) -> QualType {
        let canonical = self.canonical(underlying);
        self.intern(TypeKind::Typedef { decl, canonical }).into()
    }

    pub fn template_type_parm(
        &mut self,
        depth: u32,
        index: u32,
        pack: bool,
        decl: DeclId,
    ) -> QualType {
        self.intern(TypeKind::TemplateTypeParm {
            depth,
            index,
            pack,
            decl,
        })
        .into()
    }

    pub fn atomic(&mut self, value: QualType) -> QualType {
        self.intern(TypeKind::Atomic(value)).into()
    }

    pub fn pack_expansion(&mut self, pattern: QualType) -> QualType {
        self.intern(TypeKind::PackExpansion(pattern)).into()
    }

    // === Queries ===

    /// Strip typedef sugar, accumulating qualifiers.
    pub fn canonical(&self, mut qt: QualType) -> QualType {
        while let TypeKind::Typedef { canonical, .. } = self.kind(qt.ty) {
            qt = QualType::new(canonical.ty, canonical.quals | qt.quals);
        }
        qt
    }

    fn canonical_kind(&self, qt: QualType) -> &TypeKind {
        self.kind(self.canonical(qt).ty)
    }

    #[inline]
    pub fn is_dependent(&self, qt: QualType) -> bool {
        !qt.is_null() && self.flags(qt.ty).is_dependent()
    }

    #[inline]
    pub fn is_reference_type(&self, qt: QualType) -> bool {
        self.flags(qt.ty).contains(TypeFlags::IS_REFERENCE)
    }

    /// Referenced type if `qt` is a reference, `qt` itself otherwise.
    pub fn non_reference_type(&self, qt: QualType) -> QualType {
        match self.canonical_kind(qt) {
            TypeKind::LValueReference(p) | TypeKind::RValueReference(p) => *p,
            _ => qt,
        }
    }

    pub fn pointee(&self, qt: QualType) -> Option<QualType> {
        match self.canonical_kind(qt) {
            TypeKind::Pointer(p) | TypeKind::LValueReference(p) | TypeKind::RValueReference(p) => {
                Some(*p)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn is_integer_type(&self, qt: QualType) -> bool {
        self.flags(qt.ty).contains(TypeFlags::IS_INTEGER)
    }

    #[inline]
    pub fn is_arithmetic_type(&self, qt: QualType) -> bool {
        self.flags(qt.ty).contains(TypeFlags::IS_ARITHMETIC)
    }

    #[inline]
    pub fn is_scalar_type(&self, qt: QualType) -> bool {
        self.flags(qt.ty).contains(TypeFlags::IS_SCALAR)
    }

    #[inline]
    pub fn is_real_floating(&self, qt: QualType) -> bool {
        self.flags(qt.ty).contains(TypeFlags::IS_FLOATING)
    }

    /// Signedness of an integer type; `char` follows `char_is_signed`.
    pub fn is_signed_integer(&self, qt: QualType, char_is_signed: bool) -> bool {
        match self.canonical_kind(qt) {
            TypeKind::Builtin(b) => match b {
                BuiltinKind::Char => char_is_signed,
                BuiltinKind::SChar
                | BuiltinKind::Short
                | BuiltinKind::Int
                | BuiltinKind::Long
                | BuiltinKind::LongLong => true,
                _ => false,
            },
            TypeKind::Enum(_) => true,
            _ => false,
        }
    }

    pub fn builtin_kind(&self, qt: QualType) -> Option<BuiltinKind> {
        match self.canonical_kind(qt) {
            TypeKind::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_void(&self, qt: QualType) -> bool {
        self.builtin_kind(qt) == Some(BuiltinKind::Void)
    }

    pub fn is_pointer(&self, qt: QualType) -> bool {
        matches!(self.canonical_kind(qt), TypeKind::Pointer(_))
    }

    pub fn is_record(&self, qt: QualType) -> bool {
        matches!(self.canonical_kind(qt), TypeKind::Record(_))
    }

    pub fn as_record(&self, qt: QualType) -> Option<DeclId> {
        match self.canonical_kind(qt) {
            TypeKind::Record(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_array(&self, qt: QualType) -> bool {
        self.canonical_kind(qt).class().is_array()
    }

    pub fn is_function(&self, qt: QualType) -> bool {
        matches!(self.canonical_kind(qt), TypeKind::FunctionProto { .. })
    }

    pub fn is_vector(&self, qt: QualType) -> bool {
        self.canonical_kind(qt).class().is_vector()
    }

    pub fn is_ext_vector(&self, qt: QualType) -> bool {
        matches!(self.canonical_kind(qt), TypeKind::ExtVector { .. })
    }

    /// Element type of an array or vector.
    pub fn element_type(&self, qt: QualType) -> Option<QualType> {
        match self.canonical_kind(qt) {
            TypeKind::ConstantArray { element, .. }
            | TypeKind::IncompleteArray { element }
            | TypeKind::Vector { element, .. }
            | TypeKind::ExtVector { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn vector_len(&self, qt: QualType) -> Option<u32> {
        match self.canonical_kind(qt) {
            TypeKind::Vector { len, .. } | TypeKind::ExtVector { len, .. } => Some(*len),
            _ => None,
        }
    }

    /// Return type of a function type.
    pub fn function_result(&self, qt: QualType) -> Option<QualType> {
        match self.canonical_kind(qt) {
            TypeKind::FunctionProto { result, .. } => Some(*result),
            _ => None,
        }
    }

    /// Whether `qt` has an unknown size (incomplete array, void, or a
    /// record without a definition is decided by the caller).
    pub fn is_incomplete_array(&self, qt: QualType) -> bool {
        matches!(self.canonical_kind(qt), TypeKind::IncompleteArray { .. })
    }
}

#[cfg(test)]
mod tests;
