//! Serialized ID spaces.
//!
//! Every entity an AST file can reference lives in one of seven ID spaces.
//! Inside a file the IDs are *local*: `0..num_predefined` are reserved, and
//! the file's own entities are numbered from a base the writer picked. The
//! reader shifts them into *global* IDs through per-module remap tables,
//! so one newtype serves as both the local and the global form.

use std::fmt;

use cx_ir::types::Qualifiers;
use cx_ir::TypeId;

/// The seven ID spaces of an AST file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(u8)]
pub enum IdSpaceKind {
    Decl,
    Type,
    Identifier,
    Selector,
    Macro,
    PreprocessedEntity,
    Submodule,
}

impl IdSpaceKind {
    pub const ALL: [IdSpaceKind; 7] = [
        IdSpaceKind::Decl,
        IdSpaceKind::Type,
        IdSpaceKind::Identifier,
        IdSpaceKind::Selector,
        IdSpaceKind::Macro,
        IdSpaceKind::PreprocessedEntity,
        IdSpaceKind::Submodule,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// IDs below this value are reserved and mean the same thing in every
    /// file: the null decl and the translation unit, the null type and the
    /// builtin types, and "none" for everything else.
    pub const fn num_predefined(self) -> u32 {
        match self {
            IdSpaceKind::Decl => NUM_PREDEF_DECL_IDS,
            IdSpaceKind::Type => NUM_PREDEF_TYPE_IDS,
            _ => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            IdSpaceKind::Decl => "declaration",
            IdSpaceKind::Type => "type",
            IdSpaceKind::Identifier => "identifier",
            IdSpaceKind::Selector => "selector",
            IdSpaceKind::Macro => "macro",
            IdSpaceKind::PreprocessedEntity => "preprocessed entity",
            IdSpaceKind::Submodule => "submodule",
        }
    }
}

impl fmt::Display for IdSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const PREDEF_DECL_NULL: DeclIdx = DeclIdx(0);
pub const PREDEF_DECL_TRANSLATION_UNIT: DeclIdx = DeclIdx(1);
pub const NUM_PREDEF_DECL_IDS: u32 = 2;

/// Null type plus one slot per builtin.
pub const NUM_PREDEF_TYPE_IDS: u32 = TypeId::FIRST_DYNAMIC + 1;

/// Low bits of a serialized type reference hold the fast qualifiers.
pub const TYPE_QUALIFIER_BITS: u32 = 3;
const TYPE_QUALIFIER_MASK: u32 = (1 << TYPE_QUALIFIER_BITS) - 1;

macro_rules! define_serialized_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const NONE: Self = Self(0);

            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_serialized_id! {
    /// Declaration ID; `0` is the null decl, `1` the translation unit.
    DeclIdx
}

define_serialized_id! {
    /// Identifier ID; `0` is the empty name.
    IdentIdx
}

define_serialized_id! {
    SelectorIdx
}

define_serialized_id! {
    MacroIdx
}

define_serialized_id! {
    PreprocessedEntityIdx
}

define_serialized_id! {
    SubmoduleIdx
}

/// A type reference: `index << 3 | qualifiers`.
///
/// Index `0` is the null type; `1..NUM_PREDEF_TYPE_IDS` are the builtin
/// types (`TypeId + 1`); everything above is remapped per module.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeIdx(u32);

impl TypeIdx {
    pub const NULL: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn new(index: u32, quals: Qualifiers) -> Self {
        assert!(
            index < (1 << (32 - TYPE_QUALIFIER_BITS)),
            "type index {index} does not fit a serialized type reference"
        );
        Self(index << TYPE_QUALIFIER_BITS | u32::from(quals.bits()))
    }

    /// Reference to builtin type `ty`.
    #[inline]
    pub fn builtin(ty: TypeId, quals: Qualifiers) -> Self {
        debug_assert!(ty.is_builtin(), "{ty:?} is not a builtin type");
        Self::new(ty.raw() + 1, quals)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0 >> TYPE_QUALIFIER_BITS
    }

    #[inline]
    pub fn quals(self) -> Qualifiers {
        Qualifiers::from_bits_truncate((self.0 & TYPE_QUALIFIER_MASK) as u8)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.index() == 0
    }

    /// The builtin type this index names, if it is predefined.
    pub fn as_builtin(self) -> Option<TypeId> {
        let index = self.index();
        (index != 0 && index < NUM_PREDEF_TYPE_IDS).then(|| TypeId::new(index - 1))
    }

    /// Same reference with `index` replaced, qualifiers kept.
    #[must_use]
    pub fn with_index(self, index: u32) -> Self {
        Self::new(index, self.quals())
    }
}

impl fmt::Debug for TypeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quals().is_empty() {
            write!(f, "TypeIdx({})", self.index())
        } else {
            write!(f, "TypeIdx({} {:?})", self.index(), self.quals())
        }
    }
}

/// A source location as written in a module file: the writer's raw
/// offset, remapped by the reader into the importing translation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default, Debug)]
#[repr(transparent)]
pub struct SourceOffset(u32);

impl SourceOffset {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[inline]
pub(crate) fn to_u32(n: usize, what: &str) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("too many {what}: {n} exceeds u32::MAX"))
}

#[cfg(test)]
mod tests;
