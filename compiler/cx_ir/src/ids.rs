//! Index and range newtypes for the node arenas.
//!
//! Nodes never hold `Box`es or references to each other. Every edge in
//! the graph is a `u32` index into one of the [`AstContext`](crate::AstContext)
//! pools, and every variable-length child list is a `(start, len)` pair into
//! a flat trailing pool fixed at construction time.

use std::fmt;

/// Convert a pool length to a `u32` index.
///
/// # Panics
/// Panics if the pool has outgrown the 32-bit index space.
#[inline]
pub(crate) fn to_u32(n: usize, what: &str) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("too many {what}: {n} exceeds u32::MAX"))
}

/// Convert a list length to a `u16` range length.
///
/// # Panics
/// Panics if the list exceeds `u16::MAX` elements.
#[inline]
pub(crate) fn to_u16(n: usize, what: &str) -> u16 {
    u16::try_from(n).unwrap_or_else(|_| panic!("{what} too long: {n} exceeds u16::MAX"))
}

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel value for "no node".
            pub const INVALID: Self = Self(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                } else {
                    f.write_str(concat!(stringify!($name), "::INVALID"))
                }
            }
        }
    };
}

macro_rules! define_range {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        #[repr(C)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            pub const EMPTY: Self = Self { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                Self { start, len }
            }

            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }

            /// Pool indices covered by this range.
            #[inline]
            pub fn indices(&self) -> impl Iterator<Item = u32> {
                self.start..(self.start + u32::from(self.len))
            }

            #[inline]
            pub(crate) fn as_usize_range(&self) -> std::ops::Range<usize> {
                let start = self.start as usize;
                start..start + self.len()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..{})"),
                    self.start,
                    self.start + u32::from(self.len)
                )
            }
        }
    };
}

define_index! {
    /// Index of an expression node.
    ExprId
}

define_index! {
    /// Index of a statement node.
    StmtId
}

define_index! {
    /// Index of a declaration.
    DeclId
}

define_index! {
    /// Index of the shared definition data of a class redeclaration chain.
    DefinitionDataId
}

define_index! {
    /// Index of the shared common data of a template redeclaration chain.
    TemplateCommonId
}

define_index! {
    /// Index of an Objective-C selector in the [`SelectorTable`](crate::SelectorTable).
    SelectorId
}

define_index! {
    /// Index of a macro definition in the preprocessing record.
    MacroId
}

define_index! {
    /// Index of a preprocessed entity (macro expansion, inclusion directive).
    PreprocessedEntityId
}

define_index! {
    /// Index of a submodule in the [`SubmoduleTable`](crate::SubmoduleTable).
    SubmoduleId
}

define_index! {
    /// Index of a file registered with the [`SourceManager`](crate::SourceManager).
    FileId
}

define_index! {
    /// Translation-wide ID of a declaration that was deserialized from an
    /// AST file. Opaque to this crate; assigned by the AST reader.
    ExternalDeclId
}

define_range! {
    /// Range of expressions in the trailing expression pool.
    ExprRange
}

define_range! {
    /// Range of statements in the trailing statement pool.
    StmtRange
}

define_range! {
    /// Range of types in the trailing type pool.
    TypeRange
}

define_range! {
    /// Range of designators in the trailing designator pool.
    DesignatorRange
}

define_range! {
    /// Range of template arguments in the trailing template-argument pool.
    TemplateArgRange
}

define_range! {
    /// Range of base-class path entries in the trailing cast-path pool.
    BasePathRange
}

/// Reference to either kind of statement-graph node.
///
/// Expressions and statements live in separate arenas; `children()` and
/// the statement stream both need to talk about "a node" uniformly.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeRef {
    Stmt(StmtId),
    Expr(ExprId),
}

impl NodeRef {
    #[inline]
    pub fn as_expr(self) -> Option<ExprId> {
        match self {
            NodeRef::Expr(id) => Some(id),
            NodeRef::Stmt(_) => None,
        }
    }

    #[inline]
    pub fn as_stmt(self) -> Option<StmtId> {
        match self {
            NodeRef::Stmt(id) => Some(id),
            NodeRef::Expr(_) => None,
        }
    }
}

impl From<ExprId> for NodeRef {
    fn from(id: ExprId) -> Self {
        NodeRef::Expr(id)
    }
}

impl From<StmtId> for NodeRef {
    fn from(id: StmtId) -> Self {
        NodeRef::Stmt(id)
    }
}

#[cfg(test)]
mod tests;
