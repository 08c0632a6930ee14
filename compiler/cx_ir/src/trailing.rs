//! Trailing storage: the variable-length parts of nodes.
//!
//! A node never owns a `Vec`. Argument lists, designators, template
//! arguments and the optional name-qualification sections of name
//! references are appended to flat pools when the node is created, and
//! the node keeps `(start, len)` ranges into them. Counts are fixed at
//! that point; a longer list means a new node.
//!
//! # Optional sections
//!
//! Name references (`DeclRefExpr`, `MemberExpr`) may carry up to three
//! optional sections, always laid out in [`SECTION_ORDER`]:
//!
//! 1. qualifier (`ns::name`)
//! 2. found declaration (the using-declaration lookup went through)
//! 3. explicit template arguments (`name<int>`)
//!
//! The node stores which sections are present plus the slot of the first
//! one. A section's slot is `start` plus the number of present sections
//! before it, so absent sections cost nothing.

use bitflags::bitflags;

use crate::decl::AccessSpecifier;
use crate::ids::{to_u16, to_u32};
use crate::source::{SourceLocation, SourceRange};
use crate::{
    BasePathRange, DeclId, DesignatorRange, ExprId, ExprRange, Name, QualType, StmtId, StmtRange,
    TemplateArgRange, TypeRange,
};

bitflags! {
    /// Which optional sections follow a name reference.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TrailingSections: u8 {
        const HAS_QUALIFIER = 1 << 0;
        const HAS_FOUND_DECL = 1 << 1;
        const HAS_TEMPLATE_ARGS = 1 << 2;
    }
}

/// Manifest order of the optional sections. Every accessor and the AST
/// file reader and writer walk sections in this order.
pub const SECTION_ORDER: [TrailingSections; 3] = [
    TrailingSections::HAS_QUALIFIER,
    TrailingSections::HAS_FOUND_DECL,
    TrailingSections::HAS_TEMPLATE_ARGS,
];

/// Position of a node's optional sections in the section pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TrailingLayout {
    pub present: TrailingSections,
    pub start: u32,
}

impl TrailingLayout {
    pub const NONE: Self = Self {
        present: TrailingSections::empty(),
        start: 0,
    };

    #[inline]
    pub fn has(self, section: TrailingSections) -> bool {
        self.present.contains(section)
    }

    /// Pool slot of `section`, or `None` if the node lacks it.
    pub fn slot(self, section: TrailingSections) -> Option<usize> {
        if !self.present.contains(section) {
            return None;
        }
        let preceding = SECTION_ORDER
            .iter()
            .take_while(|&&s| s != section)
            .filter(|&&s| self.present.contains(s))
            .count();
        Some(self.start as usize + preceding)
    }

    /// Number of present sections.
    #[inline]
    pub fn len(self) -> usize {
        self.present.bits().count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.present.is_empty()
    }
}

/// Leading qualifier of a name (`::`, `ns::`, `Type::`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NestedNameSpecifier {
    Global,
    Namespace(DeclId),
    Type(QualType),
}

/// One template argument as written.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TemplateArgument {
    Null,
    Type(QualType),
    Declaration(DeclId),
    NullPtr(QualType),
    Integral { value: i64, ty: QualType },
    Expression(ExprId),
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TemplateArgumentLoc {
    pub arg: TemplateArgument,
    pub loc: SourceLocation,
}

/// One entry of a name reference's optional-section block.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TrailingSlot {
    Qualifier {
        specifier: NestedNameSpecifier,
        range: SourceRange,
    },
    FoundDecl(DeclId),
    TemplateArgs {
        args: TemplateArgRange,
        langle: SourceLocation,
        rangle: SourceLocation,
    },
}

impl TrailingSlot {
    pub fn section(&self) -> TrailingSections {
        match self {
            TrailingSlot::Qualifier { .. } => TrailingSections::HAS_QUALIFIER,
            TrailingSlot::FoundDecl(_) => TrailingSections::HAS_FOUND_DECL,
            TrailingSlot::TemplateArgs { .. } => TrailingSections::HAS_TEMPLATE_ARGS,
        }
    }
}

/// Explicit template argument list of a name reference.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ExplicitTemplateArgs {
    pub args: TemplateArgRange,
    pub langle: SourceLocation,
    pub rangle: SourceLocation,
}

/// One step of a designated initializer (`.field`, `[index]`,
/// `[lo ... hi]`). Array indices refer to positions in the owning
/// `DesignatedInitExpr`'s sub-expression list.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Designator {
    Field {
        name: Name,
        /// Resolved member, or `DeclId::INVALID` before lookup.
        field: DeclId,
        dot_loc: SourceLocation,
        field_loc: SourceLocation,
    },
    Array {
        index: u32,
        lbracket: SourceLocation,
        rbracket: SourceLocation,
    },
    ArrayRange {
        index: u32,
        lbracket: SourceLocation,
        ellipsis: SourceLocation,
        rbracket: SourceLocation,
    },
}

/// One base class, used both in class definitions and in the base path
/// of a derived-to-base cast.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BaseSpecifier {
    pub ty: QualType,
    pub is_virtual: bool,
    pub access: AccessSpecifier,
    pub range: SourceRange,
}

/// The flat pools backing every node's variable-length data.
#[derive(Clone, Debug, Default)]
pub struct TrailingStorage {
    exprs: Vec<ExprId>,
    stmts: Vec<StmtId>,
    types: Vec<QualType>,
    designators: Vec<Designator>,
    template_args: Vec<TemplateArgumentLoc>,
    sections: Vec<TrailingSlot>,
    cast_path: Vec<BaseSpecifier>,
}

macro_rules! pool_accessors {
    ($alloc:ident, $get:ident, $field:ident, $item:ty, $range:ident, $what:literal) => {
        pub fn $alloc(&mut self, items: &[$item]) -> $range {
            if items.is_empty() {
                return $range::EMPTY;
            }
            let start = to_u32(self.$field.len(), $what);
            let len = to_u16(items.len(), $what);
            self.$field.extend_from_slice(items);
            $range::new(start, len)
        }

        #[inline]
        pub fn $get(&self, range: $range) -> &[$item] {
            if range.is_empty() {
                return &[];
            }
            &self.$field[range.as_usize_range()]
        }
    };
}

impl TrailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pool_accessors!(alloc_exprs, exprs, exprs, ExprId, ExprRange, "trailing expressions");
    pool_accessors!(alloc_stmts, stmts, stmts, StmtId, StmtRange, "trailing statements");
    pool_accessors!(alloc_types, types, types, QualType, TypeRange, "trailing types");
    pool_accessors!(
        alloc_designators,
        designators,
        designators,
        Designator,
        DesignatorRange,
        "designators"
    );
    pool_accessors!(
        alloc_template_args,
        template_args,
        template_args,
        TemplateArgumentLoc,
        TemplateArgRange,
        "template arguments"
    );
    pool_accessors!(
        alloc_base_path,
        base_path,
        cast_path,
        BaseSpecifier,
        BasePathRange,
        "cast path entries"
    );

    /// Append the optional sections of a name reference in manifest order.
    pub fn alloc_sections(
        &mut self,
        qualifier: Option<(NestedNameSpecifier, SourceRange)>,
        found_decl: Option<DeclId>,
        template_args: Option<ExplicitTemplateArgs>,
    ) -> TrailingLayout {
        let start = to_u32(self.sections.len(), "trailing sections");
        let mut present = TrailingSections::empty();
        if let Some((specifier, range)) = qualifier {
            present |= TrailingSections::HAS_QUALIFIER;
            self.sections.push(TrailingSlot::Qualifier { specifier, range });
        }
        if let Some(decl) = found_decl {
            present |= TrailingSections::HAS_FOUND_DECL;
            self.sections.push(TrailingSlot::FoundDecl(decl));
        }
        if let Some(t) = template_args {
            present |= TrailingSections::HAS_TEMPLATE_ARGS;
            self.sections.push(TrailingSlot::TemplateArgs {
                args: t.args,
                langle: t.langle,
                rangle: t.rangle,
            });
        }
        if present.is_empty() {
            return TrailingLayout::NONE;
        }
        TrailingLayout { present, start }
    }

    fn section(&self, layout: TrailingLayout, section: TrailingSections) -> Option<&TrailingSlot> {
        let slot = layout.slot(section)?;
        let entry = &self.sections[slot];
        assert_eq!(
            entry.section(),
            section,
            "trailing section slot {slot} holds the wrong section"
        );
        Some(entry)
    }

    pub fn qualifier(&self, layout: TrailingLayout) -> Option<(NestedNameSpecifier, SourceRange)> {
        match self.section(layout, TrailingSections::HAS_QUALIFIER)? {
            TrailingSlot::Qualifier { specifier, range } => Some((*specifier, *range)),
            _ => None,
        }
    }

    pub fn found_decl(&self, layout: TrailingLayout) -> Option<DeclId> {
        match self.section(layout, TrailingSections::HAS_FOUND_DECL)? {
            TrailingSlot::FoundDecl(d) => Some(*d),
            _ => None,
        }
    }

    pub fn explicit_template_args(&self, layout: TrailingLayout) -> Option<ExplicitTemplateArgs> {
        match self.section(layout, TrailingSections::HAS_TEMPLATE_ARGS)? {
            TrailingSlot::TemplateArgs {
                args,
                langle,
                rangle,
            } => Some(ExplicitTemplateArgs {
                args: *args,
                langle: *langle,
                rangle: *rangle,
            }),
            _ => None,
        }
    }

    /// Template arguments of a name reference, empty if it has none.
    pub fn template_args_of(&self, layout: TrailingLayout) -> &[TemplateArgumentLoc] {
        match self.explicit_template_args(layout) {
            Some(t) => self.template_args(t.args),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests;
