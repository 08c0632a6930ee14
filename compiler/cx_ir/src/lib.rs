//! cx IR - the AST node model of the cx frontend
//!
//! This crate holds every node a translation is made of:
//! - Node class registry (`StmtClass`, `DeclClass`, `TypeClass`) with
//!   contiguous class ranges
//! - Interned types (`TypePool`, `QualType`)
//! - Expressions, statements and declarations in one arena (`AstContext`)
//! - Trailing storage for variable-length node data
//! - Source locations, identifiers, selectors, the preprocessing record
//!   and submodules
//! - Classification, constant folding and ICE checking over expressions
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers → `Name(u32)`, types → `TypeId(u32)`
//! - **Flatten Everything**: no `Box<Expr>`; nodes refer to each other by
//!   `u32` index, variable-length data by `(start, len)` ranges
//! - **Shape fixed at construction**: factories lay out trailing data up
//!   front and nodes never grow afterwards

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

#[macro_use]
mod macros;

pub mod apvalue;
pub mod children;
pub mod classify;
mod context;
pub mod decl;
pub mod diag;
pub mod evaluate;
pub mod expr;
pub mod ice;
mod ident;
mod ids;
mod ignore;
pub mod node_class;
pub mod preprocessor;
mod source;
pub mod stmt;
pub mod submodule;
mod target;
pub mod trailing;
pub mod types;

pub use apvalue::{APValue, ApsInt, LValueBase};
pub use children::Children;
pub use classify::{Classification, ClassificationKind, Modifiable};
pub use context::{AstContext, NameRefParts, RecordLayout, Redecls};
pub use decl::{Decl, DeclData, DeclFlags, FunctionBody, RedeclLink, Redeclarable};
pub use diag::{DiagKind, PartialDiagnostic};
pub use evaluate::{
    evaluate, evaluate_as_boolean_condition, evaluate_as_int, is_evaluatable, EvalResult,
};
pub use expr::{Expr, ExprDependence, ExprKind, ExprObjectKind, ExprValueKind};
pub use ice::{check_ice, is_integer_constant_expr, IceDiag, IceKind};
pub use ident::{IdentifierTable, Name, Selector, SelectorTable};
pub use ids::{
    BasePathRange, DeclId, DefinitionDataId, DesignatorRange, ExprId, ExprRange, ExternalDeclId,
    FileId, MacroId, NodeRef, PreprocessedEntityId, SelectorId, StmtId, StmtRange, SubmoduleId,
    TemplateArgRange, TemplateCommonId, TypeRange,
};
pub use node_class::{DeclClass, StmtClass, TypeClass};
pub use preprocessor::{MacroDefinition, PreprocessedEntity, PreprocessingRecord};
pub use source::{FileEntry, SourceLocation, SourceManager, SourceRange};
pub use stmt::{Stmt, StmtKind};
pub use submodule::{Submodule, SubmoduleTable};
pub use target::{LangOptions, TargetInfo};
pub use trailing::{TrailingLayout, TrailingStorage};
pub use types::{BuiltinKind, QualType, Qualifiers, TypeFlags, TypeId, TypeKind, TypePool};

static_assert_size!(ExprId, 4);
static_assert_size!(ExprRange, 8);
static_assert_size!(QualType, 8);
static_assert_size!(SourceLocation, 4);
