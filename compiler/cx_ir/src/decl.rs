//! Declarations.
//!
//! A [`Decl`] is a common header plus a [`DeclData`] payload. Payloads
//! nest along the declaration hierarchy: a constructor's data contains a
//! method's, which contains a function's, and so on down to
//! [`NamedData`]. Serialization visits the nesting in the same order.
//!
//! Redeclarable kinds carry a [`Redeclarable`] link. The first declaration
//! of an entity points at the latest one; every later declaration points
//! at its immediate predecessor. Walking `Previous` links from any
//! declaration reaches the first, and the first closes the ring.

use bitflags::bitflags;

use crate::node_class::DeclClass;
use crate::source::{SourceLocation, SourceRange};
use crate::trailing::BaseSpecifier;
use crate::{
    DeclId, DefinitionDataId, ExprId, ExternalDeclId, Name, QualType, StmtId, SubmoduleId,
    TemplateCommonId,
};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DeclFlags: u8 {
        const INVALID = 1 << 0;
        const IMPLICIT = 1 << 1;
        const USED = 1 << 2;
        const REFERENCED = 1 << 3;
        /// Deserialized from an AST file.
        const FROM_AST_FILE = 1 << 4;
        /// Changed after being loaded; the writer emits a replacement.
        const MODIFIED = 1 << 5;
    }
}

raw_enum! {
    #[derive(Default)]
    pub enum AccessSpecifier {
        Public,
        Protected,
        Private,
        #[default]
        None,
    }
}

raw_enum! {
    #[derive(Default)]
    pub enum StorageClass {
        #[default]
        None,
        Extern,
        Static,
        PrivateExtern,
        Auto,
        Register,
    }
}

raw_enum! {
    #[derive(Default)]
    pub enum TagKind {
        #[default]
        Struct,
        Class,
        Union,
        Enum,
    }
}

raw_enum! {
    #[derive(Default)]
    pub enum InitStyle {
        /// `T x = init;`
        #[default]
        CInit,
        /// `T x(args);`
        CallInit,
        /// `T x{args};`
        ListInit,
    }
}

/// Redeclaration link of one declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RedeclLink {
    /// A later declaration: its immediate predecessor.
    Previous(DeclId),
    /// The first declaration: the most recent one.
    Latest(DeclId),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Redeclarable {
    pub first: DeclId,
    pub link: RedeclLink,
}

impl Redeclarable {
    /// Link of a declaration that starts its own chain.
    pub fn first_of_chain(this: DeclId) -> Self {
        Redeclarable {
            first: this,
            link: RedeclLink::Latest(this),
        }
    }
}

/// Opaque position of a function body that has not been loaded yet.
/// `source` is chosen by whoever deferred the body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BodyOffset {
    pub source: u32,
    pub bit: u64,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum FunctionBody {
    #[default]
    None,
    Present(StmtId),
    Deferred(BodyOffset),
}

impl FunctionBody {
    pub fn has_body(self) -> bool {
        !matches!(self, FunctionBody::None)
    }
}

// === Payloads, base to derived ===

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NamedData {
    pub name: Name,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ValueData {
    pub named: NamedData,
    pub ty: QualType,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DeclaratorData {
    pub value: ValueData,
    /// Start of the declarator, before the name.
    pub inner_loc: SourceLocation,
}

/// Lexically nested declarations of a declaration context.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ContextData {
    pub decls: Vec<DeclId>,
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionFlags: u16 {
        const INLINE = 1 << 0;
        const VARIADIC = 1 << 1;
        const DELETED = 1 << 2;
        const DEFAULTED = 1 << 3;
        const PURE = 1 << 4;
        const VIRTUAL_AS_WRITTEN = 1 << 5;
        const CONSTEXPR = 1 << 6;
        const HAS_WRITTEN_PROTOTYPE = 1 << 7;
        const TRIVIAL = 1 << 8;
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FunctionData {
    pub declarator: DeclaratorData,
    pub context: ContextData,
    pub params: Vec<DeclId>,
    pub body: FunctionBody,
    pub storage: StorageClass,
    pub flags: FunctionFlags,
    /// The `FunctionTemplate` this function is the pattern of.
    pub described_template: Option<DeclId>,
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u8 {
        const STATIC = 1 << 0;
        const CONST = 1 << 1;
        const VOLATILE = 1 << 2;
        const VIRTUAL = 1 << 3;
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MethodData {
    pub function: FunctionData,
    pub method_flags: MethodFlags,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ConstructorData {
    pub method: MethodData,
    pub is_explicit: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ConversionData {
    pub method: MethodData,
    pub is_explicit: bool,
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct VarFlags: u8 {
        const CONSTEXPR = 1 << 0;
        const INLINE = 1 << 1;
        const NRVO = 1 << 2;
        const EXCEPTION_VAR = 1 << 3;
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct VarData {
    pub declarator: DeclaratorData,
    pub storage: StorageClass,
    pub init: Option<ExprId>,
    pub init_style: InitStyle,
    pub flags: VarFlags,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ParmVarData {
    pub var: VarData,
    pub default_arg: Option<ExprId>,
    pub scope_depth: u32,
    pub index: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FieldData {
    pub declarator: DeclaratorData,
    pub bit_width: Option<ExprId>,
    pub mutable: bool,
    pub in_class_init: Option<ExprId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct EnumConstantData {
    pub value: ValueData,
    pub init: Option<ExprId>,
    pub int_value: i64,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NonTypeTemplateParmData {
    pub declarator: DeclaratorData,
    pub depth: u32,
    pub position: u32,
    pub pack: bool,
    pub default: Option<ExprId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TemplateTypeParmData {
    pub named: NamedData,
    /// The `TemplateTypeParm` type this parameter declares.
    pub ty: QualType,
    pub depth: u32,
    pub position: u32,
    pub pack: bool,
    pub typename: bool,
    pub default: Option<QualType>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TypedefData {
    pub named: NamedData,
    pub underlying: QualType,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TagData {
    pub named: NamedData,
    pub context: ContextData,
    pub tag_kind: TagKind,
    pub is_complete_definition: bool,
    pub is_being_defined: bool,
    pub brace_range: SourceRange,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RecordData {
    pub tag: TagData,
    /// Shared by every declaration in the chain; owned by the definition.
    pub definition: Option<DefinitionDataId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct EnumData {
    pub tag: TagData,
    pub integer_type: QualType,
    pub promotion_type: QualType,
    pub num_positive_bits: u8,
    pub num_negative_bits: u8,
    pub scoped: bool,
    pub fixed: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NamespaceData {
    pub named: NamedData,
    pub context: ContextData,
    pub is_inline: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TemplateData {
    pub named: NamedData,
    pub params: Vec<DeclId>,
    /// The pattern declaration (`Function` or `Record`).
    pub templated: DeclId,
    /// Shared by every declaration in the chain.
    pub common: Option<TemplateCommonId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LabelData {
    pub named: NamedData,
    pub stmt: Option<StmtId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct StaticAssertData {
    pub assert_expr: ExprId,
    pub message: Option<ExprId>,
    pub failed: bool,
}

/// Kind-specific part of a declaration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DeclData {
    TranslationUnit(ContextData),
    StaticAssert(StaticAssertData),
    Namespace(NamespaceData),
    Label(LabelData),
    Typedef(TypedefData),
    Enum(EnumData),
    Record(RecordData),
    TemplateTypeParm(TemplateTypeParmData),
    FunctionTemplate(TemplateData),
    ClassTemplate(TemplateData),
    EnumConstant(EnumConstantData),
    Field(FieldData),
    NonTypeTemplateParm(NonTypeTemplateParmData),
    Function(FunctionData),
    CXXMethod(MethodData),
    CXXConstructor(ConstructorData),
    CXXDestructor(MethodData),
    CXXConversion(ConversionData),
    Var(VarData),
    ParmVar(ParmVarData),
}

impl DeclData {
    /// Default-filled payload for `kind`: the shell a deserializer
    /// registers before reading any fields.
    pub fn empty(kind: DeclClass) -> Self {
        match kind {
            DeclClass::TranslationUnit => DeclData::TranslationUnit(ContextData::default()),
            DeclClass::StaticAssert => DeclData::StaticAssert(StaticAssertData::default()),
            DeclClass::Namespace => DeclData::Namespace(NamespaceData::default()),
            DeclClass::Label => DeclData::Label(LabelData::default()),
            DeclClass::Typedef => DeclData::Typedef(TypedefData::default()),
            DeclClass::Enum => DeclData::Enum(EnumData {
                tag: TagData {
                    tag_kind: TagKind::Enum,
                    ..TagData::default()
                },
                ..EnumData::default()
            }),
            DeclClass::Record => DeclData::Record(RecordData::default()),
            DeclClass::TemplateTypeParm => {
                DeclData::TemplateTypeParm(TemplateTypeParmData::default())
            }
            DeclClass::FunctionTemplate => DeclData::FunctionTemplate(TemplateData::default()),
            DeclClass::ClassTemplate => DeclData::ClassTemplate(TemplateData::default()),
            DeclClass::EnumConstant => DeclData::EnumConstant(EnumConstantData::default()),
            DeclClass::Field => DeclData::Field(FieldData::default()),
            DeclClass::NonTypeTemplateParm => {
                DeclData::NonTypeTemplateParm(NonTypeTemplateParmData::default())
            }
            DeclClass::Function => DeclData::Function(FunctionData::default()),
            DeclClass::CXXMethod => DeclData::CXXMethod(MethodData::default()),
            DeclClass::CXXConstructor => DeclData::CXXConstructor(ConstructorData::default()),
            DeclClass::CXXDestructor => DeclData::CXXDestructor(MethodData::default()),
            DeclClass::CXXConversion => DeclData::CXXConversion(ConversionData::default()),
            DeclClass::Var => DeclData::Var(VarData::default()),
            DeclClass::ParmVar => DeclData::ParmVar(ParmVarData::default()),
        }
    }

    pub fn class(&self) -> DeclClass {
        match self {
            DeclData::TranslationUnit(_) => DeclClass::TranslationUnit,
            DeclData::StaticAssert(_) => DeclClass::StaticAssert,
            DeclData::Namespace(_) => DeclClass::Namespace,
            DeclData::Label(_) => DeclClass::Label,
            DeclData::Typedef(_) => DeclClass::Typedef,
            DeclData::Enum(_) => DeclClass::Enum,
            DeclData::Record(_) => DeclClass::Record,
            DeclData::TemplateTypeParm(_) => DeclClass::TemplateTypeParm,
            DeclData::FunctionTemplate(_) => DeclClass::FunctionTemplate,
            DeclData::ClassTemplate(_) => DeclClass::ClassTemplate,
            DeclData::EnumConstant(_) => DeclClass::EnumConstant,
            DeclData::Field(_) => DeclClass::Field,
            DeclData::NonTypeTemplateParm(_) => DeclClass::NonTypeTemplateParm,
            DeclData::Function(_) => DeclClass::Function,
            DeclData::CXXMethod(_) => DeclClass::CXXMethod,
            DeclData::CXXConstructor(_) => DeclClass::CXXConstructor,
            DeclData::CXXDestructor(_) => DeclClass::CXXDestructor,
            DeclData::CXXConversion(_) => DeclClass::CXXConversion,
            DeclData::Var(_) => DeclClass::Var,
            DeclData::ParmVar(_) => DeclClass::ParmVar,
        }
    }

    pub fn method(&self) -> Option<&MethodData> {
        match self {
            DeclData::CXXMethod(m) | DeclData::CXXDestructor(m) => Some(m),
            DeclData::CXXConstructor(c) => Some(&c.method),
            DeclData::CXXConversion(c) => Some(&c.method),
            _ => None,
        }
    }

    pub fn method_mut(&mut self) -> Option<&mut MethodData> {
        match self {
            DeclData::CXXMethod(m) | DeclData::CXXDestructor(m) => Some(m),
            DeclData::CXXConstructor(c) => Some(&mut c.method),
            DeclData::CXXConversion(c) => Some(&mut c.method),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionData> {
        match self {
            DeclData::Function(f) => Some(f),
            _ => self.method().map(|m| &m.function),
        }
    }

    pub fn function_mut(&mut self) -> Option<&mut FunctionData> {
        match self {
            DeclData::Function(f) => Some(f),
            _ => self.method_mut().map(|m| &mut m.function),
        }
    }

    pub fn var(&self) -> Option<&VarData> {
        match self {
            DeclData::Var(v) => Some(v),
            DeclData::ParmVar(p) => Some(&p.var),
            _ => None,
        }
    }

    pub fn var_mut(&mut self) -> Option<&mut VarData> {
        match self {
            DeclData::Var(v) => Some(v),
            DeclData::ParmVar(p) => Some(&mut p.var),
            _ => None,
        }
    }

    pub fn declarator(&self) -> Option<&DeclaratorData> {
        match self {
            DeclData::Field(f) => Some(&f.declarator),
            DeclData::NonTypeTemplateParm(p) => Some(&p.declarator),
            _ => self
                .function()
                .map(|f| &f.declarator)
                .or_else(|| self.var().map(|v| &v.declarator)),
        }
    }

    pub fn value(&self) -> Option<&ValueData> {
        match self {
            DeclData::EnumConstant(c) => Some(&c.value),
            _ => self.declarator().map(|d| &d.value),
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut ValueData> {
        match self {
            DeclData::EnumConstant(c) => Some(&mut c.value),
            DeclData::Field(f) => Some(&mut f.declarator.value),
            DeclData::NonTypeTemplateParm(p) => Some(&mut p.declarator.value),
            DeclData::Var(v) => Some(&mut v.declarator.value),
            DeclData::ParmVar(p) => Some(&mut p.var.declarator.value),
            other => other.function_mut().map(|f| &mut f.declarator.value),
        }
    }

    pub fn tag(&self) -> Option<&TagData> {
        match self {
            DeclData::Record(r) => Some(&r.tag),
            DeclData::Enum(e) => Some(&e.tag),
            _ => None,
        }
    }

    pub fn template(&self) -> Option<&TemplateData> {
        match self {
            DeclData::FunctionTemplate(t) | DeclData::ClassTemplate(t) => Some(t),
            _ => None,
        }
    }

    pub fn template_mut(&mut self) -> Option<&mut TemplateData> {
        match self {
            DeclData::FunctionTemplate(t) | DeclData::ClassTemplate(t) => Some(t),
            _ => None,
        }
    }

    pub fn named(&self) -> Option<&NamedData> {
        match self {
            DeclData::TranslationUnit(_) | DeclData::StaticAssert(_) => None,
            DeclData::Namespace(n) => Some(&n.named),
            DeclData::Label(l) => Some(&l.named),
            DeclData::Typedef(t) => Some(&t.named),
            DeclData::TemplateTypeParm(t) => Some(&t.named),
            _ => self
                .tag()
                .map(|t| &t.named)
                .or_else(|| self.template().map(|t| &t.named))
                .or_else(|| self.value().map(|v| &v.named)),
        }
    }

    /// Member list of a declaration context.
    pub fn context(&self) -> Option<&ContextData> {
        match self {
            DeclData::TranslationUnit(c) => Some(c),
            DeclData::Namespace(n) => Some(&n.context),
            DeclData::Record(r) => Some(&r.tag.context),
            DeclData::Enum(e) => Some(&e.tag.context),
            _ => self.function().map(|f| &f.context),
        }
    }

    pub fn context_mut(&mut self) -> Option<&mut ContextData> {
        match self {
            DeclData::TranslationUnit(c) => Some(c),
            DeclData::Namespace(n) => Some(&mut n.context),
            DeclData::Record(r) => Some(&mut r.tag.context),
            DeclData::Enum(e) => Some(&mut e.tag.context),
            other => other.function_mut().map(|f| &mut f.context),
        }
    }
}

/// A declaration: header plus kind-specific payload.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Decl {
    /// Semantic parent (the TU's own is `DeclId::INVALID`).
    pub decl_context: DeclId,
    /// Lexical parent; differs from the semantic one for out-of-line
    /// definitions.
    pub lexical_decl_context: DeclId,
    pub loc: SourceLocation,
    pub flags: DeclFlags,
    pub access: AccessSpecifier,
    pub owning_module: Option<SubmoduleId>,
    /// Translation-wide ID this declaration was loaded from.
    pub origin: Option<ExternalDeclId>,
    pub redecl: Option<Redeclarable>,
    pub data: DeclData,
}

impl Decl {
    pub fn new(data: DeclData, decl_context: DeclId, loc: SourceLocation) -> Self {
        Decl {
            decl_context,
            lexical_decl_context: decl_context,
            loc,
            flags: DeclFlags::empty(),
            access: AccessSpecifier::None,
            owning_module: None,
            origin: None,
            redecl: None,
            data,
        }
    }

    /// Empty declaration of `kind`, to be filled in later.
    pub fn shell(kind: DeclClass) -> Self {
        Self::new(DeclData::empty(kind), DeclId::INVALID, SourceLocation::INVALID)
    }

    #[inline]
    pub fn class(&self) -> DeclClass {
        self.data.class()
    }

    #[inline]
    pub fn decl_context(&self) -> DeclId {
        self.decl_context
    }

    #[inline]
    pub fn lexical_decl_context(&self) -> DeclId {
        self.lexical_decl_context
    }

    /// Identifier of a named declaration; `Name::EMPTY` otherwise.
    pub fn name(&self) -> Name {
        self.data.named().map_or(Name::EMPTY, |n| n.name)
    }

    /// Declared type of a value declaration.
    pub fn value_type(&self) -> Option<QualType> {
        self.data.value().map(|v| v.ty)
    }

    #[inline]
    pub fn is_template_parameter(&self) -> bool {
        self.class().is_template_parameter()
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.flags.contains(DeclFlags::INVALID)
    }

    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.flags.contains(DeclFlags::IMPLICIT)
    }

    #[inline]
    pub fn is_from_ast_file(&self) -> bool {
        self.flags.contains(DeclFlags::FROM_AST_FILE)
    }

    /// Whether this declaration is the defining one.
    pub fn is_definition(&self) -> bool {
        if let Some(f) = self.data.function() {
            return f.body.has_body();
        }
        if let Some(t) = self.data.tag() {
            return t.is_complete_definition;
        }
        if let Some(v) = self.data.var() {
            return v.init.is_some() && v.storage != StorageClass::Extern;
        }
        false
    }
}

/// Definition state shared by every declaration of one class.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RecordDefinitionData {
    /// The declaration that owns the definition.
    pub definition: DeclId,
    pub bases: Vec<BaseSpecifier>,
    pub flags: DefinitionFlags,
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DefinitionFlags: u8 {
        const POLYMORPHIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const AGGREGATE = 1 << 2;
        const TRIVIALLY_COPYABLE = 1 << 3;
        const EMPTY = 1 << 4;
        const POD = 1 << 5;
        const HAS_CONST_FIELDS = 1 << 6;
    }
}

/// State shared by every declaration of one template.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TemplateCommon {
    pub specializations: Vec<DeclId>,
    /// Specializations known to exist in AST files but not loaded yet.
    pub lazy_specializations: Vec<ExternalDeclId>,
    pub instantiated_from: Option<DeclId>,
}

#[cfg(test)]
mod tests;
