//! Declaration factories and redeclaration chains.

use crate::decl::{
    ContextData, Decl, DeclData, DeclaratorData, DefinitionFlags, EnumConstantData, EnumData,
    FieldData, FunctionData, LabelData, MethodData, MethodFlags, NamedData, NamespaceData,
    NonTypeTemplateParmData, ParmVarData, RecordData, RecordDefinitionData, RedeclLink,
    Redeclarable, StaticAssertData, StorageClass, TagData, TagKind, TemplateCommon, TemplateData,
    TemplateTypeParmData, TypedefData, ValueData, VarData,
};
use crate::source::SourceLocation;
use crate::trailing::BaseSpecifier;
use crate::{AstContext, DeclId, DefinitionDataId, ExprId, QualType, TemplateCommonId};

fn declarator(name: crate::Name, ty: QualType) -> DeclaratorData {
    DeclaratorData {
        value: ValueData {
            named: NamedData { name },
            ty,
        },
        inner_loc: SourceLocation::INVALID,
    }
}

impl AstContext {
    /// Allocate a declaration and register it in `dc` when `dc` is a
    /// declaration context.
    pub fn create_decl(&mut self, data: DeclData, dc: DeclId, loc: SourceLocation) -> DeclId {
        let id = self.alloc_decl(Decl::new(data, dc, loc));
        if dc.is_valid() && self.decl(dc).class().is_decl_context() {
            self.add_decl(dc, id);
        }
        id
    }

    pub fn create_var(
        &mut self,
        dc: DeclId,
        name: &str,
        ty: QualType,
        storage: StorageClass,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Var(VarData {
                declarator: declarator(name, ty),
                storage,
                ..VarData::default()
            }),
            dc,
            loc,
        )
    }

    /// Parameter `index` of a function not created yet; `create_function`
    /// attaches it.
    pub fn create_parm(
        &mut self,
        name: &str,
        ty: QualType,
        index: u32,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::ParmVar(ParmVarData {
                var: VarData {
                    declarator: declarator(name, ty),
                    ..VarData::default()
                },
                index,
                ..ParmVarData::default()
            }),
            DeclId::INVALID,
            loc,
        )
    }

    pub fn create_function(
        &mut self,
        dc: DeclId,
        name: &str,
        ty: QualType,
        params: &[DeclId],
        storage: StorageClass,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        let data = DeclData::Function(FunctionData {
            declarator: declarator(name, ty),
            params: params.to_vec(),
            storage,
            ..FunctionData::default()
        });
        self.create_function_like(data, dc, loc)
    }

    /// Member function of `record`.
    pub fn create_method(
        &mut self,
        record: DeclId,
        name: &str,
        ty: QualType,
        params: &[DeclId],
        method_flags: MethodFlags,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        let data = DeclData::CXXMethod(MethodData {
            function: FunctionData {
                declarator: declarator(name, ty),
                params: params.to_vec(),
                ..FunctionData::default()
            },
            method_flags,
        });
        self.create_function_like(data, record, loc)
    }

    /// Create any function-family declaration and adopt its parameters.
    ///
    /// # Panics
    /// Panics if `data` is not a function kind.
    pub fn create_function_like(
        &mut self,
        data: DeclData,
        dc: DeclId,
        loc: SourceLocation,
    ) -> DeclId {
        let params = match data.function() {
            Some(f) => f.params.clone(),
            None => panic!("{} is not a function declaration", data.class()),
        };
        let id = self.create_decl(data, dc, loc);
        for p in params {
            let parm = self.decl_mut(p);
            parm.decl_context = id;
            parm.lexical_decl_context = id;
        }
        id
    }

    /// Forward declaration of a struct, class or union.
    pub fn create_record(
        &mut self,
        dc: DeclId,
        tag_kind: TagKind,
        name: &str,
        loc: SourceLocation,
    ) -> DeclId {
        assert!(tag_kind != TagKind::Enum, "enums are created with create_enum");
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Record(RecordData {
                tag: TagData {
                    named: NamedData { name },
                    tag_kind,
                    ..TagData::default()
                },
                definition: None,
            }),
            dc,
            loc,
        )
    }

    /// Turn `record` into the definition of its class, allocating the
    /// definition data every redeclaration shares.
    pub fn complete_record_definition(
        &mut self,
        record: DeclId,
        bases: Vec<BaseSpecifier>,
        flags: DefinitionFlags,
    ) -> DefinitionDataId {
        let id = self.alloc_definition_data(RecordDefinitionData {
            definition: record,
            bases,
            flags,
        });
        match &mut self.decl_mut(record).data {
            DeclData::Record(r) => r.tag.is_complete_definition = true,
            other => panic!("complete_record_definition on {}", other.class()),
        }
        self.set_definition_data(record, id);
        id
    }

    /// Point every declaration of `record`'s class at `data`.
    pub fn set_definition_data(&mut self, record: DeclId, data: DefinitionDataId) {
        let chain: Vec<DeclId> = self.redecls(record).collect();
        for d in chain {
            if let DeclData::Record(r) = &mut self.decl_mut(d).data {
                r.definition = Some(data);
            }
        }
    }

    /// Definition data of `record`'s class, if it has been defined.
    pub fn record_definition(&self, record: DeclId) -> Option<&RecordDefinitionData> {
        match &self.decl(record).data {
            DeclData::Record(r) => r.definition.map(|id| self.definition_data(id)),
            _ => None,
        }
    }

    pub fn create_field(
        &mut self,
        record: DeclId,
        name: &str,
        ty: QualType,
        bit_width: Option<ExprId>,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Field(FieldData {
                declarator: declarator(name, ty),
                bit_width,
                ..FieldData::default()
            }),
            record,
            loc,
        )
    }

    pub fn create_enum(
        &mut self,
        dc: DeclId,
        name: &str,
        integer_type: QualType,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Enum(EnumData {
                tag: TagData {
                    named: NamedData { name },
                    tag_kind: TagKind::Enum,
                    ..TagData::default()
                },
                integer_type,
                promotion_type: integer_type,
                ..EnumData::default()
            }),
            dc,
            loc,
        )
    }

    pub fn create_enum_constant(
        &mut self,
        enum_decl: DeclId,
        name: &str,
        ty: QualType,
        init: Option<ExprId>,
        int_value: i64,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::EnumConstant(EnumConstantData {
                value: ValueData {
                    named: NamedData { name },
                    ty,
                },
                init,
                int_value,
            }),
            enum_decl,
            loc,
        )
    }

    /// `typedef underlying name;`. Returns the declaration and the
    /// sugared type it introduces.
    pub fn create_typedef(
        &mut self,
        dc: DeclId,
        name: &str,
        underlying: QualType,
        loc: SourceLocation,
    ) -> (DeclId, QualType) {
        let name = self.idents.intern(name);
        let id = self.create_decl(
            DeclData::Typedef(TypedefData {
                named: NamedData { name },
                underlying,
            }),
            dc,
            loc,
        );
        let ty = self.types.typedef(id, underlying);
        (id, ty)
    }

    pub fn create_namespace(
        &mut self,
        dc: DeclId,
        name: &str,
        is_inline: bool,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Namespace(NamespaceData {
                named: NamedData { name },
                context: ContextData::default(),
                is_inline,
            }),
            dc,
            loc,
        )
    }

    pub fn create_label(&mut self, dc: DeclId, name: &str, loc: SourceLocation) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::Label(LabelData {
                named: NamedData { name },
                stmt: None,
            }),
            dc,
            loc,
        )
    }

    pub fn create_static_assert(
        &mut self,
        dc: DeclId,
        assert_expr: ExprId,
        message: Option<ExprId>,
        loc: SourceLocation,
    ) -> DeclId {
        self.create_decl(
            DeclData::StaticAssert(StaticAssertData {
                assert_expr,
                message,
                failed: false,
            }),
            dc,
            loc,
        )
    }

    /// Template type parameter; interns its `TemplateTypeParm` type.
    pub fn create_template_type_parm(
        &mut self,
        dc: DeclId,
        name: &str,
        depth: u32,
        position: u32,
        pack: bool,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        let id = self.create_decl(
            DeclData::TemplateTypeParm(TemplateTypeParmData {
                named: NamedData { name },
                depth,
                position,
                pack,
                typename: true,
                ..TemplateTypeParmData::default()
            }),
            dc,
            loc,
        );
        let ty = self.types.template_type_parm(depth, position, pack, id);
        if let DeclData::TemplateTypeParm(p) = &mut self.decl_mut(id).data {
            p.ty = ty;
        }
        id
    }

    pub fn create_non_type_template_parm(
        &mut self,
        dc: DeclId,
        name: &str,
        ty: QualType,
        depth: u32,
        position: u32,
        pack: bool,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.idents.intern(name);
        self.create_decl(
            DeclData::NonTypeTemplateParm(NonTypeTemplateParmData {
                declarator: declarator(name, ty),
                depth,
                position,
                pack,
                default: None,
            }),
            dc,
            loc,
        )
    }

    /// Function template whose pattern is `templated`.
    pub fn create_function_template(
        &mut self,
        dc: DeclId,
        params: &[DeclId],
        templated: DeclId,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.decl(templated).name();
        let id = self.create_decl(
            DeclData::FunctionTemplate(TemplateData {
                named: NamedData { name },
                params: params.to_vec(),
                templated,
                common: None,
            }),
            dc,
            loc,
        );
        match self.decl_mut(templated).data.function_mut() {
            Some(f) => f.described_template = Some(id),
            None => panic!("function template pattern must be a function"),
        }
        id
    }

    /// Class template whose pattern is `templated`.
    pub fn create_class_template(
        &mut self,
        dc: DeclId,
        params: &[DeclId],
        templated: DeclId,
        loc: SourceLocation,
    ) -> DeclId {
        let name = self.decl(templated).name();
        assert!(
            matches!(self.decl(templated).data, DeclData::Record(_)),
            "class template pattern must be a record"
        );
        self.create_decl(
            DeclData::ClassTemplate(TemplateData {
                named: NamedData { name },
                params: params.to_vec(),
                templated,
                common: None,
            }),
            dc,
            loc,
        )
    }

    // === Redeclaration chains ===

    fn redecl_of(&self, d: DeclId) -> Option<Redeclarable> {
        self.decl(d).redecl
    }

    /// First declaration of `d`'s entity (`d` itself for
    /// non-redeclarable kinds).
    pub fn first_decl(&self, d: DeclId) -> DeclId {
        self.redecl_of(d).map_or(d, |r| r.first)
    }

    /// Immediate predecessor of `d`, `None` for a first declaration.
    pub fn previous_decl(&self, d: DeclId) -> Option<DeclId> {
        match self.redecl_of(d)?.link {
            RedeclLink::Previous(p) => Some(p),
            RedeclLink::Latest(_) => None,
        }
    }

    /// Latest declaration of `d`'s entity.
    pub fn most_recent_decl(&self, d: DeclId) -> DeclId {
        let first = self.first_decl(d);
        match self.redecl_of(first).map(|r| r.link) {
            Some(RedeclLink::Latest(l)) => l,
            _ => first,
        }
    }

    /// Every declaration of `d`'s entity, starting at `d` and walking
    /// towards older ones, wrapping from the first to the latest.
    pub fn redecls(&self, d: DeclId) -> Redecls<'_> {
        Redecls {
            ctx: self,
            start: d,
            current: Some(d),
            passed_first: false,
        }
    }

    /// Make `prev` the predecessor of `d` and `d` the latest declaration
    /// of the chain. Shared definition data and template state flow to
    /// `d`.
    ///
    /// # Panics
    /// Panics if the kinds differ or are not redeclarable, or if `d`
    /// already has a predecessor.
    pub fn set_previous_decl(&mut self, d: DeclId, prev: DeclId) {
        let class = self.decl(d).class();
        assert!(class.is_redeclarable(), "{class} is not redeclarable");
        assert_eq!(
            class,
            self.decl(prev).class(),
            "redeclaration of a different kind of entity"
        );
        assert!(
            self.previous_decl(d).is_none() && self.first_decl(d) == d,
            "declaration is already part of a chain"
        );

        let first = self.first_decl(prev);
        self.decl_mut(d).redecl = Some(Redeclarable {
            first,
            link: RedeclLink::Previous(prev),
        });
        self.set_latest_decl(first, d);

        let shared_definition = match &self.decl(prev).data {
            DeclData::Record(r) => r.definition,
            _ => None,
        };
        let shared_common = self.decl(prev).data.template().and_then(|t| t.common);
        match &mut self.decl_mut(d).data {
            DeclData::Record(r) if r.definition.is_none() => r.definition = shared_definition,
            DeclData::FunctionTemplate(t) | DeclData::ClassTemplate(t) if t.common.is_none() => {
                t.common = shared_common;
            }
            _ => {}
        }
        // A definition appearing after the chain has none yet.
        if let DeclData::Record(r) = &self.decl(d).data {
            if let (Some(data), None) = (r.definition, shared_definition) {
                self.set_definition_data(d, data);
            }
        }
    }

    /// Overwrite the latest-declaration link held by `first`.
    ///
    /// # Panics
    /// Panics if `first` is not the first declaration of its chain.
    pub fn set_latest_decl(&mut self, first: DeclId, latest: DeclId) {
        let decl = self.decl_mut(first);
        match decl.redecl.as_mut() {
            Some(r) if r.first == first => r.link = RedeclLink::Latest(latest),
            _ => panic!("set_latest_decl on a declaration that is not first in its chain"),
        }
    }

    /// Declaration of `d`'s entity that is the definition, if any.
    pub fn definition_of(&self, d: DeclId) -> Option<DeclId> {
        self.redecls(d).find(|&r| self.decl(r).is_definition())
    }

    /// Shared template state of `template`'s chain, created on first use.
    pub fn get_or_create_template_common(&mut self, template: DeclId) -> TemplateCommonId {
        let existing = self
            .redecls(template)
            .find_map(|d| self.decl(d).data.template().and_then(|t| t.common));
        let id = match existing {
            Some(id) => id,
            None => self.alloc_template_common(TemplateCommon::default()),
        };
        let chain: Vec<DeclId> = self.redecls(template).collect();
        for d in chain {
            if let Some(t) = self.decl_mut(d).data.template_mut() {
                t.common = Some(id);
            }
        }
        id
    }

    /// Record `spec` as a specialization of `template`. A template that came
    /// from an AST file is marked modified, so the next module written
    /// carries the new specialization.
    pub fn add_specialization(&mut self, template: DeclId, spec: DeclId) {
        let common = self.get_or_create_template_common(template);
        let specs = &mut self.template_common_mut(common).specializations;
        if !specs.contains(&spec) {
            specs.push(spec);
            let first = self.first_decl(template);
            self.mark_decl_modified(first);
        }
    }
}

/// Iterator over a redeclaration chain; see [`AstContext::redecls`].
#[derive(Clone)]
pub struct Redecls<'a> {
    ctx: &'a AstContext,
    start: DeclId,
    current: Option<DeclId>,
    passed_first: bool,
}

impl Iterator for Redecls<'_> {
    type Item = DeclId;

    fn next(&mut self) -> Option<DeclId> {
        let current = self.current?;
        let next = match self.ctx.decl(current).redecl {
            None => None,
            Some(r) => match r.link {
                RedeclLink::Previous(p) => Some(p),
                RedeclLink::Latest(l) => {
                    assert!(!self.passed_first, "redeclaration chain is cyclic");
                    self.passed_first = true;
                    Some(l)
                }
            },
        };
        self.current = next.filter(|&n| n != self.start);
        Some(current)
    }
}
