//! Declaration records.

use cx_ir::decl::{
    AccessSpecifier, BodyOffset, ConstructorData, ContextData, ConversionData, DeclaratorData,
    DefinitionFlags, EnumConstantData, EnumData, FieldData, FunctionData, FunctionFlags, InitStyle,
    LabelData, MethodData, MethodFlags, NamedData, NamespaceData, NonTypeTemplateParmData,
    ParmVarData, RecordData, RecordDefinitionData, StaticAssertData, StorageClass, TagData, TagKind,
    TemplateCommon, TemplateData, TemplateTypeParmData, TypedefData, ValueData, VarData, VarFlags,
};
use cx_ir::trailing::BaseSpecifier;
use cx_ir::{Decl, DeclClass, DeclData, DeclFlags, DeclId, ExprId, ExternalDeclId, FunctionBody};

use super::{AstReader, DeclLoadState};
use crate::bitstream::{Record, RecordFields};
use crate::codes;
use crate::module_manager::ModuleIndex;
use crate::redecl::ForwardRef;
use crate::writer::{REDECL_FIRST, REDECL_PREVIOUS, REDECL_SOLE};
use crate::{Result, SerializationError};

/// Statement groups trailing one decl record, consumed in field order.
struct Groups {
    code: u32,
    pending: std::vec::IntoIter<Vec<Record>>,
}

impl AstReader<'_> {
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn read_decl(&mut self, global: u32) -> Result<DeclId> {
        let (m, bit) = self.manager.decl_record(global)?;
        let (record, groups) = self.fetch_decl(m, bit)?;
        let class = codes::decl_class_for_code(record.code)
            .ok_or(SerializationError::UnknownDeclCode { code: record.code })?;
        if class == DeclClass::TranslationUnit {
            return Err(SerializationError::malformed(format!(
                "declaration {global} is a translation unit"
            )));
        }

        let mut shell = Decl::shell(class);
        shell.origin = Some(ExternalDeclId::new(global));
        shell.flags = DeclFlags::FROM_AST_FILE;
        let id = self.ctx.alloc_decl(shell);
        self.decls.insert(global, DeclLoadState::Loading(id));
        self.unlinked.push(global);

        let mut groups = Groups {
            code: record.code,
            pending: groups.into_iter(),
        };
        let mut f = record.fields();

        let dc = self.read_decl_ref(m, &mut f)?;
        let lexical = self.read_decl_ref(m, &mut f)?;
        let loc = self.read_loc(m, &mut f)?;
        let flags = f.next_enum("declaration flags", |v| {
            u8::try_from(v).ok().and_then(DeclFlags::from_bits)
        })?;
        let access = f.next_enum("access specifier", AccessSpecifier::from_raw)?;
        let owning_module = self.read_opt_submodule(m, &mut f)?;
        {
            let decl = self.ctx.decl_mut(id);
            decl.decl_context = dc;
            decl.lexical_decl_context = lexical;
            decl.loc = loc;
            decl.flags = flags | DeclFlags::FROM_AST_FILE;
            decl.access = access;
            decl.owning_module = owning_module;
        }

        let is_first = if class.is_redeclarable() {
            self.read_redecl_link(m, id, global, &mut f)?
        } else {
            true
        };

        let mut data = self.read_payload(m, id, class, is_first, &mut f, &mut groups)?;

        let num_groups = f.next_usize()?;
        if groups.pending.next().is_some() {
            return Err(SerializationError::malformed(format!(
                "record {} announces {num_groups} statement groups but uses fewer",
                record.code
            )));
        }
        self.finish_record(&f)?;

        // A label statement read while this shell was open already
        // pointed the shell at itself.
        if let (DeclData::Label(new), DeclData::Label(old)) = (&mut data, &self.ctx.decl(id).data) {
            new.stmt = old.stmt;
        }
        self.ctx.decl_mut(id).data = data;
        if lexical == self.ctx.translation_unit() {
            self.attach_to_translation_unit(id);
        }
        self.decls.insert(global, DeclLoadState::Loaded(id));
        tracing::trace!(global, decl = id.raw(), %class, module = %m, "loaded declaration");
        Ok(id)
    }

    /// Returns whether the declaration starts its chain.
    fn read_redecl_link(
        &mut self,
        m: ModuleIndex,
        id: DeclId,
        global: u32,
        f: &mut RecordFields<'_>,
    ) -> Result<bool> {
        let is_first = match f.next_u64()? {
            REDECL_SOLE => true,
            REDECL_FIRST => {
                let latest = self.read_decl_global(m, f)?;
                self.resolver.queue_latest(id, latest);
                true
            }
            REDECL_PREVIOUS => {
                let first = self.read_decl_ref(m, f)?;
                let prev = self.read_decl_global(m, f)?;
                match self.decls.get(&prev).and_then(|s| s.decl()) {
                    Some(prev) => self.resolver.link_previous(self.ctx, id, first, prev)?,
                    None => self.resolver.defer_previous(self.ctx, id, first, prev)?,
                }
                false
            }
            tag => {
                return Err(SerializationError::malformed(format!(
                    "unknown redeclaration link {tag} in record {}",
                    f.code()
                )))
            }
        };
        if is_first {
            for &later in self.manager.chain_extensions(global) {
                self.resolver.queue_latest(id, later);
            }
        }
        Ok(is_first)
    }

    fn read_payload(
        &mut self,
        m: ModuleIndex,
        id: DeclId,
        class: DeclClass,
        is_first: bool,
        f: &mut RecordFields<'_>,
        groups: &mut Groups,
    ) -> Result<DeclData> {
        let data = match class {
            DeclClass::TranslationUnit => unreachable!("rejected before reading the payload"),
            DeclClass::StaticAssert => {
                let has_message = f.next_bool()?;
                let failed = f.next_bool()?;
                let assert_expr = self.take_group(m, groups, true)?.ok_or_else(|| {
                    SerializationError::malformed("static assertion without a condition")
                })?;
                let message = self.take_group(m, groups, has_message)?;
                DeclData::StaticAssert(StaticAssertData {
                    assert_expr,
                    message,
                    failed,
                })
            }
            DeclClass::Namespace => DeclData::Namespace(NamespaceData {
                named: self.read_named(m, f)?,
                context: self.read_context(m, f)?,
                is_inline: f.next_bool()?,
            }),
            DeclClass::Label => DeclData::Label(LabelData {
                named: self.read_named(m, f)?,
                stmt: None,
            }),
            DeclClass::Typedef => DeclData::Typedef(TypedefData {
                named: self.read_named(m, f)?,
                underlying: self.read_type_ref(m, f)?,
            }),
            DeclClass::Enum => DeclData::Enum(EnumData {
                tag: self.read_tag(m, f)?,
                integer_type: self.read_type_ref(m, f)?,
                promotion_type: self.read_type_ref(m, f)?,
                num_positive_bits: small(f, "positive bit count")?,
                num_negative_bits: small(f, "negative bit count")?,
                scoped: f.next_bool()?,
                fixed: f.next_bool()?,
            }),
            DeclClass::Record => {
                let tag = self.read_tag(m, f)?;
                let definition = if f.next_bool()? {
                    let flags = f.next_enum("definition flags", |v| {
                        u8::try_from(v).ok().and_then(DefinitionFlags::from_bits)
                    })?;
                    let n = f.next_count()?;
                    let mut bases = Vec::with_capacity(n);
                    for _ in 0..n {
                        bases.push(self.read_base_specifier(m, f)?);
                    }
                    Some(self.ctx.alloc_definition_data(RecordDefinitionData {
                        definition: id,
                        bases,
                        flags,
                    }))
                } else {
                    self.resolver.queue_forward(ForwardRef::DefinitionData(id));
                    None
                };
                DeclData::Record(RecordData { tag, definition })
            }
            DeclClass::TemplateTypeParm => {
                let named = self.read_named(m, f)?;
                let ty = self.read_type_ref(m, f)?;
                let depth = f.next_u32()?;
                let position = f.next_u32()?;
                let pack = f.next_bool()?;
                let typename = f.next_bool()?;
                let has_default = f.next_bool()?;
                let default = self.read_type_ref(m, f)?;
                DeclData::TemplateTypeParm(TemplateTypeParmData {
                    named,
                    ty,
                    depth,
                    position,
                    pack,
                    typename,
                    default: has_default.then_some(default),
                })
            }
            DeclClass::FunctionTemplate => {
                DeclData::FunctionTemplate(self.read_template(m, id, is_first, f)?)
            }
            DeclClass::ClassTemplate => {
                DeclData::ClassTemplate(self.read_template(m, id, is_first, f)?)
            }
            DeclClass::EnumConstant => {
                let value = self.read_value(m, f)?;
                let has_init = f.next_bool()?;
                let init = self.take_group(m, groups, has_init)?;
                DeclData::EnumConstant(EnumConstantData {
                    value,
                    init,
                    int_value: f.next_i64()?,
                })
            }
            DeclClass::Field => {
                let declarator = self.read_declarator(m, f)?;
                let has_width = f.next_bool()?;
                let bit_width = self.take_group(m, groups, has_width)?;
                let mutable = f.next_bool()?;
                let has_init = f.next_bool()?;
                let in_class_init = self.take_group(m, groups, has_init)?;
                DeclData::Field(FieldData {
                    declarator,
                    bit_width,
                    mutable,
                    in_class_init,
                })
            }
            DeclClass::NonTypeTemplateParm => {
                let declarator = self.read_declarator(m, f)?;
                let depth = f.next_u32()?;
                let position = f.next_u32()?;
                let pack = f.next_bool()?;
                let has_default = f.next_bool()?;
                DeclData::NonTypeTemplateParm(NonTypeTemplateParmData {
                    declarator,
                    depth,
                    position,
                    pack,
                    default: self.take_group(m, groups, has_default)?,
                })
            }
            DeclClass::Function => DeclData::Function(self.read_function(m, f)?),
            DeclClass::CXXMethod => DeclData::CXXMethod(self.read_method(m, f)?),
            DeclClass::CXXDestructor => DeclData::CXXDestructor(self.read_method(m, f)?),
            DeclClass::CXXConstructor => DeclData::CXXConstructor(ConstructorData {
                method: self.read_method(m, f)?,
                is_explicit: f.next_bool()?,
            }),
            DeclClass::CXXConversion => DeclData::CXXConversion(ConversionData {
                method: self.read_method(m, f)?,
                is_explicit: f.next_bool()?,
            }),
            DeclClass::Var => DeclData::Var(self.read_var(m, f, groups)?),
            DeclClass::ParmVar => {
                let var = self.read_var(m, f, groups)?;
                let has_default = f.next_bool()?;
                DeclData::ParmVar(ParmVarData {
                    var,
                    default_arg: self.take_group(m, groups, has_default)?,
                    scope_depth: f.next_u32()?,
                    index: f.next_u32()?,
                })
            }
        };
        Ok(data)
    }

    /// The next statement group as an expression, if the record says one
    /// is present.
    fn take_group(
        &mut self,
        m: ModuleIndex,
        groups: &mut Groups,
        present: bool,
    ) -> Result<Option<ExprId>> {
        if !present {
            return Ok(None);
        }
        let records = groups.pending.next().ok_or_else(|| {
            SerializationError::malformed(format!(
                "record {} references more statement groups than follow it",
                groups.code
            ))
        })?;
        self.build_expr(m, records).map(Some)
    }

    fn read_named(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<NamedData> {
        Ok(NamedData {
            name: self.read_ident(m, f)?,
        })
    }

    fn read_value(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<ValueData> {
        Ok(ValueData {
            named: self.read_named(m, f)?,
            ty: self.read_type_ref(m, f)?,
        })
    }

    fn read_declarator(
        &mut self,
        m: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<DeclaratorData> {
        Ok(DeclaratorData {
            value: self.read_value(m, f)?,
            inner_loc: self.read_loc(m, f)?,
        })
    }

    fn read_decl_list(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<Vec<DeclId>> {
        let n = f.next_count()?;
        let mut decls = Vec::with_capacity(n);
        for _ in 0..n {
            decls.push(self.read_decl_ref(m, f)?);
        }
        Ok(decls)
    }

    fn read_context(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<ContextData> {
        Ok(ContextData {
            decls: self.read_decl_list(m, f)?,
        })
    }

    fn read_tag(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<TagData> {
        Ok(TagData {
            named: self.read_named(m, f)?,
            context: self.read_context(m, f)?,
            tag_kind: f.next_enum("tag kind", TagKind::from_raw)?,
            is_complete_definition: f.next_bool()?,
            is_being_defined: f.next_bool()?,
            brace_range: self.read_range(m, f)?,
        })
    }

    pub(super) fn read_base_specifier(
        &mut self,
        m: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<BaseSpecifier> {
        Ok(BaseSpecifier {
            ty: self.read_type_ref(m, f)?,
            is_virtual: f.next_bool()?,
            access: f.next_enum("access specifier", AccessSpecifier::from_raw)?,
            range: self.read_range(m, f)?,
        })
    }

    /// Shared template state arrives with the first declaration of the
    /// chain; later declarations pick it up once the chain is settled.
    fn read_template(
        &mut self,
        m: ModuleIndex,
        id: DeclId,
        is_first: bool,
        f: &mut RecordFields<'_>,
    ) -> Result<TemplateData> {
        let named = self.read_named(m, f)?;
        let params = self.read_decl_list(m, f)?;
        let templated = self.read_decl_ref(m, f)?;
        let common = if !is_first {
            self.resolver.queue_forward(ForwardRef::TemplateCommon(id));
            None
        } else if f.next_bool()? {
            let instantiated_from = self.read_opt_decl_ref(m, f)?;
            let n = f.next_count()?;
            let mut lazy_specializations = Vec::with_capacity(n);
            for _ in 0..n {
                lazy_specializations.push(ExternalDeclId::new(self.read_decl_global(m, f)?));
            }
            Some(self.ctx.alloc_template_common(TemplateCommon {
                specializations: Vec::new(),
                lazy_specializations,
                instantiated_from,
            }))
        } else {
            None
        };
        Ok(TemplateData {
            named,
            params,
            templated,
            common,
        })
    }

    fn read_function(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<FunctionData> {
        let declarator = self.read_declarator(m, f)?;
        let context = self.read_context(m, f)?;
        let params = self.read_decl_list(m, f)?;
        let body = match f.next_usize()? {
            0 => FunctionBody::None,
            ordinal => {
                let bit = self.body_offset(m, ordinal)?;
                if self.options.lazy_function_bodies {
                    FunctionBody::Deferred(BodyOffset {
                        source: m.index() as u32,
                        bit,
                    })
                } else {
                    FunctionBody::Present(self.read_body(m, bit)?)
                }
            }
        };
        Ok(FunctionData {
            declarator,
            context,
            params,
            body,
            storage: f.next_enum("storage class", StorageClass::from_raw)?,
            flags: f.next_enum("function flags", |v| {
                u16::try_from(v).ok().and_then(FunctionFlags::from_bits)
            })?,
            described_template: self.read_opt_decl_ref(m, f)?,
        })
    }

    fn read_method(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<MethodData> {
        Ok(MethodData {
            function: self.read_function(m, f)?,
            method_flags: f.next_enum("method flags", |v| {
                u8::try_from(v).ok().and_then(MethodFlags::from_bits)
            })?,
        })
    }

    fn read_var(
        &mut self,
        m: ModuleIndex,
        f: &mut RecordFields<'_>,
        groups: &mut Groups,
    ) -> Result<VarData> {
        let declarator = self.read_declarator(m, f)?;
        let storage = f.next_enum("storage class", StorageClass::from_raw)?;
        let has_init = f.next_bool()?;
        let init = self.take_group(m, groups, has_init)?;
        Ok(VarData {
            declarator,
            storage,
            init,
            init_style: f.next_enum("initialization style", InitStyle::from_raw)?,
            flags: f.next_enum("variable flags", |v| {
                u8::try_from(v).ok().and_then(VarFlags::from_bits)
            })?,
        })
    }
}

fn small(f: &mut RecordFields<'_>, what: &str) -> Result<u8> {
    f.next_enum(what, |v| u8::try_from(v).ok())
}
