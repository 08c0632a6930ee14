//! Declaration records.
//!
//! A record is the common header, the redeclaration link for redeclarable
//! kinds, then the payload fields from the outermost layer inward. Its last
//! field counts the statement groups (initializers, default arguments, bit
//! widths) that follow it in the stream.

use cx_ir::decl::{
    ContextData, DeclData, DeclaratorData, FunctionData, MethodData, NamedData, RecordData, TagData,
    TemplateData, ValueData, VarData,
};
use cx_ir::{DeclClass, DeclFlags, DeclId, ExprId, FunctionBody, NodeRef, RedeclLink};

use super::{loc, AstWriter};
use crate::bitstream::{encode_signed, Abbrev, AbbrevOp};
use crate::codes;
use crate::{Result, SerializationError};

/// Flags that describe where a declaration came from rather than what it
/// is; a reader sets them itself.
const TRANSIENT_FLAGS: DeclFlags = DeclFlags::FROM_AST_FILE.union(DeclFlags::MODIFIED);

/// Redeclaration link tags.
pub(crate) const REDECL_SOLE: u64 = 0;
pub(crate) const REDECL_PREVIOUS: u64 = 1;
pub(crate) const REDECL_FIRST: u64 = 2;

fn header_ops(class: DeclClass) -> Vec<AbbrevOp> {
    vec![
        AbbrevOp::Literal(u64::from(codes::decl_code(class))),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Fixed(4),
        AbbrevOp::Fixed(2),
        AbbrevOp::Vbr(6),
    ]
}

/// Layouts for fields and parameters without initializers, the bulk of
/// most headers.
pub(super) fn decl_abbrevs() -> Vec<Abbrev> {
    let mut field = header_ops(DeclClass::Field);
    field.extend([
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Literal(0),
        AbbrevOp::Fixed(1),
        AbbrevOp::Literal(0),
        AbbrevOp::Literal(0),
    ]);

    let mut parm = header_ops(DeclClass::ParmVar);
    parm.extend([
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Fixed(3),
        AbbrevOp::Literal(0),
        AbbrevOp::Fixed(2),
        AbbrevOp::Fixed(4),
        AbbrevOp::Literal(0),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Literal(0),
    ]);

    vec![Abbrev::new(&field), Abbrev::new(&parm)]
}

/// Fields of one record plus the statement groups trailing it.
struct DeclRecord {
    vals: Vec<u64>,
    groups: Vec<ExprId>,
}

impl DeclRecord {
    fn push(&mut self, v: u64) {
        self.vals.push(v);
    }

    fn push_bool(&mut self, b: bool) {
        self.vals.push(u64::from(b));
    }

    /// Presence flag now, the expression as a group later.
    fn push_group(&mut self, e: Option<ExprId>) {
        self.push_bool(e.is_some());
        self.groups.extend(e);
    }
}

impl AstWriter<'_> {
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn write_decl(&mut self, id: DeclId) -> Result<()> {
        let ctx = self.ctx;
        let decl = ctx.decl(id);
        let mut r = DeclRecord {
            vals: Vec::with_capacity(16),
            groups: Vec::new(),
        };

        r.push(self.decl_ref(decl.decl_context)?);
        r.push(self.decl_ref(decl.lexical_decl_context)?);
        r.push(loc(decl.loc));
        r.push(u64::from(decl.flags.difference(TRANSIENT_FLAGS).bits()));
        r.push(u64::from(decl.access.raw()));
        r.push(match decl.owning_module {
            Some(m) => self.submodule_ref(m)?,
            None => 0,
        });

        if decl.class().is_redeclarable() {
            self.write_redecl_link(id, &mut r)?;
        }

        match &decl.data {
            DeclData::TranslationUnit(_) => {
                return Err(SerializationError::malformed(
                    "the translation unit has no declaration record",
                ))
            }
            DeclData::StaticAssert(s) => {
                r.push_bool(s.message.is_some());
                r.push_bool(s.failed);
                r.groups.push(s.assert_expr);
                r.groups.extend(s.message);
            }
            DeclData::Namespace(n) => {
                self.named(&n.named, &mut r)?;
                self.context(&n.context, &mut r)?;
                r.push_bool(n.is_inline);
            }
            DeclData::Label(l) => self.named(&l.named, &mut r)?,
            DeclData::Typedef(t) => {
                self.named(&t.named, &mut r)?;
                r.push(self.type_ref(t.underlying)?);
            }
            DeclData::Enum(e) => {
                self.tag(&e.tag, &mut r)?;
                r.push(self.type_ref(e.integer_type)?);
                r.push(self.type_ref(e.promotion_type)?);
                r.push(u64::from(e.num_positive_bits));
                r.push(u64::from(e.num_negative_bits));
                r.push_bool(e.scoped);
                r.push_bool(e.fixed);
            }
            DeclData::Record(rec) => self.record(id, rec, &mut r)?,
            DeclData::TemplateTypeParm(p) => {
                self.named(&p.named, &mut r)?;
                r.push(self.type_ref(p.ty)?);
                r.push(u64::from(p.depth));
                r.push(u64::from(p.position));
                r.push_bool(p.pack);
                r.push_bool(p.typename);
                r.push_bool(p.default.is_some());
                r.push(match p.default {
                    Some(ty) => self.type_ref(ty)?,
                    None => 0,
                });
            }
            DeclData::FunctionTemplate(t) | DeclData::ClassTemplate(t) => {
                self.template(id, t, &mut r)?
            }
            DeclData::EnumConstant(c) => {
                self.value(&c.value, &mut r)?;
                r.push_group(c.init);
                r.push(encode_signed(c.int_value));
            }
            DeclData::Field(f) => {
                self.declarator(&f.declarator, &mut r)?;
                r.push_group(f.bit_width);
                r.push_bool(f.mutable);
                r.push_group(f.in_class_init);
            }
            DeclData::NonTypeTemplateParm(p) => {
                self.declarator(&p.declarator, &mut r)?;
                r.push(u64::from(p.depth));
                r.push(u64::from(p.position));
                r.push_bool(p.pack);
                r.push_group(p.default);
            }
            DeclData::Function(f) => self.function(id, f, &mut r)?,
            DeclData::CXXMethod(m) | DeclData::CXXDestructor(m) => self.method(id, m, &mut r)?,
            DeclData::CXXConstructor(c) => {
                self.method(id, &c.method, &mut r)?;
                r.push_bool(c.is_explicit);
            }
            DeclData::CXXConversion(c) => {
                self.method(id, &c.method, &mut r)?;
                r.push_bool(c.is_explicit);
            }
            DeclData::Var(v) => self.var(v, &mut r)?,
            DeclData::ParmVar(p) => {
                self.var(&p.var, &mut r)?;
                r.push_group(p.default_arg);
                r.push(u64::from(p.scope_depth));
                r.push(u64::from(p.index));
            }
        }

        r.push(r.groups.len() as u64);
        self.emit(codes::decl_code(decl.class()), &r.vals);
        for e in r.groups {
            self.write_stmt_group(NodeRef::Expr(e))?;
        }
        Ok(())
    }

    /// Sole member of a chain, a later declaration naming its first and
    /// predecessor, or a first declaration naming the latest.
    fn write_redecl_link(&self, id: DeclId, r: &mut DeclRecord) -> Result<()> {
        let Some(link) = self.ctx.decl(id).redecl else {
            r.push(REDECL_SOLE);
            return Ok(());
        };
        match link.link {
            RedeclLink::Latest(latest) if latest == id => r.push(REDECL_SOLE),
            RedeclLink::Latest(latest) => {
                r.push(REDECL_FIRST);
                r.push(self.decl_ref(latest)?);
            }
            RedeclLink::Previous(prev) => {
                r.push(REDECL_PREVIOUS);
                r.push(self.decl_ref(link.first)?);
                r.push(self.decl_ref(prev)?);
            }
        }
        Ok(())
    }

    fn named(&self, n: &NamedData, r: &mut DeclRecord) -> Result<()> {
        r.push(self.ident_ref(n.name)?);
        Ok(())
    }

    fn value(&self, v: &ValueData, r: &mut DeclRecord) -> Result<()> {
        self.named(&v.named, r)?;
        r.push(self.type_ref(v.ty)?);
        Ok(())
    }

    fn declarator(&self, d: &DeclaratorData, r: &mut DeclRecord) -> Result<()> {
        self.value(&d.value, r)?;
        r.push(loc(d.inner_loc));
        Ok(())
    }

    fn context(&self, c: &ContextData, r: &mut DeclRecord) -> Result<()> {
        r.push(c.decls.len() as u64);
        for &member in &c.decls {
            r.push(self.decl_ref(member)?);
        }
        Ok(())
    }

    fn tag(&self, t: &TagData, r: &mut DeclRecord) -> Result<()> {
        self.named(&t.named, r)?;
        self.context(&t.context, r)?;
        r.push(u64::from(t.tag_kind.raw()));
        r.push_bool(t.is_complete_definition);
        r.push_bool(t.is_being_defined);
        r.push(loc(t.brace_range.begin));
        r.push(loc(t.brace_range.end));
        Ok(())
    }

    /// Definition data is written once, by the declaration that owns it.
    fn record(&self, id: DeclId, rec: &RecordData, r: &mut DeclRecord) -> Result<()> {
        self.tag(&rec.tag, r)?;
        let owned = rec
            .definition
            .map(|data| self.ctx.definition_data(data))
            .filter(|data| data.definition == id);
        r.push_bool(owned.is_some());
        if let Some(data) = owned {
            r.push(u64::from(data.flags.bits()));
            r.push(data.bases.len() as u64);
            for base in &data.bases {
                r.push(self.type_ref(base.ty)?);
                r.push_bool(base.is_virtual);
                r.push(u64::from(base.access.raw()));
                r.push(loc(base.range.begin));
                r.push(loc(base.range.end));
            }
        }
        Ok(())
    }

    /// Shared template state is written with the first declaration only.
    fn template(&self, id: DeclId, t: &TemplateData, r: &mut DeclRecord) -> Result<()> {
        self.named(&t.named, r)?;
        r.push(t.params.len() as u64);
        for &param in &t.params {
            r.push(self.decl_ref(param)?);
        }
        r.push(self.decl_ref(t.templated)?);
        if self.ctx.first_decl(id) != id {
            return Ok(());
        }
        r.push_bool(t.common.is_some());
        if let Some(common) = t.common {
            let common = self.ctx.template_common(common);
            r.push(self.opt_decl_ref(common.instantiated_from)?);
            r.push((common.specializations.len() + common.lazy_specializations.len()) as u64);
            for &spec in &common.specializations {
                r.push(self.decl_ref(spec)?);
            }
            for lazy in &common.lazy_specializations {
                r.push(u64::from(lazy.raw()));
            }
        }
        Ok(())
    }

    fn function(&mut self, id: DeclId, f: &FunctionData, r: &mut DeclRecord) -> Result<()> {
        self.declarator(&f.declarator, r)?;
        self.context(&f.context, r)?;
        r.push(f.params.len() as u64);
        for &param in &f.params {
            r.push(self.decl_ref(param)?);
        }
        r.push(match f.body {
            FunctionBody::None => 0,
            FunctionBody::Present(body) => {
                self.pending_bodies.push(body);
                self.pending_bodies.len() as u64
            }
            FunctionBody::Deferred(_) => {
                return Err(SerializationError::UnloadedBody { decl: id.raw() })
            }
        });
        r.push(u64::from(f.storage.raw()));
        r.push(u64::from(f.flags.bits()));
        r.push(self.opt_decl_ref(f.described_template)?);
        Ok(())
    }

    fn method(&mut self, id: DeclId, m: &MethodData, r: &mut DeclRecord) -> Result<()> {
        self.function(id, &m.function, r)?;
        r.push(u64::from(m.method_flags.bits()));
        Ok(())
    }

    fn var(&self, v: &VarData, r: &mut DeclRecord) -> Result<()> {
        self.declarator(&v.declarator, r)?;
        r.push(u64::from(v.storage.raw()));
        r.push_group(v.init);
        r.push(u64::from(v.init_style.raw()));
        r.push(u64::from(v.flags.bits()));
        Ok(())
    }
}
