//! Type records.

use cx_ir::types::TypeKind;
use cx_ir::{TypeClass, TypeId};

use super::AstReader;
use crate::codes;
use crate::{Result, SerializationError};

impl AstReader<'_> {
    /// Decode and intern the type with global index `global`.
    pub(super) fn read_type(&mut self, global: u32) -> Result<TypeId> {
        let (m, local) = self.manager.resolve_global_type(global)?;
        let bit = self
            .manager
            .get(m)
            .type_offsets
            .get(local as usize)
            .copied()
            .ok_or_else(|| SerializationError::malformed(format!("type {global} has no offset")))?;
        let record = self.fetch_record(m, bit)?;
        let class = codes::type_class_for_code(record.code)
            .ok_or(SerializationError::UnknownTypeCode { code: record.code })?;
        let mut f = record.fields();

        let kind = match class {
            TypeClass::Builtin => {
                return Err(SerializationError::malformed(format!(
                    "type {global} is a builtin written as a record"
                )))
            }
            TypeClass::Pointer => TypeKind::Pointer(self.read_type_ref(m, &mut f)?),
            TypeClass::LValueReference => TypeKind::LValueReference(self.read_type_ref(m, &mut f)?),
            TypeClass::RValueReference => TypeKind::RValueReference(self.read_type_ref(m, &mut f)?),
            TypeClass::Atomic => TypeKind::Atomic(self.read_type_ref(m, &mut f)?),
            TypeClass::PackExpansion => TypeKind::PackExpansion(self.read_type_ref(m, &mut f)?),
            TypeClass::ConstantArray => TypeKind::ConstantArray {
                element: self.read_type_ref(m, &mut f)?,
                size: f.next_u64()?,
            },
            TypeClass::IncompleteArray => TypeKind::IncompleteArray {
                element: self.read_type_ref(m, &mut f)?,
            },
            TypeClass::Vector => TypeKind::Vector {
                element: self.read_type_ref(m, &mut f)?,
                len: f.next_u32()?,
            },
            TypeClass::ExtVector => TypeKind::ExtVector {
                element: self.read_type_ref(m, &mut f)?,
                len: f.next_u32()?,
            },
            TypeClass::FunctionProto => {
                let result = self.read_type_ref(m, &mut f)?;
                let variadic = f.next_bool()?;
                let mut params = Vec::with_capacity(f.remaining().len());
                while !f.is_exhausted() {
                    params.push(self.read_type_ref(m, &mut f)?);
                }
                TypeKind::FunctionProto {
                    result,
                    params: params.into_boxed_slice(),
                    variadic,
                }
            }
            TypeClass::Record => TypeKind::Record(self.read_decl_ref(m, &mut f)?),
            TypeClass::Enum => TypeKind::Enum(self.read_decl_ref(m, &mut f)?),
            TypeClass::Typedef => TypeKind::Typedef {
                decl: self.read_decl_ref(m, &mut f)?,
                canonical: self.read_type_ref(m, &mut f)?,
            },
            TypeClass::TemplateTypeParm => TypeKind::TemplateTypeParm {
                depth: f.next_u32()?,
                index: f.next_u32()?,
                pack: f.next_bool()?,
                decl: self.read_decl_ref(m, &mut f)?,
            },
        };
        self.finish_record(&f)?;

        // A type built from a cycle (a record whose fields point back at
        // it) may have been interned by the inner request already.
        if let Some(&ty) = self.types.get(&global) {
            return Ok(ty);
        }
        let ty = self.ctx.types.intern(kind);
        tracing::trace!(global, ty = ty.raw(), ?class, "loaded type");
        Ok(ty)
    }
}
