//! Type records.

use cx_ir::types::TypeKind;
use cx_ir::TypeId;

use super::AstWriter;
use crate::codes;
use crate::{Result, SerializationError};

impl AstWriter<'_> {
    pub(super) fn write_type(&mut self, id: TypeId) -> Result<()> {
        let kind = self.ctx.types.kind(id);
        let mut vals: Vec<u64> = Vec::with_capacity(4);
        match kind {
            TypeKind::Builtin(_) => {
                return Err(SerializationError::malformed(format!(
                    "builtin type {} outside the predefined range",
                    id.raw()
                )))
            }
            TypeKind::Pointer(qt)
            | TypeKind::LValueReference(qt)
            | TypeKind::RValueReference(qt)
            | TypeKind::Atomic(qt)
            | TypeKind::PackExpansion(qt) => vals.push(self.type_ref(*qt)?),
            TypeKind::ConstantArray { element, size } => {
                vals.push(self.type_ref(*element)?);
                vals.push(*size);
            }
            TypeKind::IncompleteArray { element } => vals.push(self.type_ref(*element)?),
            TypeKind::Vector { element, len } | TypeKind::ExtVector { element, len } => {
                vals.push(self.type_ref(*element)?);
                vals.push(u64::from(*len));
            }
            TypeKind::FunctionProto {
                result,
                params,
                variadic,
            } => {
                vals.push(self.type_ref(*result)?);
                vals.push(u64::from(*variadic));
                for &param in params.iter() {
                    vals.push(self.type_ref(param)?);
                }
            }
            TypeKind::Record(decl) | TypeKind::Enum(decl) => vals.push(self.decl_ref(*decl)?),
            TypeKind::Typedef { decl, canonical } => {
                vals.push(self.decl_ref(*decl)?);
                vals.push(self.type_ref(*canonical)?);
            }
            TypeKind::TemplateTypeParm {
                depth,
                index,
                pack,
                decl,
            } => {
                vals.push(u64::from(*depth));
                vals.push(u64::from(*index));
                vals.push(u64::from(*pack));
                vals.push(self.decl_ref(*decl)?);
            }
        }
        self.emit(codes::type_code(kind.class()), &vals);
        Ok(())
    }
}
