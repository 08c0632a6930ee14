//! Sizes, alignments and record layout.
//!
//! Sizes are computed in bits and reported in bytes, except field
//! offsets which stay in bits so bit-fields can be placed.

use crate::decl::{DeclData, DefinitionFlags, TagKind};
use crate::evaluate::evaluate_as_int;
use crate::types::{BuiltinKind, TypeKind};
use crate::{AstContext, DeclId, QualType};

/// Layout of a complete class.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RecordLayout {
    /// Size in bytes, including tail padding.
    pub size: u64,
    /// Alignment in bytes.
    pub align: u64,
    /// Offset of each field in declaration order, in bits.
    pub field_offsets: Vec<u64>,
}

fn align_to(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

impl AstContext {
    /// Size of `qt` in bytes.
    ///
    /// # Panics
    /// Panics on incomplete, dependent and function types.
    pub fn type_size(&self, qt: QualType) -> u64 {
        self.type_info(qt).0 / 8
    }

    /// Alignment of `qt` in bytes.
    pub fn type_align(&self, qt: QualType) -> u64 {
        self.type_info(qt).1 / 8
    }

    /// Whether `qt` has no known size: `void`, arrays of unknown bound
    /// and classes that are only declared.
    pub fn is_incomplete_type(&self, qt: QualType) -> bool {
        let qt = self.types.canonical(qt);
        match self.types.kind(qt.ty) {
            TypeKind::Builtin(BuiltinKind::Void) | TypeKind::IncompleteArray { .. } => true,
            TypeKind::Record(d) => self.record_definition(*d).is_none(),
            TypeKind::Enum(d) => !matches!(
                &self.decl(*d).data,
                DeclData::Enum(e) if e.fixed || e.tag.is_complete_definition
            ),
            TypeKind::ConstantArray { element, .. } => self.is_incomplete_type(*element),
            _ => false,
        }
    }

    /// (width, align) in bits.
    fn type_info(&self, qt: QualType) -> (u64, u64) {
        let t = &self.target;
        let qt = self.types.canonical(qt);
        let (w, a) = match self.types.kind(qt.ty) {
            TypeKind::Builtin(b) => match b {
                BuiltinKind::Bool => (t.bool_width, t.bool_width),
                BuiltinKind::Char | BuiltinKind::SChar | BuiltinKind::UChar => {
                    (t.char_width, t.char_width)
                }
                BuiltinKind::Short | BuiltinKind::UShort => (t.short_width, t.short_width),
                BuiltinKind::Int | BuiltinKind::UInt => (t.int_width, t.int_width),
                BuiltinKind::Long | BuiltinKind::ULong => (t.long_width, t.long_width),
                BuiltinKind::LongLong | BuiltinKind::ULongLong => {
                    (t.long_long_width, t.long_long_align)
                }
                BuiltinKind::Float => (t.float_width, t.float_width),
                BuiltinKind::Double => (t.double_width, t.double_align),
                BuiltinKind::LongDouble => (t.long_double_width, t.long_double_align),
                BuiltinKind::NullPtr | BuiltinKind::ObjCSel => (t.pointer_width, t.pointer_align),
                BuiltinKind::Void => panic!("size of incomplete type void"),
                BuiltinKind::Dependent => panic!("size of a dependent type"),
            },
            TypeKind::Pointer(_) | TypeKind::LValueReference(_) | TypeKind::RValueReference(_) => {
                (t.pointer_width, t.pointer_align)
            }
            TypeKind::ConstantArray { element, size } => {
                let (w, a) = self.type_info(*element);
                return (w * size, a);
            }
            TypeKind::IncompleteArray { .. } => panic!("size of an array of unknown bound"),
            TypeKind::Vector { element, len } | TypeKind::ExtVector { element, len } => {
                let w = self.type_info(*element).0 * u64::from(*len);
                return (w, w.next_power_of_two());
            }
            TypeKind::FunctionProto { .. } => panic!("size of a function type"),
            TypeKind::Record(d) => {
                let layout = self.record_layout(*d);
                return (layout.size * 8, layout.align * 8);
            }
            TypeKind::Enum(d) => match &self.decl(*d).data {
                DeclData::Enum(e) if !e.integer_type.is_null() => {
                    return self.type_info(e.integer_type)
                }
                _ => panic!("size of an enum without an underlying type"),
            },
            TypeKind::Atomic(value) => {
                let (w, a) = self.type_info(*value);
                let a = if w.is_power_of_two() && w <= 128 { a.max(w) } else { a };
                return (w, a);
            }
            TypeKind::Typedef { .. } => unreachable!("canonical type is never a typedef"),
            TypeKind::TemplateTypeParm { .. } | TypeKind::PackExpansion(_) => {
                panic!("size of a dependent type")
            }
        };
        (u64::from(w), u64::from(a))
    }

    /// Lay out the class `record` names.
    ///
    /// # Panics
    /// Panics if the class has no definition.
    pub fn record_layout(&self, record: DeclId) -> RecordLayout {
        let Some(def_data) = self.record_definition(record) else {
            panic!("layout of incomplete class '{}'", self.decl_name(record))
        };
        let def = def_data.definition;
        let is_union = matches!(self.decl(def).data.tag(), Some(t) if t.tag_kind == TagKind::Union);

        let mut offset = 0u64;
        let mut align = 8u64;
        let mut data_size = 0u64;

        for base in &def_data.bases {
            let (w, a) = self.type_info(base.ty);
            offset = align_to(offset, a);
            offset += w;
            align = align.max(a);
        }
        if def_data.flags.contains(DefinitionFlags::POLYMORPHIC) && def_data.bases.is_empty() {
            let p = u64::from(self.target.pointer_width);
            offset = p;
            align = align.max(u64::from(self.target.pointer_align));
        }

        let mut field_offsets = Vec::new();
        for &member in self.decls_in(def) {
            let DeclData::Field(field) = &self.decl(member).data else {
                continue;
            };
            let (w, a) = self.type_info(field.declarator.value.ty);
            align = align.max(a);

            let Some(width_expr) = field.bit_width else {
                if is_union {
                    field_offsets.push(0);
                    data_size = data_size.max(w);
                } else {
                    offset = align_to(offset, a);
                    field_offsets.push(offset);
                    offset += w;
                }
                continue;
            };

            let bits = self.bit_width_of(width_expr);
            if is_union {
                field_offsets.push(0);
                data_size = data_size.max(bits);
            } else if bits == 0 {
                // Zero-width bit-fields close the current storage unit.
                offset = align_to(offset, a);
                field_offsets.push(offset);
            } else {
                // A bit-field never straddles a storage unit of its type.
                if offset / w != (offset + bits - 1) / w {
                    offset = align_to(offset, a);
                }
                field_offsets.push(offset);
                offset += bits;
            }
        }

        let mut size_bits = if is_union { data_size } else { offset };
        if size_bits == 0 && self.lang.cplusplus {
            size_bits = 8;
        }
        RecordLayout {
            size: align_to(size_bits, align) / 8,
            align: align / 8,
            field_offsets,
        }
    }

    fn bit_width_of(&self, e: crate::ExprId) -> u64 {
        match evaluate_as_int(self, e) {
            Some(v) => u64::try_from(v.value).unwrap_or(0),
            None => panic!("bit-field width is not a constant"),
        }
    }
}
