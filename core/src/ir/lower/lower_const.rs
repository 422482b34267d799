//! file: core/src/ir/lower/lower_const.rs
//! description: materialization of source literals as target constants.

use crate::ast::{ConstantLit, Literal, Scalar};
use crate::ice;
use crate::ir::value::{Constant, FALSE_BITS, TRUE_BITS};
use crate::types::{BaseType, Type};

/// Copy a source literal into the target's constant encoding.
///
/// Booleans become all-ones or zero. Without native integers, integer and
/// boolean components are stored as 32-bit float bit patterns instead.
pub fn constant_copy(lit: &ConstantLit, native_integers: bool) -> Constant {
    match &lit.value {
        Literal::Aggregate(elements) => {
            let expected = match &lit.ty {
                Type::Array { length, .. } => *length as usize,
                Type::Struct { fields, .. } => fields.len(),
                other => ice!("aggregate literal of non-aggregate type {}", other),
            };
            if elements.len() != expected {
                ice!("literal of type {} has {} elements, expected {}", lit.ty, elements.len(), expected);
            }
            Constant::Aggregate(elements.iter().map(|e| constant_copy(e, native_integers)).collect())
        }
        Literal::Components(scalars) => {
            let base = match lit.ty.base_type() {
                Some(b) => b,
                None => ice!("component literal of type {}", lit.ty),
            };
            let rows = lit.ty.vector_elements();
            let columns = lit.ty.matrix_columns();
            if scalars.len() != rows as usize * columns as usize {
                ice!("literal of type {} has {} components", lit.ty, scalars.len());
            }
            if columns > 1 && !base.is_float() {
                ice!("matrix literal of non-float type {}", lit.ty);
            }
            let as_float = !native_integers && (base.is_integer() || base.is_boolean());
            let bit_size = if as_float { 32 } else { base.bit_size() };
            let bits = scalars
                .iter()
                .map(|s| component_bits(*s, base, native_integers))
                .collect();
            Constant::Numeric { bit_size, columns, rows, bits }
        }
    }
}

fn component_bits(scalar: Scalar, base: BaseType, native_integers: bool) -> u64 {
    let int = |raw: u64, value: f64| -> u64 {
        if native_integers {
            raw
        } else {
            (value as f32).to_bits() as u64
        }
    };
    match (base, scalar) {
        (BaseType::Bool, Scalar::Bool(v)) => match (native_integers, v) {
            (true, true) => TRUE_BITS,
            (true, false) => FALSE_BITS,
            (false, true) => 1.0f32.to_bits() as u64,
            (false, false) => 0.0f32.to_bits() as u64,
        },
        (BaseType::Uint8, Scalar::U8(v)) => int(v as u64, v as f64),
        (BaseType::Int8, Scalar::I8(v)) => int(v as u8 as u64, v as f64),
        (BaseType::Uint16, Scalar::U16(v)) => int(v as u64, v as f64),
        (BaseType::Int16, Scalar::I16(v)) => int(v as u16 as u64, v as f64),
        (BaseType::Uint, Scalar::U32(v)) => int(v as u64, v as f64),
        (BaseType::Int, Scalar::I32(v)) => int(v as u32 as u64, v as f64),
        (BaseType::Uint64, Scalar::U64(v)) => int(v, v as f64),
        (BaseType::Int64, Scalar::I64(v)) => int(v as u64, v as f64),
        (BaseType::Float16, Scalar::F16(v)) => v as u64,
        (BaseType::Float, Scalar::F32(v)) => v.to_bits() as u64,
        (BaseType::Double, Scalar::F64(v)) => v.to_bits(),
        (base, scalar) => ice!("literal component {:?} does not match base type {:?}", scalar, base),
    }
}
