//! file: core/src/ir/lower/lower_expr.rs
//! description: rvalue evaluation and expression lowering.
//!
//! `evaluate_rvalue` is the single entry point: it emits whatever the
//! rvalue needs into the current region and returns the SSA value holding
//! the result. Opcode selection follows the operand type for comparisons
//! and the result type for everything else. A target without native
//! integers only ever sees float opcodes.

use crate::ast::{ExprOp, Expression, Rvalue, Swizzle};
use crate::error::LowerError;
use crate::ice;
use crate::ir::op::{AluKind, AluOp, AluType, IntrinsicOp, RoundingMode};
use crate::ir::shader::{AluSrc, Indices, InstrKind, Src, StorageClass};
use crate::ir::value::ValueId;
use crate::types::{BaseType, Type};

use super::Lowerer;
use super::function_builder::FunctionBuilder;

impl Lowerer<'_> {
    pub(crate) fn evaluate_rvalue(&mut self, b: &mut FunctionBuilder, rvalue: &Rvalue) -> Result<ValueId, LowerError> {
        match rvalue {
            Rvalue::Deref(_) | Rvalue::Constant(_) => {
                let ty = rvalue.ty();
                if ty.is_matrix() || ty.vector_elements() == 0 {
                    ice!("load of {} cannot produce a single SSA value", ty);
                }
                let n = ty.vector_elements();
                let bits = self.value_bits(&ty);
                let head = self.rvalue_location(b, rvalue)?.into_head();
                // Buffer memory only promises nonzero for true.
                let root = self.shader.derefs.root_var(head);
                let from_buffer = matches!(
                    self.shader.variable(root).class,
                    StorageClass::UniformBuffer | StorageClass::StorageBuffer
                );
                let zero = match from_buffer && ty.is_boolean() {
                    true => Some(self.emit_zero(b)?),
                    false => None,
                };
                let kind = InstrKind::Intrinsic {
                    op: IntrinsicOp::LoadDeref,
                    srcs: vec![Src::Deref(head)],
                    indices: Indices { num_components: n, ..Indices::default() },
                };
                let raw = self.emit_value(b, kind, n, bits)?;
                match zero {
                    Some(zero) => self.emit_nonzero_test(b, raw, zero),
                    None => Ok(raw),
                }
            }
            Rvalue::Expression(e) => self.lower_expression(b, e),
            Rvalue::Swizzle(s) => self.lower_swizzle(b, s),
            Rvalue::Texture(t) => self.lower_texture(b, t),
        }
    }

    /// Width of a value of type `ty` as the target stores it.
    pub(crate) fn value_bits(&self, ty: &Type) -> u8 {
        match ty.base_type() {
            Some(base) if !self.ctx.native_integers() && !base.is_float() => 32,
            _ => ty.bit_size(),
        }
    }

    /// Re-read `src` through `swizzle`. An identity swizzle of the same
    /// width returns `src` unchanged.
    pub(crate) fn swizzle(
        &mut self,
        b: &mut FunctionBuilder,
        src: ValueId,
        swizzle: [u8; 4],
        num_components: u8,
    ) -> Result<ValueId, LowerError> {
        let def = *self.shader.value(src);
        let identity = num_components == def.num_components
            && swizzle.iter().take(num_components as usize).enumerate().all(|(i, &s)| s as usize == i);
        if identity {
            return Ok(src);
        }
        if let Some(&bad) = swizzle.iter().take(num_components as usize).find(|&&s| s >= def.num_components) {
            ice!("swizzle reads component {} of a {}-component value", bad, def.num_components);
        }
        let op = self.mov_op();
        let kind = InstrKind::Alu { op, srcs: vec![AluSrc::swizzled(src, swizzle)] };
        self.emit_value(b, kind, num_components, def.bit_size)
    }

    fn lower_swizzle(&mut self, b: &mut FunctionBuilder, s: &Swizzle) -> Result<ValueId, LowerError> {
        let src = self.evaluate_rvalue(b, &s.val)?;
        self.swizzle(b, src, s.components, s.num_components)
    }

    pub(crate) fn mov_op(&self) -> AluOp {
        if self.ctx.native_integers() { AluOp::Imov } else { AluOp::Fmov }
    }

    /// Emit a 32-bit zero for the boolean fix-up compare.
    pub(crate) fn emit_zero(&mut self, b: &mut FunctionBuilder) -> Result<ValueId, LowerError> {
        self.emit_value(b, InstrKind::LoadConst { bit_size: 32, bits: vec![0] }, 1, 32)
    }

    /// Turn a raw boolean read from buffer memory into a canonical boolean.
    pub(crate) fn emit_nonzero_test(
        &mut self,
        b: &mut FunctionBuilder,
        raw: ValueId,
        zero: ValueId,
    ) -> Result<ValueId, LowerError> {
        let n = self.shader.value(raw).num_components;
        let srcs = vec![AluSrc::broadcast(raw, n), AluSrc::swizzled(zero, [0; 4])];
        self.emit_value(b, InstrKind::Alu { op: AluOp::Ine, srcs }, n, 32)
    }

    pub(crate) fn lower_expression(&mut self, b: &mut FunctionBuilder, e: &Expression) -> Result<ValueId, LowerError> {
        if e.op.must_be_lowered_upstream() {
            ice!("{:?} expressions must be lowered before this pass", e.op);
        }
        match e.op {
            ExprOp::UboLoad => return self.lower_ubo_load(b, e),
            ExprOp::InterpolateAtCentroid | ExprOp::InterpolateAtOffset | ExprOp::InterpolateAtSample => {
                return self.lower_interpolate(b, e);
            }
            ExprOp::GetBufferSize => {
                let block = self.evaluate_rvalue(b, operand(e, 0))?;
                let kind = InstrKind::Intrinsic {
                    op: IntrinsicOp::GetBufferSize,
                    srcs: vec![Src::Ssa(block)],
                    indices: Indices::default(),
                };
                return self.emit_value(b, kind, 1, 32);
            }
            _ => {}
        }

        if e.ty.is_matrix() || e.operands.iter().any(|o| o.ty().is_matrix()) {
            ice!("{:?} on matrices must be split into column operations", e.op);
        }

        let mut srcs = Vec::with_capacity(e.operands.len());
        for o in &e.operands {
            srcs.push(self.evaluate_rvalue(b, o)?);
        }

        if e.op == ExprOp::Convert {
            return self.lower_conversion(b, &operand(e, 0).ty(), &e.ty, srcs[0]);
        }

        let out = match e.ty.base_type() {
            Some(base) => base,
            None => ice!("{:?} expression of non-numeric type {}", e.op, e.ty),
        };
        let input = e.operands.first().and_then(|o| o.ty().base_type()).unwrap_or(out);
        let width = e.operands.first().map(|o| o.ty().vector_elements()).unwrap_or(1);

        let op = self.select_alu_op(e.op, input, out, width, e.operands.len());
        if matches!(e.op, ExprOp::Greater | ExprOp::Lequal) {
            srcs.swap(0, 1);
        }

        let n = e.ty.vector_elements();
        let bits = self.value_bits(&e.ty);
        let alu_srcs = match e.op {
            ExprOp::Vector => srcs.iter().map(|&v| AluSrc::swizzled(v, [0; 4])).collect(),
            _ => srcs
                .iter()
                .map(|&v| AluSrc::broadcast(v, self.shader.value(v).num_components))
                .collect(),
        };
        self.emit_value(b, InstrKind::Alu { op, srcs: alu_srcs }, n, bits)
    }

    fn select_alu_op(&self, op: ExprOp, input: BaseType, out: BaseType, width: u8, arity: usize) -> AluOp {
        let ints = self.ctx.native_integers();
        let int_only = |chosen: AluOp| -> AluOp {
            if !ints {
                ice!("{:?} needs native integer support", op);
            }
            chosen
        };
        // float / signed / unsigned, keyed on `base`
        let by_base = |base: BaseType, f: AluOp, s: AluOp, u: AluOp| -> AluOp {
            if !ints || base.is_float() {
                f
            } else if base.is_signed_int() {
                s
            } else {
                u
            }
        };
        // comparisons, with a set-on-compare form for float-only targets
        let compare = |f: AluOp, i: AluOp, u: AluOp, set: AluOp| -> AluOp {
            if !ints {
                set
            } else if input.is_float() {
                f
            } else if input.is_signed_int() || input.is_boolean() {
                i
            } else {
                u
            }
        };
        let logic = |i: AluOp, f: AluOp| -> AluOp { if ints { i } else { f } };

        match op {
            ExprOp::BitNot => logic(AluOp::Inot, AluOp::Fnot),
            ExprOp::LogicNot => logic(AluOp::Inot, AluOp::Fnot),
            ExprOp::Neg => by_base(out, AluOp::Fneg, AluOp::Ineg, AluOp::Ineg),
            ExprOp::Abs => by_base(out, AluOp::Fabs, AluOp::Iabs, AluOp::Iabs),
            ExprOp::Sign => by_base(out, AluOp::Fsign, AluOp::Isign, AluOp::Isign),
            ExprOp::Rcp => AluOp::Frcp,
            ExprOp::Rsq => AluOp::Frsq,
            ExprOp::Sqrt => AluOp::Fsqrt,
            ExprOp::Exp2 => AluOp::Fexp2,
            ExprOp::Log2 => AluOp::Flog2,
            ExprOp::BitcastI2F
            | ExprOp::BitcastF2I
            | ExprOp::BitcastU2F
            | ExprOp::BitcastF2U
            | ExprOp::BitcastI642D
            | ExprOp::BitcastD2I64
            | ExprOp::BitcastU642D
            | ExprOp::BitcastD2U64
            | ExprOp::SubroutineToInt => self.mov_op(),
            ExprOp::Trunc => AluOp::Ftrunc,
            ExprOp::Ceil => AluOp::Fceil,
            ExprOp::Floor => AluOp::Ffloor,
            ExprOp::Fract => AluOp::Ffract,
            ExprOp::RoundEven => AluOp::FroundEven,
            ExprOp::Sin => AluOp::Fsin,
            ExprOp::Cos => AluOp::Fcos,
            ExprOp::Dfdx => AluOp::Fddx,
            ExprOp::DfdxCoarse => AluOp::FddxCoarse,
            ExprOp::DfdxFine => AluOp::FddxFine,
            ExprOp::Dfdy => AluOp::Fddy,
            ExprOp::DfdyCoarse => AluOp::FddyCoarse,
            ExprOp::DfdyFine => AluOp::FddyFine,
            ExprOp::PackSnorm2x16 => AluOp::PackSnorm2x16,
            ExprOp::PackSnorm4x8 => AluOp::PackSnorm4x8,
            ExprOp::PackUnorm2x16 => AluOp::PackUnorm2x16,
            ExprOp::PackUnorm4x8 => AluOp::PackUnorm4x8,
            ExprOp::PackHalf2x16 => AluOp::PackHalf2x16,
            ExprOp::UnpackSnorm2x16 => AluOp::UnpackSnorm2x16,
            ExprOp::UnpackSnorm4x8 => AluOp::UnpackSnorm4x8,
            ExprOp::UnpackUnorm2x16 => AluOp::UnpackUnorm2x16,
            ExprOp::UnpackUnorm4x8 => AluOp::UnpackUnorm4x8,
            ExprOp::UnpackHalf2x16 => AluOp::UnpackHalf2x16,
            ExprOp::PackDouble2x32 => AluOp::PackDouble2x32,
            ExprOp::UnpackDouble2x32 => AluOp::UnpackDouble2x32,
            ExprOp::BitfieldReverse => int_only(AluOp::BitfieldReverse),
            ExprOp::BitCount => int_only(AluOp::BitCount),
            ExprOp::FindMsb if input.is_signed_int() => int_only(AluOp::IfindMsb),
            ExprOp::FindMsb => int_only(AluOp::UfindMsb),
            ExprOp::FindLsb => int_only(AluOp::FindLsb),
            ExprOp::Saturate => AluOp::Fsat,
            ExprOp::FrexpSig => AluOp::FrexpSig,
            ExprOp::FrexpExp => AluOp::FrexpExp,

            ExprOp::Add => by_base(out, AluOp::Fadd, AluOp::Iadd, AluOp::Iadd),
            ExprOp::Sub => by_base(out, AluOp::Fsub, AluOp::Isub, AluOp::Isub),
            ExprOp::Mul => by_base(out, AluOp::Fmul, AluOp::Imul, AluOp::Imul),
            ExprOp::Div => by_base(out, AluOp::Fdiv, AluOp::Idiv, AluOp::Udiv),
            ExprOp::Mod => by_base(out, AluOp::Fmod, AluOp::Umod, AluOp::Umod),
            ExprOp::Less | ExprOp::Greater => compare(AluOp::Flt, AluOp::Ilt, AluOp::Ult, AluOp::Slt),
            ExprOp::Gequal | ExprOp::Lequal => compare(AluOp::Fge, AluOp::Ige, AluOp::Uge, AluOp::Sge),
            ExprOp::Equal => compare(AluOp::Feq, AluOp::Ieq, AluOp::Ieq, AluOp::Seq),
            ExprOp::Nequal => compare(AluOp::Fne, AluOp::Ine, AluOp::Ine, AluOp::Sne),
            ExprOp::AllEqual => fused_compare(true, input, width, ints),
            ExprOp::AnyNequal => fused_compare(false, input, width, ints),
            ExprOp::LogicAnd => logic(AluOp::Iand, AluOp::Fand),
            ExprOp::LogicOr => logic(AluOp::Ior, AluOp::For),
            ExprOp::LogicXor => logic(AluOp::Ixor, AluOp::Fxor),
            ExprOp::BitAnd => logic(AluOp::Iand, AluOp::Fand),
            ExprOp::BitOr => logic(AluOp::Ior, AluOp::For),
            ExprOp::BitXor => logic(AluOp::Ixor, AluOp::Fxor),
            ExprOp::Lshift => int_only(AluOp::Ishl),
            ExprOp::Rshift if input.is_signed_int() => int_only(AluOp::Ishr),
            ExprOp::Rshift => int_only(AluOp::Ushr),
            ExprOp::Min => by_base(out, AluOp::Fmin, AluOp::Imin, AluOp::Umin),
            ExprOp::Max => by_base(out, AluOp::Fmax, AluOp::Imax, AluOp::Umax),
            ExprOp::Pow => AluOp::Fpow,
            ExprOp::Dot => match width {
                1 => AluOp::Fmul,
                2 => AluOp::Fdot2,
                3 => AluOp::Fdot3,
                4 => AluOp::Fdot4,
                w => ice!("dot product of {}-component vectors", w),
            },
            ExprOp::ImulHigh if out.is_signed_int() => int_only(AluOp::ImulHigh),
            ExprOp::ImulHigh => int_only(AluOp::UmulHigh),
            ExprOp::Carry => int_only(AluOp::UaddCarry),
            ExprOp::Borrow => int_only(AluOp::UsubBorrow),
            ExprOp::Ldexp => AluOp::Ldexp,

            ExprOp::Fma => AluOp::Ffma,
            ExprOp::Lrp => AluOp::Flrp,
            ExprOp::Csel => logic(AluOp::Bcsel, AluOp::Fcsel),
            ExprOp::BitfieldExtract if out.is_signed_int() => int_only(AluOp::IbitfieldExtract),
            ExprOp::BitfieldExtract => int_only(AluOp::UbitfieldExtract),
            ExprOp::BitfieldInsert => int_only(AluOp::BitfieldInsert),
            ExprOp::Vector => match arity {
                2 => AluOp::Vec2,
                3 => AluOp::Vec3,
                4 => AluOp::Vec4,
                n => ice!("vector constructor with {} operands", n),
            },

            ExprOp::Convert
            | ExprOp::UboLoad
            | ExprOp::GetBufferSize
            | ExprOp::InterpolateAtCentroid
            | ExprOp::InterpolateAtOffset
            | ExprOp::InterpolateAtSample
            | ExprOp::Exp
            | ExprOp::Log
            | ExprOp::Noise
            | ExprOp::VectorExtract
            | ExprOp::VectorInsert
            | ExprOp::SsboUnsizedArrayLength => ice!("{:?} has no single ALU opcode", op),
        }
    }

    fn lower_conversion(
        &mut self,
        b: &mut FunctionBuilder,
        from: &Type,
        to: &Type,
        src: ValueId,
    ) -> Result<ValueId, LowerError> {
        let (from_base, to_base) = match (from.base_type(), to.base_type()) {
            (Some(f), Some(t)) => (f, t),
            _ => ice!("conversion from {} to {}", from, to),
        };
        let n = to.vector_elements();
        let bits = self.value_bits(to);
        let width = self.shader.value(src).num_components;

        if !self.ctx.native_integers() {
            // Every value is already a float; only truncation and
            // boolean normalization do any work.
            if to_base.is_boolean() {
                let zero = self.emit_zero(b)?;
                let srcs = vec![AluSrc::broadcast(src, width), AluSrc::swizzled(zero, [0; 4])];
                return self.emit_value(b, InstrKind::Alu { op: AluOp::Sne, srcs }, n, 32);
            }
            let op = if from_base.is_float() && to_base.is_integer() { AluOp::Ftrunc } else { AluOp::Fmov };
            return self.emit_value(b, InstrKind::Alu { op, srcs: vec![AluSrc::broadcast(src, width)] }, n, 32);
        }

        let src_type = alu_type(from_base);
        let dst_type = alu_type(to_base);
        let op = if src_type.bit_size == dst_type.bit_size
            && src_type.kind != AluKind::Float
            && dst_type.kind != AluKind::Float
            && src_type.kind != AluKind::Bool
            && dst_type.kind != AluKind::Bool
        {
            AluOp::Imov
        } else {
            let rounding = if src_type.kind == AluKind::Float
                && dst_type.kind == AluKind::Float
                && dst_type.bit_size < src_type.bit_size
            {
                RoundingMode::Rtne
            } else {
                RoundingMode::Undef
            };
            AluOp::Convert { src: src_type, dst: dst_type, rounding }
        };
        self.emit_value(b, InstrKind::Alu { op, srcs: vec![AluSrc::broadcast(src, width)] }, n, bits)
    }

    fn lower_ubo_load(&mut self, b: &mut FunctionBuilder, e: &Expression) -> Result<ValueId, LowerError> {
        let block = self.evaluate_rvalue(b, operand(e, 0))?;
        let offset = self.evaluate_rvalue(b, operand(e, 1))?;
        let n = e.ty.vector_elements();
        let bits = self.value_bits(&e.ty);
        let zero = match e.ty.is_boolean() {
            true => Some(self.emit_zero(b)?),
            false => None,
        };
        let kind = InstrKind::Intrinsic {
            op: IntrinsicOp::LoadUbo,
            srcs: vec![Src::Ssa(block), Src::Ssa(offset)],
            indices: Indices { num_components: n, ..Indices::default() },
        };
        let raw = self.emit_value(b, kind, n, bits)?;
        match zero {
            Some(zero) => self.emit_nonzero_test(b, raw, zero),
            None => Ok(raw),
        }
    }

    fn lower_interpolate(&mut self, b: &mut FunctionBuilder, e: &Expression) -> Result<ValueId, LowerError> {
        let interpolant = match operand(e, 0).as_deref() {
            Some(d) => d,
            None => ice!("{:?} needs a variable operand", e.op),
        };
        let chain = self.build_deref(b, interpolant)?;
        let mut srcs = vec![Src::Deref(chain.into_head())];
        let op = match e.op {
            ExprOp::InterpolateAtCentroid => IntrinsicOp::InterpDerefAtCentroid,
            ExprOp::InterpolateAtOffset => IntrinsicOp::InterpDerefAtOffset,
            _ => IntrinsicOp::InterpDerefAtSample,
        };
        if op != IntrinsicOp::InterpDerefAtCentroid {
            srcs.push(Src::Ssa(self.evaluate_rvalue(b, operand(e, 1))?));
        }
        let n = e.ty.vector_elements();
        let bits = self.value_bits(&e.ty);
        let kind = InstrKind::Intrinsic { op, srcs, indices: Indices { num_components: n, ..Indices::default() } };
        self.emit_value(b, kind, n, bits)
    }
}

fn operand(e: &Expression, index: usize) -> &Rvalue {
    match e.operands.get(index) {
        Some(o) => o,
        None => ice!("{:?} expression is missing operand {}", e.op, index),
    }
}

fn alu_type(base: BaseType) -> AluType {
    let kind = if base.is_float() {
        AluKind::Float
    } else if base.is_boolean() {
        AluKind::Bool
    } else if base.is_signed_int() {
        AluKind::Int
    } else {
        AluKind::Uint
    };
    AluType { kind, bit_size: base.bit_size() }
}

/// Pick the compare for `all_equal` (`all == true`) or `any_nequal`.
/// Vectors use the fused reduce-compare forms.
pub(crate) fn fused_compare(all: bool, input: BaseType, width: u8, native_integers: bool) -> AluOp {
    use AluOp::*;
    if !native_integers {
        return match (all, width) {
            (true, 1) => Seq,
            (true, 2) => FallEqual2,
            (true, 3) => FallEqual3,
            (true, 4) => FallEqual4,
            (false, 1) => Sne,
            (false, 2) => FanyNequal2,
            (false, 3) => FanyNequal3,
            (false, 4) => FanyNequal4,
            (_, w) => ice!("fused compare of {}-component vectors", w),
        };
    }
    match (all, input.is_float(), width) {
        (true, true, 1) => Feq,
        (true, true, 2) => BallFequal2,
        (true, true, 3) => BallFequal3,
        (true, true, 4) => BallFequal4,
        (true, false, 1) => Ieq,
        (true, false, 2) => BallIequal2,
        (true, false, 3) => BallIequal3,
        (true, false, 4) => BallIequal4,
        (false, true, 1) => Fne,
        (false, true, 2) => BanyFnequal2,
        (false, true, 3) => BanyFnequal3,
        (false, true, 4) => BanyFnequal4,
        (false, false, 1) => Ine,
        (false, false, 2) => BanyInequal2,
        (false, false, 3) => BanyInequal3,
        (false, false, 4) => BanyInequal4,
        (_, _, w) => ice!("fused compare of {}-component vectors", w),
    }
}
