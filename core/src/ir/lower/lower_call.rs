//! file: core/src/ir/lower/lower_call.rs
//! description: user function calls and the compiler intrinsic catalogue.
//!
//! Intrinsics are described by a static table mapping each `IntrinsicId`
//! to the target opcode and a recipe for laying out its sources. Arity is
//! checked against the recipe; a mismatch is an internal error.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::{Call, IntrinsicId, Rvalue};
use crate::error::LowerError;
use crate::ice;
use crate::ir::deref::DerefId;
use crate::ir::op::{AluOp, IntrinsicOp};
use crate::ir::shader::{AluSrc, Indices, InstrKind, Src};
use crate::ir::value::ValueId;
use crate::types::{SamplerDim, Type};

use super::Lowerer;
use super::function_builder::FunctionBuilder;

/// How the target opcode is chosen for an intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpChoice {
    Fixed(IntrinsicOp),
    /// Signed or unsigned form, picked from the type of the return location.
    BySignedness { signed: IntrinsicOp, unsigned: IntrinsicOp },
}

/// Source layout of an intrinsic. `data` counts the trailing value
/// parameters of atomics and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    AtomicCounter { data: usize },
    Image { data: usize },
    ImageQuery,
    Barrier,
    Clock,
    SsboLoad,
    SsboStore,
    SsboAtomic { data: usize },
    SharedLoad,
    SharedStore,
    SharedAtomic { data: usize },
    Vote,
    Ballot,
    ReadInvocation,
    ReadFirstInvocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrinsicRule {
    pub op: OpChoice,
    pub recipe: Recipe,
}

lazy_static! {
    static ref INTRINSIC_RULES: HashMap<IntrinsicId, IntrinsicRule> = {
        use IntrinsicId as I;
        use IntrinsicOp as O;
        use Recipe as R;

        let fixed = |op, recipe| IntrinsicRule { op: OpChoice::Fixed(op), recipe };
        let signed = |s, u, recipe| IntrinsicRule { op: OpChoice::BySignedness { signed: s, unsigned: u }, recipe };

        let mut m = HashMap::new();
        m.insert(I::AtomicCounterRead, fixed(O::AtomicCounterReadDeref, R::AtomicCounter { data: 0 }));
        m.insert(I::AtomicCounterIncrement, fixed(O::AtomicCounterIncDeref, R::AtomicCounter { data: 0 }));
        m.insert(I::AtomicCounterPredecrement, fixed(O::AtomicCounterPreDecDeref, R::AtomicCounter { data: 0 }));
        m.insert(I::AtomicCounterAdd, fixed(O::AtomicCounterAddDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterAnd, fixed(O::AtomicCounterAndDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterOr, fixed(O::AtomicCounterOrDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterXor, fixed(O::AtomicCounterXorDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterMin, fixed(O::AtomicCounterMinDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterMax, fixed(O::AtomicCounterMaxDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterExchange, fixed(O::AtomicCounterExchangeDeref, R::AtomicCounter { data: 1 }));
        m.insert(I::AtomicCounterCompSwap, fixed(O::AtomicCounterCompSwapDeref, R::AtomicCounter { data: 2 }));

        m.insert(I::ImageLoad, fixed(O::ImageDerefLoad, R::Image { data: 0 }));
        m.insert(I::ImageStore, fixed(O::ImageDerefStore, R::Image { data: 1 }));
        m.insert(I::ImageAtomicAdd, fixed(O::ImageDerefAtomicAdd, R::Image { data: 1 }));
        m.insert(I::ImageAtomicMin, signed(O::ImageDerefAtomicImin, O::ImageDerefAtomicUmin, R::Image { data: 1 }));
        m.insert(I::ImageAtomicMax, signed(O::ImageDerefAtomicImax, O::ImageDerefAtomicUmax, R::Image { data: 1 }));
        m.insert(I::ImageAtomicAnd, fixed(O::ImageDerefAtomicAnd, R::Image { data: 1 }));
        m.insert(I::ImageAtomicOr, fixed(O::ImageDerefAtomicOr, R::Image { data: 1 }));
        m.insert(I::ImageAtomicXor, fixed(O::ImageDerefAtomicXor, R::Image { data: 1 }));
        m.insert(I::ImageAtomicExchange, fixed(O::ImageDerefAtomicExchange, R::Image { data: 1 }));
        m.insert(I::ImageAtomicCompSwap, fixed(O::ImageDerefAtomicCompSwap, R::Image { data: 2 }));
        m.insert(I::ImageSize, fixed(O::ImageDerefSize, R::ImageQuery));
        m.insert(I::ImageSamples, fixed(O::ImageDerefSamples, R::ImageQuery));

        m.insert(I::MemoryBarrier, fixed(O::MemoryBarrier, R::Barrier));
        m.insert(I::MemoryBarrierAtomicCounter, fixed(O::MemoryBarrierAtomicCounter, R::Barrier));
        m.insert(I::MemoryBarrierBuffer, fixed(O::MemoryBarrierBuffer, R::Barrier));
        m.insert(I::MemoryBarrierImage, fixed(O::MemoryBarrierImage, R::Barrier));
        m.insert(I::MemoryBarrierShared, fixed(O::MemoryBarrierShared, R::Barrier));
        m.insert(I::GroupMemoryBarrier, fixed(O::GroupMemoryBarrier, R::Barrier));

        m.insert(I::ShaderClock, fixed(O::ShaderClock, R::Clock));

        m.insert(I::SsboLoad, fixed(O::LoadSsbo, R::SsboLoad));
        m.insert(I::SsboStore, fixed(O::StoreSsbo, R::SsboStore));
        m.insert(I::SsboAtomicAdd, fixed(O::SsboAtomicAdd, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicMin, signed(O::SsboAtomicImin, O::SsboAtomicUmin, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicMax, signed(O::SsboAtomicImax, O::SsboAtomicUmax, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicAnd, fixed(O::SsboAtomicAnd, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicOr, fixed(O::SsboAtomicOr, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicXor, fixed(O::SsboAtomicXor, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicExchange, fixed(O::SsboAtomicExchange, R::SsboAtomic { data: 1 }));
        m.insert(I::SsboAtomicCompSwap, fixed(O::SsboAtomicCompSwap, R::SsboAtomic { data: 2 }));

        m.insert(I::SharedLoad, fixed(O::LoadShared, R::SharedLoad));
        m.insert(I::SharedStore, fixed(O::StoreShared, R::SharedStore));
        m.insert(I::SharedAtomicAdd, fixed(O::SharedAtomicAdd, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicMin, signed(O::SharedAtomicImin, O::SharedAtomicUmin, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicMax, signed(O::SharedAtomicImax, O::SharedAtomicUmax, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicAnd, fixed(O::SharedAtomicAnd, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicOr, fixed(O::SharedAtomicOr, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicXor, fixed(O::SharedAtomicXor, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicExchange, fixed(O::SharedAtomicExchange, R::SharedAtomic { data: 1 }));
        m.insert(I::SharedAtomicCompSwap, fixed(O::SharedAtomicCompSwap, R::SharedAtomic { data: 2 }));

        m.insert(I::VoteAny, fixed(O::VoteAny, R::Vote));
        m.insert(I::VoteAll, fixed(O::VoteAll, R::Vote));
        m.insert(I::VoteEq, fixed(O::VoteIeq, R::Vote));
        m.insert(I::Ballot, fixed(O::Ballot, R::Ballot));
        m.insert(I::ReadInvocation, fixed(O::ReadInvocation, R::ReadInvocation));
        m.insert(I::ReadFirstInvocation, fixed(O::ReadFirstInvocation, R::ReadFirstInvocation));
        m
    };
}

/// Table entry for `id`. Every catalogue member has one.
pub fn intrinsic_rule(id: IntrinsicId) -> &'static IntrinsicRule {
    match INTRINSIC_RULES.get(&id) {
        Some(rule) => rule,
        None => ice!("intrinsic {:?} has no lowering rule", id),
    }
}

fn expect_arity(id: IntrinsicId, params: &[Rvalue], expected: usize) {
    if params.len() != expected {
        ice!("{:?} takes {} parameters, got {}", id, expected, params.len());
    }
}

impl Lowerer<'_> {
    pub(crate) fn lower_call(&mut self, b: &mut FunctionBuilder, call: &Call) -> Result<(), LowerError> {
        let sig = self.src.signature(call.callee);
        match sig.intrinsic {
            Some(id) => self.lower_intrinsic_call(b, id, call),
            None => self.lower_user_call(b, call),
        }
    }

    fn lower_user_call(&mut self, b: &mut FunctionBuilder, call: &Call) -> Result<(), LowerError> {
        let callee = self.ctx.function(self.src, call.callee);
        let mut params = Vec::with_capacity(call.actual_parameters.len());
        for p in &call.actual_parameters {
            params.push(self.rvalue_location(b, p)?.into_head());
        }
        let return_deref = match &call.return_deref {
            Some(d) => Some(self.build_deref(b, d)?.into_head()),
            None => None,
        };
        self.emit(b, InstrKind::Call { callee, params, return_deref }, None)?;
        Ok(())
    }

    fn lower_intrinsic_call(&mut self, b: &mut FunctionBuilder, id: IntrinsicId, call: &Call) -> Result<(), LowerError> {
        let rule = intrinsic_rule(id);
        let ret_ty = call.return_deref.as_ref().map(|d| d.ty().clone());
        let op = match rule.op {
            OpChoice::Fixed(op) => op,
            OpChoice::BySignedness { signed, unsigned } => match ret_ty.as_ref().and_then(Type::base_type) {
                Some(base) if base.is_signed_int() => signed,
                Some(_) => unsigned,
                None => ice!("{:?} needs a typed return location to pick its opcode", id),
            },
        };
        let params = call.actual_parameters.as_slice();
        let ret_shape = |default_bits: u8| -> (u8, u8) {
            match &ret_ty {
                Some(t) => (t.vector_elements(), if default_bits == 0 { t.bit_size() } else { default_bits }),
                None => ice!("{:?} result has nowhere to go", id),
            }
        };

        let result = match rule.recipe {
            Recipe::AtomicCounter { data } => {
                expect_arity(id, params, 1 + data);
                let counter = self.rvalue_location(b, &params[0])?.into_head();
                let mut srcs = vec![Src::Deref(counter)];
                self.push_values(b, &mut srcs, &params[1..])?;
                self.emit_intrinsic(b, op, srcs, Indices::default(), Some((1, 32)))?
            }
            Recipe::Image { data } => {
                let image = match params.first().map(|p| p.ty()) {
                    Some(ty) => match ty.without_array() {
                        Type::Image(img) => *img,
                        other => ice!("{:?} on non-image type {}", id, other),
                    },
                    None => ice!("{:?} without an image parameter", id),
                };
                let multisample = image.dim == SamplerDim::Ms;
                expect_arity(id, params, 2 + usize::from(multisample) + data);

                let deref = self.rvalue_location(b, &params[0])?.into_head();
                let mut site = CallSite::default();
                let coord = self.evaluate_rvalue(b, &params[1])?;
                let coord = self.image_coordinate(b, &mut site, coord, image.coordinate_components())?;
                let sample = match multisample {
                    true => self.evaluate_rvalue(b, &params[2])?,
                    false => site.undef(self, b)?,
                };
                let mut srcs = vec![Src::Deref(deref), Src::Ssa(coord), Src::Ssa(sample)];
                let first_data = 2 + usize::from(multisample);
                self.push_values(b, &mut srcs, &params[first_data..])?;
                let dest = ret_ty.as_ref().map(|t| (t.vector_elements(), 32));
                self.emit_intrinsic(b, op, srcs, Indices::default(), dest)?
            }
            Recipe::ImageQuery => {
                expect_arity(id, params, 1);
                let deref = self.rvalue_location(b, &params[0])?.into_head();
                self.emit_intrinsic(b, op, vec![Src::Deref(deref)], Indices::default(), Some(ret_shape(32)))?
            }
            Recipe::Barrier => {
                expect_arity(id, params, 0);
                self.emit_intrinsic(b, op, Vec::new(), Indices::default(), None)?
            }
            Recipe::Clock => {
                expect_arity(id, params, 0);
                let dest = ret_ty.as_ref().map(|t| (t.vector_elements(), 32)).unwrap_or((2, 32));
                self.emit_intrinsic(b, op, Vec::new(), Indices::default(), Some(dest))?
            }
            Recipe::SsboLoad => {
                expect_arity(id, params, 2);
                let ty = match &ret_ty {
                    Some(t) => t.clone(),
                    None => ice!("{:?} result has nowhere to go", id),
                };
                let mut srcs = Vec::with_capacity(2);
                self.push_values(b, &mut srcs, params)?;
                let n = ty.vector_elements();
                let bits = self.value_bits(&ty);
                let zero = match ty.is_boolean() {
                    true => Some(self.emit_zero(b)?),
                    false => None,
                };
                let indices = Indices { num_components: n, ..Indices::default() };
                let raw = self.emit_intrinsic(b, op, srcs, indices, Some((n, bits)))?;
                match (zero, raw) {
                    (Some(zero), Some(raw)) => Some(self.emit_nonzero_test(b, raw, zero)?),
                    (_, raw) => raw,
                }
            }
            Recipe::SsboStore => {
                expect_arity(id, params, 4);
                let block = self.evaluate_rvalue(b, &params[0])?;
                let offset = self.evaluate_rvalue(b, &params[1])?;
                let value = self.evaluate_rvalue(b, &params[2])?;
                let write_mask = immediate(id, &params[3]) as u8;
                let indices = Indices {
                    num_components: self.shader.value(value).num_components,
                    write_mask: Some(write_mask),
                    ..Indices::default()
                };
                let srcs = vec![Src::Ssa(value), Src::Ssa(block), Src::Ssa(offset)];
                self.emit_intrinsic(b, op, srcs, indices, None)?
            }
            Recipe::SsboAtomic { data } => {
                expect_arity(id, params, 2 + data);
                let mut srcs = Vec::with_capacity(params.len());
                self.push_values(b, &mut srcs, params)?;
                self.emit_intrinsic(b, op, srcs, Indices::default(), Some(ret_shape(32)))?
            }
            Recipe::SharedLoad => {
                expect_arity(id, params, 1);
                let offset = self.evaluate_rvalue(b, &params[0])?;
                let (n, bits) = ret_shape(0);
                let indices = Indices { num_components: n, base: Some(0), ..Indices::default() };
                self.emit_intrinsic(b, op, vec![Src::Ssa(offset)], indices, Some((n, bits)))?
            }
            Recipe::SharedStore => {
                expect_arity(id, params, 3);
                let offset = self.evaluate_rvalue(b, &params[0])?;
                let value = self.evaluate_rvalue(b, &params[1])?;
                let write_mask = immediate(id, &params[2]) as u8;
                let indices = Indices {
                    num_components: self.shader.value(value).num_components,
                    write_mask: Some(write_mask),
                    base: Some(0),
                    ..Indices::default()
                };
                self.emit_intrinsic(b, op, vec![Src::Ssa(value), Src::Ssa(offset)], indices, None)?
            }
            Recipe::SharedAtomic { data } => {
                expect_arity(id, params, 1 + data);
                let mut srcs = Vec::with_capacity(params.len());
                self.push_values(b, &mut srcs, params)?;
                let indices = Indices { base: Some(0), ..Indices::default() };
                self.emit_intrinsic(b, op, srcs, indices, Some(ret_shape(0)))?
            }
            Recipe::Vote => {
                expect_arity(id, params, 1);
                let mut srcs = Vec::with_capacity(1);
                self.push_values(b, &mut srcs, params)?;
                self.emit_intrinsic(b, op, srcs, Indices::default(), Some((1, 32)))?
            }
            Recipe::Ballot => {
                expect_arity(id, params, 1);
                let mut srcs = Vec::with_capacity(1);
                self.push_values(b, &mut srcs, params)?;
                self.emit_intrinsic(b, op, srcs, Indices::default(), Some((1, 64)))?
            }
            Recipe::ReadInvocation | Recipe::ReadFirstInvocation => {
                let arity = if rule.recipe == Recipe::ReadInvocation { 2 } else { 1 };
                expect_arity(id, params, arity);
                let mut srcs = Vec::with_capacity(arity);
                self.push_values(b, &mut srcs, params)?;
                let value = srcs[0].as_ssa();
                let shape = match value {
                    Some(v) => {
                        let def = self.shader.value(v);
                        (def.num_components, def.bit_size)
                    }
                    None => ice!("{:?} value is not an SSA value", id),
                };
                let indices = Indices { num_components: shape.0, ..Indices::default() };
                self.emit_intrinsic(b, op, srcs, indices, Some(shape))?
            }
        };

        if let Some(ret) = &call.return_deref {
            let value = match result {
                Some(v) => v,
                None => ice!("{:?} produces no value for its return location", id),
            };
            let dst = self.build_deref(b, ret)?;
            let n = self.shader.value(value).num_components;
            self.emit_store(b, dst.into_head(), value, full_mask(n))?;
        }
        Ok(())
    }

    fn push_values(&mut self, b: &mut FunctionBuilder, srcs: &mut Vec<Src>, params: &[Rvalue]) -> Result<(), LowerError> {
        for p in params {
            let v = self.evaluate_rvalue(b, p)?;
            srcs.push(Src::Ssa(v));
        }
        Ok(())
    }

    fn emit_intrinsic(
        &mut self,
        b: &mut FunctionBuilder,
        op: IntrinsicOp,
        srcs: Vec<Src>,
        indices: Indices,
        dest: Option<(u8, u8)>,
    ) -> Result<Option<ValueId>, LowerError> {
        match dest {
            Some((n, bits)) => Ok(Some(self.emit_value(b, InstrKind::Intrinsic { op, srcs, indices }, n, bits)?)),
            None => self.emit(b, InstrKind::Intrinsic { op, srcs, indices }, None),
        }
    }

    /// Widen an image coordinate to four channels. Unused channels read
    /// the call site's undefined value.
    fn image_coordinate(
        &mut self,
        b: &mut FunctionBuilder,
        site: &mut CallSite,
        coord: ValueId,
        used: u8,
    ) -> Result<ValueId, LowerError> {
        let available = self.shader.value(coord).num_components;
        if used > available {
            ice!("image access uses {} coordinate components, value has {}", used, available);
        }
        let mut srcs = Vec::with_capacity(4);
        for i in 0..4u8 {
            if i < used {
                srcs.push(AluSrc::swizzled(coord, [i; 4]));
            } else {
                srcs.push(AluSrc::swizzled(site.undef(self, b)?, [0; 4]));
            }
        }
        let bits = self.shader.value(coord).bit_size;
        self.emit_value(b, InstrKind::Alu { op: AluOp::Vec4, srcs }, 4, bits)
    }

    pub(crate) fn emit_store(
        &mut self,
        b: &mut FunctionBuilder,
        dst: DerefId,
        value: ValueId,
        write_mask: u8,
    ) -> Result<(), LowerError> {
        let num_components = self.shader.value(value).num_components;
        let kind = InstrKind::Intrinsic {
            op: IntrinsicOp::StoreDeref,
            srcs: vec![Src::Deref(dst), Src::Ssa(value)],
            indices: Indices { num_components, write_mask: Some(write_mask), ..Indices::default() },
        };
        self.emit(b, kind, None)?;
        Ok(())
    }
}

/// Per-call-site state. All padding channels of one call share a single
/// undefined value.
#[derive(Debug, Default)]
struct CallSite {
    undef: Option<ValueId>,
}

impl CallSite {
    fn undef(&mut self, lowerer: &mut Lowerer<'_>, b: &mut FunctionBuilder) -> Result<ValueId, LowerError> {
        if let Some(v) = self.undef {
            return Ok(v);
        }
        let v = lowerer.emit_value(b, InstrKind::Undef, 1, 32)?;
        self.undef = Some(v);
        Ok(v)
    }
}

pub(crate) fn full_mask(num_components: u8) -> u8 {
    match num_components {
        0 => 0,
        n => ((1u16 << n) - 1) as u8,
    }
}

fn immediate(id: IntrinsicId, param: &Rvalue) -> u32 {
    match param.as_constant().and_then(|c| c.as_u32()) {
        Some(v) => v,
        None => ice!("{:?} needs a constant immediate, got {}", id, param.ty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intrinsic_has_a_rule() {
        use IntrinsicId::*;
        for id in [
            AtomicCounterRead, AtomicCounterCompSwap, ImageLoad, ImageAtomicCompSwap, ImageSize,
            ImageSamples, MemoryBarrier, GroupMemoryBarrier, ShaderClock, SsboLoad, SsboStore,
            SsboAtomicCompSwap, SharedLoad, SharedStore, SharedAtomicAdd, SharedAtomicCompSwap,
            VoteAny, VoteAll, VoteEq, Ballot, ReadInvocation, ReadFirstInvocation,
        ] {
            intrinsic_rule(id);
        }
        assert_eq!(INTRINSIC_RULES.len(), 56);
    }

    #[test]
    fn comp_swap_takes_two_data_operands() {
        assert_eq!(intrinsic_rule(IntrinsicId::SharedAtomicCompSwap).recipe, Recipe::SharedAtomic { data: 2 });
        assert_eq!(intrinsic_rule(IntrinsicId::SsboAtomicCompSwap).recipe, Recipe::SsboAtomic { data: 2 });
        assert_eq!(intrinsic_rule(IntrinsicId::SharedAtomicAdd).recipe, Recipe::SharedAtomic { data: 1 });
    }

    #[test]
    fn masks_cover_components() {
        assert_eq!(full_mask(1), 0b1);
        assert_eq!(full_mask(3), 0b111);
        assert_eq!(full_mask(4), 0b1111);
    }
}
