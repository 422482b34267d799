//! file: core/src/ir/lower/lower_texture.rs
//! description: texture operations to target texture instructions.

use crate::ast::{LodInfo, Rvalue, Texture, TextureOp};
use crate::error::LowerError;
use crate::ice;
use crate::ir::op::{TexDestType, TexOp, TexSrcKind};
use crate::ir::shader::{InstrKind, TexInstr, TexSrc};
use crate::ir::value::ValueId;
use crate::types::{BaseType, Type};

use super::Lowerer;
use super::function_builder::FunctionBuilder;

/// Number of sources a texture instruction must carry.
///
/// `has_lod` only matters for fetches and size queries, where the LOD is
/// optional. The gather component is an immediate and never a source.
pub fn expected_src_count(op: TextureOp, has_lod: bool, projector: bool, comparator: bool, offset: bool) -> usize {
    let base = match op {
        TextureOp::Tex => 1,
        TextureOp::Txb | TextureOp::Txl => 2,
        TextureOp::Txd => 3,
        TextureOp::Txf => 1 + usize::from(has_lod),
        TextureOp::TxfMs => 2,
        TextureOp::Txs => usize::from(has_lod),
        TextureOp::Lod | TextureOp::Tg4 | TextureOp::SamplesIdentical => 1,
        TextureOp::QueryLevels | TextureOp::TextureSamples => 0,
    };
    base + usize::from(projector) + usize::from(comparator) + usize::from(offset)
}

fn tex_op(op: TextureOp) -> TexOp {
    match op {
        TextureOp::Tex => TexOp::Tex,
        TextureOp::Txb => TexOp::Txb,
        TextureOp::Txl => TexOp::Txl,
        TextureOp::Txd => TexOp::Txd,
        TextureOp::Txf => TexOp::Txf,
        TextureOp::TxfMs => TexOp::TxfMs,
        TextureOp::Txs => TexOp::Txs,
        TextureOp::Lod => TexOp::Lod,
        TextureOp::Tg4 => TexOp::Tg4,
        TextureOp::QueryLevels => TexOp::QueryLevels,
        TextureOp::TextureSamples => TexOp::TextureSamples,
        TextureOp::SamplesIdentical => TexOp::SamplesIdentical,
    }
}

/// Components written by a texture instruction with result type `ty`.
fn dest_size(op: TextureOp, ty: &Type, new_style_shadow: bool) -> u8 {
    match op {
        TextureOp::Txs => ty.vector_elements(),
        TextureOp::Lod => 2,
        TextureOp::QueryLevels | TextureOp::TextureSamples | TextureOp::SamplesIdentical => 1,
        _ if new_style_shadow => 1,
        _ => 4,
    }
}

impl Lowerer<'_> {
    pub(crate) fn lower_texture(&mut self, b: &mut FunctionBuilder, t: &Texture) -> Result<ValueId, LowerError> {
        let sampler = match t.sampler.ty().without_array() {
            Type::Sampler(s) => *s,
            other => ice!("texture {:?} through non-sampler type {}", t.op, other),
        };
        let dest_type = match t.ty.base_type() {
            Some(BaseType::Float) => TexDestType::Float,
            Some(BaseType::Int) => TexDestType::Int,
            Some(BaseType::Uint) | Some(BaseType::Bool) => TexDestType::Uint,
            _ => ice!("texture {:?} returning {}", t.op, t.ty),
        };
        let has_lod = matches!(t.lod_info, LodInfo::Lod(_));
        let expected = expected_src_count(
            t.op,
            has_lod,
            t.projector.is_some(),
            t.shadow_comparator.is_some(),
            t.offset.is_some(),
        );

        let texture = self.build_deref(b, &t.sampler)?.into_head();
        let mut srcs = Vec::with_capacity(expected);
        let mut coord_components = 0;

        if let Some(coord) = &t.coordinate {
            coord_components = coord.ty().vector_elements();
            self.push_tex_src(b, &mut srcs, TexSrcKind::Coord, coord)?;
        }
        if let Some(p) = &t.projector {
            self.push_tex_src(b, &mut srcs, TexSrcKind::Projector, p)?;
        }
        if let Some(c) = &t.shadow_comparator {
            self.push_tex_src(b, &mut srcs, TexSrcKind::Comparator, c)?;
        }
        if let Some(o) = &t.offset {
            let ty = o.ty();
            if !ty.is_scalar() && !ty.is_vector() {
                ice!("texel offset of type {}", ty);
            }
            self.push_tex_src(b, &mut srcs, TexSrcKind::Offset, o)?;
        }

        let mut component = 0;
        match (t.op, &t.lod_info) {
            (TextureOp::Txb, LodInfo::Bias(bias)) => self.push_tex_src(b, &mut srcs, TexSrcKind::Bias, bias)?,
            (TextureOp::Txl | TextureOp::Txf | TextureOp::Txs, LodInfo::Lod(lod)) => {
                self.push_tex_src(b, &mut srcs, TexSrcKind::Lod, lod)?
            }
            (TextureOp::Txd, LodInfo::Grad { dpdx, dpdy }) => {
                self.push_tex_src(b, &mut srcs, TexSrcKind::Ddx, dpdx)?;
                self.push_tex_src(b, &mut srcs, TexSrcKind::Ddy, dpdy)?;
            }
            (TextureOp::TxfMs, LodInfo::SampleIndex(index)) => {
                self.push_tex_src(b, &mut srcs, TexSrcKind::MsIndex, index)?
            }
            (TextureOp::Tg4, LodInfo::Component(c)) => {
                component = match c.as_constant().and_then(|lit| lit.as_u32()) {
                    Some(v) if v < 4 => v as u8,
                    _ => ice!("gather component must be a constant in 0..4"),
                };
            }
            (
                TextureOp::Tex
                | TextureOp::Txf
                | TextureOp::Txs
                | TextureOp::Lod
                | TextureOp::Tg4
                | TextureOp::QueryLevels
                | TextureOp::TextureSamples
                | TextureOp::SamplesIdentical,
                LodInfo::None,
            ) => {}
            (op, lod) => ice!("texture {:?} cannot take {:?}", op, lod),
        }

        if srcs.len() != expected {
            ice!("texture {:?} emitted {} sources, expected {}", t.op, srcs.len(), expected);
        }

        let is_shadow = sampler.shadow;
        let is_new_style_shadow = is_shadow && t.ty.vector_elements() == 1;
        let n = dest_size(t.op, &t.ty, is_new_style_shadow);
        let instr = TexInstr {
            op: tex_op(t.op),
            sampler_dim: sampler.dim,
            is_array: sampler.array,
            is_shadow,
            is_new_style_shadow,
            dest_type,
            texture,
            coord_components,
            component,
            srcs,
        };
        self.emit_value(b, InstrKind::Tex(instr), n, 32)
    }

    fn push_tex_src(
        &mut self,
        b: &mut FunctionBuilder,
        srcs: &mut Vec<TexSrc>,
        kind: TexSrcKind,
        rvalue: &Rvalue,
    ) -> Result<(), LowerError> {
        let value = self.evaluate_rvalue(b, rvalue)?;
        srcs.push(TexSrc { kind, value });
        Ok(())
    }
}
