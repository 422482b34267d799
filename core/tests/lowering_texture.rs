mod common;

use common::*;
use glint_core::ast::{ConstantLit, LodInfo, Rvalue, Texture, TextureOp, VarMode};
use glint_core::ir::op::{TexDestType, TexSrcKind};
use glint_core::ir::{InstrKind, TexInstr};
use glint_core::ir::lower::expected_src_count;
use glint_core::types::{BaseType, SamplerDim, SamplerType, Type};
use glint_core::{Capabilities, Shader, lower_shader};

const OPS: [TextureOp; 12] = [
    TextureOp::Tex,
    TextureOp::Txb,
    TextureOp::Txl,
    TextureOp::Txd,
    TextureOp::Txf,
    TextureOp::TxfMs,
    TextureOp::Txs,
    TextureOp::Lod,
    TextureOp::Tg4,
    TextureOp::QueryLevels,
    TextureOp::TextureSamples,
    TextureOp::SamplesIdentical,
];

struct Case {
    op: TextureOp,
    projector: bool,
    comparator: bool,
    offset: bool,
    with_lod: bool,
    shadow: bool,
}

fn result_type(op: TextureOp, shadow: bool) -> Type {
    match op {
        TextureOp::Txs => Type::vector(BaseType::Int, 2),
        TextureOp::Lod => Type::vec(2),
        TextureOp::QueryLevels | TextureOp::TextureSamples => Type::int(),
        TextureOp::SamplesIdentical => Type::bool(),
        _ if shadow => Type::float(),
        _ => Type::vec(4),
    }
}

fn lower_case(case: &Case) -> (Shader, TexInstr) {
    let mut sb = ShaderBuilder::fragment("tex");
    let dim = if case.op == TextureOp::TxfMs { SamplerDim::Ms } else { SamplerDim::Dim2D };
    let sampler_ty = Type::Sampler(SamplerType { dim, shadow: case.shadow, array: false, sampled: BaseType::Float });
    let s = sb.global("s", sampler_ty, VarMode::Uniform);
    let uv = sb.global("uv", Type::vec(2), VarMode::ShaderIn);
    let ty = result_type(case.op, case.shadow);
    let out = sb.global("out", ty.clone(), VarMode::ShaderOut);

    let f = |v: f32| Rvalue::Constant(ConstantLit::float(v));
    let i = |v: i32| Rvalue::Constant(ConstantLit::int(v));
    let has_coord = !matches!(case.op, TextureOp::Txs | TextureOp::QueryLevels | TextureOp::TextureSamples);
    let lod_info = match case.op {
        TextureOp::Txb => LodInfo::Bias(f(0.5)),
        TextureOp::Txl => LodInfo::Lod(f(1.0)),
        TextureOp::Txf | TextureOp::Txs if case.with_lod => LodInfo::Lod(i(0)),
        TextureOp::Txd => LodInfo::Grad { dpdx: sb.load(uv), dpdy: sb.load(uv) },
        TextureOp::TxfMs => LodInfo::SampleIndex(i(3)),
        TextureOp::Tg4 => LodInfo::Component(i(2)),
        _ => LodInfo::None,
    };
    let texture = Texture {
        op: case.op,
        ty: ty.clone(),
        sampler: sb.deref(s),
        coordinate: has_coord.then(|| sb.load(uv)),
        projector: case.projector.then(|| f(2.0)),
        shadow_comparator: case.comparator.then(|| f(0.25)),
        offset: case.offset.then(|| Rvalue::Constant(ConstantLit::new(
            Type::vector(BaseType::Int, 2),
            vec![glint_core::ast::Scalar::I32(1), glint_core::ast::Scalar::I32(-1)],
        ))),
        lod_info,
    };
    let mask = if ty.vector_elements() == 4 { 0b1111 } else if ty.vector_elements() == 2 { 0b11 } else { 0b1 };
    let body = vec![assign(sb.deref(out), Rvalue::Texture(Box::new(texture)), mask)];
    sb.main(body);

    let shader = lower_shader(&sb.finish(), &Capabilities::default()).expect("lowering failed");
    let tex = body_of(&shader, "main")
        .into_iter()
        .find_map(|(_, i)| match &i.kind {
            InstrKind::Tex(t) => Some(t.clone()),
            _ => None,
        })
        .expect("texture instruction");
    (shader, tex)
}

fn rank(kind: TexSrcKind) -> u8 {
    match kind {
        TexSrcKind::Coord => 0,
        TexSrcKind::Projector => 1,
        TexSrcKind::Comparator => 2,
        TexSrcKind::Offset => 3,
        _ => 4,
    }
}

#[test]
fn source_counts_match_for_every_op_and_option() {
    for op in OPS {
        for bits in 0..8u8 {
            for with_lod in [false, true] {
                if with_lod && !matches!(op, TextureOp::Txf | TextureOp::Txs) {
                    continue;
                }
                let case = Case {
                    op,
                    projector: bits & 1 != 0,
                    comparator: bits & 2 != 0,
                    offset: bits & 4 != 0,
                    with_lod,
                    shadow: false,
                };
                let (shader, tex) = lower_case(&case);
                let expected = expected_src_count(op, with_lod, case.projector, case.comparator, case.offset);
                assert_eq!(tex.srcs.len(), expected, "{:?} bits={:03b} lod={}\n{}", op, bits, with_lod, shader);

                let ranks: Vec<u8> = tex.srcs.iter().map(|s| rank(s.kind)).collect();
                let mut sorted = ranks.clone();
                sorted.sort();
                assert_eq!(ranks, sorted, "sources of {:?} out of order", op);
            }
        }
    }
}

#[test]
fn gather_component_is_an_immediate() {
    let (_, tex) = lower_case(&Case {
        op: TextureOp::Tg4,
        projector: false,
        comparator: false,
        offset: false,
        with_lod: false,
        shadow: false,
    });
    assert_eq!(tex.component, 2);
    assert_eq!(tex.srcs.len(), 1);
    assert_eq!(tex.srcs[0].kind, TexSrcKind::Coord);
}

#[test]
fn destination_sizes_follow_the_op() {
    let base = |op| Case { op, projector: false, comparator: false, offset: false, with_lod: false, shadow: false };
    let size = |case: Case| {
        let (shader, _) = lower_case(&case);
        let dest = body_of(&shader, "main")
            .into_iter()
            .find_map(|(_, i)| match i.kind {
                InstrKind::Tex(_) => i.dest,
                _ => None,
            })
            .unwrap();
        shader.value(dest).num_components
    };
    assert_eq!(size(base(TextureOp::Tex)), 4);
    assert_eq!(size(base(TextureOp::Txs)), 2);
    assert_eq!(size(base(TextureOp::Lod)), 2);
    assert_eq!(size(base(TextureOp::QueryLevels)), 1);
    assert_eq!(size(base(TextureOp::TextureSamples)), 1);
    assert_eq!(size(Case { comparator: true, shadow: true, ..base(TextureOp::Tex) }), 1);
}

#[test]
fn new_style_shadow_is_flagged() {
    let (_, tex) = lower_case(&Case {
        op: TextureOp::Tex,
        projector: false,
        comparator: true,
        offset: false,
        with_lod: false,
        shadow: true,
    });
    assert!(tex.is_shadow);
    assert!(tex.is_new_style_shadow);
    assert_eq!(tex.dest_type, TexDestType::Float);
    assert_eq!(tex.coord_components, 2);
}

#[test]
fn integer_results_use_int_dest_type() {
    let (_, tex) = lower_case(&Case {
        op: TextureOp::QueryLevels,
        projector: false,
        comparator: false,
        offset: false,
        with_lod: false,
        shadow: false,
    });
    assert_eq!(tex.dest_type, TexDestType::Int);
}

#[test]
#[should_panic(expected = "cannot take")]
fn bias_without_bias_operand_is_fatal() {
    let mut sb = ShaderBuilder::fragment("bad_tex");
    let s = sb.global(
        "s",
        Type::Sampler(SamplerType { dim: SamplerDim::Dim2D, shadow: false, array: false, sampled: BaseType::Float }),
        VarMode::Uniform,
    );
    let uv = sb.global("uv", Type::vec(2), VarMode::ShaderIn);
    let out = sb.global("out", Type::vec(4), VarMode::ShaderOut);
    let texture = Texture {
        op: TextureOp::Txb,
        ty: Type::vec(4),
        sampler: sb.deref(s),
        coordinate: Some(sb.load(uv)),
        projector: None,
        shadow_comparator: None,
        offset: None,
        lod_info: LodInfo::None,
    };
    let body = vec![assign(sb.deref(out), Rvalue::Texture(Box::new(texture)), 0b1111)];
    sb.main(body);
    let _ = lower_shader(&sb.finish(), &Capabilities::default());
}
