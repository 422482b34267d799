mod common;

use common::*;
use glint_core::ast::{ConstantLit, ExprOp, Rvalue, VarMode};
use glint_core::ir::op::{AluKind, AluOp, RoundingMode};
use glint_core::ir::InstrKind;
use glint_core::types::{BaseType, Type};
use glint_core::{Capabilities, Shader, lower_shader};

const NO_INTS: Capabilities = Capabilities { native_integers: false, max_instructions: None };

/// Lower `out = op(a, b)` with `a`, `b` of `operand` type and collect the
/// ALU opcodes emitted, in order.
fn binary(op: ExprOp, operand: Type, result: Type, caps: &Capabilities) -> (Shader, Vec<AluOp>) {
    let mut sb = ShaderBuilder::fragment("alu");
    let a = sb.global("a", operand.clone(), VarMode::Uniform);
    let b = sb.global("b", operand, VarMode::Uniform);
    let out = sb.global("out", result.clone(), VarMode::Auto);
    let mask = ((1u16 << result.vector_elements()) - 1) as u8;
    let body = vec![assign(sb.deref(out), binop(op, result, sb.load(a), sb.load(b)), mask)];
    sb.main(body);
    let shader = lower_shader(&sb.finish(), caps).expect("lowering failed");
    let ops = alu_ops(&shader);
    (shader, ops)
}

fn unary(op: ExprOp, operand: Type, result: Type, caps: &Capabilities) -> (Shader, Vec<AluOp>) {
    let mut sb = ShaderBuilder::fragment("alu");
    let a = sb.global("a", operand, VarMode::Uniform);
    let out = sb.global("out", result.clone(), VarMode::Auto);
    let mask = ((1u16 << result.vector_elements()) - 1) as u8;
    let body = vec![assign(sb.deref(out), Rvalue::expr(op, result, vec![sb.load(a)]), mask)];
    sb.main(body);
    let shader = lower_shader(&sb.finish(), caps).expect("lowering failed");
    let ops = alu_ops(&shader);
    (shader, ops)
}

fn alu_ops(shader: &Shader) -> Vec<AluOp> {
    body_of(shader, "main")
        .into_iter()
        .filter_map(|(_, i)| match &i.kind {
            InstrKind::Alu { op, .. } => Some(*op),
            _ => None,
        })
        .collect()
}

#[test]
fn all_equal_picks_fused_form_by_width() {
    let native = Capabilities::default();
    assert_eq!(binary(ExprOp::AllEqual, Type::float(), Type::bool(), &native).1, vec![AluOp::Feq]);
    assert_eq!(binary(ExprOp::AllEqual, Type::vec(2), Type::bool(), &native).1, vec![AluOp::BallFequal2]);
    assert_eq!(binary(ExprOp::AllEqual, Type::vec(3), Type::bool(), &native).1, vec![AluOp::BallFequal3]);
    assert_eq!(binary(ExprOp::AllEqual, Type::vec(4), Type::bool(), &native).1, vec![AluOp::BallFequal4]);
    let ivec3 = Type::vector(BaseType::Int, 3);
    assert_eq!(binary(ExprOp::AllEqual, ivec3, Type::bool(), &native).1, vec![AluOp::BallIequal3]);
    let bvec2 = Type::vector(BaseType::Bool, 2);
    assert_eq!(binary(ExprOp::AllEqual, bvec2, Type::bool(), &native).1, vec![AluOp::BallIequal2]);
}

#[test]
fn any_nequal_picks_fused_form_by_width() {
    let native = Capabilities::default();
    assert_eq!(binary(ExprOp::AnyNequal, Type::vec(4), Type::bool(), &native).1, vec![AluOp::BanyFnequal4]);
    assert_eq!(binary(ExprOp::AnyNequal, Type::uint(), Type::bool(), &native).1, vec![AluOp::Ine]);
    assert_eq!(binary(ExprOp::AnyNequal, Type::vec(3), Type::bool(), &NO_INTS).1, vec![AluOp::FanyNequal3]);
    assert_eq!(binary(ExprOp::AllEqual, Type::vec(2), Type::bool(), &NO_INTS).1, vec![AluOp::FallEqual2]);
}

#[test]
fn comparisons_follow_operand_type() {
    let native = Capabilities::default();
    assert_eq!(binary(ExprOp::Less, Type::float(), Type::bool(), &native).1, vec![AluOp::Flt]);
    assert_eq!(binary(ExprOp::Less, Type::int(), Type::bool(), &native).1, vec![AluOp::Ilt]);
    assert_eq!(binary(ExprOp::Less, Type::uint(), Type::bool(), &native).1, vec![AluOp::Ult]);
    assert_eq!(binary(ExprOp::Gequal, Type::uint(), Type::bool(), &native).1, vec![AluOp::Uge]);
    assert_eq!(binary(ExprOp::Equal, Type::bool(), Type::bool(), &native).1, vec![AluOp::Ieq]);
}

#[test]
fn greater_is_less_with_swapped_operands() {
    let (shader, ops) = binary(ExprOp::Greater, Type::float(), Type::bool(), &Capabilities::default());
    assert_eq!(ops, vec![AluOp::Flt]);
    let instrs = body_of(&shader, "main");
    let loads: Vec<_> = instrs
        .iter()
        .filter(|(_, i)| matches!(i.kind, InstrKind::Intrinsic { .. }) && i.dest.is_some())
        .map(|(_, i)| i.dest.unwrap())
        .collect();
    let srcs = instrs
        .iter()
        .find_map(|(_, i)| match &i.kind {
            InstrKind::Alu { srcs, .. } => Some(srcs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(srcs[0].value, loads[1], "b is the first operand of the less-than");
    assert_eq!(srcs[1].value, loads[0]);
}

#[test]
fn arithmetic_follows_result_type() {
    let native = Capabilities::default();
    assert_eq!(binary(ExprOp::Add, Type::int(), Type::int(), &native).1, vec![AluOp::Iadd]);
    assert_eq!(binary(ExprOp::Div, Type::uint(), Type::uint(), &native).1, vec![AluOp::Udiv]);
    assert_eq!(binary(ExprOp::Div, Type::int(), Type::int(), &native).1, vec![AluOp::Idiv]);
    assert_eq!(binary(ExprOp::Min, Type::uint(), Type::uint(), &native).1, vec![AluOp::Umin]);
    assert_eq!(binary(ExprOp::Dot, Type::vec(3), Type::float(), &native).1, vec![AluOp::Fdot3]);
    assert_eq!(binary(ExprOp::Dot, Type::float(), Type::float(), &native).1, vec![AluOp::Fmul]);
}

#[test]
fn float_only_target_never_sees_integer_opcodes() {
    assert_eq!(binary(ExprOp::Less, Type::int(), Type::bool(), &NO_INTS).1, vec![AluOp::Slt]);
    assert_eq!(binary(ExprOp::Equal, Type::int(), Type::bool(), &NO_INTS).1, vec![AluOp::Seq]);
    assert_eq!(binary(ExprOp::Add, Type::int(), Type::int(), &NO_INTS).1, vec![AluOp::Fadd]);
    assert_eq!(binary(ExprOp::LogicAnd, Type::bool(), Type::bool(), &NO_INTS).1, vec![AluOp::Fand]);
    assert_eq!(binary(ExprOp::LogicXor, Type::bool(), Type::bool(), &NO_INTS).1, vec![AluOp::Fxor]);
    assert_eq!(unary(ExprOp::LogicNot, Type::bool(), Type::bool(), &NO_INTS).1, vec![AluOp::Fnot]);
}

#[test]
fn float_only_conversions() {
    assert_eq!(unary(ExprOp::Convert, Type::float(), Type::int(), &NO_INTS).1, vec![AluOp::Ftrunc]);
    assert_eq!(unary(ExprOp::Convert, Type::float(), Type::uint(), &NO_INTS).1, vec![AluOp::Ftrunc]);
    assert_eq!(unary(ExprOp::Convert, Type::int(), Type::float(), &NO_INTS).1, vec![AluOp::Fmov]);
    assert_eq!(unary(ExprOp::Convert, Type::float(), Type::bool(), &NO_INTS).1, vec![AluOp::Sne]);
    assert_eq!(unary(ExprOp::Convert, Type::int(), Type::bool(), &NO_INTS).1, vec![AluOp::Sne]);
}

#[test]
fn native_conversions() {
    let native = Capabilities::default();
    assert_eq!(unary(ExprOp::Convert, Type::int(), Type::uint(), &native).1, vec![AluOp::Imov]);
    match unary(ExprOp::Convert, Type::scalar(BaseType::Double), Type::float(), &native).1[..] {
        [AluOp::Convert { src, dst, rounding }] => {
            assert_eq!(src.kind, AluKind::Float);
            assert_eq!(src.bit_size, 64);
            assert_eq!(dst.bit_size, 32);
            assert_eq!(rounding, RoundingMode::Rtne);
        }
        ref other => panic!("unexpected {:?}", other),
    }
    match unary(ExprOp::Convert, Type::int(), Type::float(), &native).1[..] {
        [AluOp::Convert { dst, rounding, .. }] => {
            assert_eq!(dst.kind, AluKind::Float);
            assert_eq!(rounding, RoundingMode::Undef);
        }
        ref other => panic!("unexpected {:?}", other),
    }
    assert_eq!(unary(ExprOp::BitcastF2U, Type::float(), Type::uint(), &native).1, vec![AluOp::Imov]);
}

#[test]
fn scalar_operand_is_broadcast() {
    let mut sb = ShaderBuilder::fragment("broadcast");
    let v = sb.global("v", Type::vec(3), VarMode::Uniform);
    let s = sb.global("s", Type::float(), VarMode::Uniform);
    let out = sb.global("out", Type::vec(3), VarMode::Auto);
    let body = vec![assign(sb.deref(out), binop(ExprOp::Mul, Type::vec(3), sb.load(v), sb.load(s)), 0b111)];
    sb.main(body);

    let shader = lower_shader(&sb.finish(), &Capabilities::default()).unwrap();
    let srcs = body_of(&shader, "main")
        .into_iter()
        .find_map(|(_, i)| match &i.kind {
            InstrKind::Alu { op: AluOp::Fmul, srcs } => Some(srcs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(srcs[0].swizzle, [0, 1, 2, 2]);
    assert_eq!(srcs[1].swizzle, [0, 0, 0, 0]);
}

#[test]
fn vector_constructor_gathers_scalars() {
    let mut sb = ShaderBuilder::fragment("ctor");
    let x = sb.global("x", Type::float(), VarMode::Uniform);
    let out = sb.global("out", Type::vec(3), VarMode::Auto);
    let ctor = Rvalue::expr(
        ExprOp::Vector,
        Type::vec(3),
        vec![sb.load(x), Rvalue::Constant(ConstantLit::float(0.0)), sb.load(x)],
    );
    let body = vec![assign(sb.deref(out), ctor, 0b111)];
    sb.main(body);
    let shader = lower_shader(&sb.finish(), &Capabilities::default()).unwrap();
    assert_eq!(alu_ops(&shader), vec![AluOp::Vec3]);
}

#[test]
fn bitwise_ops_without_integers_use_float_logic() {
    for (op, expected) in [(ExprOp::BitAnd, AluOp::Fand), (ExprOp::BitOr, AluOp::For), (ExprOp::BitXor, AluOp::Fxor)] {
        let (shader, ops) = binary(op, Type::uint(), Type::uint(), &NO_INTS);
        assert!(ops.contains(&expected), "{:?}: {:?}\n{}", op, ops, shader);
        assert!(!ops.iter().any(|o| matches!(o, AluOp::Iand | AluOp::Ior | AluOp::Ixor)), "{:?}", ops);
    }
    let (_, ops) = unary(ExprOp::BitNot, Type::int(), Type::int(), &NO_INTS);
    assert!(ops.contains(&AluOp::Fnot), "{:?}", ops);
    assert!(!ops.contains(&AluOp::Inot), "{:?}", ops);
}

#[test]
#[should_panic(expected = "needs native integer support")]
fn shift_without_integers_is_fatal() {
    binary(ExprOp::Lshift, Type::uint(), Type::uint(), &NO_INTS);
}

#[test]
#[should_panic(expected = "must be lowered before this pass")]
fn exp_must_be_lowered_upstream() {
    unary(ExprOp::Exp, Type::float(), Type::float(), &Capabilities::default());
}

#[test]
#[should_panic(expected = "must be lowered before this pass")]
fn vector_extract_must_be_lowered_upstream() {
    binary(ExprOp::VectorExtract, Type::vec(4), Type::float(), &Capabilities::default());
}
