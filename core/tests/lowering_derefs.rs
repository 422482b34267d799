mod common;

use common::*;
use glint_core::ast::{ConstantLit, Deref, Rvalue, VarMode};
use glint_core::ir::op::IntrinsicOp;
use glint_core::ir::{ArrayIndex, DerefKind, InstrKind};
use glint_core::types::{StructField, Type};
use glint_core::{Capabilities, lower_shader};

fn inner() -> Type {
    Type::Struct { name: "T".into(), fields: vec![StructField { name: "c".into(), ty: Type::vec(4) }] }
}

fn outer() -> Type {
    Type::Struct {
        name: "S".into(),
        fields: vec![
            StructField { name: "pad".into(), ty: Type::float() },
            StructField { name: "b".into(), ty: Type::array(inner(), 4) },
        ],
    }
}

/// `out = a.b[index].c`
fn nested_read(index: impl FnOnce(&ShaderBuilder) -> Rvalue) -> glint_core::Shader {
    let mut sb = ShaderBuilder::fragment("derefs");
    let a = sb.global("a", outer(), VarMode::Auto);
    let out = sb.global("out", Type::vec(4), VarMode::ShaderOut);
    let path = sb
        .deref(a)
        .field(1, Type::array(inner(), 4))
        .index(index(&sb), inner())
        .field(0, Type::vec(4));
    let body = vec![assign(sb.deref(out), Rvalue::Deref(path), 0)];
    sb.main(body);
    lower_shader(&sb.finish(), &Capabilities::default()).expect("lowering failed")
}

#[test]
fn constant_index_builds_direct_chain_without_instructions() {
    let shader = nested_read(|_| Rvalue::Constant(ConstantLit::int(2)));
    let instrs = body_of(&shader, "main");
    // whole-location copy, no index evaluation
    assert_eq!(instrs.len(), 1, "{}", shader);
    let InstrKind::Intrinsic { op: IntrinsicOp::CopyDeref, srcs, .. } = &instrs[0].1.kind else {
        panic!("expected copy_deref:\n{}", shader);
    };
    let head = srcs[1].as_deref().unwrap();
    let links: Vec<_> = shader.derefs.walk(head).map(|(_, l)| l.kind).collect();
    assert_eq!(links.len(), 4, "root plus three links");
    assert!(matches!(links[0], DerefKind::Var(_)));
    assert_eq!(links[1], DerefKind::Struct { index: 1 });
    assert_eq!(links[2], DerefKind::Array(ArrayIndex::Direct(2)));
    assert_eq!(links[3], DerefKind::Struct { index: 0 });
    assert_eq!(shader.derefs.chain_type(head), &Type::vec(4));
}

#[test]
fn variable_index_is_evaluated_before_its_consumer() {
    let shader = {
        let mut sb = ShaderBuilder::fragment("derefs");
        let i = sb.global("i", Type::int(), VarMode::Uniform);
        let a = sb.global("a", outer(), VarMode::Auto);
        let out = sb.global("out", Type::vec(4), VarMode::ShaderOut);
        let path = sb
            .deref(a)
            .field(1, Type::array(inner(), 4))
            .index(sb.load(i), inner())
            .field(0, Type::vec(4));
        let body = vec![assign(sb.deref(out), Rvalue::Deref(path), 0)];
        sb.main(body);
        lower_shader(&sb.finish(), &Capabilities::default()).unwrap()
    };

    let instrs = body_of(&shader, "main");
    assert_eq!(instrs.len(), 2, "{}", shader);
    let index_value = match &instrs[0].1.kind {
        InstrKind::Intrinsic { op: IntrinsicOp::LoadDeref, .. } => instrs[0].1.dest.unwrap(),
        other => panic!("index load should come first, got {:?}", other),
    };
    let InstrKind::Intrinsic { op: IntrinsicOp::CopyDeref, srcs, .. } = &instrs[1].1.kind else {
        panic!("expected copy_deref:\n{}", shader);
    };
    let links: Vec<_> = shader.derefs.walk(srcs[1].as_deref().unwrap()).map(|(_, l)| l.kind).collect();
    assert_eq!(links[2], DerefKind::Array(ArrayIndex::Indirect(index_value)));
}

#[test]
fn loads_through_a_chain_read_the_leaf_type() {
    let mut sb = ShaderBuilder::fragment("leaf");
    let arr = sb.global("arr", Type::array(Type::vec(3), 2), VarMode::Uniform);
    let out = sb.global("out", Type::vec(3), VarMode::ShaderOut);
    let elem = sb.deref(arr).index(Rvalue::Constant(ConstantLit::uint(1)), Type::vec(3));
    let sum = binop(glint_core::ast::ExprOp::Add, Type::vec(3), Rvalue::Deref(elem.clone()), Rvalue::Deref(elem));
    let body = vec![assign(sb.deref(out), sum, 0b111)];
    sb.main(body);

    let shader = lower_shader(&sb.finish(), &Capabilities::default()).unwrap();
    let instrs = body_of(&shader, "main");
    let loads: Vec<_> = instrs
        .iter()
        .filter(|(_, i)| matches!(i.kind, InstrKind::Intrinsic { op: IntrinsicOp::LoadDeref, .. }))
        .collect();
    assert_eq!(loads.len(), 2);
    for (_, load) in loads {
        assert_eq!(shader.value(load.dest.unwrap()).num_components, 3);
    }
}

#[test]
#[should_panic(expected = "does not narrow")]
fn mistyped_link_is_fatal() {
    let mut sb = ShaderBuilder::fragment("bad_link");
    let a = sb.global("a", outer(), VarMode::Auto);
    let out = sb.global("out", Type::float(), VarMode::ShaderOut);
    let bogus = Deref::Record { record: Box::new(sb.deref(a)), field: 0, ty: Type::int() };
    let body = vec![assign(sb.deref(out), Rvalue::Deref(bogus), 0)];
    sb.main(body);
    let _ = lower_shader(&sb.finish(), &Capabilities::default());
}

#[test]
#[should_panic(expected = "referenced before its declaration")]
fn undeclared_variable_is_fatal() {
    let mut sb = ShaderBuilder::fragment("undeclared");
    let ghost = sb.local("ghost", Type::float());
    let out = sb.global("out", Type::float(), VarMode::ShaderOut);
    let body = vec![assign(sb.deref(out), sb.load(ghost), 0)];
    sb.main(body);
    let _ = lower_shader(&sb.finish(), &Capabilities::default());
}
