use assert_cmd::Command;
use glint_core::SourceShader;
use glint_core::ast::{ConstantLit, Deref, Node, Rvalue, Scalar, Signature, VarDecl, VarMode};
use glint_core::stage::{DepthLayout, StageLayout};
use glint_core::types::Type;
use std::fs;
use tempfile::tempdir;

/// `out vec4 color; void main() { color = vec4(1, 0, 0, 1); }`
fn sample_json() -> String {
    let mut source = SourceShader::new(
        "sample",
        StageLayout::Fragment {
            early_fragment_tests: false,
            depth_layout: DepthLayout::None,
            origin_upper_left: false,
        },
    );
    let color = source.add_variable(VarDecl::new("color", Type::vec(4), VarMode::ShaderOut));
    source.instructions.push(Node::Variable(color));

    let store = Node::Assignment {
        lhs: Deref::Variable { var: color, ty: Type::vec(4) },
        rhs: Rvalue::Constant(ConstantLit::new(
            Type::vec(4),
            vec![Scalar::F32(1.0), Scalar::F32(0.0), Scalar::F32(0.0), Scalar::F32(1.0)],
        )),
        write_mask: 0xf,
        condition: None,
    };
    let main = source.add_signature(Signature {
        function_name: "main".to_string(),
        return_type: Type::Void,
        parameters: Vec::new(),
        body: vec![store],
        is_defined: true,
        intrinsic: None,
        decl_site: None,
    });
    source.instructions.push(Node::Function { name: "main".to_string(), signatures: vec![main] });
    source.to_json().unwrap()
}

#[test]
fn lower_prints_text_dump() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.json");
    fs::write(&input, sample_json()).unwrap();

    let output = Command::cargo_bin("glint").unwrap().arg("lower").arg(&input).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("impl main"), "{}", stdout);
    assert!(stdout.contains("@copy_deref"), "{}", stdout);
    assert!(stdout.contains("entry: main"), "{}", stdout);
}

#[test]
fn lower_writes_json_to_output_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.json");
    let out = dir.path().join("lowered.json");
    fs::write(&input, sample_json()).unwrap();

    let output = Command::cargo_bin("glint")
        .unwrap()
        .args(["lower", "--json", "-o"])
        .arg(&out)
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let written = fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["info"]["name"], "sample");
    assert_eq!(value["info"]["entry_point"], "main");
}

#[test]
fn stats_lists_each_function() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.json");
    fs::write(&input, sample_json()).unwrap();

    let output = Command::cargo_bin("glint")
        .unwrap()
        .args(["lower", "--stats"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("intrinsic"), "{}", stdout);
    assert!(stdout.contains("main"), "{}", stdout);
}

#[test]
fn malformed_input_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ \"name\": 3 }").unwrap();

    let output = Command::cargo_bin("glint").unwrap().arg("lower").arg(&input).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed source shader"), "{}", stderr);
}

#[test]
fn missing_file_fails() {
    let output = Command::cargo_bin("glint")
        .unwrap()
        .args(["lower", "definitely-not-here.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

#[test]
fn instruction_cap_fails_the_run() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.json");
    fs::write(&input, sample_json()).unwrap();

    let output = Command::cargo_bin("glint")
        .unwrap()
        .args(["lower", "--max-instructions", "0"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("out of memory while growing instructions"), "{}", stderr);
}
