//! Helpers for building small source shaders in tests.
#![allow(dead_code)]

use glint_core::ast::{
    Call, ConstantLit, Deref, ExprOp, IntrinsicId, Node, Rvalue, Signature, SignatureId,
    SourceShader, SourceVarId, Swizzle, VarDecl, VarMode,
};
use glint_core::ir::{FuncId, InstId, Instr, InstrKind, Shader};
use glint_core::stage::{DepthLayout, StageLayout};
use glint_core::types::Type;

pub struct ShaderBuilder {
    pub source: SourceShader,
}

impl ShaderBuilder {
    pub fn new(name: &str, layout: StageLayout) -> Self {
        ShaderBuilder { source: SourceShader::new(name, layout) }
    }

    pub fn fragment(name: &str) -> Self {
        ShaderBuilder::new(
            name,
            StageLayout::Fragment {
                early_fragment_tests: false,
                depth_layout: DepthLayout::None,
                origin_upper_left: false,
            },
        )
    }

    pub fn compute(name: &str) -> Self {
        ShaderBuilder::new(name, StageLayout::Compute { local_size: [8, 8, 1], shared_size: 0 })
    }

    /// Declare a global and emit its top-level declaration node.
    pub fn global(&mut self, name: &str, ty: Type, mode: VarMode) -> SourceVarId {
        let id = self.source.add_variable(VarDecl::new(name, ty, mode));
        self.source.instructions.push(Node::Variable(id));
        id
    }

    pub fn global_decl(&mut self, decl: VarDecl) -> SourceVarId {
        let id = self.source.add_variable(decl);
        self.source.instructions.push(Node::Variable(id));
        id
    }

    /// Declare a variable without emitting a declaration node. The caller
    /// places `Node::Variable(id)` inside a body.
    pub fn local(&mut self, name: &str, ty: Type) -> SourceVarId {
        self.source.add_variable(VarDecl::new(name, ty, VarMode::Auto))
    }

    pub fn param(&mut self, name: &str, ty: Type) -> SourceVarId {
        self.source.add_variable(VarDecl::new(name, ty, VarMode::FunctionIn))
    }

    /// Add a defined function with an empty body. Fill it with `set_body`.
    pub fn function(&mut self, name: &str, return_type: Type, parameters: Vec<SourceVarId>) -> SignatureId {
        let sig = self.source.add_signature(Signature {
            function_name: name.to_string(),
            return_type,
            parameters,
            body: Vec::new(),
            is_defined: true,
            intrinsic: None,
            decl_site: None,
        });
        self.source.instructions.push(Node::Function { name: name.to_string(), signatures: vec![sig] });
        sig
    }

    pub fn declared_only(&mut self, name: &str, return_type: Type) -> SignatureId {
        let sig = self.function(name, return_type, Vec::new());
        self.source.signatures[sig.0 as usize].is_defined = false;
        sig
    }

    pub fn intrinsic(&mut self, name: &str, id: IntrinsicId, return_type: Type) -> SignatureId {
        let sig = self.source.add_signature(Signature {
            function_name: name.to_string(),
            return_type,
            parameters: Vec::new(),
            body: Vec::new(),
            is_defined: false,
            intrinsic: Some(id),
            decl_site: None,
        });
        self.source.instructions.push(Node::Function { name: name.to_string(), signatures: vec![sig] });
        sig
    }

    pub fn set_body(&mut self, sig: SignatureId, body: Vec<Node>) {
        self.source.signatures[sig.0 as usize].body = body;
    }

    pub fn main(&mut self, body: Vec<Node>) -> SignatureId {
        let sig = self.function("main", Type::Void, Vec::new());
        self.set_body(sig, body);
        sig
    }

    pub fn ty(&self, var: SourceVarId) -> Type {
        self.source.variables[var.0 as usize].ty.clone()
    }

    pub fn deref(&self, var: SourceVarId) -> Deref {
        Deref::Variable { var, ty: self.ty(var) }
    }

    pub fn load(&self, var: SourceVarId) -> Rvalue {
        Rvalue::Deref(self.deref(var))
    }

    pub fn finish(self) -> SourceShader {
        self.source
    }
}

pub fn assign(lhs: Deref, rhs: Rvalue, write_mask: u8) -> Node {
    Node::Assignment { lhs, rhs, write_mask, condition: None }
}

pub fn binop(op: ExprOp, ty: Type, a: Rvalue, b: Rvalue) -> Rvalue {
    Rvalue::expr(op, ty, vec![a, b])
}

pub fn constant(lit: ConstantLit) -> Rvalue {
    Rvalue::Constant(lit)
}

pub fn swizzle(val: Rvalue, components: &[u8]) -> Rvalue {
    let mut c = [0u8; 4];
    c[..components.len()].copy_from_slice(components);
    Rvalue::Swizzle(Box::new(Swizzle { val, components: c, num_components: components.len() as u8 }))
}

pub fn call(callee: SignatureId, actual_parameters: Vec<Rvalue>, return_deref: Option<Deref>) -> Node {
    Node::Call(Call { callee, actual_parameters, return_deref })
}

/// Instructions of the named function in program order.
pub fn body_of<'a>(shader: &'a Shader, name: &str) -> Vec<(InstId, &'a Instr)> {
    let func: FuncId = shader
        .find_function(name)
        .unwrap_or_else(|| panic!("no function `{}` in:\n{}", name, shader));
    shader.instrs_in(func).into_iter().map(|id| (id, shader.instr(id))).collect()
}

pub fn count<'a>(instrs: &[(InstId, &'a Instr)], pred: impl Fn(&InstrKind) -> bool) -> usize {
    instrs.iter().filter(|(_, i)| pred(&i.kind)).count()
}
