//! file: core/src/ast/node.rs
//! description: the source IR tree handed over by the front-end.
//!
//! The tree is immutable to lowering. Variables and function signatures
//! are addressed by integer handles into the owning `SourceShader`, so the
//! lowering pass can key its symbol table by index.

use serde::{Deserialize, Serialize};

use super::kind::{Builtin, ExprOp, Interpolation, IntrinsicId, LoopJump, TextureOp, VarMode};
use crate::location::Location;
use crate::stage::{Stage, StageLayout};
use crate::types::{BaseType, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceVarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceShader {
    pub name: String,
    pub layout: StageLayout,
    pub variables: Vec<VarDecl>,
    pub signatures: Vec<Signature>,
    /// Top-level instruction list: global declarations and functions.
    pub instructions: Vec<Node>,
}

impl SourceShader {
    pub fn new(name: impl Into<String>, layout: StageLayout) -> Self {
        SourceShader {
            name: name.into(),
            layout,
            variables: Vec::new(),
            signatures: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.layout.stage()
    }

    pub fn variable(&self, id: SourceVarId) -> &VarDecl {
        match self.variables.get(id.0 as usize) {
            Some(v) => v,
            None => crate::ice!("source variable #{} is out of range", id.0),
        }
    }

    pub fn signature(&self, id: SignatureId) -> &Signature {
        match self.signatures.get(id.0 as usize) {
            Some(s) => s,
            None => crate::ice!("signature #{} is out of range", id.0),
        }
    }

    pub fn add_variable(&mut self, decl: VarDecl) -> SourceVarId {
        self.variables.push(decl);
        SourceVarId(self.variables.len() as u32 - 1)
    }

    pub fn add_signature(&mut self, sig: Signature) -> SignatureId {
        self.signatures.push(sig);
        SignatureId(self.signatures.len() as u32 - 1)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub mode: VarMode,
    /// Explicit `layout(location = N)`.
    #[serde(default)]
    pub location: Option<i32>,
    #[serde(default)]
    pub binding: Option<u32>,
    #[serde(default)]
    pub interpolation: Option<Interpolation>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub constant_initializer: Option<ConstantLit>,
    #[serde(default)]
    pub builtin: Option<Builtin>,
    /// Set for the instance variable of a uniform or buffer block.
    #[serde(default)]
    pub interface_block: Option<String>,
    #[serde(default)]
    pub decl_site: Option<Location>,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: Type, mode: VarMode) -> Self {
        VarDecl {
            name: name.into(),
            ty,
            mode,
            location: None,
            binding: None,
            interpolation: None,
            read_only: false,
            constant_initializer: None,
            builtin: None,
            interface_block: None,
            decl_site: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub function_name: String,
    pub return_type: Type,
    pub parameters: Vec<SourceVarId>,
    pub body: Vec<Node>,
    pub is_defined: bool,
    /// Present on compiler-internal pseudo-calls.
    #[serde(default)]
    pub intrinsic: Option<IntrinsicId>,
    #[serde(default)]
    pub decl_site: Option<Location>,
}

impl Signature {
    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic.is_some()
    }
}

/// A statement-level instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Variable(SourceVarId),
    Function {
        name: String,
        signatures: Vec<SignatureId>,
    },
    Loop {
        body: Vec<Node>,
    },
    If {
        condition: Rvalue,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    Discard {
        condition: Option<Rvalue>,
    },
    LoopJump(LoopJump),
    Return {
        value: Option<Rvalue>,
    },
    Call(Call),
    Assignment {
        lhs: Deref,
        rhs: Rvalue,
        write_mask: u8,
        condition: Option<Rvalue>,
    },
    EmitVertex {
        stream: Rvalue,
    },
    EndPrimitive {
        stream: Rvalue,
    },
    Barrier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: SignatureId,
    pub actual_parameters: Vec<Rvalue>,
    pub return_deref: Option<Deref>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rvalue {
    Expression(Box<Expression>),
    Swizzle(Box<Swizzle>),
    Texture(Box<Texture>),
    Constant(ConstantLit),
    Deref(Deref),
}

impl Rvalue {
    pub fn ty(&self) -> Type {
        match self {
            Rvalue::Expression(e) => e.ty.clone(),
            Rvalue::Swizzle(s) => {
                let base = s.val.ty().base_type().unwrap_or(BaseType::Float);
                Type::vector(base, s.num_components)
            }
            Rvalue::Texture(t) => t.ty.clone(),
            Rvalue::Constant(c) => c.ty.clone(),
            Rvalue::Deref(d) => d.ty().clone(),
        }
    }

    pub fn as_deref(&self) -> Option<&Deref> {
        match self {
            Rvalue::Deref(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&ConstantLit> {
        match self {
            Rvalue::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn var(var: SourceVarId, ty: Type) -> Self {
        Rvalue::Deref(Deref::Variable { var, ty })
    }

    pub fn expr(op: ExprOp, ty: Type, operands: Vec<Rvalue>) -> Self {
        Rvalue::Expression(Box::new(Expression { op, ty, operands }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub op: ExprOp,
    pub ty: Type,
    pub operands: Vec<Rvalue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swizzle {
    pub val: Rvalue,
    pub components: [u8; 4],
    pub num_components: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LodInfo {
    None,
    Bias(Rvalue),
    Lod(Rvalue),
    Grad { dpdx: Rvalue, dpdy: Rvalue },
    SampleIndex(Rvalue),
    /// Gather component; must be a constant.
    Component(Rvalue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub op: TextureOp,
    pub ty: Type,
    pub sampler: Deref,
    pub coordinate: Option<Rvalue>,
    pub projector: Option<Rvalue>,
    pub shadow_comparator: Option<Rvalue>,
    pub offset: Option<Rvalue>,
    pub lod_info: LodInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Deref {
    Variable {
        var: SourceVarId,
        ty: Type,
    },
    Record {
        record: Box<Deref>,
        field: u32,
        ty: Type,
    },
    Array {
        array: Box<Deref>,
        index: Box<Rvalue>,
        ty: Type,
    },
}

impl Deref {
    pub fn ty(&self) -> &Type {
        match self {
            Deref::Variable { ty, .. } | Deref::Record { ty, .. } | Deref::Array { ty, .. } => ty,
        }
    }

    pub fn field(self, field: u32, ty: Type) -> Self {
        Deref::Record { record: Box::new(self), field, ty }
    }

    pub fn index(self, index: Rvalue, ty: Type) -> Self {
        Deref::Array { array: Box::new(self), index: Box::new(index), ty }
    }
}

/// One literal component, typed as the front-end folded it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    /// Raw IEEE half bits.
    F16(u16),
    F32(f32),
    F64(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Column-major components of a scalar, vector or matrix.
    Components(Vec<Scalar>),
    /// Array elements or struct fields, in order.
    Aggregate(Vec<ConstantLit>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantLit {
    pub ty: Type,
    pub value: Literal,
}

impl ConstantLit {
    pub fn new(ty: Type, components: Vec<Scalar>) -> Self {
        ConstantLit { ty, value: Literal::Components(components) }
    }

    pub fn aggregate(ty: Type, elements: Vec<ConstantLit>) -> Self {
        ConstantLit { ty, value: Literal::Aggregate(elements) }
    }

    pub fn uint(v: u32) -> Self {
        ConstantLit::new(Type::uint(), vec![Scalar::U32(v)])
    }

    pub fn int(v: i32) -> Self {
        ConstantLit::new(Type::int(), vec![Scalar::I32(v)])
    }

    pub fn float(v: f32) -> Self {
        ConstantLit::new(Type::float(), vec![Scalar::F32(v)])
    }

    pub fn bool(v: bool) -> Self {
        ConstantLit::new(Type::bool(), vec![Scalar::Bool(v)])
    }

    /// First component as an unsigned integer, for constant indices and
    /// compile-time immediates.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.value {
            Literal::Components(c) => match c.first()? {
                Scalar::U8(v) => Some(*v as u32),
                Scalar::I8(v) => Some(*v as u32),
                Scalar::U16(v) => Some(*v as u32),
                Scalar::I16(v) => Some(*v as u32),
                Scalar::U32(v) => Some(*v),
                Scalar::I32(v) => Some(*v as u32),
                Scalar::U64(v) => Some(*v as u32),
                Scalar::I64(v) => Some(*v as u32),
                Scalar::Bool(b) => Some(*b as u32),
                Scalar::F16(_) | Scalar::F32(_) | Scalar::F64(_) => None,
            },
            Literal::Aggregate(_) => None,
        }
    }
}
