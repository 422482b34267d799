//! file: core/src/ir/shader.rs
//! description: the target IR container and its arenas.
//!
//! `Shader` owns every instruction, SSA value, variable and deref link
//! produced by lowering. Functions hold structured control flow
//! (`CfNode`) whose leaves are instruction handles into the shader.

use serde::{Deserialize, Serialize};

use super::deref::{DerefArena, DerefId};
use super::op::{AluOp, IntrinsicOp, JumpKind, TexDestType, TexOp, TexSrcKind};
use super::value::{Constant, SsaDef, ValueId};
use crate::ast::{Builtin, Interpolation};
use crate::error::{LowerError, try_push};
use crate::ice;
use crate::stage::{Stage, StageLayout};
use crate::types::{SamplerDim, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    Global,
    Local,
    Param,
    ShaderIn,
    ShaderOut,
    Uniform,
    UniformBuffer,
    StorageBuffer,
    SystemValue,
    Shared,
}

impl StorageClass {
    /// Classes whose variables belong to a function rather than the shader.
    pub fn is_function_owned(self) -> bool {
        matches!(self, StorageClass::Local | StorageClass::Param)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub class: StorageClass,
    pub location: Option<i32>,
    pub binding: Option<u32>,
    pub interpolation: Option<Interpolation>,
    pub read_only: bool,
    /// Array of scalars packed into consecutive components of a slot.
    pub compact: bool,
    pub builtin: Option<Builtin>,
    /// Block name for uniform and storage interface blocks.
    pub interface_block: Option<String>,
    pub constant_initializer: Option<Constant>,
    /// Owning function for local and parameter variables.
    pub owner: Option<FuncId>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, class: StorageClass) -> Self {
        Variable {
            name: name.into(),
            ty,
            class,
            location: None,
            binding: None,
            interpolation: None,
            read_only: false,
            compact: false,
            builtin: None,
            interface_block: None,
            constant_initializer: None,
            owner: None,
        }
    }
}

/// Source operand of an intrinsic: either an SSA value or a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Src {
    Ssa(ValueId),
    Deref(DerefId),
}

impl Src {
    pub fn as_ssa(&self) -> Option<ValueId> {
        match self {
            Src::Ssa(v) => Some(*v),
            Src::Deref(_) => None,
        }
    }

    pub fn as_deref(&self) -> Option<DerefId> {
        match self {
            Src::Deref(d) => Some(*d),
            Src::Ssa(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AluSrc {
    pub value: ValueId,
    pub swizzle: [u8; 4],
}

impl AluSrc {
    /// Read `value` component-wise, replicating its last component when
    /// the consumer is wider.
    pub fn broadcast(value: ValueId, num_components: u8) -> Self {
        let last = num_components.saturating_sub(1);
        let mut swizzle = [0u8; 4];
        for (i, s) in swizzle.iter_mut().enumerate() {
            *s = (i as u8).min(last);
        }
        AluSrc { value, swizzle }
    }

    pub fn swizzled(value: ValueId, swizzle: [u8; 4]) -> Self {
        AluSrc { value, swizzle }
    }
}

/// Compile-time immediates attached to an intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Indices {
    pub num_components: u8,
    pub write_mask: Option<u8>,
    pub base: Option<i32>,
    pub stream_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexSrc {
    pub kind: TexSrcKind,
    pub value: ValueId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexInstr {
    pub op: TexOp,
    pub sampler_dim: SamplerDim,
    pub is_array: bool,
    pub is_shadow: bool,
    pub is_new_style_shadow: bool,
    pub dest_type: TexDestType,
    pub texture: DerefId,
    pub coord_components: u8,
    /// Gather component.
    pub component: u8,
    pub srcs: Vec<TexSrc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrKind {
    Alu {
        op: AluOp,
        srcs: Vec<AluSrc>,
    },
    Intrinsic {
        op: IntrinsicOp,
        srcs: Vec<Src>,
        indices: Indices,
    },
    Tex(TexInstr),
    Call {
        callee: FuncId,
        params: Vec<DerefId>,
        return_deref: Option<DerefId>,
    },
    Jump(JumpKind),
    Undef,
    LoadConst {
        bit_size: u8,
        bits: Vec<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instr {
    pub kind: InstrKind,
    pub dest: Option<ValueId>,
}

/// Structured control flow. Basic blocks are implied by the regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfNode {
    Instr(InstId),
    If {
        condition: ValueId,
        then_body: Vec<CfNode>,
        else_body: Vec<CfNode>,
    },
    Loop {
        body: Vec<CfNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionImpl {
    pub params: Vec<VarId>,
    pub return_var: Option<VarId>,
    pub locals: Vec<VarId>,
    pub body: Vec<CfNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Absent for functions that are only declared.
    pub impl_: Option<FunctionImpl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderInfo {
    pub name: String,
    pub stage: Stage,
    pub entry_point: Option<String>,
    pub num_textures: u32,
    pub num_images: u32,
    pub num_ubos: u32,
    pub num_ssbos: u32,
    pub num_abos: u32,
    pub clip_distance_array_size: u32,
    pub cull_distance_array_size: u32,
    pub uses_discard: bool,
    pub layout: StageLayout,
}

impl ShaderInfo {
    pub fn new(name: impl Into<String>, layout: StageLayout) -> Self {
        ShaderInfo {
            name: name.into(),
            stage: layout.stage(),
            entry_point: None,
            num_textures: 0,
            num_images: 0,
            num_ubos: 0,
            num_ssbos: 0,
            num_abos: 0,
            clip_distance_array_size: 0,
            cull_distance_array_size: 0,
            uses_discard: false,
            layout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shader {
    pub info: ShaderInfo,
    pub globals: Vec<VarId>,
    pub functions: Vec<Function>,
    pub variables: Vec<Variable>,
    pub instrs: Vec<Instr>,
    pub values: Vec<SsaDef>,
    pub derefs: DerefArena,
    #[serde(skip)]
    instr_limit: Option<u32>,
}

impl Shader {
    pub fn new(info: ShaderInfo) -> Self {
        Shader {
            info,
            globals: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            instrs: Vec::new(),
            values: Vec::new(),
            derefs: DerefArena::new(),
            instr_limit: None,
        }
    }

    pub fn with_instr_limit(mut self, limit: Option<u32>) -> Self {
        self.instr_limit = limit;
        self
    }

    pub fn add_function(&mut self, name: impl Into<String>) -> Result<FuncId, LowerError> {
        let func = Function { name: name.into(), impl_: None };
        let idx = try_push(&mut self.functions, func, "functions")?;
        Ok(FuncId(idx as u32))
    }

    /// Register a variable. Locals go to `owner`'s local list, parameters
    /// only record their owner (the caller places them in `params`), and
    /// everything else goes to the shader's globals.
    pub fn add_variable(&mut self, mut var: Variable, owner: Option<FuncId>) -> Result<VarId, LowerError> {
        let class = var.class;
        let function_owned = class.is_function_owned();
        if function_owned && owner.is_none() {
            ice!("{:?} variable `{}` declared outside a function", class, var.name);
        }
        var.owner = if function_owned { owner } else { None };
        let id = VarId(try_push(&mut self.variables, var, "variables")? as u32);
        match owner.filter(|_| function_owned) {
            Some(f) if class == StorageClass::Local => {
                let imp = self.function_impl_mut(f);
                try_push(&mut imp.locals, id, "function locals")?;
            }
            Some(_) => {}
            None => {
                try_push(&mut self.globals, id, "globals")?;
            }
        }
        Ok(id)
    }

    /// Append an instruction, minting its destination value when `dest`
    /// gives a shape (components, bit size).
    pub fn add_instr(&mut self, kind: InstrKind, dest: Option<(u8, u8)>) -> Result<(InstId, Option<ValueId>), LowerError> {
        let inst = InstId(self.instrs.len() as u32);
        if self.instr_limit.is_some_and(|limit| inst.0 >= limit) {
            return Err(LowerError::out_of_memory("instructions"));
        }
        let dest = match dest {
            Some((num_components, bit_size)) => {
                let def = SsaDef { num_components, bit_size, producer: inst };
                Some(ValueId(try_push(&mut self.values, def, "SSA values")? as u32))
            }
            None => None,
        };
        try_push(&mut self.instrs, Instr { kind, dest }, "instructions")?;
        Ok((inst, dest))
    }

    pub fn function(&self, id: FuncId) -> &Function {
        match self.functions.get(id.0 as usize) {
            Some(f) => f,
            None => ice!("function #{} is out of range", id.0),
        }
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        match self.functions.get_mut(id.0 as usize) {
            Some(f) => f,
            None => ice!("function #{} is out of range", id.0),
        }
    }

    pub fn function_impl_mut(&mut self, id: FuncId) -> &mut FunctionImpl {
        match self.function_mut(id).impl_.as_mut() {
            Some(imp) => imp,
            None => ice!("function #{} has no body", id.0),
        }
    }

    pub fn find_function(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FuncId(i as u32))
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        match self.variables.get(id.0 as usize) {
            Some(v) => v,
            None => ice!("variable #{} is out of range", id.0),
        }
    }

    pub fn instr(&self, id: InstId) -> &Instr {
        match self.instrs.get(id.0 as usize) {
            Some(i) => i,
            None => ice!("instruction #{} is out of range", id.0),
        }
    }

    pub fn value(&self, id: ValueId) -> &SsaDef {
        match self.values.get(id.0 as usize) {
            Some(v) => v,
            None => ice!("SSA value {} is out of range", id),
        }
    }

    /// Instruction that produced `value`.
    pub fn producer(&self, value: ValueId) -> &Instr {
        self.instr(self.value(value).producer)
    }

    /// Instructions of a function body in program order, regions flattened.
    pub fn instrs_in(&self, func: FuncId) -> Vec<InstId> {
        let mut out = Vec::new();
        if let Some(imp) = &self.function(func).impl_ {
            collect_instrs(&imp.body, &mut out);
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn collect_instrs(body: &[CfNode], out: &mut Vec<InstId>) {
    for node in body {
        match node {
            CfNode::Instr(id) => out.push(*id),
            CfNode::If { then_body, else_body, .. } => {
                collect_instrs(then_body, out);
                collect_instrs(else_body, out);
            }
            CfNode::Loop { body } => collect_instrs(body, out),
        }
    }
}
