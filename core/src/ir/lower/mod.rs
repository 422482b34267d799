//! file: core/src/ir/lower/mod.rs
//! description: lowering of a source shader tree into the target IR.
//!
//! Lowering runs in two passes over the top-level instruction list:
//!
//! 1. every non-intrinsic signature gets a target function, so calls can
//!    resolve callees that are defined later in the source;
//! 2. global variables are declared and each defined signature's body is
//!    lowered into its function.
//!
//! The per-node translation lives in the sibling modules; this module owns
//! the driver, the `Lowerer` state shared by them, and the final pass that
//! fills in `ShaderInfo`.

pub mod function_builder;
pub mod lower_call;
pub mod lower_const;
pub mod lower_deref;
pub mod lower_expr;
pub mod lower_stmt;
pub mod lower_texture;
pub mod lowering_context;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::ast::{Builtin, Node, SourceShader, SourceVarId, VarMode};
use crate::error::LowerError;
use crate::ice;
use crate::types::Type;

use self::function_builder::FunctionBuilder;
use self::lowering_context::LoweringContext;
use super::shader::{InstrKind, Shader, ShaderInfo, StorageClass, VarId, Variable};
use super::value::ValueId;

pub use self::lower_call::{IntrinsicRule, OpChoice, Recipe, intrinsic_rule};
pub use self::lower_const::constant_copy;
pub use self::lower_texture::expected_src_count;

/// Backend features that change which opcodes lowering may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// When false, integers and booleans are carried as 32-bit floats and
    /// every operator uses its float form.
    pub native_integers: bool,
    /// Capacity of the instruction arena. Lowering past it fails the same
    /// way a refused allocation does.
    pub max_instructions: Option<u32>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities { native_integers: true, max_instructions: None }
    }
}

/// Lower `source` into a fresh target shader.
///
/// The only recoverable failure is running out of memory while growing the
/// IR. Malformed input is an internal error and panics.
pub fn lower_shader(source: &SourceShader, caps: &Capabilities) -> Result<Shader, LowerError> {
    let mut lowerer = Lowerer::new(source, caps);
    lowerer.register_signatures()?;
    lowerer.lower_top_level()?;
    Ok(lowerer.finish())
}

pub(crate) struct Lowerer<'a> {
    pub(crate) src: &'a SourceShader,
    pub(crate) shader: Shader,
    pub(crate) ctx: LoweringContext,
}

impl<'a> Lowerer<'a> {
    fn new(src: &'a SourceShader, caps: &Capabilities) -> Self {
        let info = ShaderInfo::new(src.name.clone(), src.layout.clone());
        Lowerer {
            src,
            shader: Shader::new(info).with_instr_limit(caps.max_instructions),
            ctx: LoweringContext::new(src, caps),
        }
    }

    fn register_signatures(&mut self) -> Result<(), LowerError> {
        let src = self.src;
        for node in &src.instructions {
            let Node::Function { signatures, .. } = node else {
                continue;
            };
            for &sig_id in signatures {
                let sig = src.signature(sig_id);
                if sig.is_intrinsic() {
                    continue;
                }
                let func = self.shader.add_function(sig.function_name.clone())?;
                self.ctx.bind_function(sig_id, func);
                debug!("registered function `{}` as #{}", sig.function_name, func.0);
            }
        }
        Ok(())
    }

    fn lower_top_level(&mut self) -> Result<(), LowerError> {
        let src = self.src;
        for node in &src.instructions {
            match node {
                Node::Variable(id) => {
                    self.lower_variable(*id)?;
                }
                Node::Function { signatures, .. } => {
                    for &sig_id in signatures {
                        self.lower_signature(sig_id)?;
                    }
                }
                other => ice!("{} at global scope", lower_stmt::node_name(other)),
            }
        }
        Ok(())
    }

    /// Declare the target variable for a source declaration.
    pub(crate) fn lower_variable(&mut self, id: SourceVarId) -> Result<VarId, LowerError> {
        let src = self.src;
        let decl = src.variable(id);
        let owner = self.ctx.current_function();

        let class = match decl.mode {
            VarMode::Auto | VarMode::Temporary => match owner {
                Some(_) => StorageClass::Local,
                None => StorageClass::Global,
            },
            VarMode::ConstIn => StorageClass::Local,
            VarMode::Uniform if decl.interface_block.is_some() => StorageClass::UniformBuffer,
            VarMode::Uniform => StorageClass::Uniform,
            VarMode::ShaderStorage => StorageClass::StorageBuffer,
            VarMode::ShaderIn => StorageClass::ShaderIn,
            VarMode::ShaderOut => StorageClass::ShaderOut,
            VarMode::SystemValue => StorageClass::SystemValue,
            VarMode::Shared => StorageClass::Shared,
            VarMode::FunctionIn | VarMode::FunctionOut | VarMode::FunctionInout => StorageClass::Param,
        };

        let mut var = Variable::new(decl.name.clone(), decl.ty.clone(), class);
        var.location = decl.location;
        var.binding = decl.binding;
        var.interpolation = decl.interpolation;
        var.read_only = decl.read_only;
        var.builtin = decl.builtin;
        var.interface_block = decl.interface_block.clone();
        // Clip and cull distances are packed scalar arrays.
        var.compact = matches!(decl.builtin, Some(Builtin::ClipDistance | Builtin::CullDistance));
        var.constant_initializer = decl
            .constant_initializer
            .as_ref()
            .map(|c| constant_copy(c, self.ctx.native_integers()));

        let vid = self.shader.add_variable(var, owner)?;
        self.ctx.bind_variable(id, vid);
        trace!("declared `{}` as {:?} var #{}", decl.name, class, vid.0);
        Ok(vid)
    }

    /// Emit one instruction into the region `b`.
    pub(crate) fn emit(
        &mut self,
        b: &mut FunctionBuilder,
        kind: InstrKind,
        dest: Option<(u8, u8)>,
    ) -> Result<Option<ValueId>, LowerError> {
        let (id, value) = self.shader.add_instr(kind, dest)?;
        b.push_instr(id)?;
        trace!("emit #{}: {:?}", id.0, self.shader.instr(id).kind);
        Ok(value)
    }

    /// Emit an instruction that defines a value of the given shape.
    pub(crate) fn emit_value(
        &mut self,
        b: &mut FunctionBuilder,
        kind: InstrKind,
        num_components: u8,
        bit_size: u8,
    ) -> Result<ValueId, LowerError> {
        if num_components == 0 || num_components > 4 {
            ice!("value with {} components", num_components);
        }
        match self.emit(b, kind, Some((num_components, bit_size)))? {
            Some(v) => Ok(v),
            None => ice!("instruction with a destination shape defined no value"),
        }
    }

    fn finish(mut self) -> Shader {
        self.gather_info();
        let info = &self.shader.info;
        info!(
            "lowered {} shader `{}`: {} functions, {} instructions, {} values",
            info.stage,
            info.name,
            self.shader.functions.len(),
            self.shader.instrs.len(),
            self.shader.values.len()
        );
        self.shader
    }

    fn gather_info(&mut self) {
        let shader = &mut self.shader;
        for &id in &shader.globals {
            let var = &shader.variables[id.0 as usize];
            let count = var.ty.flattened_array_length();
            let info = &mut shader.info;
            match var.ty.without_array() {
                Type::Sampler(_) => info.num_textures += count,
                Type::Image(_) => info.num_images += count,
                Type::AtomicUint => info.num_abos += count,
                _ => {}
            }
            // An array of blocks binds one buffer per element; any other
            // buffer variable is a single binding.
            let buffers = match (&var.interface_block, &var.ty) {
                (Some(_), Type::Array { .. }) => count,
                _ => 1,
            };
            match var.class {
                StorageClass::UniformBuffer => info.num_ubos += buffers,
                StorageClass::StorageBuffer => info.num_ssbos += buffers,
                _ => {}
            }
            match var.builtin {
                Some(Builtin::ClipDistance) => info.clip_distance_array_size = count,
                Some(Builtin::CullDistance) => info.cull_distance_array_size = count,
                _ => {}
            }
        }
        shader.info.entry_point = shader
            .functions
            .iter()
            .find(|f| f.name == "main" && f.impl_.is_some())
            .map(|f| f.name.clone());
    }
}
