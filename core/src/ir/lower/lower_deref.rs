//! file: core/src/ir/lower/lower_deref.rs
//! description: source dereferences to target deref chains.
//!
//! A chain is built root first. Constant array indices become direct
//! links; any other index expression is evaluated into the current region
//! before the link that consumes it is attached.

use crate::ast::{ConstantLit, Deref, Rvalue};
use crate::error::LowerError;
use crate::ice;
use crate::ir::deref::{ArrayIndex, DerefChain, DerefKind};
use crate::ir::shader::{StorageClass, Variable};

use super::Lowerer;
use super::function_builder::FunctionBuilder;

impl Lowerer<'_> {
    pub(crate) fn build_deref(&mut self, b: &mut FunctionBuilder, deref: &Deref) -> Result<DerefChain, LowerError> {
        match deref {
            Deref::Variable { var, ty } => {
                let target = self.ctx.variable(self.src, *var);
                self.shader.derefs.root(target, ty.clone())
            }
            Deref::Record { record, field, ty } => {
                let mut chain = self.build_deref(b, record)?;
                self.shader.derefs.append(&mut chain, DerefKind::Struct { index: *field }, ty.clone())?;
                Ok(chain)
            }
            Deref::Array { array, index, ty } => {
                let mut chain = self.build_deref(b, array)?;
                let index = match index.as_constant() {
                    Some(lit) => match lit.as_u32() {
                        Some(i) => ArrayIndex::Direct(i),
                        None => ice!("array index literal of type {} is not an integer", lit.ty),
                    },
                    None => ArrayIndex::Indirect(self.evaluate_rvalue(b, index)?),
                };
                self.shader.derefs.append(&mut chain, DerefKind::Array(index), ty.clone())?;
                Ok(chain)
            }
        }
    }

    /// Chain naming the storage an rvalue reads from. Constants are spilled
    /// into a read-only local first.
    pub(crate) fn rvalue_location(&mut self, b: &mut FunctionBuilder, rvalue: &Rvalue) -> Result<DerefChain, LowerError> {
        match rvalue {
            Rvalue::Deref(d) => self.build_deref(b, d),
            Rvalue::Constant(lit) => self.constant_location(lit),
            other => ice!("{} value of type {} has no storage location", discriminant_name(other), other.ty()),
        }
    }

    fn constant_location(&mut self, lit: &ConstantLit) -> Result<DerefChain, LowerError> {
        let func = match self.ctx.current_function() {
            Some(f) => f,
            None => ice!("constant of type {} used outside a function body", lit.ty),
        };
        let mut var = Variable::new("const_temp", lit.ty.clone(), StorageClass::Local);
        var.read_only = true;
        var.constant_initializer = Some(super::constant_copy(lit, self.ctx.native_integers()));
        let vid = self.shader.add_variable(var, Some(func))?;
        self.shader.derefs.root(vid, lit.ty.clone())
    }
}

fn discriminant_name(rvalue: &Rvalue) -> &'static str {
    match rvalue {
        Rvalue::Expression(_) => "expression",
        Rvalue::Swizzle(_) => "swizzle",
        Rvalue::Texture(_) => "texture",
        Rvalue::Constant(_) => "constant",
        Rvalue::Deref(_) => "deref",
    }
}
