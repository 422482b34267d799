//! file: core/src/ir/lower/lower_stmt.rs
//! description: statement nodes and function bodies.
//!
//! Every statement is lowered into the region of the builder it is handed.
//! Loops and conditionals open fresh builders for their bodies and attach
//! the finished regions to the enclosing one.

use log::debug;

use crate::ast::{Deref, LoopJump, Node, Rvalue, SignatureId};
use crate::error::{LowerError, try_push};
use crate::ice;
use crate::ir::deref::DerefId;
use crate::ir::op::{IntrinsicOp, JumpKind};
use crate::ir::shader::{FunctionImpl, Indices, InstrKind, StorageClass, Src, Variable};

use super::Lowerer;
use super::function_builder::FunctionBuilder;
use super::lower_call::full_mask;

/// Short name of a node kind for diagnostics.
pub(crate) fn node_name(node: &Node) -> &'static str {
    match node {
        Node::Variable(_) => "variable declaration",
        Node::Function { .. } => "function",
        Node::Loop { .. } => "loop",
        Node::If { .. } => "if",
        Node::Discard { .. } => "discard",
        Node::LoopJump(_) => "loop jump",
        Node::Return { .. } => "return",
        Node::Call(_) => "call",
        Node::Assignment { .. } => "assignment",
        Node::EmitVertex { .. } => "emit-vertex",
        Node::EndPrimitive { .. } => "end-primitive",
        Node::Barrier => "barrier",
    }
}

impl Lowerer<'_> {
    /// Lower the body of a defined signature into its registered function.
    pub(crate) fn lower_signature(&mut self, sig_id: SignatureId) -> Result<(), LowerError> {
        let src = self.src;
        let sig = src.signature(sig_id);
        if sig.is_intrinsic() {
            return Ok(());
        }
        let func = self.ctx.function(src, sig_id);
        if !sig.is_defined {
            debug!("`{}` is declared only", sig.function_name);
            return Ok(());
        }

        self.shader.function_mut(func).impl_ = Some(FunctionImpl::default());
        self.ctx.enter_function(func);

        for &param in &sig.parameters {
            let var = self.lower_variable(param)?;
            if self.shader.variable(var).class != StorageClass::Param {
                ice!("parameter `{}` of `{}` is not a function parameter", src.variable(param).name, sig.function_name);
            }
            try_push(&mut self.shader.function_impl_mut(func).params, var, "function params")?;
        }
        if !sig.return_type.is_void() {
            let ret = Variable::new("return_var", sig.return_type.clone(), StorageClass::Local);
            let ret = self.shader.add_variable(ret, Some(func))?;
            self.shader.function_impl_mut(func).return_var = Some(ret);
        }

        let mut body = FunctionBuilder::new();
        self.lower_body(&mut body, &sig.body).map_err(|e| match &sig.decl_site {
            Some(site) => e.with_location(site.clone()),
            None => e,
        })?;
        debug!("lowered `{}`: {} top-level nodes", sig.function_name, body.len());
        self.shader.function_impl_mut(func).body = body.finish();

        self.ctx.leave_function();
        Ok(())
    }

    pub(crate) fn lower_body(&mut self, b: &mut FunctionBuilder, body: &[Node]) -> Result<(), LowerError> {
        for node in body {
            self.lower_node(b, node)?;
        }
        Ok(())
    }

    fn lower_node(&mut self, b: &mut FunctionBuilder, node: &Node) -> Result<(), LowerError> {
        match node {
            Node::Variable(id) => {
                self.lower_variable(*id)?;
            }
            Node::Function { name, .. } => ice!("function `{}` defined inside another function", name),
            Node::Loop { body } => {
                let mut inner = FunctionBuilder::new();
                self.lower_body(&mut inner, body)?;
                b.push_loop(inner)?;
            }
            Node::If { condition, then_body, else_body } => {
                let condition = self.evaluate_rvalue(b, condition)?;
                let mut then_region = FunctionBuilder::new();
                self.lower_body(&mut then_region, then_body)?;
                let mut else_region = FunctionBuilder::new();
                self.lower_body(&mut else_region, else_body)?;
                b.push_if(condition, then_region, else_region)?;
            }
            Node::Discard { condition } => {
                let (op, srcs) = match condition {
                    Some(c) => (IntrinsicOp::DiscardIf, vec![Src::Ssa(self.evaluate_rvalue(b, c)?)]),
                    None => (IntrinsicOp::Discard, Vec::new()),
                };
                self.emit(b, InstrKind::Intrinsic { op, srcs, indices: Indices::default() }, None)?;
                self.shader.info.uses_discard = true;
            }
            Node::LoopJump(jump) => {
                let kind = match jump {
                    LoopJump::Break => JumpKind::Break,
                    LoopJump::Continue => JumpKind::Continue,
                };
                self.emit(b, InstrKind::Jump(kind), None)?;
            }
            Node::Return { value } => self.lower_return(b, value.as_ref())?,
            Node::Call(call) => self.lower_call(b, call)?,
            Node::Assignment { lhs, rhs, write_mask, condition } => {
                self.lower_assignment(b, lhs, rhs, *write_mask, condition.as_ref())?
            }
            Node::EmitVertex { stream } | Node::EndPrimitive { stream } => {
                let op = match node {
                    Node::EmitVertex { .. } => IntrinsicOp::EmitVertex,
                    _ => IntrinsicOp::EndPrimitive,
                };
                let stream_id = match stream.as_constant().and_then(|c| c.as_u32()) {
                    Some(s) => s,
                    None => ice!("{} stream must be a constant", node_name(node)),
                };
                let indices = Indices { stream_id: Some(stream_id), ..Indices::default() };
                self.emit(b, InstrKind::Intrinsic { op, srcs: Vec::new(), indices }, None)?;
            }
            Node::Barrier => {
                let kind = InstrKind::Intrinsic { op: IntrinsicOp::Barrier, srcs: Vec::new(), indices: Indices::default() };
                self.emit(b, kind, None)?;
            }
        }
        Ok(())
    }

    fn lower_return(&mut self, b: &mut FunctionBuilder, value: Option<&Rvalue>) -> Result<(), LowerError> {
        if let Some(value) = value {
            let func = match self.ctx.current_function() {
                Some(f) => f,
                None => ice!("return outside a function body"),
            };
            let ret = match self.shader.function(func).impl_.as_ref().and_then(|i| i.return_var) {
                Some(v) => v,
                None => ice!("`{}` returns a value but has no return variable", self.shader.function(func).name),
            };
            let ret_ty = self.shader.variable(ret).ty.clone();
            match value {
                Rvalue::Deref(_) | Rvalue::Constant(_) => {
                    let dst = self.shader.derefs.root(ret, ret_ty)?;
                    let src = self.rvalue_location(b, value)?;
                    self.emit_copy(b, dst.into_head(), src.into_head())?;
                }
                _ => {
                    let v = self.evaluate_rvalue(b, value)?;
                    let dst = self.shader.derefs.root(ret, ret_ty)?;
                    let mask = full_mask(self.shader.value(v).num_components);
                    self.emit_store(b, dst.into_head(), v, mask)?;
                }
            }
        }
        self.emit(b, InstrKind::Jump(JumpKind::Return), None)?;
        Ok(())
    }

    fn lower_assignment(
        &mut self,
        b: &mut FunctionBuilder,
        lhs: &Deref,
        rhs: &Rvalue,
        write_mask: u8,
        condition: Option<&Rvalue>,
    ) -> Result<(), LowerError> {
        let width = lhs.ty().vector_elements();
        let full = full_mask(width);
        let whole_copy = matches!(rhs, Rvalue::Deref(_) | Rvalue::Constant(_)) && (write_mask == full || write_mask == 0);

        if whole_copy {
            let dst = self.build_deref(b, lhs)?.into_head();
            let src = self.rvalue_location(b, rhs)?.into_head();
            return match condition {
                Some(c) => {
                    let c = self.evaluate_rvalue(b, c)?;
                    let mut then_region = FunctionBuilder::new();
                    self.emit_copy(&mut then_region, dst, src)?;
                    b.push_if(c, then_region, FunctionBuilder::new())
                }
                None => self.emit_copy(b, dst, src),
            };
        }

        let mask = if write_mask == 0 { full } else { write_mask };
        let dst = self.build_deref(b, lhs)?.into_head();
        let mut value = self.evaluate_rvalue(b, rhs)?;
        if mask != full {
            // Pack the rhs components into the written channels.
            let mut swizzle = [0u8; 4];
            let mut next = 0u8;
            for (i, s) in swizzle.iter_mut().enumerate().take(width as usize) {
                if mask & (1 << i) != 0 {
                    *s = next;
                    next += 1;
                }
            }
            value = self.swizzle(b, value, swizzle, width)?;
        }

        match condition {
            Some(c) => {
                let c = self.evaluate_rvalue(b, c)?;
                let mut then_region = FunctionBuilder::new();
                self.emit_store(&mut then_region, dst, value, mask)?;
                b.push_if(c, then_region, FunctionBuilder::new())
            }
            None => self.emit_store(b, dst, value, mask),
        }
    }

    fn emit_copy(
        &mut self,
        b: &mut FunctionBuilder,
        dst: DerefId,
        src: DerefId,
    ) -> Result<(), LowerError> {
        let kind = InstrKind::Intrinsic {
            op: IntrinsicOp::CopyDeref,
            srcs: vec![Src::Deref(dst), Src::Deref(src)],
            indices: Indices::default(),
        };
        self.emit(b, kind, None)?;
        Ok(())
    }
}
