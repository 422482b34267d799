//! file: core/src/ir/lower/lowering_context.rs
//! description: symbol table and cached target flags used during lowering.
//!
//! `LoweringContext` maps source variable and signature handles to the
//! target handles minted for them. Source handles are dense indices, so
//! each map is a plain vector. A lookup that finds nothing is an internal
//! error: the signature pre-pass registers every callable before any body
//! is lowered, and every variable is declared before it is referenced.

use log::trace;

use crate::ast::{SignatureId, SourceShader, SourceVarId};
use crate::ice;
use crate::ir::shader::{FuncId, VarId};
use crate::location;

use super::Capabilities;

#[derive(Debug, Clone)]
pub struct LoweringContext {
    variables: Vec<Option<VarId>>,
    functions: Vec<Option<FuncId>>,
    /// Resolved once per shader from the capability descriptor.
    native_integers: bool,
    /// Function whose body is being lowered; `None` at global scope.
    current: Option<FuncId>,
}

impl LoweringContext {
    pub fn new(source: &SourceShader, caps: &Capabilities) -> Self {
        LoweringContext {
            variables: vec![None; source.variables.len()],
            functions: vec![None; source.signatures.len()],
            native_integers: caps.native_integers,
            current: None,
        }
    }

    pub fn native_integers(&self) -> bool {
        self.native_integers
    }

    pub fn bind_variable(&mut self, id: SourceVarId, var: VarId) {
        match self.variables.get_mut(id.0 as usize) {
            Some(slot) => *slot = Some(var),
            None => ice!("source variable #{} is out of range", id.0),
        }
        trace!("bound source variable #{} -> var #{}", id.0, var.0);
    }

    /// Target variable for `id`. Fatal when `id` was never declared.
    pub fn variable(&self, source: &SourceShader, id: SourceVarId) -> VarId {
        match self.variables.get(id.0 as usize).copied().flatten() {
            Some(v) => v,
            None => {
                let decl = source.variable(id);
                ice!(
                    "variable `{}` ({}) is referenced before its declaration was lowered",
                    decl.name,
                    location::describe(decl.decl_site.as_ref())
                )
            }
        }
    }

    pub fn bind_function(&mut self, sig: SignatureId, func: FuncId) {
        match self.functions.get_mut(sig.0 as usize) {
            Some(slot) => *slot = Some(func),
            None => ice!("signature #{} is out of range", sig.0),
        }
    }

    /// Target function for `sig`. Fatal when the pre-pass skipped it.
    pub fn function(&self, source: &SourceShader, sig: SignatureId) -> FuncId {
        match self.functions.get(sig.0 as usize).copied().flatten() {
            Some(f) => f,
            None => {
                let s = source.signature(sig);
                ice!(
                    "signature of `{}` ({}) has no registered function",
                    s.function_name,
                    location::describe(s.decl_site.as_ref())
                )
            }
        }
    }

    pub fn enter_function(&mut self, func: FuncId) {
        if let Some(outer) = self.current {
            ice!("function #{} entered while lowering function #{}", func.0, outer.0);
        }
        self.current = Some(func);
    }

    pub fn leave_function(&mut self) {
        self.current = None;
    }

    pub fn current_function(&self) -> Option<FuncId> {
        self.current
    }
}
