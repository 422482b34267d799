use crate::error::{LowerError, try_push};
use crate::ir::shader::{CfNode, InstId};
use crate::ir::value::ValueId;

/// The insertion point for one structured region.
///
/// Each region (function body, loop body, then/else arm) gets its own
/// builder. Nested regions are lowered into a fresh builder which is then
/// handed to the enclosing one, so an instruction can only ever land in
/// the region whose builder it was emitted through.
#[derive(Debug, Default)]
pub struct FunctionBuilder {
    nodes: Vec<CfNode>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        FunctionBuilder { nodes: Vec::new() }
    }

    pub fn push_instr(&mut self, id: InstId) -> Result<(), LowerError> {
        try_push(&mut self.nodes, CfNode::Instr(id), "control flow")?;
        Ok(())
    }

    pub fn push_if(
        &mut self,
        condition: ValueId,
        then_region: FunctionBuilder,
        else_region: FunctionBuilder,
    ) -> Result<(), LowerError> {
        let node = CfNode::If {
            condition,
            then_body: then_region.finish(),
            else_body: else_region.finish(),
        };
        try_push(&mut self.nodes, node, "control flow")?;
        Ok(())
    }

    pub fn push_loop(&mut self, body: FunctionBuilder) -> Result<(), LowerError> {
        try_push(&mut self.nodes, CfNode::Loop { body: body.finish() }, "control flow")?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[CfNode] {
        &self.nodes
    }

    pub fn finish(self) -> Vec<CfNode> {
        self.nodes
    }
}
