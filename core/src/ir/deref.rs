//! file: core/src/ir/deref.rs
//! description: arena of deref-chain links.
//!
//! A chain is a variable root followed by struct/array links, each link
//! naming the type it narrows to. Links live in one arena per shader and
//! refer to their child by index, so a chain handed to an instruction is
//! just its head index and can never dangle.

use serde::{Deserialize, Serialize};

use super::shader::VarId;
use super::value::ValueId;
use crate::error::{LowerError, try_push};
use crate::ice;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DerefId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayIndex {
    /// Index known at translation time.
    Direct(u32),
    /// Index computed by an earlier instruction.
    Indirect(ValueId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerefKind {
    Var(VarId),
    Struct { index: u32 },
    Array(ArrayIndex),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerefLink {
    pub kind: DerefKind,
    pub ty: Type,
    pub child: Option<DerefId>,
}

/// A chain under construction: `head` names the whole location, `tail` is
/// where the next link is attached. Not `Clone`: a chain is consumed by
/// exactly one instruction.
#[derive(Debug, PartialEq, Eq)]
pub struct DerefChain {
    head: DerefId,
    tail: DerefId,
}

impl DerefChain {
    pub fn head(&self) -> DerefId {
        self.head
    }

    pub fn tail(&self) -> DerefId {
        self.tail
    }

    /// Hand the chain over to its consumer.
    pub fn into_head(self) -> DerefId {
        self.head
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerefArena {
    links: Vec<DerefLink>,
}

impl DerefArena {
    pub fn new() -> Self {
        DerefArena { links: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, id: DerefId) -> &DerefLink {
        match self.links.get(id.0 as usize) {
            Some(link) => link,
            None => ice!("deref link #{} is out of range", id.0),
        }
    }

    /// Start a chain rooted at `var`.
    pub fn root(&mut self, var: VarId, ty: Type) -> Result<DerefChain, LowerError> {
        let link = DerefLink { kind: DerefKind::Var(var), ty, child: None };
        let idx = try_push(&mut self.links, link, "deref links")?;
        let id = DerefId(idx as u32);
        Ok(DerefChain { head: id, tail: id })
    }

    /// Attach a link at the tail in O(1). The link type must be what the
    /// current tail narrows to.
    pub fn append(&mut self, chain: &mut DerefChain, kind: DerefKind, ty: Type) -> Result<(), LowerError> {
        let parent_ty = &self.get(chain.tail).ty;
        let expected = match kind {
            DerefKind::Var(_) => ice!("a variable link can only start a chain"),
            DerefKind::Struct { index } => parent_ty.field_type(index).cloned(),
            DerefKind::Array(_) => parent_ty.index_result(),
        };
        if expected.as_ref() != Some(&ty) {
            ice!(
                "deref link of type {} does not narrow {} (expected {:?})",
                ty,
                parent_ty,
                expected.map(|t| t.to_string())
            );
        }
        let idx = try_push(&mut self.links, DerefLink { kind, ty, child: None }, "deref links")?;
        let id = DerefId(idx as u32);
        self.links[chain.tail.0 as usize].child = Some(id);
        chain.tail = id;
        Ok(())
    }

    /// Walk a chain from `head`, root first.
    pub fn walk(&self, head: DerefId) -> DerefWalk<'_> {
        DerefWalk { arena: self, next: Some(head) }
    }

    /// Variable at the root of the chain starting at `head`.
    pub fn root_var(&self, head: DerefId) -> VarId {
        match self.get(head).kind {
            DerefKind::Var(v) => v,
            _ => ice!("deref chain #{} does not start at a variable", head.0),
        }
    }

    /// Type of the whole location named by the chain starting at `head`.
    pub fn chain_type(&self, head: DerefId) -> &Type {
        match self.walk(head).last() {
            Some((_, link)) => &link.ty,
            None => ice!("empty deref chain #{}", head.0),
        }
    }
}

pub struct DerefWalk<'a> {
    arena: &'a DerefArena,
    next: Option<DerefId>,
}

impl<'a> Iterator for DerefWalk<'a> {
    type Item = (DerefId, &'a DerefLink);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let link = self.arena.get(id);
        self.next = link.child;
        Some((id, link))
    }
}
