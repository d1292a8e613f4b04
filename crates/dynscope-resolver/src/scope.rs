//! Scope Chain - lexical blocks and their local variables.
//!
//! A `ScopeChain` lives for the compilation of one function or member body.
//! Blocks are stored in an arena and linked to their parent; `current` is the
//! block enclosing the expression being compiled. Lookups walk from the
//! current block outward.
//!
//! Locals start out *pending*: the front end pre-declares every local of a
//! block when it enters it, then marks each one declared when it reaches the
//! declaration statement. A reference that finds a pending local is a use
//! before the declaration.

use crate::types::TypeRef;
use dynscope_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use dynscope_common::{Diagnostic, Span, diagnostic_codes};
use rustc_hash::FxHashMap;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const NONE: BlockId = BlockId(u32::MAX);
    /// The function body block created with every chain.
    pub const TOP: BlockId = BlockId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == BlockId::NONE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

/// A local variable descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalVariable {
    pub name: String,
    /// `None` until the declaration (or inference) supplies a type.
    pub declared_type: Option<TypeRef>,
    /// False while the lexical position is before the declaration.
    pub is_declared: bool,
    pub span: Span,
    pub block: BlockId,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub id: BlockId,
    pub parent: BlockId,
    locals: FxHashMap<String, LocalId>,
}

impl Block {
    pub fn get(&self, name: &str) -> Option<LocalId> {
        self.locals.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

/// A local found by walking the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalHit {
    pub id: LocalId,
    pub block: BlockId,
    /// 0 for the current block, 1 for its parent, ...
    pub depth: u32,
}

impl LocalHit {
    #[inline]
    pub fn is_immediate(&self) -> bool {
        self.depth == 0
    }
}

/// Nested lexical blocks of one member body.
#[derive(Clone, Debug)]
pub struct ScopeChain {
    file_name: String,
    blocks: Vec<Block>,
    locals: Vec<LocalVariable>,
    current: BlockId,
}

impl ScopeChain {
    /// Create a chain holding only the top (function body) block.
    pub fn new(file_name: impl Into<String>) -> Self {
        ScopeChain {
            file_name: file_name.into(),
            blocks: vec![Block {
                id: BlockId::TOP,
                parent: BlockId::NONE,
                locals: FxHashMap::default(),
            }],
            locals: Vec::new(),
            current: BlockId::TOP,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn current(&self) -> BlockId {
        self.current
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn local(&self, id: LocalId) -> Option<&LocalVariable> {
        self.locals.get(id.0 as usize)
    }

    /// Open a child block of the current block and make it current.
    pub fn enter_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            id,
            parent: self.current,
            locals: FxHashMap::default(),
        });
        self.current = id;
        id
    }

    /// Return to the parent block. The top block is never exited.
    pub fn exit_block(&mut self) -> BlockId {
        if let Some(block) = self.block(self.current) {
            if !block.parent.is_none() {
                self.current = block.parent;
            }
        }
        self.current
    }

    /// Reposition the cursor, e.g. when revisiting a body after binding.
    pub fn set_current(&mut self, id: BlockId) {
        if self.block(id).is_some() {
            self.current = id;
        }
    }

    /// Pre-declare a local in the current block (pending until `mark_declared`).
    ///
    /// A second declaration of the same spelling in the same block is an
    /// error; shadowing an outer block's local is allowed.
    pub fn declare_local(
        &mut self,
        name: &str,
        declared_type: Option<TypeRef>,
        span: Span,
    ) -> Result<LocalId, Diagnostic> {
        let block_idx = self.current.0 as usize;
        if let Some(existing) = self.blocks[block_idx].get(name) {
            let mut diag = Diagnostic::from_code(
                &self.file_name,
                span,
                diagnostic_codes::LOCAL_VARIABLE_ALREADY_DEFINED_IN_SCOPE,
                &[name],
            );
            if let Some(prev) = self.local(existing) {
                diag = diag.with_related(
                    self.file_name.clone(),
                    prev.span,
                    format!("`{name}' is declared here"),
                );
            }
            return Err(diag);
        }
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalVariable {
            name: name.to_string(),
            declared_type,
            is_declared: false,
            span,
            block: self.current,
        });
        self.blocks[block_idx].locals.insert(name.to_string(), id);
        trace!(name, local = id.0, block = self.current.0, "declare_local");
        Ok(id)
    }

    /// Declare a local and immediately mark it declared.
    pub fn define_local(
        &mut self,
        name: &str,
        declared_type: Option<TypeRef>,
        span: Span,
    ) -> Result<LocalId, Diagnostic> {
        let id = self.declare_local(name, declared_type, span)?;
        self.mark_declared(id);
        Ok(id)
    }

    pub fn mark_declared(&mut self, id: LocalId) {
        if let Some(local) = self.locals.get_mut(id.0 as usize) {
            local.is_declared = true;
        }
    }

    /// Record an inferred type for a local declared without one.
    pub fn set_local_type(&mut self, id: LocalId, ty: TypeRef) {
        if let Some(local) = self.locals.get_mut(id.0 as usize) {
            local.declared_type = Some(ty);
        }
    }

    /// Block ids from the current block out to the top block.
    pub fn chain(&self) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut current = self.current;
        while !current.is_none() {
            if chain.len() as u32 >= MAX_SCOPE_WALK_ITERATIONS {
                break;
            }
            let Some(block) = self.block(current) else {
                break;
            };
            chain.push(current);
            current = block.parent;
        }
        chain
    }

    /// Innermost local named `name` on the chain, declared or pending.
    pub fn lookup(&self, name: &str) -> Option<LocalHit> {
        self.chain()
            .into_iter()
            .enumerate()
            .find_map(|(depth, block_id)| {
                let id = self.block(block_id)?.get(name)?;
                Some(LocalHit {
                    id,
                    block: block_id,
                    depth: depth as u32,
                })
            })
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
