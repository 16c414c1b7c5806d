//! Editable block graph.
//!
//! [`BlockGraph`] owns a snapshot of every block on the canvas and performs
//! the edits the workspace makes: inserting, linking, unlinking and removing
//! blocks. Readers (linearizer, compiler, validator) only ever see
//! `&[Block]` taken from [`BlockGraph::blocks`].

use crate::block::{Block, BlockId, DELAY_MAX, DELAY_MIN};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A set of blocks with unique ids, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: Vec<Block>,
    index: HashMap<BlockId, usize>,
}

impl BlockGraph {
    /// Build a graph from a snapshot, rejecting duplicate ids.
    pub fn new(blocks: Vec<Block>) -> Result<Self> {
        let mut graph = Self::default();
        for block in blocks {
            graph.insert(block)?;
        }
        Ok(graph)
    }

    /// Parse a `blocks.json` snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Self::new(blocks)
    }

    /// Load a `blocks.json` snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    fn position(&self, id: &BlockId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownBlock(id.to_string()))
    }

    fn reindex(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
    }

    /// Add a block to the canvas.
    pub fn insert(&mut self, block: Block) -> Result<()> {
        if self.index.contains_key(&block.id) {
            return Err(Error::DuplicateBlockId(block.id.to_string()));
        }
        self.index.insert(block.id.clone(), self.blocks.len());
        self.blocks.push(block);
        Ok(())
    }

    /// The chain starting at `id`, following child links until a missing
    /// child, a dangling reference or an already-visited block.
    pub fn chain_from(&self, id: &BlockId) -> Vec<&Block> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(id);
        while let Some(block) = current {
            if !visited.insert(&block.id) {
                break;
            }
            chain.push(block);
            current = block.child_id.as_ref().and_then(|c| self.get(c));
        }
        chain
    }

    /// Link `child`, with the chain hanging below it, directly after `parent`.
    ///
    /// The child is first unlinked from its previous parent, if any. When
    /// `parent` already has a child, the moved chain is spliced in between:
    /// `parent -> child .. tail -> old child`.
    pub fn attach(&mut self, child: &BlockId, parent: &BlockId) -> Result<()> {
        let child_pos = self.position(child)?;
        let parent_pos = self.position(parent)?;

        let moved: Vec<BlockId> = self.chain_from(child).iter().map(|b| b.id.clone()).collect();
        if moved.contains(parent) {
            return Err(Error::WouldCycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        let displaced = self.blocks[parent_pos]
            .child_id
            .clone()
            .filter(|existing| self.contains(existing) && !moved.contains(existing));

        self.detach(child)?;
        self.blocks[child_pos].parent_id = Some(parent.clone());
        self.blocks[parent_pos].child_id = Some(child.clone());

        if let (Some(displaced), Some(tail)) = (displaced, moved.last()) {
            let tail_pos = self.position(tail)?;
            let displaced_pos = self.position(&displaced)?;
            self.blocks[tail_pos].child_id = Some(displaced);
            self.blocks[displaced_pos].parent_id = Some(tail.clone());
        }
        Ok(())
    }

    /// Break the link between `id` and its parent, making `id` a chain head.
    pub fn detach(&mut self, id: &BlockId) -> Result<()> {
        let pos = self.position(id)?;
        if let Some(parent) = self.blocks[pos].parent_id.take() {
            if let Some(&parent_pos) = self.index.get(&parent) {
                if self.blocks[parent_pos].child_id.as_ref() == Some(id) {
                    self.blocks[parent_pos].child_id = None;
                }
            }
        }
        Ok(())
    }

    /// Remove `id` and everything chained after it.
    ///
    /// The former parent keeps its place; its child link is cleared only if
    /// it still points at `id`.
    pub fn remove_chain(&mut self, id: &BlockId) -> Result<Vec<Block>> {
        let pos = self.position(id)?;
        let parent = self.blocks[pos].parent_id.clone();
        let doomed: HashSet<BlockId> = self.chain_from(id).iter().map(|b| b.id.clone()).collect();

        let (removed, kept): (Vec<Block>, Vec<Block>) = std::mem::take(&mut self.blocks)
            .into_iter()
            .partition(|b| doomed.contains(&b.id));
        self.blocks = kept;
        self.reindex();

        if let Some(parent) = parent {
            if let Some(&parent_pos) = self.index.get(&parent) {
                if self.blocks[parent_pos].child_id.as_ref() == Some(id) {
                    self.blocks[parent_pos].child_id = None;
                }
            }
        }
        Ok(removed)
    }

    /// Set a delay block's value, clamped to the editor range.
    pub fn set_delay_value(&mut self, id: &BlockId, value: u32) -> Result<u32> {
        let pos = self.position(id)?;
        let block = &mut self.blocks[pos];
        if !block.block_type.is_delay() {
            return Err(Error::NotADelay(id.to_string()));
        }
        let clamped = value.clamp(DELAY_MIN, DELAY_MAX);
        block.value = Some(clamped);
        Ok(clamped)
    }

    /// Recompute every child link from the parent back-references.
    ///
    /// When two blocks claim the same parent, the later one in snapshot
    /// order becomes the child.
    pub fn normalize_links(&mut self) {
        let mut parent_to_child: HashMap<BlockId, BlockId> = HashMap::new();
        for block in &self.blocks {
            if let Some(parent) = &block.parent_id {
                parent_to_child.insert(parent.clone(), block.id.clone());
            }
        }
        for block in &mut self.blocks {
            block.child_id = parent_to_child.get(&block.id).cloned();
        }
    }
}
