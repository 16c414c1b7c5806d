//! Chain discovery over the parent/child links of a block snapshot.
//!
//! Blocks reference each other only by id, so every walk goes through an
//! id lookup and a visited set. Broken links (dangling ids, cycles) end a
//! chain early instead of failing.

use blockjr_core::{Block, BlockId, BlockType};
use std::collections::{HashMap, HashSet};

/// Walks chains in a block snapshot.
pub struct ChainWalker<'a> {
    blocks: &'a [Block],
    by_id: HashMap<&'a BlockId, &'a Block>,
}

impl<'a> ChainWalker<'a> {
    pub fn new(blocks: &'a [Block]) -> Self {
        let by_id = blocks.iter().map(|b| (&b.id, b)).collect();
        Self { blocks, by_id }
    }

    pub fn get(&self, id: &BlockId) -> Option<&'a Block> {
        self.by_id.get(id).copied()
    }

    /// Follow child links from `start`, skipping anything already in `visited`.
    fn walk(&self, start: &'a Block, visited: &mut HashSet<&'a BlockId>) -> Vec<&'a Block> {
        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(block) = current {
            if !visited.insert(&block.id) {
                break;
            }
            chain.push(block);
            current = block.child_id.as_ref().and_then(|c| self.get(c));
        }
        chain
    }

    /// Every block exactly once, grouped into chains.
    ///
    /// Chains rooted at head blocks come first, in snapshot order; blocks
    /// that no head reaches (orphaned sub-chains, cycles) follow, also in
    /// snapshot order.
    pub fn execution_chains(&self) -> Vec<Vec<&'a Block>> {
        let mut visited = HashSet::new();
        let mut chains = Vec::new();

        for block in self.blocks.iter().filter(|b| b.is_head()) {
            if !visited.contains(&block.id) {
                chains.push(self.walk(block, &mut visited));
            }
        }

        for block in self.blocks {
            if !visited.contains(&block.id) {
                chains.push(self.walk(block, &mut visited));
            }
        }

        chains
    }

    /// The chains a validator looks at.
    ///
    /// One chain per head block. When no block is a head, every block is
    /// tried as a chain start. Each chain has its own cycle guard, so a
    /// block may appear in more than one chain.
    pub fn validation_chains(&self) -> Vec<Vec<&'a Block>> {
        let heads: Vec<&'a Block> = self.blocks.iter().filter(|b| b.is_head()).collect();
        let starts: Vec<&'a Block> = if heads.is_empty() {
            self.blocks.iter().collect()
        } else {
            heads
        };

        starts
            .into_iter()
            .map(|start| self.walk(start, &mut HashSet::new()))
            .collect()
    }

    /// The chain starting at `id`.
    pub fn chain_from(&self, id: &BlockId) -> Vec<&'a Block> {
        match self.get(id) {
            Some(start) => self.walk(start, &mut HashSet::new()),
            None => Vec::new(),
        }
    }

    /// The program attached below a green flag: its child and everything after.
    pub fn program_after_flag(&self, flag: &BlockId) -> Vec<&'a Block> {
        let Some(flag) = self.get(flag) else {
            return Vec::new();
        };
        if flag.block_type != BlockType::GreenFlag {
            return Vec::new();
        }
        match &flag.child_id {
            // The flag is pre-visited so a link back to it ends the program.
            Some(child) => match self.get(child) {
                Some(start) => self.walk(start, &mut HashSet::from([&flag.id])),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }
}

/// Execution chains for `blocks`; see [`ChainWalker::execution_chains`].
pub fn execution_chains(blocks: &[Block]) -> Vec<Vec<&Block>> {
    ChainWalker::new(blocks).execution_chains()
}

/// All chains flattened into a single execution order.
pub fn linearize(blocks: &[Block]) -> Vec<&Block> {
    execution_chains(blocks).into_iter().flatten().collect()
}

/// Validation chains for `blocks`; see [`ChainWalker::validation_chains`].
pub fn validation_chains(blocks: &[Block]) -> Vec<Vec<&Block>> {
    ChainWalker::new(blocks).validation_chains()
}

/// The program below the green flag `flag`; see [`ChainWalker::program_after_flag`].
pub fn program_after_flag<'a>(blocks: &'a [Block], flag: &BlockId) -> Vec<&'a Block> {
    ChainWalker::new(blocks).program_after_flag(flag)
}
