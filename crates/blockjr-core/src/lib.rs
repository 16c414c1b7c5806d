//! Core types and schemas for the BlockJr toolchain.
//!
//! This crate defines the data structures shared by the compiler, the
//! validator and the runtime: blocks and their chain links, the editable
//! block graph, the rule-book schema and the error type.

pub mod block;
pub mod error;
pub mod graph;
pub mod rules;

pub use block::{Block, BlockId, BlockType, DELAY_MAX, DELAY_MIN};
pub use error::{Error, Result};
pub use graph::BlockGraph;
pub use rules::{ChapterRules, RuleBook};
