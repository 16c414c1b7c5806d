//! Program compilation and validation for BlockJr.
//!
//! This crate handles:
//! - Discovering chains in a block snapshot and linearizing them
//! - Compiling a linearized sequence into the device command line
//! - Validating a snapshot against chapter rule books

pub mod chain;
pub mod command;
pub mod encoder;
pub mod naming;
pub mod pattern;
pub mod rulebooks;
pub mod validator;

pub use chain::{execution_chains, linearize, program_after_flag, validation_chains, ChainWalker};
pub use command::{Arg, Command, CommandLine, DELIMITER};
pub use encoder::{
    build_command_queue, compile, compile_blocks, Compilation, CompileOptions, Encoder,
    QueuedCommand, Scale,
};
pub use naming::{CommandNaming, NamingScheme};
pub use pattern::{Pattern, Token};
pub use validator::{validate_exact, validate_rules, validate_subsequence, MatchMode, Validator};
