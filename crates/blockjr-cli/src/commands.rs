//! Command implementations for the BlockJr CLI.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use blockjr_compiler::{
    build_command_queue, compile, execution_chains, linearize, program_after_flag,
    CompileOptions, Compilation, MatchMode, NamingScheme, Scale, Validator,
};
use blockjr_core::{Block, BlockGraph, BlockId};
use blockjr_runtime::{ExecutionOutcome, Executor, WriterTransport};
use itertools::Itertools;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Compile-time flags shared by `compile`, `queue` and `run`.
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    pub naming: Option<NamingScheme>,
    pub unit: Option<String>,
    pub scale: Option<f64>,
}

fn load_blocks(path: &Path) -> Result<Vec<Block>> {
    let graph = BlockGraph::load(path)
        .with_context(|| format!("Failed to load blocks from {}", path.display()))?;
    Ok(graph.into_blocks())
}

fn compile_options(config: &Config, args: &CompileArgs) -> Result<CompileOptions> {
    Ok(CompileOptions::new(
        config.naming(args.naming),
        config.scale(args.unit.as_deref(), args.scale)?,
    ))
}

/// Order command: print each execution chain on its own line.
pub fn order(path: &Path, out: &mut impl Write) -> Result<()> {
    let blocks = load_blocks(path)?;
    for chain in execution_chains(&blocks) {
        let line = chain
            .iter()
            .map(|b| format!("{}:{}", b.id, b.block_type))
            .join(" -> ");
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Compile command: print the command line for the whole snapshot.
pub fn compile_file(
    config: &Config,
    path: &Path,
    args: &CompileArgs,
    out: &mut impl Write,
) -> Result<()> {
    let blocks = load_blocks(path)?;
    let options = compile_options(config, args)?;
    match compile(&linearize(&blocks), &options) {
        Compilation::Empty => writeln!(out, "execution chain is empty")?,
        Compilation::Commands(line) => writeln!(out, "{}", line)?,
    }
    Ok(())
}

/// Queue command: print `block-id<TAB>command` per queued command.
pub fn queue(config: &Config, path: &Path, args: &CompileArgs, out: &mut impl Write) -> Result<()> {
    let blocks = load_blocks(path)?;
    let options = compile_options(config, args)?;
    for item in build_command_queue(&linearize(&blocks), &options) {
        writeln!(out, "{}\t{}", item.block_id, item.command)?;
    }
    Ok(())
}

/// Validate command: returns whether the chapter's rules are satisfied.
pub fn validate(
    config: &Config,
    path: &Path,
    chapter: &str,
    rules: Option<&Path>,
    mode: Option<MatchMode>,
    out: &mut impl Write,
) -> Result<bool> {
    let blocks = load_blocks(path)?;
    let validator = Validator::new(&config.rule_book(rules)?);
    if !validator.has_chapter(chapter) {
        warn!(chapter, "no rules for chapter");
    }

    let passed = match mode.unwrap_or(config.validation.mode) {
        MatchMode::Subsequence => validator.validate_subsequence(&blocks, chapter),
        MatchMode::Exact => {
            validator.validate_exact(&blocks, chapter, config.validation.block_types.as_deref())
        }
    };
    writeln!(out, "{}", if passed { "pass" } else { "fail" })?;
    Ok(passed)
}

/// Chapters command: list chapter keys with their pattern counts.
pub fn chapters(config: &Config, rules: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let book = config.rule_book(rules)?;
    for (chapter, patterns) in book.chapters() {
        writeln!(out, "{}\t{} pattern(s)", chapter, patterns.len())?;
    }
    Ok(())
}

/// Run command: execute over a writer transport. Status goes to stderr,
/// commands to `link`.
pub fn run<W: Write>(
    config: &Config,
    path: &Path,
    args: &CompileArgs,
    stepwise: bool,
    flag: Option<&str>,
    link: W,
) -> Result<ExecutionOutcome> {
    let blocks = load_blocks(path)?;
    let options = compile_options(config, args)?;
    let sequence = match flag {
        Some(flag) => {
            let flag = BlockId::from(flag);
            let sequence = program_after_flag(&blocks, &flag);
            if sequence.is_empty() && !blocks.iter().any(|b| b.id == flag) {
                return Err(anyhow!("Unknown block '{}'", flag));
            }
            sequence
        }
        None => linearize(&blocks),
    };

    let mut executor =
        Executor::new(WriterTransport::new(link), options).with_config(config.executor());
    let outcome = if stepwise || config.transport.stepwise {
        executor.run_stepwise(&sequence)?
    } else {
        executor.run_sequence(&sequence)?
    };

    match &outcome {
        ExecutionOutcome::Empty => eprintln!("execution chain is empty"),
        ExecutionOutcome::NoCommands => eprintln!("program produced no commands"),
        ExecutionOutcome::Sent { attempts, .. } => info!(attempts, "program sent"),
        ExecutionOutcome::Stepped { acknowledged } => {
            info!(steps = acknowledged.len(), "program stepped")
        }
    }
    Ok(outcome)
}

/// Stop command: send the stop signal.
pub fn stop<W: Write>(config: &Config, link: W) -> Result<()> {
    let options = CompileOptions::new(config.naming(None), Scale::IDENTITY);
    let mut executor =
        Executor::new(WriterTransport::new(link), options).with_config(config.executor());
    executor.stop()?;
    Ok(())
}
