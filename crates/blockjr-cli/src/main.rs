//! CLI tool for BlockJr block programs.
//!
//! Provides commands for ordering, compiling, validating and running
//! block snapshots saved by the app.

mod commands;
mod config;

use anyhow::Result;
use blockjr_compiler::{MatchMode, NamingScheme};
use clap::{Parser, Subcommand};
use commands::CompileArgs;
use config::Config;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "blockjr")]
#[command(about = "BlockJr block program toolchain", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "blockjr.toml")]
    config: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the execution chains in run order
    Order {
        /// Block snapshot (JSON array)
        blocks: PathBuf,
    },

    /// Compile a snapshot to the device command line
    Compile {
        /// Block snapshot (JSON array)
        blocks: PathBuf,

        #[command(flatten)]
        compile: CompileFlags,
    },

    /// Print each command with the block that produced it
    Queue {
        /// Block snapshot (JSON array)
        blocks: PathBuf,

        #[command(flatten)]
        compile: CompileFlags,
    },

    /// Check a snapshot against a chapter's rules
    Validate {
        /// Block snapshot (JSON array)
        blocks: PathBuf,

        /// Chapter key, e.g. chapter-01
        #[arg(long)]
        chapter: String,

        /// Rule book file (bundled elevator rules if not specified)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Matching mode: subsequence or exact
        #[arg(long)]
        mode: Option<MatchMode>,
    },

    /// List the chapters of a rule book
    Chapters {
        /// Rule book file (bundled elevator rules if not specified)
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Execute a snapshot, writing commands to stdout
    Run {
        /// Block snapshot (JSON array)
        blocks: PathBuf,

        /// Send one command at a time, waiting for each OK
        #[arg(long)]
        stepwise: bool,

        /// Run only the program under this green-flag block
        #[arg(long)]
        flag: Option<String>,

        #[command(flatten)]
        compile: CompileFlags,
    },

    /// Send the stop signal
    Stop,
}

#[derive(clap::Args)]
struct CompileFlags {
    /// Command naming: workspace or gamepad
    #[arg(long)]
    naming: Option<NamingScheme>,

    /// Unit preset key applied to delay counts, e.g. 100m
    #[arg(long, conflicts_with = "scale")]
    unit: Option<String>,

    /// Raw multiplier applied to delay counts
    #[arg(long)]
    scale: Option<f64>,
}

impl From<CompileFlags> for CompileArgs {
    fn from(flags: CompileFlags) -> Self {
        CompileArgs {
            naming: flags.naming,
            unit: flags.unit,
            scale: flags.scale,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "blockjr=debug" } else { "blockjr=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Order { blocks } => commands::order(&blocks, &mut out)?,
        Commands::Compile { blocks, compile } => {
            commands::compile_file(&config, &blocks, &compile.into(), &mut out)?
        }
        Commands::Queue { blocks, compile } => {
            commands::queue(&config, &blocks, &compile.into(), &mut out)?
        }
        Commands::Validate {
            blocks,
            chapter,
            rules,
            mode,
        } => {
            let passed =
                commands::validate(&config, &blocks, &chapter, rules.as_deref(), mode, &mut out)?;
            if !passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Chapters { rules } => commands::chapters(&config, rules.as_deref(), &mut out)?,
        Commands::Run {
            blocks,
            stepwise,
            flag,
            compile,
        } => {
            commands::run(
                &config,
                &blocks,
                &compile.into(),
                stepwise,
                flag.as_deref(),
                &mut out,
            )?;
        }
        Commands::Stop => commands::stop(&config, &mut out)?,
    }

    Ok(ExitCode::SUCCESS)
}
