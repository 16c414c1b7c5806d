//! Program execution.
//!
//! Compilation and transmission are separate steps: a program is compiled
//! once, and every retry re-sends the same line.

use crate::transport::Transport;
use blockjr_compiler::{linearize, Command, CompileOptions, Compilation, Encoder, QueuedCommand};
use blockjr_core::{Block, BlockId, Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Send attempts per line before giving up.
    pub attempts: u32,
    /// Pause before retry `n` is `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
    /// How long to wait for the device's OK in stepwise mode.
    pub ack_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay_ms: 200,
            ack_timeout_ms: 8000,
        }
    }
}

impl ExecutorConfig {
    /// Pause before retry number `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt)))
    }
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// There were no blocks to run.
    Empty,
    /// Blocks compiled to zero commands, so nothing was sent.
    NoCommands,
    /// The whole program went out as one line.
    Sent { line: String, attempts: u32 },
    /// Commands went out one at a time; these blocks were acknowledged.
    Stepped { acknowledged: Vec<BlockId> },
}

/// Compiles programs and delivers them over a transport.
pub struct Executor<T: Transport> {
    transport: T,
    options: CompileOptions,
    config: ExecutorConfig,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, options: CompileOptions) -> Self {
        Self {
            transport,
            options,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Linearize a whole snapshot and send it as one line.
    pub fn run(&mut self, blocks: &[Block]) -> Result<ExecutionOutcome> {
        self.run_sequence(&linearize(blocks))
    }

    /// Send an already linearized sequence as one line.
    pub fn run_sequence(&mut self, sequence: &[&Block]) -> Result<ExecutionOutcome> {
        let line = match Encoder::new(&self.options).compile(sequence) {
            Compilation::Empty => return Ok(ExecutionOutcome::Empty),
            Compilation::Commands(line) if line.is_empty() => {
                return Ok(ExecutionOutcome::NoCommands)
            }
            Compilation::Commands(line) => line.to_string(),
        };

        self.ensure_connected()?;
        info!(command = %line, "executing program");
        let attempts = self.send_with_retry(&line)?;
        Ok(ExecutionOutcome::Sent { line, attempts })
    }

    /// Send a sequence one command at a time, waiting for an OK after each.
    ///
    /// A missing OK aborts the run.
    pub fn run_stepwise(&mut self, sequence: &[&Block]) -> Result<ExecutionOutcome> {
        if sequence.is_empty() {
            info!("execution chain is empty");
            return Ok(ExecutionOutcome::Empty);
        }
        let queue: Vec<QueuedCommand> = Encoder::new(&self.options).queue(sequence);
        if queue.is_empty() {
            return Ok(ExecutionOutcome::NoCommands);
        }

        self.ensure_connected()?;
        let timeout = Duration::from_millis(self.config.ack_timeout_ms);
        let mut acknowledged = Vec::with_capacity(queue.len());

        for item in queue {
            let line = item.command.to_string();
            debug!(block = %item.block_id, command = %line, "sending step");
            self.send_with_retry(&line)?;
            self.transport.await_ok(timeout)?;
            acknowledged.push(item.block_id);
        }

        Ok(ExecutionOutcome::Stepped { acknowledged })
    }

    /// Send the immediate stop signal, bypassing compilation.
    pub fn stop(&mut self) -> Result<()> {
        let line = Command::stop().to_string();
        info!("sending stop");
        self.send_with_retry(&line).map(|_| ())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.transport.is_connected() {
            Ok(())
        } else {
            warn!("not connected to a device; command not sent");
            Err(Error::NotConnected)
        }
    }

    /// Returns the number of attempts used.
    fn send_with_retry(&mut self, line: &str) -> Result<u32> {
        let attempts = self.config.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.transport.send(line) {
                Ok(()) => return Ok(attempt),
                Err(err) if attempt < attempts => {
                    warn!(attempt, error = %err, "send failed, retrying");
                    std::thread::sleep(self.config.backoff(attempt));
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
