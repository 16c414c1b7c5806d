//! Command compilation.
//!
//! Turns a linearized block sequence into device commands. Movement and
//! lamp blocks absorb the delay blocks that directly follow them; the
//! summed delay becomes their parameter. Delays that nothing absorbs are
//! either sent on their own or dropped:
//!
//! - right after a speed block, the whole delay run is dropped;
//! - at the very start of the sequence, a run of two or more is dropped;
//! - otherwise each delay is sent as `delay(n)`.
//!
//! Delay units are multiplied by the caller's [`Scale`] before they are
//! written; use [`Scale::IDENTITY`] to send raw units.

use crate::chain::linearize;
use crate::command::{Command, CommandLine};
use crate::naming::CommandNaming;
use blockjr_core::{Block, BlockId, BlockType, Error, Result};
use tracing::{debug, info};

/// Multiplier applied to delay units before they go on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f64);

impl Scale {
    /// Send delay units unchanged.
    pub const IDENTITY: Scale = Scale(1.0);

    /// Create a scale; it must be finite and non-negative.
    pub fn new(factor: f64) -> Result<Self> {
        if factor.is_finite() && factor >= 0.0 {
            Ok(Self(factor))
        } else {
            Err(Error::InvalidScale(factor))
        }
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Render `units` scaled, e.g. `3` at `0.1` becomes `0.30000000000000004`,
    /// exactly as the app's number formatting would.
    pub fn apply(&self, units: u64) -> String {
        (units as f64 * self.0).to_string()
    }
}

/// Everything the encoder needs besides the blocks themselves.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub naming: CommandNaming,
    pub scale: Scale,
}

impl CompileOptions {
    pub fn new(naming: CommandNaming, scale: Scale) -> Self {
        Self { naming, scale }
    }
}

/// A command together with the block that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub block_id: BlockId,
    pub command: Command,
}

/// Result of compiling a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compilation {
    /// The sequence had no blocks; there is nothing to send.
    Empty,
    /// The compiled commands. May itself be empty when every block was a
    /// dropped delay.
    Commands(CommandLine),
}

impl Compilation {
    pub fn is_empty(&self) -> bool {
        matches!(self, Compilation::Empty)
    }

    /// The wire string, or `None` for an empty sequence.
    pub fn wire(&self) -> Option<String> {
        match self {
            Compilation::Empty => None,
            Compilation::Commands(line) => Some(line.to_string()),
        }
    }
}

/// Compiles linearized block sequences.
pub struct Encoder<'o> {
    options: &'o CompileOptions,
}

impl<'o> Encoder<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        Self { options }
    }

    /// Compile `sequence` into a command line.
    pub fn compile(&self, sequence: &[&Block]) -> Compilation {
        if sequence.is_empty() {
            info!("execution chain is empty");
            return Compilation::Empty;
        }

        let line: CommandLine = self.queue(sequence).into_iter().map(|q| q.command).collect();
        debug!(command = %line, "compiled block sequence");
        Compilation::Commands(line)
    }

    /// Compile `sequence` into per-block commands.
    pub fn queue(&self, sequence: &[&Block]) -> Vec<QueuedCommand> {
        let mut queue = Vec::new();
        let mut i = 0;

        while i < sequence.len() {
            let block = sequence[i];

            if block.block_type.consumes_delay() {
                let run_end = delay_run_end(sequence, i + 1);
                let units = sum_units(&sequence[i + 1..run_end]);
                queue.push(QueuedCommand {
                    block_id: block.id.clone(),
                    command: self.action(&block.block_type, units),
                });
                i = run_end;
                continue;
            }

            if block.block_type.is_delay() {
                let run_end = delay_run_end(sequence, i);
                let previous = i.checked_sub(1).map(|p| sequence[p]);
                let dropped = match previous {
                    Some(prev) => prev.block_type.is_speed(),
                    None => run_end - i >= 2,
                };

                if dropped {
                    debug!(count = run_end - i, "dropping standalone delay run");
                } else {
                    queue.extend(sequence[i..run_end].iter().map(|delay| QueuedCommand {
                        block_id: delay.id.clone(),
                        command: self.delay(delay),
                    }));
                }
                i = run_end;
                continue;
            }

            queue.push(QueuedCommand {
                block_id: block.id.clone(),
                command: self.direct(block),
            });
            i += 1;
        }

        queue
    }

    fn action(&self, block_type: &BlockType, units: u64) -> Command {
        Command::call(
            self.options.naming.name_for(block_type),
            self.options.scale.apply(units),
        )
    }

    fn delay(&self, block: &Block) -> Command {
        Command::call(
            self.options.naming.name_for(&BlockType::Delay),
            self.options.scale.apply(u64::from(block.delay_units())),
        )
    }

    fn direct(&self, block: &Block) -> Command {
        if let Some(speed) = block.block_type.fixed_speed() {
            return Command::call("speed", speed);
        }
        let name = self.options.naming.name_for(&block.block_type);
        match block.value {
            Some(value) => Command::call(name, value),
            None => Command::empty(name),
        }
    }
}

/// Index one past the run of delay blocks starting at `from`.
fn delay_run_end(sequence: &[&Block], from: usize) -> usize {
    sequence[from.min(sequence.len())..]
        .iter()
        .position(|b| !b.block_type.is_delay())
        .map_or(sequence.len(), |offset| from + offset)
}

fn sum_units(delays: &[&Block]) -> u64 {
    delays.iter().map(|d| u64::from(d.delay_units())).sum()
}

/// Compile an already linearized sequence.
pub fn compile(sequence: &[&Block], options: &CompileOptions) -> Compilation {
    Encoder::new(options).compile(sequence)
}

/// Per-block commands for an already linearized sequence.
pub fn build_command_queue(sequence: &[&Block], options: &CompileOptions) -> Vec<QueuedCommand> {
    Encoder::new(options).queue(sequence)
}

/// Linearize a whole snapshot and compile it.
pub fn compile_blocks(blocks: &[Block], options: &CompileOptions) -> Compilation {
    compile(&linearize(blocks), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> CompileOptions {
        CompileOptions::new(CommandNaming::workspace(), Scale::IDENTITY)
    }

    fn block(id: &str, t: BlockType) -> Block {
        Block::new(id, t)
    }

    fn wire(blocks: &[Block], options: &CompileOptions) -> Option<String> {
        let sequence: Vec<&Block> = blocks.iter().collect();
        compile(&sequence, options).wire()
    }

    #[test]
    fn test_action_absorbs_delay() {
        let blocks = [block("a", BlockType::Up), Block::delay("d", 2)];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("up(2)"));
    }

    #[test]
    fn test_action_sums_consecutive_delays() {
        let blocks = [
            block("a", BlockType::Down),
            Block::delay("d1", 2),
            Block::delay("d2", 3),
        ];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("down(5)"));
    }

    #[test]
    fn test_action_without_delay() {
        let blocks = [block("a", BlockType::Forward)];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("forward(0)"));
    }

    #[test]
    fn test_missing_delay_value_counts_as_one() {
        let blocks = [
            block("a", BlockType::Backward),
            block("d1", BlockType::Delay),
            Block::delay("d2", 4),
        ];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("backward(5)"));
    }

    #[test]
    fn test_delays_after_speed_are_dropped() {
        let blocks = [
            block("s", BlockType::SpeedLow),
            Block::delay("d1", 1),
            Block::delay("d2", 1),
        ];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("speed(50)"));

        let blocks = [
            block("s", BlockType::SpeedHigh),
            Block::delay("d1", 3),
            block("u", BlockType::Up),
        ];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("speed(100)_up(0)"));
    }

    #[test]
    fn test_leading_delay_run_is_dropped() {
        let blocks = [Block::delay("d1", 1), Block::delay("d2", 1), block("u", BlockType::Up)];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("up(0)"));
    }

    #[test]
    fn test_single_leading_delay_is_kept() {
        let blocks = [Block::delay("d1", 2), block("u", BlockType::Up)];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("delay(2)_up(0)"));
    }

    #[test]
    fn test_delays_after_non_consumer_are_sent() {
        let blocks = [
            block("f", BlockType::GreenFlag),
            Block::delay("d1", 2),
            block("d2", BlockType::Delay),
        ];
        assert_eq!(
            wire(&blocks, &workspace()).as_deref(),
            Some("green-flag()_delay(2)_delay(1)")
        );
    }

    #[test]
    fn test_unknown_type_uses_raw_value() {
        let blocks = [
            block("x", BlockType::Other("teleport".to_string())).with_value(7),
            block("s", BlockType::Shoot),
        ];
        assert_eq!(wire(&blocks, &workspace()).as_deref(), Some("teleport(7)_shoot()"));
    }

    #[test]
    fn test_empty_sequence_is_distinct() {
        assert_eq!(compile(&[], &workspace()), Compilation::Empty);
        assert!(compile(&[], &workspace()).is_empty());

        let blocks = [Block::delay("d1", 1), Block::delay("d2", 1)];
        let sequence: Vec<&Block> = blocks.iter().collect();
        let compiled = compile(&sequence, &workspace());
        assert_eq!(compiled, Compilation::Commands(CommandLine::default()));
        assert_eq!(compiled.wire().as_deref(), Some(""));
    }

    #[test]
    fn test_gamepad_naming() {
        let options = CompileOptions::new(CommandNaming::gamepad(), Scale::IDENTITY);
        let blocks = [
            block("c", BlockType::Clockwise),
            Block::delay("d", 3),
            block("cc", BlockType::CountClockwise),
            block("l", BlockType::LampOn),
        ];
        assert_eq!(
            wire(&blocks, &options).as_deref(),
            Some("turnright(3)_turnleft(0)_lampon(0)")
        );
        assert_eq!(
            wire(&blocks, &workspace()).as_deref(),
            Some("clockwise(3)_countclockwise(0)_lamp-on(0)")
        );
    }

    #[test]
    fn test_scale_applies_to_delay_units_only() {
        let options = CompileOptions::new(CommandNaming::workspace(), Scale::new(100.0).unwrap());
        let blocks = [
            Block::delay("d0", 2),
            block("u", BlockType::Up),
            Block::delay("d1", 3),
            block("s", BlockType::SpeedHigh),
            block("x", BlockType::Other("beep".to_string())).with_value(4),
        ];
        assert_eq!(
            wire(&blocks, &options).as_deref(),
            Some("delay(200)_up(300)_speed(100)_beep(4)")
        );
    }

    #[test]
    fn test_fractional_scale() {
        let options = CompileOptions::new(CommandNaming::workspace(), Scale::new(0.5).unwrap());
        let blocks = [block("u", BlockType::Up), Block::delay("d", 3)];
        assert_eq!(wire(&blocks, &options).as_deref(), Some("up(1.5)"));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        assert!(Scale::new(-1.0).is_err());
        assert!(Scale::new(f64::NAN).is_err());
        assert!(Scale::new(f64::INFINITY).is_err());
        assert!(Scale::new(0.0).is_ok());
    }

    #[test]
    fn test_queue_attributes_commands_to_blocks() {
        let blocks = [
            block("u", BlockType::Up),
            Block::delay("d1", 2),
            block("s", BlockType::SpeedLow),
            Block::delay("d2", 1),
            block("f", BlockType::Forward),
            block("g", BlockType::GreenFlag),
            Block::delay("d3", 4),
        ];
        let sequence: Vec<&Block> = blocks.iter().collect();
        let queue = build_command_queue(&sequence, &workspace());
        let pairs: Vec<(&str, String)> = queue
            .iter()
            .map(|q| (q.block_id.as_str(), q.command.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("u", "up(2)".to_string()),
                ("s", "speed(50)".to_string()),
                ("f", "forward(0)".to_string()),
                ("g", "green-flag()".to_string()),
                ("d3", "delay(4)".to_string()),
            ]
        );
    }

    #[test]
    fn test_compile_blocks_linearizes_first() {
        let blocks = vec![
            Block::delay("d", 2).with_parent("u"),
            block("u", BlockType::Up).with_child("d"),
        ];
        assert_eq!(
            compile_blocks(&blocks, &workspace()).wire().as_deref(),
            Some("up(2)")
        );
    }
}
