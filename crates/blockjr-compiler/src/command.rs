//! Wire-level commands.
//!
//! The device understands a flat text line of function-call style
//! commands joined by [`DELIMITER`], e.g. `up(3)_delay(2)_down(1)`.

use itertools::Itertools;
use std::fmt;

/// Separator between commands on the wire.
pub const DELIMITER: &str = "_";

/// The argument part of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// No parentheses at all: `stop`.
    Bare,
    /// Empty parentheses: `stop()`, `shoot()`.
    Empty,
    /// A rendered parameter: `up(3)`.
    Value(String),
}

/// A single device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub arg: Arg,
}

impl Command {
    pub fn call(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            arg: Arg::Value(value.to_string()),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg: Arg::Empty,
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg: Arg::Bare,
        }
    }

    /// Immediate stop, sent outside any compiled program.
    pub fn stop() -> Self {
        Self::empty("stop")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Arg::Bare => write!(f, "{}", self.name),
            Arg::Empty => write!(f, "{}()", self.name),
            Arg::Value(v) => write!(f, "{}({})", self.name, v),
        }
    }
}

/// An ordered list of commands, rendered as one delimited line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine(pub Vec<Command>);

impl CommandLine {
    pub fn commands(&self) -> &[Command] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Command> for CommandLine {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(DELIMITER))
    }
}
