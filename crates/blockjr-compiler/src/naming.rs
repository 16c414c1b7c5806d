//! Block type to command name tables.
//!
//! The workspace runner sends block types under their own names
//! (`clockwise(…)`), while the gamepad firmware expects `turnright(…)` and
//! friends. The encoder never branches on who is calling; it just looks the
//! name up in the table it was given.

use blockjr_core::BlockType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Built-in naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Raw block type names. Used by the palette/workspace runner.
    #[default]
    Workspace,
    /// Gamepad/teleoperation names: `turnright`, `turnleft`, `lampon`, `lampoff`.
    Gamepad,
}

impl FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workspace" => Ok(NamingScheme::Workspace),
            "gamepad" => Ok(NamingScheme::Gamepad),
            other => Err(format!("unknown naming scheme '{}'", other)),
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingScheme::Workspace => f.write_str("workspace"),
            NamingScheme::Gamepad => f.write_str("gamepad"),
        }
    }
}

/// Maps block types to the function names written on the wire.
///
/// Types without an entry use their own wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandNaming {
    names: HashMap<BlockType, String>,
}

impl CommandNaming {
    pub fn workspace() -> Self {
        Self::default()
    }

    pub fn gamepad() -> Self {
        Self::workspace()
            .rename(BlockType::Clockwise, "turnright")
            .rename(BlockType::CountClockwise, "turnleft")
            .rename(BlockType::LampOn, "lampon")
            .rename(BlockType::LampOff, "lampoff")
    }

    pub fn for_scheme(scheme: NamingScheme) -> Self {
        match scheme {
            NamingScheme::Workspace => Self::workspace(),
            NamingScheme::Gamepad => Self::gamepad(),
        }
    }

    /// Override the name used for `block_type`.
    pub fn rename(mut self, block_type: BlockType, name: impl Into<String>) -> Self {
        self.names.insert(block_type, name.into());
        self
    }

    pub fn name_for<'a>(&'a self, block_type: &'a BlockType) -> &'a str {
        self.names
            .get(block_type)
            .map(String::as_str)
            .unwrap_or_else(|| block_type.as_str())
    }
}
