use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Duplicate block ID: {0}")]
    DuplicateBlockId(String),

    #[error("Attaching {child} under {parent} would create a cycle")]
    WouldCycle { parent: String, child: String },

    #[error("Block {0} is not a delay block")]
    NotADelay(String),

    #[error("Invalid scale: {0}")]
    InvalidScale(f64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not connected to a device")]
    NotConnected,

    #[error("No OK received within {0} ms")]
    AckTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
