//! Program execution runtime for BlockJr.
//!
//! This crate provides:
//! - The device transport interface and in-process transports
//! - Batch and stepwise program execution with retries
//! - The emergency stop signal

pub mod executor;
pub mod transport;

pub use executor::{ExecutionOutcome, Executor, ExecutorConfig};
pub use transport::{MemoryTransport, Transport, WriterTransport};
