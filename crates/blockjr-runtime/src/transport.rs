//! Device transport interface.
//!
//! A transport moves command lines to the toy. The serial Bluetooth link
//! lives outside this workspace; anything that can report connectivity
//! and push a line of text can stand in for it.

use blockjr_core::{Error, Result};
use std::io::Write;
use std::time::Duration;

/// A link to a device.
pub trait Transport {
    /// Whether a device is currently reachable.
    fn is_connected(&self) -> bool;

    /// Send one line of text.
    fn send(&mut self, line: &str) -> Result<()>;

    /// Wait for the device to acknowledge the last command.
    ///
    /// Transports without acknowledgements report success immediately.
    fn await_ok(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// In-memory transport that records every line it is given.
///
/// Connectivity, send failures and acknowledgements are scriptable.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    connected: bool,
    failures_left: usize,
    acks_left: Option<usize>,
    sent: Vec<String>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// A connected transport that accepts and acknowledges everything.
    pub fn new() -> Self {
        Self {
            connected: true,
            failures_left: 0,
            acks_left: None,
            sent: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new()
        }
    }

    /// Fail the next `count` sends.
    pub fn failing(mut self, count: usize) -> Self {
        self.failures_left = count;
        self
    }

    /// Acknowledge only the first `count` commands; later waits time out.
    pub fn acknowledging(mut self, count: usize) -> Self {
        self.acks_left = Some(count);
        self
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Transport for MemoryTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, line: &str) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(Error::Transport("simulated send failure".to_string()));
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn await_ok(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.acks_left {
            None => Ok(()),
            Some(0) => Err(Error::AckTimeout(timeout.as_millis() as u64)),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
        }
    }
}

/// Writes each line to an `io::Write`, one per line. Always connected.
pub struct WriterTransport<W: Write> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn is_connected(&self) -> bool {
        true
    }

    fn send(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}
