//! Instrument bus access.
//!
//! The driver only needs a handful of primitives from whatever library actually talks to the
//! instrument; they are collected in [`Transport`] and [`ResourceManager`].

use std::time::Duration;

use crate::Result;

/// A connection to a single instrument.
pub trait Transport {
    /// Send a command. The implementation appends the message terminator.
    fn write(&mut self, command: &str) -> Result<()>;

    /// Send a query and read back one response message, terminator included.
    fn query(&mut self, command: &str) -> Result<String>;

    /// Send a pre-formatted message that contains binary data, e.g. a command header followed
    /// by an arbitrary block. The data is sent as-is, as a single message.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Send a query whose response is an arbitrary block, and return the complete block
    /// (header and payload).
    fn query_bytes(&mut self, command: &str) -> Result<Vec<u8>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Enumerates and opens instrument resources.
pub trait ResourceManager {
    type Transport: Transport;

    /// Addresses of every resource currently visible to the bus library.
    fn list_resources(&self) -> Result<Vec<String>>;

    /// Open `resource`, giving up after `timeout`.
    fn open(&self, resource: &str, timeout: Duration) -> Result<Self::Transport>;
}

pub mod loopback;

#[cfg(feature = "visa")]
pub mod visa;
