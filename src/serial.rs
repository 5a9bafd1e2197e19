//! Serial transport seam.
//!
//! The byte-level driver lives outside the engine. The engine only needs to open a
//! port and then write bytes or poll a single byte without blocking.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// An open, exclusively owned byte transport
pub trait SerialPort {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Non-blocking read of at most one byte. `None` when nothing is pending.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Opens transports for `uinit`
pub trait SerialOpener {
    fn open(&mut self, port: &str, baud: u32, timeout: Duration) -> io::Result<Box<dyn SerialPort>>;
}

/// Opener used when the embedder provides no transport. Every `uinit` fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSerial;

impl SerialOpener for NoSerial {
    fn open(&mut self, port: &str, _baud: u32, _timeout: Duration) -> io::Result<Box<dyn SerialPort>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no serial transport available for port {}", port),
        ))
    }
}

/// In-memory transport. Every written byte becomes readable, and bytes can be
/// fed in ahead of time to simulate a peer.
#[derive(Debug, Default)]
pub struct LoopbackPort {
    pending: VecDeque<u8>,
}

impl LoopbackPort {
    pub fn with_input(bytes: &[u8]) -> Self {
        LoopbackPort {
            pending: bytes.iter().copied().collect(),
        }
    }
}

impl SerialPort for LoopbackPort {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.pending.extend(bytes);
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pending.pop_front())
    }
}

/// Opener producing `LoopbackPort`s, optionally preloaded with input
#[derive(Debug, Default, Clone)]
pub struct LoopbackOpener {
    input: Vec<u8>,
}

impl LoopbackOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        LoopbackOpener {
            input: bytes.to_vec(),
        }
    }
}

impl SerialOpener for LoopbackOpener {
    fn open(&mut self, _port: &str, _baud: u32, _timeout: Duration) -> io::Result<Box<dyn SerialPort>> {
        Ok(Box::new(LoopbackPort::with_input(&self.input)))
    }
}
