//! Byte channel contract between the vendor codecs and the radio
//!
//! A transport is a synchronous, blocking channel: one `write`, then one
//! `read` that returns whatever arrived before the channel's read timeout.
//! The serial implementation lives in `rigcat-port`; tests use the scripted
//! transport from `rigcat-sim`.

use std::fmt;

use tracing::trace;

use crate::error::{CatError, CatResult, TransportError};

/// Hardware handshake line usable for keying a transmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlLine {
    /// Data Terminal Ready
    Dtr,
    /// Request To Send
    Rts,
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLine::Dtr => f.write_str("DTR"),
            ControlLine::Rts => f.write_str("RTS"),
        }
    }
}

/// Synchronous byte channel to one radio
pub trait Transport: Send {
    /// Write `data`, returning how many bytes the channel accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `max_bytes`, blocking until that many arrive or the read
    /// timeout elapses. A timeout is not an error: the bytes received so far
    /// are returned, possibly none.
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError>;

    /// Assert or release a handshake line
    fn set_control_line(&mut self, line: ControlLine, asserted: bool)
        -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(max_bytes)
    }

    fn set_control_line(
        &mut self,
        line: ControlLine,
        asserted: bool,
    ) -> Result<(), TransportError> {
        (**self).set_control_line(line, asserted)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(max_bytes)
    }

    fn set_control_line(
        &mut self,
        line: ControlLine,
        asserted: bool,
    ) -> Result<(), TransportError> {
        (**self).set_control_line(line, asserted)
    }
}

/// Write all of `request`, failing on a short write
pub fn send(transport: &mut dyn Transport, request: &[u8]) -> CatResult<()> {
    trace!("TX {:02X?}", request);
    let written = transport.write(request)?;
    if written != request.len() {
        return Err(TransportError::ShortWrite {
            written,
            expected: request.len(),
        }
        .into());
    }
    Ok(())
}

/// Send `request` and read back up to `max_reply` bytes
///
/// With `max_reply == 0` nothing is read.
pub fn exchange(
    transport: &mut dyn Transport,
    request: &[u8],
    max_reply: usize,
) -> CatResult<Vec<u8>> {
    send(transport, request)?;
    if max_reply == 0 {
        return Ok(Vec::new());
    }
    let reply = transport.read(max_reply)?;
    trace!("RX {:02X?}", reply);
    Ok(reply)
}

/// Send `request` and require exactly `len` reply bytes
pub fn exchange_exact(
    transport: &mut dyn Transport,
    request: &[u8],
    len: usize,
) -> CatResult<Vec<u8>> {
    let reply = exchange(transport, request, len)?;
    if reply.len() < len {
        return Err(CatError::Incomplete {
            expected: len,
            received: reply.len(),
        });
    }
    Ok(reply)
}
