//! Blocking serial transport
//!
//! `read` collects bytes until the requested count arrives or the read
//! timeout elapses, so a single call covers a whole CAT reply even when the
//! radio dribbles it out a few bytes at a time.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use rigcat_protocol::{ControlLine, Transport, TransportError};
use serialport::SerialPort;
use tracing::{debug, info};

use crate::config::PortConfig;
use crate::error::PortError;

/// Largest single read request handed to the OS
const CHUNK_LEN: usize = 256;

/// Serial connection to a radio
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Open and configure the port described by `config`
    pub fn open(config: &PortConfig) -> Result<Self, PortError> {
        if config.port.is_empty() {
            return Err(PortError::NoPort);
        }

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .flow_control(config.flow_control.into())
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| PortError::OpenFailed {
                port: config.port.clone(),
                source,
            })?;

        info!("Opened {} at {} baud", config.port, config.baud_rate);

        Ok(Self {
            port,
            name: config.port.clone(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        })
    }

    /// Port name this transport was opened on
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.port
            .set_timeout(self.write_timeout)
            .map_err(io::Error::from)?;
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(data.len())
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut received = Vec::with_capacity(max_bytes);
        let mut chunk = [0u8; CHUNK_LEN];

        while received.len() < max_bytes {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port.set_timeout(remaining).map_err(io::Error::from)?;

            let want = (max_bytes - received.len()).min(CHUNK_LEN);
            match self.port.read(&mut chunk[..want]) {
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if received.len() < max_bytes {
            debug!(
                "{}: read timed out with {}/{} bytes",
                self.name,
                received.len(),
                max_bytes
            );
        }
        Ok(received)
    }

    fn set_control_line(
        &mut self,
        line: ControlLine,
        asserted: bool,
    ) -> Result<(), TransportError> {
        let result = match line {
            ControlLine::Dtr => self.port.write_data_terminal_ready(asserted),
            ControlLine::Rts => self.port.write_request_to_send(asserted),
        };
        result.map_err(|e| TransportError::ControlLine {
            line,
            reason: e.to_string(),
        })?;
        debug!("{}: {} {}", self.name, line, if asserted { "on" } else { "off" });
        Ok(())
    }
}
