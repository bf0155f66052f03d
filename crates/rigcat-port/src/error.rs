//! Error types for serial port handling

use thiserror::Error;

/// Errors opening or enumerating serial ports
#[derive(Debug, Error)]
pub enum PortError {
    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Failed to open serial port
    #[error("failed to open port {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// No port name configured
    #[error("no serial port configured")]
    NoPort,

    /// Serial port error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}
