//! CAT Protocol Library
//!
//! This crate provides the wire encodings for amateur radio CAT (Computer
//! Aided Transceiver) control:
//!
//! - **Yaesu CAT**: 5-byte binary command format with BCD parameters (FT-817/857/897)
//! - **Yaesu ASCII**: ASCII semicolon-terminated commands (FT-991/FTDX series)
//! - **Icom CI-V**: Variable-length framed messages with address-based routing
//!
//! # Architecture
//!
//! Protocol modules are pure: they build request bytes, validate arguments
//! and decode replies, but never touch a port. I/O goes through the
//! [`Transport`] trait, implemented by `rigcat-port` for real serial ports
//! and by `rigcat-sim` for tests.
//!
//! Client software speaks a vendor-neutral text command surface
//! ([`Command`] in, [`Response`] out); the `rigcat` crate routes those
//! commands to the codec for the connected radio.
//!
//! # Example
//!
//! ```rust
//! use rigcat_protocol::yaesu::YaesuCommand;
//! use rigcat_protocol::yaesu_ascii::YaesuAsciiCommand;
//!
//! // FT-817: set 14.250 MHz
//! let bytes = YaesuCommand::SetFrequency { hz: 14_250_000 }.encode().unwrap();
//! assert_eq!(bytes, [0x01, 0x42, 0x50, 0x00, 0x01]);
//!
//! // FT-991: same thing in ASCII
//! let wire = YaesuAsciiCommand::FrequencyA(Some(14_250_000)).encode().unwrap();
//! assert_eq!(wire, "FA014250000;");
//! ```

pub mod bcd;
pub mod command;
pub mod error;
pub mod icom;
pub mod models;
pub mod transport;
pub mod yaesu;
pub mod yaesu_ascii;

pub use command::{Command, OperatingMode, PttMethod, RepeaterShift, Response, ToneMode, Vfo};
pub use error::{CatError, CatResult, ParseError, TransportError};
pub use models::{RigDatabase, RigModel};
pub use transport::{ControlLine, Transport};

/// Identifies which CAT protocol variant a radio uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    /// Yaesu CAT protocol (5-byte binary commands for FT-817/857/897)
    YaesuBinary,
    /// Yaesu ASCII protocol (semicolon-terminated for FT-991/FTDX series)
    YaesuAscii,
    /// Icom CI-V protocol (framed variable-length messages)
    IcomCiv,
}

impl Protocol {
    /// Returns a human-readable name for the protocol
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::YaesuBinary => "Yaesu CAT",
            Protocol::YaesuAscii => "Yaesu ASCII",
            Protocol::IcomCiv => "Icom CI-V",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
