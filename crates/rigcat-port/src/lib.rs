//! Serial Port Transport Library
//!
//! This crate connects the CAT codecs to real hardware: a blocking
//! [`SerialTransport`] implementing [`rigcat_protocol::Transport`], the
//! serde-backed [`PortConfig`] describing how to open it, and serial port
//! enumeration.
//!
//! # Example
//!
//! ```rust,no_run
//! use rigcat_port::{PortConfig, PortScanner, SerialTransport};
//!
//! let ports = PortScanner::new().enumerate_ports().unwrap();
//! for port in &ports {
//!     println!("Found port: {}", port.port);
//! }
//!
//! let config = PortConfig {
//!     port: "/dev/ttyUSB0".into(),
//!     baud_rate: 38_400,
//!     ..PortConfig::default()
//! };
//! let transport = SerialTransport::open(&config).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod scanner;
pub mod serial;

pub use config::{DataBits, FlowControl, Parity, PortConfig, StopBits};
pub use error::PortError;
pub use scanner::{PortScanner, SerialPortInfo};
pub use serial::SerialTransport;
