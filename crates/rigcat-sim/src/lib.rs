//! CAT Transport Simulation Library
//!
//! This crate provides a scripted stand-in for a radio's serial port so the
//! codecs can be exercised without hardware:
//!
//! - **MockTransport**: checks each outgoing buffer against a queue of
//!   expected requests and answers with the scripted reply
//!
//! # Example
//!
//! ```rust
//! use rigcat_protocol::transport::exchange;
//! use rigcat_sim::MockTransport;
//!
//! let mock = MockTransport::new();
//! mock.expect(b"FA;", b"FA007074000;");
//!
//! let mut port = mock.clone();
//! let reply = exchange(&mut port, b"FA;", 12).unwrap();
//! assert_eq!(reply, b"FA007074000;");
//! assert!(mock.verify().is_ok());
//! ```

pub mod transport;

pub use transport::{Expectation, MockTransport};
