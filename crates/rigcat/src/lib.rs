//! Vendor-neutral CAT command router
//!
//! This crate turns textual commands such as `FREQ 7074000` or `PTT ON`
//! into the wire transactions of one transceiver family and normalises the
//! replies to `OK`, `ERROR`, `NOT FOUND` or a value.
//!
//! # Architecture
//!
//! A [`Rig`] owns the transport, the per-radio [`Session`] shadow state and
//! one [`VendorCodec`]:
//!
//! - **FT-817**: fixed 5-byte binary commands ([`ft817`])
//! - **FT-991**: `;`-terminated ASCII mnemonics ([`ft991`])
//! - **CI-V**: addressed Icom frames, optionally echoed ([`civ`])
//!
//! Generic commands (PTT, PTT-METHOD, ASCII, HEX, SETUP-SPLIT) are handled
//! by the router before the codec sees the command.
//!
//! # Example
//!
//! ```rust,no_run
//! use rigcat::{CodecOptions, Rig};
//! use rigcat_sim::MockTransport;
//!
//! let mut rig = Rig::open("FT-991", Box::new(MockTransport::new()), &CodecOptions::default())?;
//! let response = rig.dispatch("FREQ", &["7074000"]);
//! println!("{response}");
//! # Ok::<(), rigcat::RigError>(())
//! ```

pub mod civ;
pub mod codec;
pub mod error;
pub mod ft817;
pub mod ft991;
pub mod ptt;
pub mod router;
pub mod script;
pub mod session;

pub use codec::{create_codec, CodecOptions, Link, SplitPlan, VendorCodec};
pub use error::RigError;
pub use router::{format_hex, Rig, RAW_REPLY_MAX};
pub use script::CommandScript;
pub use session::Session;
