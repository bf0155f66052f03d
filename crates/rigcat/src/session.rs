//! Per-radio shadow state
//!
//! Some radios cannot report their active VFO, split or transmit state.
//! The codecs keep what they last set here. The values are only as good as
//! the assumption that nobody touched the front panel since; a failed set
//! never changes them.

use rigcat_protocol::{PttMethod, Vfo};

/// State a codec remembers between commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    /// Last VFO selected through this session
    pub vfo: Vfo,
    /// Last split state set through this session
    pub split: bool,
    /// Transmitter keyed
    pub ptt_on: bool,
    /// How PTT keys the transmitter
    pub ptt_method: PttMethod,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}
