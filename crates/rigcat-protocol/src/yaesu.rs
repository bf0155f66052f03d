//! Yaesu CAT Protocol Implementation (fixed 5-byte binary)
//!
//! The FT-817/857/897 family takes fixed-length binary commands and
//! answers with short fixed-length replies.
//!
//! # Command Format
//! ```text
//! [P1] [P2] [P3] [P4] [CMD]
//! ```
//!
//! - Bytes 0-3: Parameters (meaning depends on command)
//! - Byte 4: Command opcode
//!
//! # Replies
//! Set commands answer with a single status byte (0x00 = accepted). The
//! frequency/mode read answers with 5 bytes, the EEPROM read with 2.
//!
//! # Frequency Encoding
//! Frequencies are BCD encoded in bytes 0-3 (big-endian) in units of 10 Hz.
//! Example: 14.250.00 MHz = 0x01 0x42 0x50 0x00
//!
//! The radio has no "select VFO A/B" command, only a toggle, and no
//! documented way to read the active VFO or split state. Both are read
//! from EEPROM status bytes (see [`EEPROM_VFO_STATUS`] and
//! [`EEPROM_SPLIT_STATUS`]); the locations come from community reverse
//! engineering and are best-effort.

use crate::bcd;
use crate::command::{OperatingMode, RepeaterShift, ToneMode, Vfo};
use crate::error::ParseError;

/// Standard Yaesu command length
pub const COMMAND_LEN: usize = 5;

/// Length of the status byte returned by set commands
pub const ACK_LEN: usize = 1;

/// Length of the frequency/mode reply
pub const FREQ_MODE_REPLY_LEN: usize = 5;

/// Length of the EEPROM read reply
pub const EEPROM_REPLY_LEN: usize = 2;

/// Lowest settable frequency in Hz
pub const MIN_FREQUENCY_HZ: u64 = 100_000;

/// Highest settable frequency in Hz
pub const MAX_FREQUENCY_HZ: u64 = 450_000_000;

/// Clarifier offset limit in units of 10 Hz
pub const MAX_CLARIFIER_TENS: i64 = 999;

/// Repeater offset limit in Hz
pub const MAX_REPEATER_OFFSET_HZ: i64 = 9_999_999;

/// CTCSS tone range in tenths of a hertz (67.0 Hz to 254.1 Hz)
pub const CTCSS_TENTHS_RANGE: (u64, u64) = (670, 2541);

/// Highest readable EEPROM address
pub const EEPROM_MAX_ADDRESS: u16 = 0x1925;

/// EEPROM byte holding the active VFO in bit 0 (set = VFO B)
pub const EEPROM_VFO_STATUS: u16 = 0x55;

/// EEPROM byte holding the split flag in bit 7
pub const EEPROM_SPLIT_STATUS: u16 = 0x7A;

const VFO_B_MASK: u8 = 0x01;
const SPLIT_MASK: u8 = 0x80;

/// Yaesu command opcodes (FT-817/857/897 compatible)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YaesuOpcode {
    /// Set frequency (P1-P4 = BCD freq)
    SetFrequency = 0x01,
    /// Split on
    SplitOn = 0x02,
    /// Read frequency and mode
    ReadFreqMode = 0x03,
    /// Clarifier on
    ClarOn = 0x05,
    /// Set mode (P1 = mode)
    SetMode = 0x07,
    /// PTT on (TX)
    PttOn = 0x08,
    /// Repeater shift direction (P1 = direction)
    RepeaterShift = 0x09,
    /// CTCSS/DCS mode (P1 = mode)
    CtcssMode = 0x0A,
    /// CTCSS tone (P1-P2 = BCD tone)
    CtcssTone = 0x0B,
    /// Toggle VFO
    ToggleVfo = 0x81,
    /// Split off
    SplitOff = 0x82,
    /// Clarifier off
    ClarOff = 0x85,
    /// PTT off (RX)
    PttOff = 0x88,
    /// Read EEPROM (P1-P2 = address)
    ReadEeprom = 0xBB,
    /// Read RX status
    ReadRxStatus = 0xE7,
    /// Clarifier frequency
    ClarFreq = 0xF5,
    /// Read TX status
    ReadTxStatus = 0xF7,
    /// Repeater offset (P1-P4 = BCD offset)
    RepeaterOffset = 0xF9,
}

/// Yaesu protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YaesuCommand {
    /// Set frequency (sent in 10 Hz units)
    SetFrequency { hz: u64 },
    /// Read frequency/mode query
    ReadFrequencyMode,
    /// Set operating mode by radio code
    SetMode { code: u8 },
    /// Key or unkey the transmitter
    Ptt { on: bool },
    /// Toggle VFO A/B
    ToggleVfo,
    /// Split on/off
    Split { on: bool },
    /// Clarifier (RIT) on/off
    Clarifier { on: bool },
    /// Clarifier offset in Hz, truncated to 10 Hz
    ClarifierOffset { hz: i64 },
    /// Repeater shift direction
    RepeaterShift(RepeaterShift),
    /// Repeater offset magnitude in Hz
    RepeaterOffset { hz: u64 },
    /// CTCSS encoder/decoder mode
    CtcssMode(ToneMode),
    /// CTCSS tone in tenths of a hertz
    CtcssTone { tenths_hz: u64 },
    /// Read RX status
    ReadRxStatus,
    /// Read TX status
    ReadTxStatus,
    /// Read two EEPROM bytes
    ReadEeprom { address: u16 },
}

/// What the radio sends back for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// One status byte; `strict` requires it to be 0x00
    Ack { strict: bool },
    /// Fixed-length data
    Data(usize),
}

impl Reply {
    /// Number of bytes to read
    pub fn len(&self) -> usize {
        match self {
            Reply::Ack { .. } => ACK_LEN,
            Reply::Data(n) => *n,
        }
    }

    /// Always false: every reply has at least one byte
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl YaesuCommand {
    /// Opcode byte for this command
    pub fn opcode(&self) -> YaesuOpcode {
        match self {
            YaesuCommand::SetFrequency { .. } => YaesuOpcode::SetFrequency,
            YaesuCommand::ReadFrequencyMode => YaesuOpcode::ReadFreqMode,
            YaesuCommand::SetMode { .. } => YaesuOpcode::SetMode,
            YaesuCommand::Ptt { on: true } => YaesuOpcode::PttOn,
            YaesuCommand::Ptt { on: false } => YaesuOpcode::PttOff,
            YaesuCommand::ToggleVfo => YaesuOpcode::ToggleVfo,
            YaesuCommand::Split { on: true } => YaesuOpcode::SplitOn,
            YaesuCommand::Split { on: false } => YaesuOpcode::SplitOff,
            YaesuCommand::Clarifier { on: true } => YaesuOpcode::ClarOn,
            YaesuCommand::Clarifier { on: false } => YaesuOpcode::ClarOff,
            YaesuCommand::ClarifierOffset { .. } => YaesuOpcode::ClarFreq,
            YaesuCommand::RepeaterShift(_) => YaesuOpcode::RepeaterShift,
            YaesuCommand::RepeaterOffset { .. } => YaesuOpcode::RepeaterOffset,
            YaesuCommand::CtcssMode(_) => YaesuOpcode::CtcssMode,
            YaesuCommand::CtcssTone { .. } => YaesuOpcode::CtcssTone,
            YaesuCommand::ReadRxStatus => YaesuOpcode::ReadRxStatus,
            YaesuCommand::ReadTxStatus => YaesuOpcode::ReadTxStatus,
            YaesuCommand::ReadEeprom { .. } => YaesuOpcode::ReadEeprom,
        }
    }

    /// Expected reply shape
    pub fn reply(&self) -> Reply {
        match self {
            YaesuCommand::ReadFrequencyMode => Reply::Data(FREQ_MODE_REPLY_LEN),
            YaesuCommand::ReadEeprom { .. } => Reply::Data(EEPROM_REPLY_LEN),
            YaesuCommand::ReadRxStatus | YaesuCommand::ReadTxStatus => Reply::Data(1),
            YaesuCommand::SetFrequency { .. }
            | YaesuCommand::ToggleVfo
            | YaesuCommand::ClarifierOffset { .. }
            | YaesuCommand::RepeaterShift(_)
            | YaesuCommand::RepeaterOffset { .. }
            | YaesuCommand::CtcssMode(_)
            | YaesuCommand::CtcssTone { .. } => Reply::Ack { strict: true },
            YaesuCommand::SetMode { .. }
            | YaesuCommand::Ptt { .. }
            | YaesuCommand::Split { .. }
            | YaesuCommand::Clarifier { .. } => Reply::Ack { strict: false },
        }
    }

    /// Encode to the 5-byte wire format, validating parameter ranges
    pub fn encode(&self) -> Result<[u8; COMMAND_LEN], ParseError> {
        let mut frame = [0u8; COMMAND_LEN];
        match *self {
            YaesuCommand::SetFrequency { hz } => {
                check_frequency(hz)?;
                frame[..4].copy_from_slice(&frequency_to_bcd_be(hz)?);
            }
            YaesuCommand::SetMode { code } => frame[0] = code,
            YaesuCommand::ClarifierOffset { hz } => {
                let tens = hz / 10;
                if tens.abs() > MAX_CLARIFIER_TENS {
                    return Err(ParseError::OutOfRange {
                        what: "clarifier offset",
                        value: hz,
                        min: -MAX_CLARIFIER_TENS * 10 - 9,
                        max: MAX_CLARIFIER_TENS * 10 + 9,
                    });
                }
                if tens < 0 {
                    frame[0] = 0x01;
                }
                let packed = bcd::pack(&bcd::encode(tens, 9_999)?);
                frame[2..4].copy_from_slice(&packed);
            }
            YaesuCommand::RepeaterShift(shift) => {
                frame[0] = match shift {
                    RepeaterShift::Minus => 0x09,
                    RepeaterShift::Plus => 0x49,
                    RepeaterShift::Simplex => 0x89,
                };
            }
            YaesuCommand::RepeaterOffset { hz } => {
                let hz = i64::try_from(hz).unwrap_or(i64::MAX);
                if hz > MAX_REPEATER_OFFSET_HZ {
                    return Err(ParseError::OutOfRange {
                        what: "repeater offset",
                        value: hz,
                        min: -MAX_REPEATER_OFFSET_HZ,
                        max: MAX_REPEATER_OFFSET_HZ,
                    });
                }
                let packed = bcd::pack(&bcd::encode(hz, 99_999_999)?);
                frame[..4].copy_from_slice(&packed);
            }
            YaesuCommand::CtcssMode(mode) => {
                frame[0] = match mode {
                    ToneMode::Off => 0x8A,
                    ToneMode::Encode => 0x4A,
                    ToneMode::Decode => 0x2A,
                };
            }
            YaesuCommand::CtcssTone { tenths_hz } => {
                let (min, max) = CTCSS_TENTHS_RANGE;
                if !(min..=max).contains(&tenths_hz) {
                    return Err(ParseError::OutOfRange {
                        what: "CTCSS tone",
                        value: tenths_hz as i64,
                        min: min as i64,
                        max: max as i64,
                    });
                }
                let packed = bcd::pack(&bcd::encode(tenths_hz as i64, 9_999)?);
                frame[..2].copy_from_slice(&packed);
            }
            YaesuCommand::ReadEeprom { address } => {
                if address > EEPROM_MAX_ADDRESS {
                    return Err(ParseError::InvalidAddress(format!("0x{address:04X}")));
                }
                frame[..2].copy_from_slice(&address.to_be_bytes());
            }
            YaesuCommand::ReadFrequencyMode
            | YaesuCommand::Ptt { .. }
            | YaesuCommand::ToggleVfo
            | YaesuCommand::Split { .. }
            | YaesuCommand::Clarifier { .. }
            | YaesuCommand::ReadRxStatus
            | YaesuCommand::ReadTxStatus => {}
        }
        frame[4] = self.opcode() as u8;
        Ok(frame)
    }
}

/// Reject frequencies the radio cannot tune
pub fn check_frequency(hz: u64) -> Result<(), ParseError> {
    if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&hz) {
        return Err(ParseError::FrequencyOutOfRange {
            hz,
            min: MIN_FREQUENCY_HZ,
            max: MAX_FREQUENCY_HZ,
        });
    }
    Ok(())
}

/// Pack a frequency into 4 big-endian BCD bytes of 10 Hz units
pub fn frequency_to_bcd_be(hz: u64) -> Result<[u8; 4], ParseError> {
    let tens = i64::try_from(hz / 10).map_err(|_| ParseError::BcdOverflow {
        value: hz,
        width: 8,
    })?;
    let packed = bcd::pack(&bcd::encode(tens, 99_999_999)?);
    let mut out = [0u8; 4];
    out.copy_from_slice(&packed);
    Ok(out)
}

/// Unpack 4 big-endian BCD bytes of 10 Hz units
pub fn bcd_to_frequency_be(bytes: &[u8]) -> Result<u64, ParseError> {
    Ok(bcd::decode_packed(bytes)? * 10)
}

/// Decode the 5-byte frequency/mode reply into (Hz, mode code)
pub fn decode_frequency_mode(reply: &[u8]) -> Result<(u64, u8), ParseError> {
    if reply.len() < FREQ_MODE_REPLY_LEN {
        return Err(ParseError::InvalidArgument(format!(
            "frequency/mode reply needs {FREQ_MODE_REPLY_LEN} bytes, got {}",
            reply.len()
        )));
    }
    Ok((bcd_to_frequency_be(&reply[..4])?, reply[4]))
}

/// Settable modes and their radio codes
const MODE_TABLE: [(OperatingMode, u8); 8] = [
    (OperatingMode::Lsb, 0x00),
    (OperatingMode::Usb, 0x01),
    (OperatingMode::Cw, 0x02),
    (OperatingMode::CwR, 0x03),
    (OperatingMode::Am, 0x04),
    (OperatingMode::Fm, 0x08),
    (OperatingMode::Digi, 0x0A),
    (OperatingMode::Pkt, 0x0C),
];

/// Wide FM is reported by the radio but cannot be selected over CAT
const WIDE_FM_CODE: u8 = 0x06;

/// Radio code for a settable mode
pub fn mode_code(mode: OperatingMode) -> Option<u8> {
    MODE_TABLE
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, code)| *code)
}

/// Mode for a code reported by the radio
pub fn mode_from_code(code: u8) -> Option<OperatingMode> {
    if code == WIDE_FM_CODE {
        return Some(OperatingMode::FmW);
    }
    MODE_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(mode, _)| *mode)
}

/// Active VFO from the first byte of the [`EEPROM_VFO_STATUS`] read
pub fn vfo_from_status(status: u8) -> Vfo {
    if status & VFO_B_MASK != 0 {
        Vfo::B
    } else {
        Vfo::A
    }
}

/// Split flag from the first byte of the [`EEPROM_SPLIT_STATUS`] read
pub fn split_from_status(status: u8) -> bool {
    status & SPLIT_MASK != 0
}

/// Parse an EEPROM address given in decimal or `0x` hex
pub fn parse_eeprom_address(s: &str) -> Result<u16, ParseError> {
    let s = s.trim();
    let parsed = match s.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => u32::from_str_radix(&s[2..], 16),
        _ => s.parse::<u32>(),
    };
    match parsed {
        Ok(addr) if addr <= u32::from(EEPROM_MAX_ADDRESS) => Ok(addr as u16),
        _ => Err(ParseError::InvalidAddress(s.to_string())),
    }
}
