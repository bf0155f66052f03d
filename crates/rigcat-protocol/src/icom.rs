//! Icom CI-V Protocol Implementation
//!
//! The CI-V (Communication Interface V) protocol is used by Icom transceivers.
//! It uses framed variable-length binary messages with address-based routing.
//!
//! # Frame Format
//! ```text
//! FE FE [to] [from] [cmd] [subcmd...] [data...] FD
//! ```
//!
//! - `FE FE`: Preamble (two bytes)
//! - `to`: Destination address (radio address or 0xE0 for controller)
//! - `from`: Source address (controller address, typically 0xE0)
//! - `cmd`: Command code
//! - `subcmd`: Sub-command bytes (zero or more, depends on command)
//! - `data`: Variable length data (BCD encoded for frequencies)
//! - `FD`: Terminator
//!
//! The CI-V bus is a single shared wire, so most radios hear their own
//! transmission: every reply is then preceded by an echo of the request.
//!
//! # Frequency Encoding
//! Frequencies are encoded in BCD (Binary Coded Decimal), little-endian.
//! Example: 14.250.000 Hz = 00 00 25 14 00 (reversed: 00 14 25 00 00)

use crate::bcd;
use crate::command::{OperatingMode, RepeaterShift, ToneMode};
use crate::error::{CatError, CatResult, ParseError};

/// CI-V frame preamble byte
pub const PREAMBLE: u8 = 0xFE;
/// CI-V frame terminator byte
pub const TERMINATOR: u8 = 0xFD;
/// Default controller address
pub const CONTROLLER_ADDR: u8 = 0xE0;
/// Positive acknowledgement command byte
pub const ACK_OK: u8 = 0xFB;
/// Negative acknowledgement command byte
pub const ACK_NG: u8 = 0xFA;

/// Bytes in a reply frame around its data: preamble x2, to, from, cmd, terminator
pub const FRAME_OVERHEAD: usize = 6;

/// Frequency field width in bytes (10 BCD digits)
pub const FREQUENCY_LEN: usize = 5;

/// Settable frequency limits in Hz
pub const MIN_FREQUENCY_HZ: u64 = 100_000;
pub const MAX_FREQUENCY_HZ: u64 = 450_000_000;

/// Repeater offset limit in Hz
pub const MAX_REPEATER_OFFSET_HZ: i64 = 9_999_999;

/// CTCSS tone limits in tenths of a hertz
pub const CTCSS_TENTHS_RANGE: (u64, u64) = (670, 2541);

/// CI-V command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CivCommand {
    /// Read frequency
    ReadFrequency = 0x03,
    /// Read mode
    ReadMode = 0x04,
    /// Set frequency
    SetFrequency = 0x05,
    /// Set mode
    SetMode = 0x06,
    /// VFO select / VFO mode
    Vfo = 0x07,
    /// Memory mode
    Memory = 0x08,
    /// Split and duplex control
    Split = 0x0F,
    /// Level settings
    Level = 0x14,
    /// Function switches (NB, NR, preamp, tone)
    Function = 0x16,
    /// Extended settings (menu items, clock)
    Extended = 0x1A,
    /// Tone frequencies
    Tone = 0x1B,
    /// Transmit control
    Transmit = 0x1C,
}

impl From<CivCommand> for u8 {
    fn from(cmd: CivCommand) -> u8 {
        cmd as u8
    }
}

/// Sub-command bytes for `Function` (0x16)
pub mod function {
    pub const PREAMP: u8 = 0x02;
    pub const NOISE_BLANKER: u8 = 0x22;
    pub const NOISE_REDUCTION: u8 = 0x40;
    pub const TONE: u8 = 0x42;
    pub const TONE_SQUELCH: u8 = 0x43;
    pub const SPEECH: u8 = 0x44;
}

/// Sub-command groups for `Extended` (0x1A)
pub mod extended {
    pub const YEAR: [u8; 3] = [0x05, 0x00, 0x39];
    pub const DATE: [u8; 3] = [0x05, 0x00, 0x40];
    pub const TIME: [u8; 3] = [0x05, 0x00, 0x41];
    pub const MONITOR: [u8; 3] = [0x05, 0x00, 0x45];
    pub const MONITOR_LEVEL: [u8; 3] = [0x05, 0x00, 0x46];
    pub const SPEECH_LEVEL: [u8; 3] = [0x05, 0x00, 0x94];
}

/// RF power sub-command for `Level` (0x14)
pub const LEVEL_RF_POWER: u8 = 0x0A;

/// PTT sub-command for `Transmit` (0x1C)
pub const TRANSMIT_PTT: u8 = 0x00;

/// One outgoing CI-V frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivFrame {
    /// Destination address
    pub to: u8,
    /// Source address
    pub from: u8,
    /// Command byte
    pub command: u8,
    /// Sub-command bytes
    pub subcommand: Vec<u8>,
    /// Payload bytes
    pub data: Vec<u8>,
}

impl CivFrame {
    /// Frame from the controller to `radio_addr`
    pub fn new(radio_addr: u8, command: impl Into<u8>) -> Self {
        Self {
            to: radio_addr,
            from: CONTROLLER_ADDR,
            command: command.into(),
            subcommand: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Append sub-command bytes
    pub fn sub(mut self, bytes: &[u8]) -> Self {
        self.subcommand.extend_from_slice(bytes);
        self
    }

    /// Append payload bytes
    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Serialize with preamble and terminator
    pub fn encode(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(FRAME_OVERHEAD + self.subcommand.len() + self.data.len());
        buf.extend_from_slice(&[PREAMBLE, PREAMBLE, self.to, self.from, self.command]);
        buf.extend_from_slice(&self.subcommand);
        buf.extend_from_slice(&self.data);
        buf.push(TERMINATOR);
        buf
    }
}

/// Reply bytes to read for a request of `sent_len` bytes
///
/// `max_data` counts the reply bytes after the command byte and before the
/// terminator, including any sub-command echo.
pub fn reply_len(sent_len: usize, max_data: usize, echo: bool) -> usize {
    overhead(sent_len, echo) + max_data
}

fn overhead(sent_len: usize, echo: bool) -> usize {
    FRAME_OVERHEAD + if echo { sent_len } else { 0 }
}

/// Validate a reply and return its `max_data` payload bytes
///
/// A reply shorter than expected or not ending in `FD` fails even if some
/// payload arrived. An NG frame is reported as a reject.
pub fn extract_payload(
    reply: &[u8],
    sent_len: usize,
    max_data: usize,
    echo: bool,
) -> CatResult<Vec<u8>> {
    let overhead = overhead(sent_len, echo);
    let expected = overhead + max_data;
    let command_byte = reply.get(overhead - 2).copied();

    if reply.len() < expected {
        if reply.len() == overhead && command_byte == Some(ACK_NG) {
            return Err(CatError::Rejected(format!("{:02X?}", reply)));
        }
        return Err(CatError::Incomplete {
            expected,
            received: reply.len(),
        });
    }
    if reply.last() != Some(&TERMINATOR) {
        return Err(CatError::Unterminated);
    }
    if max_data == 0 && command_byte == Some(ACK_NG) {
        return Err(CatError::Rejected(format!("{:02X?}", reply)));
    }
    Ok(reply[overhead - 1..overhead - 1 + max_data].to_vec())
}

/// Range-check and encode a frequency as the 5-byte little-endian BCD field
pub fn encode_frequency(hz: u64) -> Result<Vec<u8>, ParseError> {
    if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&hz) {
        return Err(ParseError::FrequencyOutOfRange {
            hz,
            min: MIN_FREQUENCY_HZ,
            max: MAX_FREQUENCY_HZ,
        });
    }
    bcd::encode_packed_le(hz, FREQUENCY_LEN)
}

/// Decode the 5-byte little-endian BCD frequency field
pub fn decode_frequency(data: &[u8]) -> Result<u64, ParseError> {
    bcd::decode_packed_le(data)
}

/// Mode codes used by the read/set mode commands
const MODE_TABLE: [(OperatingMode, u8); 8] = [
    (OperatingMode::Lsb, 0x00),
    (OperatingMode::Usb, 0x01),
    (OperatingMode::Am, 0x02),
    (OperatingMode::Cw, 0x03),
    (OperatingMode::Rtty, 0x04),
    (OperatingMode::Fm, 0x05),
    (OperatingMode::CwR, 0x07),
    (OperatingMode::RttyR, 0x08),
];

/// Mode code for `mode`
///
/// Radios without separate data modes take the data mode names as aliases
/// of their voice counterparts.
pub fn mode_code(mode: OperatingMode, has_data_modes: bool) -> Option<u8> {
    let mode = match mode {
        OperatingMode::DataLsb if !has_data_modes => OperatingMode::Lsb,
        OperatingMode::DataUsb if !has_data_modes => OperatingMode::Usb,
        OperatingMode::DataFm if !has_data_modes => OperatingMode::Fm,
        other => other,
    };
    MODE_TABLE
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, code)| *code)
}

/// Operating mode for a mode code
pub fn mode_from_code(code: u8) -> Option<OperatingMode> {
    MODE_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(mode, _)| *mode)
}

/// Scale a 0-255 device level to a percentage
pub fn byte_to_percent(value: u16) -> u8 {
    let value = u32::from(value.min(255));
    ((value * 100 + 127) / 255) as u8
}

/// Scale a percentage to a 0-255 device level
pub fn percent_to_byte(percent: u8) -> u16 {
    let percent = u32::from(percent.min(100));
    ((percent * 255 + 50) / 100) as u16
}

/// Decode a 3-digit level from its hundreds byte and tens/units byte
pub fn decode_level(hundreds: u8, tens_units: u8) -> u16 {
    u16::from(hundreds & 0x0F) * 100
        + u16::from(tens_units >> 4) * 10
        + u16::from(tens_units & 0x0F)
}

/// Encode a 0-255 level as its hundreds byte and tens/units byte
pub fn encode_level(value: u16) -> Result<[u8; 2], ParseError> {
    let d = bcd::encode(i64::from(value), 255)?;
    Ok([d[0], bcd::pack_pair(d[1], d[2])])
}

/// Speech processor level byte for a percentage (0-9 in tens, 0x10 for full)
pub fn speech_level_byte(percent: u8) -> u8 {
    match percent / 10 {
        level if level >= 10 => 0x10,
        level => level,
    }
}

/// Percentage for a speech processor level byte
pub fn speech_level_percent(byte: u8) -> u8 {
    if byte >= 0x10 {
        100
    } else {
        byte.saturating_mul(10)
    }
}

/// Duplex sub-command for a repeater shift
pub fn shift_subcommand(shift: RepeaterShift) -> u8 {
    match shift {
        RepeaterShift::Simplex => 0x10,
        RepeaterShift::Minus => 0x11,
        RepeaterShift::Plus => 0x12,
    }
}

/// Offset register for the band containing `frequency_hz`
pub fn repeater_register(frequency_hz: u64) -> u8 {
    match frequency_hz {
        f if f < 50_000_000 => 0x55,
        f if f < 144_000_000 => 0x56,
        f if f < 430_000_000 => 0x57,
        _ => 0x58,
    }
}

/// Encode a non-zero repeater offset: BCD(|offset| / 100) least significant
/// pair first, then a sign byte (1 = minus)
pub fn encode_repeater_offset(offset_hz: i64) -> Result<[u8; 4], ParseError> {
    if offset_hz.unsigned_abs() > MAX_REPEATER_OFFSET_HZ.unsigned_abs() {
        return Err(ParseError::OutOfRange {
            what: "repeater offset",
            value: offset_hz,
            min: -MAX_REPEATER_OFFSET_HZ,
            max: MAX_REPEATER_OFFSET_HZ,
        });
    }
    let d = bcd::encode(offset_hz / 100, 999_999)?;
    Ok([
        bcd::pack_pair(d[4], d[5]),
        bcd::pack_pair(d[2], d[3]),
        bcd::pack_pair(d[0], d[1]),
        u8::from(offset_hz < 0),
    ])
}

/// Tone and tone-squelch enable bytes for a tone mode
pub fn tone_enables(mode: ToneMode) -> (u8, u8) {
    match mode {
        ToneMode::Off => (0, 0),
        ToneMode::Encode => (1, 0),
        ToneMode::Decode => (1, 1),
    }
}

/// Encode a CTCSS tone (tenths of a hertz) as the 3-byte tone payload
pub fn encode_tone(tenths_hz: u64) -> Result<[u8; 3], ParseError> {
    let (min, max) = CTCSS_TENTHS_RANGE;
    if !(min..=max).contains(&tenths_hz) {
        return Err(ParseError::OutOfRange {
            what: "CTCSS tone",
            value: tenths_hz as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    let d = bcd::encode(tenths_hz as i64, max as i64)?;
    Ok([0x00, bcd::pack_pair(d[0], d[1]), bcd::pack_pair(d[2], d[3])])
}

/// Pack the first `len` digits of `s` two per byte (`"2024"` -> `20 24`)
pub fn pack_clock_digits(s: &str, len: usize) -> Result<Vec<u8>, ParseError> {
    let head = s.get(..len).unwrap_or(s);
    bcd::from_digit_string(head, len).map(|digits| bcd::pack(&digits))
}

/// Render packed clock bytes back to their digit string
pub fn unpack_clock_digits(bytes: &[u8]) -> Result<String, ParseError> {
    bcd::unpack(bytes).map(|digits| bcd::to_digit_string(&digits))
}

/// Known Icom radio addresses
pub const ADDRESS_TABLE: &[(&str, u8)] = &[
    ("IC-703", 0x68),
    ("IC-706", 0x48),
    ("IC-706MKII", 0x4E),
    ("IC-718", 0x5E),
    ("IC-725", 0x28),
    ("IC-728", 0x38),
    ("IC-729", 0x3A),
    ("IC-735", 0x04),
    ("IC-736", 0x40),
    ("IC-737", 0x3C),
    ("IC-738", 0x44),
    ("IC-746", 0x56),
    ("IC-746PRO", 0x66),
    ("IC-751", 0x1C),
    ("IC-765", 0x2C),
    ("IC-775", 0x46),
    ("IC-781", 0x26),
    ("IC-7000", 0x70),
    ("IC-7100", 0x88),
    ("IC-7200", 0x76),
    ("IC-7300", 0x94),
    ("IC-7600", 0x7A),
    ("IC-7610", 0x98),
    ("IC-7700", 0x74),
    ("IC-7800", 0x6A),
];

/// Default CI-V address for a model name (case-insensitive)
pub fn address_for(model: &str) -> Option<u8> {
    ADDRESS_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(model))
        .map(|(_, addr)| *addr)
}

/// Parse a CI-V address given as hex (`70`, `0x70`)
pub fn parse_address(s: &str) -> Result<u8, ParseError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IC7000: u8 = 0x70;

    #[test]
    fn test_encode_frame() {
        let frame = CivFrame::new(IC7000, CivCommand::Function)
            .sub(&[function::NOISE_BLANKER])
            .data(&[0x01]);
        assert_eq!(
            frame.encode(),
            vec![0xFE, 0xFE, 0x70, 0xE0, 0x16, 0x22, 0x01, 0xFD]
        );
        assert_eq!(
            CivFrame::new(IC7000, CivCommand::ReadFrequency).encode(),
            vec![0xFE, 0xFE, 0x70, 0xE0, 0x03, 0xFD]
        );
    }

    #[test]
    fn test_reply_len_with_echo() {
        assert_eq!(reply_len(6, 5, false), 11);
        assert_eq!(reply_len(6, 5, true), 17);
        assert_eq!(reply_len(11, 0, true), 17);
    }

    #[test]
    fn test_extract_frequency_payload() {
        let request = CivFrame::new(IC7000, CivCommand::ReadFrequency).encode();
        let mut reply = request.clone();
        reply.extend_from_slice(&[0xFE, 0xFE, 0xE0, 0x70, 0x03, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]);
        let data = extract_payload(&reply, request.len(), 5, true).unwrap();
        assert_eq!(decode_frequency(&data).unwrap(), 14_250_000);
    }

    #[test]
    fn test_extract_short_reply() {
        let reply = [0xFE, 0xFE, 0xE0, 0x70, 0x03, 0x00, 0x00];
        assert!(matches!(
            extract_payload(&reply, 6, 5, false),
            Err(CatError::Incomplete {
                expected: 11,
                received: 7
            })
        ));
    }

    #[test]
    fn test_extract_unterminated() {
        let reply = [0xFE, 0xFE, 0xE0, 0x70, 0xFB, 0x00];
        assert!(matches!(
            extract_payload(&reply, 6, 0, false),
            Err(CatError::Unterminated)
        ));
    }

    #[test]
    fn test_extract_ng() {
        let reply = [0xFE, 0xFE, 0xE0, 0x70, 0xFA, 0xFD];
        assert!(matches!(
            extract_payload(&reply, 7, 0, false),
            Err(CatError::Rejected(_))
        ));
        assert!(matches!(
            extract_payload(&reply, 6, 5, false),
            Err(CatError::Rejected(_))
        ));
        let ok = [0xFE, 0xFE, 0xE0, 0x70, 0xFB, 0xFD];
        assert_eq!(extract_payload(&ok, 7, 0, false).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_frequency_range() {
        assert_eq!(
            encode_frequency(7_074_000).unwrap(),
            vec![0x00, 0x40, 0x07, 0x07, 0x00]
        );
        assert!(encode_frequency(99_999).is_err());
        assert!(encode_frequency(450_000_001).is_err());
        assert!(encode_frequency(450_000_000).is_ok());
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!(mode_code(OperatingMode::DataUsb, false), Some(0x01));
        assert_eq!(mode_code(OperatingMode::DataUsb, true), None);
        assert_eq!(mode_code(OperatingMode::DataFm, false), Some(0x05));
        assert_eq!(mode_code(OperatingMode::CwR, false), Some(0x07));
        assert_eq!(mode_code(OperatingMode::C4fm, false), None);
        assert_eq!(mode_from_code(0x08), Some(OperatingMode::RttyR));
        assert_eq!(mode_from_code(0x06), None);
    }

    #[test]
    fn test_percent_scaling() {
        assert_eq!(byte_to_percent(0), 0);
        assert_eq!(byte_to_percent(255), 100);
        assert_eq!(byte_to_percent(128), 50);
        assert_eq!(percent_to_byte(0), 0);
        assert_eq!(percent_to_byte(100), 255);
        assert_eq!(percent_to_byte(50), 128);
    }

    #[test]
    fn test_level_fields() {
        assert_eq!(encode_level(128).unwrap(), [0x01, 0x28]);
        assert_eq!(decode_level(0x01, 0x28), 128);
        assert_eq!(decode_level(0x02, 0x55), 255);
    }

    #[test]
    fn test_speech_level() {
        assert_eq!(speech_level_byte(0), 0);
        assert_eq!(speech_level_byte(55), 5);
        assert_eq!(speech_level_byte(100), 0x10);
        assert_eq!(speech_level_percent(0x10), 100);
        assert_eq!(speech_level_percent(3), 30);
    }

    #[test]
    fn test_repeater_offset() {
        // 600 kHz -> 6000 hundreds of Hz -> digits 006000
        assert_eq!(encode_repeater_offset(-600_000).unwrap(), [0x00, 0x60, 0x00, 0x01]);
        assert_eq!(encode_repeater_offset(5_000_000).unwrap(), [0x00, 0x00, 0x05, 0x00]);
        assert!(encode_repeater_offset(10_000_000).is_err());
        assert!(encode_repeater_offset(i64::MIN).is_err());
        assert_eq!(encode_repeater_offset(-9_999_999).unwrap(), [0x99, 0x99, 0x09, 0x01]);
        assert_eq!(repeater_register(14_000_000), 0x55);
        assert_eq!(repeater_register(50_100_000), 0x56);
        assert_eq!(repeater_register(146_520_000), 0x57);
        assert_eq!(repeater_register(446_000_000), 0x58);
    }

    #[test]
    fn test_tone_encoding() {
        assert_eq!(encode_tone(1318).unwrap(), [0x00, 0x13, 0x18]);
        assert_eq!(encode_tone(670).unwrap(), [0x00, 0x06, 0x70]);
        assert!(encode_tone(669).is_err());
        assert_eq!(tone_enables(ToneMode::Decode), (1, 1));
    }

    #[test]
    fn test_clock_digits() {
        assert_eq!(pack_clock_digits("20240131", 4).unwrap(), vec![0x20, 0x24]);
        assert_eq!(pack_clock_digits("123045", 4).unwrap(), vec![0x12, 0x30]);
        assert!(pack_clock_digits("12", 4).is_err());
        assert_eq!(unpack_clock_digits(&[0x01, 0x31]).unwrap(), "0131");
    }

    #[test]
    fn test_address_table() {
        assert_eq!(address_for("IC-7000"), Some(0x70));
        assert_eq!(address_for("ic-7300"), Some(0x94));
        assert_eq!(address_for("IC-9700"), None);
        assert_eq!(parse_address("0x70").unwrap(), 0x70);
        assert_eq!(parse_address("94").unwrap(), 0x94);
        assert!(parse_address("zz").is_err());
    }
}
