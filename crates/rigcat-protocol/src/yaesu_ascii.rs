//! Yaesu ASCII CAT Protocol Implementation
//!
//! Modern Yaesu radios (FT-991, FT-991A, FTDX series) use an ASCII
//! protocol of 2-3 letter mnemonics with fixed-width numeric fields,
//! terminated by `;`.
//!
//! - Set: mnemonic plus value, `FA007074000;`. The radio answers nothing
//!   on success.
//! - Get: bare mnemonic, `FA;`. The radio echoes the mnemonic with the
//!   current value, `FA007074000;`.
//! - Reject: the radio answers `?;` to anything it refuses.
//!
//! # References
//! - [FT-991A CAT Manual](https://yaesu.com/Files/4CB893D7-1018-01AF-FA97E9E9AD48B50C/FT-991A_CAT_OM_ENG_1711-D.pdf)

use crate::bcd;
use crate::command::{format_frequency, on_off, OperatingMode, Response, ToneMode};
use crate::error::{CatError, CatResult, ParseError};

/// Reject token sent by the radio
pub const REJECT: &str = "?;";

/// Bytes to read after a set command (room for a reject)
pub const SET_REPLY_LEN: usize = 2;

/// Yaesu ASCII frequency digit count (9 digits = 1 Hz resolution up to 999 MHz)
const FREQ_DIGITS: usize = 9;

/// IF shift limit in Hz
pub const MAX_IF_SHIFT_HZ: i64 = 1_000;

/// Highest IF width index
pub const MAX_IF_WIDTH: u8 = 21;

/// RF power limits in watts (percent of 100 W)
pub const RF_POWER_RANGE: (u8, u8) = (5, 100);

/// Yaesu ASCII protocol command
///
/// `None` payloads are queries; `Some` payloads are sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YaesuAsciiCommand {
    /// VFO A frequency: FA007074000;
    FrequencyA(Option<u64>),
    /// VFO B frequency: FB007074000;
    FrequencyB(Option<u64>),
    /// Clock date, YYYYMMDD: DT020240131;
    Date(Option<String>),
    /// Clock time, HHMMSS: DT1123000;
    Time(Option<String>),
    /// IF narrow filter: NA00; / NA01;
    Narrow(Option<bool>),
    /// IF shift in Hz: IS0+0100;
    IfShift(Option<i64>),
    /// IF width index: SH015;
    IfWidth(Option<u8>),
    /// Dial lock: LK0; / LK1;
    Lock(Option<bool>),
    /// Main receiver mode: MD02;
    Mode(Option<OperatingMode>),
    /// RF power: PC050;
    RfPower(Option<u8>),
    /// Monitor enable: ML0001;
    MonitorEnable(Option<bool>),
    /// Monitor level: ML1050;
    MonitorLevel(Option<u8>),
    /// Speech processor enable: PR01;
    ProcessorEnable(Option<bool>),
    /// Speech processor level: PL050;
    ProcessorLevel(Option<u8>),
    /// Split (transmit on VFO B): FT3; on, FT2; off
    Split(Option<bool>),
    /// Swap VFO A and B: SV;
    SwapVfo,
    /// Transmit: TX1; / TX0;
    Transmit(Option<bool>),
    /// CTCSS mode: CT00; off, CT02; encode, CT01; decode
    ToneMode(ToneMode),
    /// CTCSS tone by table code: CN00012;
    ToneCode(u8),
}

/// Classified radio reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiReply<'a> {
    /// Nothing came back: the set was accepted
    Accepted,
    /// `?;`
    Rejected,
    /// Any other text, normally an answer to a query
    Answer(&'a str),
}

/// Sort a raw reply into accepted / rejected / answer
pub fn classify(reply: &str) -> AsciiReply<'_> {
    match reply {
        "" => AsciiReply::Accepted,
        REJECT => AsciiReply::Rejected,
        other => AsciiReply::Answer(other),
    }
}

impl YaesuAsciiCommand {
    /// Returns true if this command asks for a value
    pub fn is_query(&self) -> bool {
        match self {
            Self::FrequencyA(v) | Self::FrequencyB(v) => v.is_none(),
            Self::Date(v) | Self::Time(v) => v.is_none(),
            Self::Narrow(v)
            | Self::Lock(v)
            | Self::MonitorEnable(v)
            | Self::ProcessorEnable(v)
            | Self::Split(v)
            | Self::Transmit(v) => v.is_none(),
            Self::IfShift(v) => v.is_none(),
            Self::IfWidth(v)
            | Self::RfPower(v)
            | Self::MonitorLevel(v)
            | Self::ProcessorLevel(v) => v.is_none(),
            Self::Mode(v) => v.is_none(),
            Self::SwapVfo | Self::ToneMode(_) | Self::ToneCode(_) => false,
        }
    }

    /// Bytes to read back for this command
    pub fn reply_len(&self) -> usize {
        if !self.is_query() {
            return SET_REPLY_LEN;
        }
        match self {
            Self::FrequencyA(_) | Self::FrequencyB(_) => 3 + FREQ_DIGITS,
            Self::Date(_) => 12,
            Self::Time(_) => 10,
            Self::Narrow(_) | Self::Mode(_) | Self::ProcessorEnable(_) => 5,
            Self::IfShift(_) => 9,
            Self::IfWidth(_) | Self::RfPower(_) | Self::ProcessorLevel(_) => 6,
            Self::MonitorEnable(_) | Self::MonitorLevel(_) => 7,
            Self::Lock(_) | Self::Split(_) | Self::Transmit(_) => 4,
            Self::SwapVfo | Self::ToneMode(_) | Self::ToneCode(_) => SET_REPLY_LEN,
        }
    }

    /// Encode to the wire string, validating set values
    pub fn encode(&self) -> Result<String, ParseError> {
        let wire = match self {
            Self::FrequencyA(None) => "FA;".to_string(),
            Self::FrequencyA(Some(hz)) => format!("FA{};", frequency_field(*hz)?),
            Self::FrequencyB(None) => "FB;".to_string(),
            Self::FrequencyB(Some(hz)) => format!("FB{};", frequency_field(*hz)?),
            Self::Date(None) => "DT0;".to_string(),
            Self::Date(Some(date)) => format!("DT0{};", digits_field(date, 8)?),
            Self::Time(None) => "DT1;".to_string(),
            Self::Time(Some(time)) => format!("DT1{};", digits_field(time, 6)?),
            Self::Narrow(None) => "NA0;".to_string(),
            Self::Narrow(Some(on)) => format!("NA0{};", u8::from(*on)),
            Self::IfShift(None) => "IS0;".to_string(),
            Self::IfShift(Some(hz)) => {
                check_range("IF shift", *hz, -MAX_IF_SHIFT_HZ, MAX_IF_SHIFT_HZ)?;
                format!("IS0{hz:+05};")
            }
            Self::IfWidth(None) => "SH0;".to_string(),
            Self::IfWidth(Some(width)) => {
                check_range("IF width", i64::from(*width), 0, i64::from(MAX_IF_WIDTH))?;
                format!("SH0{width:02};")
            }
            Self::Lock(None) => "LK;".to_string(),
            Self::Lock(Some(on)) => format!("LK{};", u8::from(*on)),
            Self::Mode(None) => "MD0;".to_string(),
            Self::Mode(Some(mode)) => {
                let code =
                    mode_char(*mode).ok_or_else(|| ParseError::InvalidMode(mode.to_string()))?;
                format!("MD0{code};")
            }
            Self::RfPower(None) => "PC;".to_string(),
            Self::RfPower(Some(watts)) => {
                let (min, max) = RF_POWER_RANGE;
                check_range("RF power", i64::from(*watts), i64::from(min), i64::from(max))?;
                format!("PC{watts:03};")
            }
            Self::MonitorEnable(None) => "ML0;".to_string(),
            Self::MonitorEnable(Some(on)) => format!("ML000{};", u8::from(*on)),
            Self::MonitorLevel(None) => "ML1;".to_string(),
            Self::MonitorLevel(Some(level)) => format!("ML1{:03};", percent(*level)?),
            Self::ProcessorEnable(None) => "PR0;".to_string(),
            Self::ProcessorEnable(Some(on)) => format!("PR0{};", u8::from(*on)),
            Self::ProcessorLevel(None) => "PL;".to_string(),
            Self::ProcessorLevel(Some(level)) => format!("PL{:03};", percent(*level)?),
            Self::Split(None) => "FT;".to_string(),
            Self::Split(Some(true)) => "FT3;".to_string(),
            Self::Split(Some(false)) => "FT2;".to_string(),
            Self::SwapVfo => "SV;".to_string(),
            Self::Transmit(None) => "TX;".to_string(),
            Self::Transmit(Some(on)) => format!("TX{};", u8::from(*on)),
            Self::ToneMode(ToneMode::Off) => "CT00;".to_string(),
            Self::ToneMode(ToneMode::Encode) => "CT02;".to_string(),
            Self::ToneMode(ToneMode::Decode) => "CT01;".to_string(),
            Self::ToneCode(code) => {
                check_range("CTCSS code", i64::from(*code), 0, CTCSS_TONES.len() as i64 - 1)?;
                format!("CN00{code:03};")
            }
        };
        Ok(wire)
    }

    /// Turn the radio's reply into a response
    ///
    /// Sets map an empty reply to `OK`. Queries extract their value field
    /// and normalise it (`FA007074000;` -> `007074000`, `MD02;` -> `USB`).
    pub fn interpret(&self, reply: &str) -> CatResult<Response> {
        match classify(reply) {
            AsciiReply::Rejected => Err(CatError::Rejected(REJECT.to_string())),
            AsciiReply::Accepted if self.is_query() => Err(CatError::Incomplete {
                expected: self.reply_len(),
                received: 0,
            }),
            AsciiReply::Accepted => Ok(Response::Ok),
            AsciiReply::Answer(text) if self.is_query() => {
                self.parse_answer(text).map(Response::Value)
            }
            AsciiReply::Answer(text) => Err(CatError::UnexpectedReply(text.to_string())),
        }
    }

    fn parse_answer(&self, text: &str) -> CatResult<String> {
        let value = match self {
            Self::FrequencyA(_) => field(text, "FA", 2, 2 + FREQ_DIGITS),
            Self::FrequencyB(_) => field(text, "FB", 2, 2 + FREQ_DIGITS),
            Self::Date(_) => field(text, "DT0", 3, 11),
            Self::Time(_) => field(text, "DT1", 3, 9),
            Self::IfShift(_) => field(text, "IS0", 3, 8),
            Self::IfWidth(_) => field(text, "SH0", 3, 5),
            Self::RfPower(_) => field(text, "PC", 2, 5),
            Self::MonitorLevel(_) => field(text, "ML1", 3, 6),
            Self::ProcessorLevel(_) => field(text, "PL", 2, 5),
            Self::Narrow(_) => flag(text, "NA00;", "NA01;"),
            Self::MonitorEnable(_) => flag(text, "ML0000;", "ML0001;"),
            Self::ProcessorEnable(_) => flag(text, "PR00;", "PR01;"),
            Self::Split(_) => flag(text, "FT0;", "FT1;"),
            Self::Transmit(_) => match text {
                "TX0;" => Some(on_off(false).to_string()),
                "TX1;" | "TX2;" => Some(on_off(true).to_string()),
                _ => None,
            },
            Self::Lock(_) => match field(text, "LK", 2, 3).as_deref() {
                Some("0") => Some(on_off(false).to_string()),
                Some("1") => Some(on_off(true).to_string()),
                _ => None,
            },
            Self::Mode(_) => field(text, "MD0", 3, 4)
                .and_then(|c| c.chars().next())
                .and_then(mode_from_char)
                .map(|mode| mode.as_str().to_string()),
            Self::SwapVfo | Self::ToneMode(_) | Self::ToneCode(_) => None,
        };
        value.ok_or_else(|| CatError::UnexpectedReply(text.to_string()))
    }
}

fn frequency_field(hz: u64) -> Result<String, ParseError> {
    if hz >= 10u64.pow(FREQ_DIGITS as u32) {
        return Err(ParseError::BcdOverflow {
            value: hz,
            width: FREQ_DIGITS,
        });
    }
    Ok(format_frequency(hz))
}

fn digits_field(value: &str, len: usize) -> Result<String, ParseError> {
    bcd::from_digit_string(value.trim(), len).map(|digits| bcd::to_digit_string(&digits))
}

fn percent(level: u8) -> Result<u8, ParseError> {
    check_range("level", i64::from(level), 0, 100)?;
    Ok(level)
}

fn check_range(what: &'static str, value: i64, min: i64, max: i64) -> Result<(), ParseError> {
    if value < min || value > max {
        return Err(ParseError::OutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Slice `text[start..end]` when it starts with `prefix`
fn field(text: &str, prefix: &str, start: usize, end: usize) -> Option<String> {
    if !text.starts_with(prefix) {
        return None;
    }
    text.get(start..end).map(str::to_string)
}

fn flag(text: &str, off: &str, on: &str) -> Option<String> {
    if text == off {
        Some(on_off(false).to_string())
    } else if text == on {
        Some(on_off(true).to_string())
    } else {
        None
    }
}

/// Mode characters used by MD0
const MODE_TABLE: [(OperatingMode, char); 14] = [
    (OperatingMode::Lsb, '1'),
    (OperatingMode::Usb, '2'),
    (OperatingMode::Cw, '3'),
    (OperatingMode::Fm, '4'),
    (OperatingMode::Am, '5'),
    (OperatingMode::Rtty, '6'),
    (OperatingMode::CwR, '7'),
    (OperatingMode::DataLsb, '8'),
    (OperatingMode::RttyR, '9'),
    (OperatingMode::DataFm, 'A'),
    (OperatingMode::FmN, 'B'),
    (OperatingMode::DataUsb, 'C'),
    (OperatingMode::AmN, 'D'),
    (OperatingMode::C4fm, 'E'),
];

/// Mode character for an operating mode
pub fn mode_char(mode: OperatingMode) -> Option<char> {
    MODE_TABLE
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, c)| *c)
}

/// Operating mode for a mode character
pub fn mode_from_char(c: char) -> Option<OperatingMode> {
    let c = c.to_ascii_uppercase();
    MODE_TABLE
        .iter()
        .find(|(_, mc)| *mc == c)
        .map(|(mode, _)| *mode)
}

/// CTCSS tones in tenths of a hertz; the index is the radio's tone code
pub const CTCSS_TONES: [u16; 50] = [
    670, 693, 719, 744, 770, 797, 825, 854, 885, 915, //
    948, 974, 1000, 1035, 1072, 1109, 1148, 1188, 1230, 1273, //
    1318, 1365, 1413, 1462, 1514, 1567, 1598, 1622, 1655, 1679, //
    1713, 1738, 1773, 1799, 1835, 1862, 1899, 1928, 1966, 1995, //
    2035, 2065, 2107, 2181, 2257, 2291, 2336, 2418, 2503, 2541,
];

/// Tone code for a CTCSS frequency in tenths of a hertz
pub fn ctcss_code(tenths_hz: u64) -> Option<u8> {
    CTCSS_TONES
        .iter()
        .position(|&t| u64::from(t) == tenths_hz)
        .map(|idx| idx as u8)
}
