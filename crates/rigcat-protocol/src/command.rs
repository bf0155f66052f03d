//! Vendor-neutral command and response representation
//!
//! Clients speak in text: a command name plus arguments (`FREQ 7074000`)
//! in, one response string out. This module holds the parsed forms and
//! the closed token sets shared by every vendor codec.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Operating modes a client may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatingMode {
    /// Lower Sideband
    Lsb,
    /// Upper Sideband
    Usb,
    /// Continuous Wave
    Cw,
    /// CW Reverse
    CwR,
    /// Amplitude Modulation
    Am,
    /// AM Narrow
    AmN,
    /// Frequency Modulation
    Fm,
    /// FM Narrow
    FmN,
    /// FM Wide (broadcast)
    FmW,
    /// Yaesu System Fusion digital voice
    C4fm,
    /// RTTY
    Rtty,
    /// RTTY Reverse
    RttyR,
    /// Digital (FT-817 DIG)
    Digi,
    /// Packet
    Pkt,
    /// Data mode (generic)
    Data,
    /// Data on upper sideband
    DataUsb,
    /// Data on lower sideband
    DataLsb,
    /// Data on FM
    DataFm,
}

impl OperatingMode {
    /// Every mode, in display order
    pub const ALL: [OperatingMode; 18] = [
        Self::Lsb,
        Self::Usb,
        Self::Cw,
        Self::CwR,
        Self::Am,
        Self::AmN,
        Self::Fm,
        Self::FmN,
        Self::FmW,
        Self::C4fm,
        Self::Rtty,
        Self::RttyR,
        Self::Digi,
        Self::Pkt,
        Self::Data,
        Self::DataUsb,
        Self::DataLsb,
        Self::DataFm,
    ];

    /// Canonical token used on the command surface
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lsb => "LSB",
            Self::Usb => "USB",
            Self::Cw => "CW",
            Self::CwR => "CW-R",
            Self::Am => "AM",
            Self::AmN => "AM-N",
            Self::Fm => "FM",
            Self::FmN => "FM-N",
            Self::FmW => "FM-W",
            Self::C4fm => "C4FM",
            Self::Rtty => "RTTY",
            Self::RttyR => "RTTY-R",
            Self::Digi => "DIGI",
            Self::Pkt => "PKT",
            Self::Data => "DATA",
            Self::DataUsb => "DATA-USB",
            Self::DataLsb => "DATA-LSB",
            Self::DataFm => "DATA-FM",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParseError::InvalidMode(token.to_string()))
    }
}

/// VFO selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vfo {
    /// VFO A
    #[default]
    A,
    /// VFO B
    B,
}

impl Vfo {
    /// Single-letter token
    pub fn as_str(&self) -> &'static str {
        match self {
            Vfo::A => "A",
            Vfo::B => "B",
        }
    }
}

impl fmt::Display for Vfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vfo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Vfo::A),
            "B" => Ok(Vfo::B),
            other => Err(ParseError::InvalidVfo(other.to_string())),
        }
    }
}

/// How the transmitter is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum PttMethod {
    /// Keying disabled
    #[default]
    None,
    /// CAT command to the radio
    Cat,
    /// Serial DTR line
    Dtr,
    /// Serial RTS line
    Rts,
}

impl PttMethod {
    /// Token used on the command surface
    pub fn as_str(&self) -> &'static str {
        match self {
            PttMethod::None => "NONE",
            PttMethod::Cat => "CAT",
            PttMethod::Dtr => "DTR",
            PttMethod::Rts => "RTS",
        }
    }
}

impl fmt::Display for PttMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PttMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(PttMethod::None),
            "CAT" => Ok(PttMethod::Cat),
            "DTR" => Ok(PttMethod::Dtr),
            "RTS" => Ok(PttMethod::Rts),
            other => Err(ParseError::InvalidPttMethod(other.to_string())),
        }
    }
}

/// CTCSS tone mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToneMode {
    /// No tone
    Off,
    /// Tone on transmit
    Encode,
    /// Tone on transmit, tone squelch on receive
    Decode,
}

impl FromStr for ToneMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(ToneMode::Off),
            "ENC" => Ok(ToneMode::Encode),
            "DEC" => Ok(ToneMode::Decode),
            other => Err(ParseError::InvalidTone(other.to_string())),
        }
    }
}

/// Repeater shift direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeaterShift {
    /// Transmit below the receive frequency
    Minus,
    /// Transmit above the receive frequency
    Plus,
    /// No offset
    Simplex,
}

impl RepeaterShift {
    /// Shift direction implied by a signed offset
    pub fn for_offset(offset_hz: i64) -> Self {
        match offset_hz {
            0 => RepeaterShift::Simplex,
            o if o < 0 => RepeaterShift::Minus,
            _ => RepeaterShift::Plus,
        }
    }
}

/// Parse an `ON`/`OFF` token
pub fn parse_on_off(s: &str) -> Result<bool, ParseError> {
    match s.trim().to_ascii_uppercase().as_str() {
        "ON" => Ok(true),
        "OFF" => Ok(false),
        other => Err(ParseError::InvalidOnOff(other.to_string())),
    }
}

/// Render a flag as `ON`/`OFF`
pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

/// Parse a non-negative decimal argument (digits only, no sign)
pub fn parse_unsigned(s: &str) -> Result<u64, ParseError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }
    s.parse()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

/// Parse a signed decimal argument
pub fn parse_signed(s: &str) -> Result<i64, ParseError> {
    let s = s.trim();
    s.parse()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

/// Parse a percentage argument in 0..=100
pub fn parse_percent(s: &str) -> Result<u8, ParseError> {
    parse_bounded(s, "level", 0, 100).map(|v| v as u8)
}

/// Parse an unsigned argument and check it against an inclusive range
pub fn parse_bounded(s: &str, what: &'static str, min: u64, max: u64) -> Result<u64, ParseError> {
    let value = parse_unsigned(s)?;
    if value < min || value > max {
        return Err(ParseError::OutOfRange {
            what,
            value: value as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(value)
}

/// One client request: an upper-cased name and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    /// Build a command; the name is upper-cased
    pub fn new<S: AsRef<str>>(name: &str, args: &[S]) -> Self {
        Self {
            name: name.trim().to_ascii_uppercase(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
        }
    }

    /// Command without arguments
    pub fn bare(name: &str) -> Self {
        Self::new::<&str>(name, &[])
    }

    /// Split a command line on whitespace; `None` for a blank line
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let name = words.next()?;
        let args: Vec<&str> = words.collect();
        Some(Self::new(name, &args))
    }

    /// Upper-cased command name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All arguments as given
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Argument `index`, trimmed, or `""` when absent
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(|a| a.trim()).unwrap_or("")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Textual reply to a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Set operation succeeded
    Ok,
    /// Command recognised but failed
    Error,
    /// No handler recognises the command name
    NotFound,
    /// Command-specific value
    Value(String),
}

impl Response {
    /// Wire token for this response
    pub fn as_str(&self) -> &str {
        match self {
            Response::Ok => "OK",
            Response::Error => "ERROR",
            Response::NotFound => "NOT FOUND",
            Response::Value(v) => v,
        }
    }

    /// Build a value response
    pub fn value(v: impl Into<String>) -> Self {
        Response::Value(v.into())
    }

    /// Returns true for anything other than `ERROR` and `NOT FOUND`
    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Error | Response::NotFound)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a frequency the way every `FREQ` get replies: 9 digits, zero-filled
pub fn format_frequency(hz: u64) -> String {
    format!("{hz:09}")
}
