//! Vendor codec capability interface
//!
//! A codec turns vendor-neutral commands into one radio family's wire
//! transactions. The router owns the transport and the session and lends
//! both to the codec for the duration of one command through a [`Link`].

use rigcat_protocol::command::{parse_on_off, parse_unsigned};
use rigcat_protocol::transport;
use rigcat_protocol::{
    CatResult, Command, OperatingMode, ParseError, Protocol, PttMethod, Response, RigModel,
    Transport,
};

use crate::civ::CivCodec;
use crate::error::RigError;
use crate::ft817::Ft817Codec;
use crate::ft991::Ft991Codec;
use crate::session::Session;

/// Transport plus shadow state, borrowed for one command
pub struct Link<'a> {
    pub transport: &'a mut dyn Transport,
    pub session: &'a mut Session,
}

impl<'a> Link<'a> {
    pub fn new(transport: &'a mut dyn Transport, session: &'a mut Session) -> Self {
        Self { transport, session }
    }

    /// Write `request` without reading a reply
    pub fn send(&mut self, request: &[u8]) -> CatResult<()> {
        transport::send(&mut *self.transport, request)
    }

    /// Write `request` and read up to `max_reply` bytes
    pub fn exchange(&mut self, request: &[u8], max_reply: usize) -> CatResult<Vec<u8>> {
        transport::exchange(&mut *self.transport, request, max_reply)
    }

    /// Write `request` and require exactly `len` reply bytes
    pub fn exchange_exact(&mut self, request: &[u8], len: usize) -> CatResult<Vec<u8>> {
        transport::exchange_exact(&mut *self.transport, request, len)
    }
}

/// One radio family's command set
pub trait VendorCodec: Send {
    /// Family name for logs
    fn name(&self) -> &'static str;

    /// Put the session into the family's starting state
    fn init(&self, link: &mut Link<'_>) {
        link.session.ptt_method = PttMethod::Cat;
    }

    /// Handle a vendor command
    ///
    /// Returns `None` when the name is not part of this family's command
    /// set, so the router can answer `NOT FOUND`.
    fn dispatch(&self, link: &mut Link<'_>, cmd: &Command) -> Option<CatResult<Response>>;

    /// Key, unkey (`Some`) or query (`None`) the transmitter over CAT
    ///
    /// The router updates the shadow PTT state after a successful set.
    fn ptt(&self, link: &mut Link<'_>, on: Option<bool>) -> CatResult<Response>;

    /// Program both VFOs and the split state in one go
    fn setup_split(&self, link: &mut Link<'_>, plan: &SplitPlan) -> CatResult<()>;
}

/// Arguments of a split setup
///
/// A zero frequency or a missing mode leaves that setting alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitPlan {
    pub vfo_a_hz: u64,
    pub mode_a: Option<OperatingMode>,
    pub split: bool,
    pub vfo_b_hz: u64,
    pub mode_b: Option<OperatingMode>,
}

impl SplitPlan {
    /// Parse `<vfoa_hz> <modea> <ON|OFF> [<vfob_hz> [<modeb>]]`
    ///
    /// `0` skips a frequency and `-` skips a mode.
    pub fn parse(cmd: &Command) -> Result<Self, ParseError> {
        if cmd.args().len() < 3 {
            return Err(ParseError::InvalidArgument(format!(
                "{} needs <vfoa_hz> <modea> <ON|OFF>",
                cmd.name()
            )));
        }
        let vfo_b_hz = match cmd.arg(3) {
            "" => 0,
            hz => parse_unsigned(hz)?,
        };
        Ok(Self {
            vfo_a_hz: parse_unsigned(cmd.arg(0))?,
            mode_a: optional_mode(cmd.arg(1))?,
            split: parse_on_off(cmd.arg(2))?,
            vfo_b_hz,
            mode_b: optional_mode(cmd.arg(4))?,
        })
    }

    /// Validate every step against `model` before anything is sent
    pub(crate) fn check(
        &self,
        model: &RigModel,
        mode_supported: impl Fn(OperatingMode) -> bool,
    ) -> Result<(), ParseError> {
        for (hz, mode) in [(self.vfo_a_hz, self.mode_a), (self.vfo_b_hz, self.mode_b)] {
            if hz > 0 && !model.covers(hz) {
                return Err(ParseError::FrequencyOutOfRange {
                    hz,
                    min: model.min_frequency_hz,
                    max: model.max_frequency_hz,
                });
            }
            if let Some(mode) = mode.filter(|m| !mode_supported(*m)) {
                return Err(ParseError::InvalidMode(mode.to_string()));
            }
        }
        Ok(())
    }
}

fn optional_mode(token: &str) -> Result<Option<OperatingMode>, ParseError> {
    match token {
        "" | "-" => Ok(None),
        mode => mode.parse().map(Some),
    }
}

/// Codec construction overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    /// Override the model's echo default (CI-V)
    pub echo: Option<bool>,
    /// Override the model's CI-V address
    pub civ_address: Option<u8>,
}

/// Build the codec for `model`
pub fn create_codec(
    model: &RigModel,
    options: &CodecOptions,
) -> Result<Box<dyn VendorCodec>, RigError> {
    let codec: Box<dyn VendorCodec> = match model.protocol {
        Protocol::YaesuBinary => Box::new(Ft817Codec::new(*model)),
        Protocol::YaesuAscii => Box::new(Ft991Codec::new(*model)),
        Protocol::IcomCiv => {
            let address = options
                .civ_address
                .or(model.civ_address)
                .ok_or_else(|| RigError::MissingAddress(model.name.to_string()))?;
            Box::new(CivCodec::new(
                *model,
                address,
                options.echo.unwrap_or(model.echo),
            ))
        }
    };
    Ok(codec)
}

/// Parse a frequency argument and check it against the model's range
pub(crate) fn parse_frequency(model: &RigModel, arg: &str) -> Result<u64, ParseError> {
    let hz = parse_unsigned(arg)?;
    if !model.covers(hz) {
        return Err(ParseError::FrequencyOutOfRange {
            hz,
            min: model.min_frequency_hz,
            max: model.max_frequency_hz,
        });
    }
    Ok(hz)
}

/// Mode argument, or `None` for a query
pub(crate) fn mode_arg(arg: &str) -> Result<Option<OperatingMode>, ParseError> {
    match arg {
        "" => Ok(None),
        mode => mode.parse().map(Some),
    }
}

/// ON/OFF argument, or `None` for a query
pub(crate) fn on_off_arg(arg: &str) -> Result<Option<bool>, ParseError> {
    match arg {
        "" => Ok(None),
        flag => parse_on_off(flag).map(Some),
    }
}

/// Join the two halves of a compound MONITOR/SPEECH result
pub(crate) fn compound(first: &str, second: CatResult<String>) -> Response {
    let second = second.unwrap_or_else(|_| Response::Error.as_str().to_string());
    Response::value(format!("{first}:{second}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigcat_protocol::RigDatabase;

    #[test]
    fn test_split_plan_parse() {
        let plan = SplitPlan::parse(&Command::new(
            "SETUP-SPLIT",
            &["14074000", "USB", "ON", "14076000", "DATA-USB"],
        ))
        .unwrap();
        assert_eq!(plan.vfo_a_hz, 14_074_000);
        assert_eq!(plan.mode_a, Some(OperatingMode::Usb));
        assert!(plan.split);
        assert_eq!(plan.vfo_b_hz, 14_076_000);
        assert_eq!(plan.mode_b, Some(OperatingMode::DataUsb));
    }

    #[test]
    fn test_split_plan_skips() {
        let plan =
            SplitPlan::parse(&Command::new("SETUP-SPLIT", &["0", "-", "off"])).unwrap();
        assert_eq!(plan, SplitPlan::default());
        assert!(SplitPlan::parse(&Command::new("SETUP-SPLIT", &["0", "-"])).is_err());
        assert!(SplitPlan::parse(&Command::new("SETUP-SPLIT", &["0", "XYZ", "ON"])).is_err());
    }

    #[test]
    fn test_split_plan_check() {
        let model = RigDatabase::find("FT-817").unwrap();
        let plan = SplitPlan {
            vfo_a_hz: 7_074_000,
            mode_a: Some(OperatingMode::Usb),
            split: true,
            vfo_b_hz: 0,
            mode_b: Some(OperatingMode::C4fm),
        };
        assert!(matches!(
            plan.check(&model, |mode| mode != OperatingMode::C4fm),
            Err(ParseError::InvalidMode(_))
        ));
        assert!(plan.check(&model, |_| true).is_ok());

        let out_of_range = SplitPlan {
            vfo_b_hz: 99_999,
            ..SplitPlan::default()
        };
        assert!(matches!(
            out_of_range.check(&model, |_| true),
            Err(ParseError::FrequencyOutOfRange { .. })
        ));
    }

    #[test]
    fn test_create_codec_per_family() {
        let options = CodecOptions::default();
        for (name, family) in [
            ("FT-817", "FT-817"),
            ("FT-991", "FT-991"),
            ("IC-7300", "CI-V"),
        ] {
            let model = RigDatabase::find(name).unwrap();
            assert_eq!(create_codec(&model, &options).unwrap().name(), family);
        }
    }

    #[test]
    fn test_civ_needs_address() {
        let mut model = RigDatabase::find("IC-7000").unwrap();
        model.civ_address = None;
        assert!(matches!(
            create_codec(&model, &CodecOptions::default()),
            Err(RigError::MissingAddress(_))
        ));
        let options = CodecOptions {
            civ_address: Some(0x70),
            ..CodecOptions::default()
        };
        assert!(create_codec(&model, &options).is_ok());
    }

    #[test]
    fn test_parse_frequency_range() {
        let model = RigDatabase::find("FT-991").unwrap();
        assert_eq!(parse_frequency(&model, "100000").unwrap(), 100_000);
        assert_eq!(parse_frequency(&model, "450000000").unwrap(), 450_000_000);
        assert!(matches!(
            parse_frequency(&model, "99999"),
            Err(ParseError::FrequencyOutOfRange { .. })
        ));
        assert!(parse_frequency(&model, "7.074").is_err());
    }

    #[test]
    fn test_compound() {
        assert_eq!(compound("ON", Ok("50".into())), Response::value("ON:50"));
        assert_eq!(
            compound("OK", Err(rigcat_protocol::CatError::Unterminated)),
            Response::value("OK:ERROR")
        );
    }
}
