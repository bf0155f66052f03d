//! FT-991 codec (ASCII mnemonics)

use rigcat_protocol::command::{parse_bounded, parse_percent, parse_signed, parse_unsigned};
use rigcat_protocol::yaesu_ascii::{self, YaesuAsciiCommand, MAX_IF_WIDTH, RF_POWER_RANGE};
use rigcat_protocol::{
    CatResult, Command, OperatingMode, ParseError, Response, RigModel, ToneMode,
};
use tracing::{debug, warn};

use crate::codec::{
    compound, mode_arg, on_off_arg, parse_frequency, Link, SplitPlan, VendorCodec,
};

/// ASCII-mnemonic Yaesu codec
pub struct Ft991Codec {
    model: RigModel,
}

impl Ft991Codec {
    pub fn new(model: RigModel) -> Self {
        Self { model }
    }

    /// Send one command and interpret the reply
    fn transact(&self, link: &mut Link<'_>, cmd: &YaesuAsciiCommand) -> CatResult<Response> {
        let wire = cmd.encode()?;
        let reply = link.exchange(wire.as_bytes(), cmd.reply_len())?;
        cmd.interpret(&String::from_utf8_lossy(&reply))
    }

    fn frequency(
        &self,
        link: &mut Link<'_>,
        cmd: fn(Option<u64>) -> YaesuAsciiCommand,
        arg: &str,
    ) -> CatResult<Response> {
        let hz = match arg {
            "" => None,
            hz => Some(parse_frequency(&self.model, hz)?),
        };
        self.transact(link, &cmd(hz))
    }

    fn set_frequency_a(&self, link: &mut Link<'_>, hz: u64) -> CatResult<Response> {
        if !self.model.covers(hz) {
            return Err(ParseError::FrequencyOutOfRange {
                hz,
                min: self.model.min_frequency_hz,
                max: self.model.max_frequency_hz,
            }
            .into());
        }
        self.transact(link, &YaesuAsciiCommand::FrequencyA(Some(hz)))
    }

    fn set_mode(&self, link: &mut Link<'_>, mode: OperatingMode) -> CatResult<Response> {
        self.transact(link, &YaesuAsciiCommand::Mode(Some(mode)))
    }

    /// MODE on VFO B: swap, operate on the front VFO, swap back
    fn mode_b(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let cmd = YaesuAsciiCommand::Mode(mode_arg(arg)?);
        cmd.encode()?;

        self.transact(link, &YaesuAsciiCommand::SwapVfo)?;
        let result = self.transact(link, &cmd);
        let restored = self.transact(link, &YaesuAsciiCommand::SwapVfo);
        if let Err(e) = &restored {
            warn!("could not swap VFOs back: {}", e);
        }
        let response = result?;
        restored?;
        Ok(response)
    }

    /// Enable flag plus level, reported as `<flag>:<level>`
    fn flag_and_level(
        &self,
        link: &mut Link<'_>,
        enable: fn(Option<bool>) -> YaesuAsciiCommand,
        level: fn(Option<u8>) -> YaesuAsciiCommand,
        flag_arg: &str,
        level_arg: &str,
    ) -> CatResult<Response> {
        let new_level = match level_arg {
            "" => None,
            value => Some(parse_percent(value)?),
        };

        match on_off_arg(flag_arg)? {
            None => {
                let flag = self.transact(link, &enable(None))?;
                let current = self
                    .transact(link, &level(None))
                    .map(|r| r.as_str().to_string());
                Ok(compound(flag.as_str(), current))
            }
            Some(on) => {
                self.transact(link, &enable(Some(on)))?;
                let applied = match new_level {
                    Some(value) => self.transact(link, &level(Some(value))),
                    None => Ok(Response::Ok),
                };
                Ok(compound(
                    Response::Ok.as_str(),
                    applied.map(|r| r.as_str().to_string()),
                ))
            }
        }
    }

    fn split(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let request = on_off_arg(arg)?;
        let response = self.transact(link, &YaesuAsciiCommand::Split(request))?;
        link.session.split = match request {
            Some(on) => on,
            None => response.as_str() == "ON",
        };
        Ok(response)
    }

    /// CT sets the tone mode, CN the tone by table code
    fn tone(&self, link: &mut Link<'_>, mode: &str, freq: &str) -> CatResult<Response> {
        let mode = mode.parse::<ToneMode>()?;
        let code = match mode {
            ToneMode::Off => None,
            ToneMode::Encode | ToneMode::Decode => {
                let tenths = parse_unsigned(freq)?;
                let code = yaesu_ascii::ctcss_code(tenths)
                    .ok_or_else(|| ParseError::InvalidTone(freq.to_string()))?;
                Some(code)
            }
        };
        self.transact(link, &YaesuAsciiCommand::ToneMode(mode))?;
        if let Some(code) = code {
            self.transact(link, &YaesuAsciiCommand::ToneCode(code))?;
        }
        Ok(Response::Ok)
    }

    fn optional<T>(
        arg: &str,
        parse: impl FnOnce(&str) -> Result<T, ParseError>,
    ) -> Result<Option<T>, ParseError> {
        match arg {
            "" => Ok(None),
            value => parse(value).map(Some),
        }
    }
}

impl VendorCodec for Ft991Codec {
    fn name(&self) -> &'static str {
        "FT-991"
    }

    fn dispatch(&self, link: &mut Link<'_>, cmd: &Command) -> Option<CatResult<Response>> {
        use YaesuAsciiCommand as Y;

        let arg = cmd.arg(0);
        let result = match cmd.name() {
            "DATE" => self.transact(link, &Y::Date(text_arg(arg))),
            "TIME" => self.transact(link, &Y::Time(text_arg(arg))),
            "FREQ" | "FREQA" => self.frequency(link, Y::FrequencyA, arg),
            "FREQB" => self.frequency(link, Y::FrequencyB, arg),
            "IF-NARROW" => on_off_arg(arg)
                .map_err(Into::into)
                .and_then(|on| self.transact(link, &Y::Narrow(on))),
            "IF-SHIFT" => Self::optional(arg, parse_signed)
                .map_err(Into::into)
                .and_then(|hz| self.transact(link, &Y::IfShift(hz))),
            "IF-WIDTH" => Self::optional(arg, |s| {
                parse_bounded(s, "IF width", 0, u64::from(MAX_IF_WIDTH)).map(|w| w as u8)
            })
            .map_err(Into::into)
            .and_then(|width| self.transact(link, &Y::IfWidth(width))),
            "LOCK" => on_off_arg(arg)
                .map_err(Into::into)
                .and_then(|on| self.transact(link, &Y::Lock(on))),
            "MODE" => mode_arg(arg)
                .map_err(Into::into)
                .and_then(|mode| self.transact(link, &Y::Mode(mode))),
            "MODEB" => self.mode_b(link, arg),
            "MONITOR" => self.flag_and_level(
                link,
                Y::MonitorEnable,
                Y::MonitorLevel,
                arg,
                cmd.arg(1),
            ),
            "POWER" => {
                let (min, max) = RF_POWER_RANGE;
                Self::optional(arg, |s| {
                    parse_bounded(s, "RF power", u64::from(min), u64::from(max)).map(|w| w as u8)
                })
                .map_err(Into::into)
                .and_then(|watts| self.transact(link, &Y::RfPower(watts)))
            }
            "SPEECH" => self.flag_and_level(
                link,
                Y::ProcessorEnable,
                Y::ProcessorLevel,
                arg,
                cmd.arg(1),
            ),
            "SPLIT" => self.split(link, arg),
            "SWAPVFO" => self.transact(link, &Y::SwapVfo),
            "TONE" => self.tone(link, arg, cmd.arg(1)),
            _ => return None,
        };
        Some(result)
    }

    fn ptt(&self, link: &mut Link<'_>, on: Option<bool>) -> CatResult<Response> {
        let response = self.transact(link, &YaesuAsciiCommand::Transmit(on))?;
        if on.is_none() {
            link.session.ptt_on = response.as_str() == "ON";
        }
        Ok(response)
    }

    fn setup_split(&self, link: &mut Link<'_>, plan: &SplitPlan) -> CatResult<()> {
        plan.check(&self.model, |mode| yaesu_ascii::mode_char(mode).is_some())?;

        if !plan.split {
            self.transact(link, &YaesuAsciiCommand::Split(Some(false)))?;
            link.session.split = false;
            if let Some(mode) = plan.mode_a {
                if let Err(e) = self.set_mode(link, mode) {
                    debug!("VFO A mode not set: {}", e);
                }
            }
            if plan.vfo_a_hz > 0 {
                if let Err(e) = self.set_frequency_a(link, plan.vfo_a_hz) {
                    debug!("VFO A frequency not set: {}", e);
                }
            }
            return Ok(());
        }

        // B values go in on the front VFO, then move to B with a swap
        if let Some(mode) = plan.mode_b {
            self.set_mode(link, mode)?;
        }
        if plan.vfo_b_hz > 0 {
            self.set_frequency_a(link, plan.vfo_b_hz)?;
        }
        self.transact(link, &YaesuAsciiCommand::SwapVfo)?;

        if let Some(mode) = plan.mode_a {
            self.set_mode(link, mode)?;
        }
        if plan.vfo_a_hz > 0 {
            self.set_frequency_a(link, plan.vfo_a_hz)?;
        }
        self.transact(link, &YaesuAsciiCommand::Split(Some(true)))?;
        link.session.split = true;
        Ok(())
    }
}

fn text_arg(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use rigcat_protocol::{CatError, RigDatabase};
    use rigcat_sim::MockTransport;

    fn codec() -> Ft991Codec {
        Ft991Codec::new(RigDatabase::find("FT-991").unwrap())
    }

    fn run(mock: &MockTransport, name: &str, args: &[&str]) -> CatResult<Response> {
        let mut port = mock.clone();
        let mut session = Session::default();
        let mut link = Link::new(&mut port, &mut session);
        codec()
            .dispatch(&mut link, &Command::new(name, args))
            .expect("known command")
    }

    #[test]
    fn test_frequency() {
        let mock = MockTransport::new();
        mock.expect(b"FA007074000;", b"");
        mock.expect(b"FA;", b"FA007074000;");
        mock.expect(b"FB;", b"FB014250000;");
        assert_eq!(run(&mock, "FREQ", &["7074000"]).unwrap(), Response::Ok);
        assert_eq!(run(&mock, "FREQA", &[]).unwrap(), Response::value("007074000"));
        assert_eq!(run(&mock, "FREQB", &[]).unwrap(), Response::value("014250000"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_frequency_rejected() {
        let mock = MockTransport::new();
        mock.expect(b"FA007074000;", b"?;");
        assert!(matches!(
            run(&mock, "FREQ", &["7074000"]),
            Err(CatError::Rejected(_))
        ));
        assert!(run(&mock, "FREQ", &["450000001"]).is_err());
        assert_eq!(mock.sent().len(), 1);
    }

    #[test]
    fn test_query_timeout_is_error() {
        let mock = MockTransport::new();
        mock.expect(b"FA;", b"");
        assert!(matches!(
            run(&mock, "FREQ", &[]),
            Err(CatError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_mode_b_swaps_back() {
        let mock = MockTransport::new();
        mock.expect(b"SV;", b"");
        mock.expect(b"MD0;", b"MD02;");
        mock.expect(b"SV;", b"");
        assert_eq!(run(&mock, "MODEB", &[]).unwrap(), Response::value("USB"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_mode_b_swaps_back_after_failure() {
        let mock = MockTransport::new();
        mock.expect(b"SV;", b"");
        mock.expect(b"MD0C;", b"?;");
        mock.expect(b"SV;", b"");
        assert!(run(&mock, "MODEB", &["DATA-USB"]).is_err());
        assert!(mock.verify().is_ok());

        assert!(run(&mock, "MODEB", &["PKT"]).is_err());
        assert_eq!(mock.sent().len(), 3);
    }

    #[test]
    fn test_monitor_get() {
        let mock = MockTransport::new();
        mock.expect(b"ML0;", b"ML0001;");
        mock.expect(b"ML1;", b"ML1050;");
        assert_eq!(run(&mock, "MONITOR", &[]).unwrap(), Response::value("ON:050"));

        mock.expect(b"ML0;", b"ML0000;");
        mock.expect(b"ML1;", b"?;");
        assert_eq!(run(&mock, "MONITOR", &[]).unwrap(), Response::value("OFF:ERROR"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_monitor_set() {
        let mock = MockTransport::new();
        mock.expect(b"ML0001;", b"");
        mock.expect(b"ML1075;", b"");
        assert_eq!(run(&mock, "MONITOR", &["ON", "75"]).unwrap(), Response::value("OK:OK"));

        mock.expect(b"ML0000;", b"");
        mock.expect(b"ML1050;", b"");
        assert_eq!(run(&mock, "MONITOR", &["OFF", "50"]).unwrap(), Response::value("OK:OK"));

        mock.expect(b"ML0000;", b"");
        assert_eq!(run(&mock, "MONITOR", &["OFF"]).unwrap(), Response::value("OK:OK"));

        assert!(run(&mock, "MONITOR", &["ON", "101"]).is_err());
        assert!(run(&mock, "MONITOR", &["SOMETIMES"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_speech_level_failure_is_partial() {
        let mock = MockTransport::new();
        mock.expect(b"PR01;", b"");
        mock.expect(b"PL050;", b"?;");
        assert_eq!(run(&mock, "SPEECH", &["ON", "50"]).unwrap(), Response::value("OK:ERROR"));
    }

    #[test]
    fn test_speech_off_still_sets_level() {
        let mock = MockTransport::new();
        mock.expect(b"PR00;", b"");
        mock.expect(b"PL020;", b"");
        assert_eq!(run(&mock, "SPEECH", &["OFF", "20"]).unwrap(), Response::value("OK:OK"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_if_controls() {
        let mock = MockTransport::new();
        mock.expect(b"NA01;", b"");
        mock.expect(b"IS0-0250;", b"");
        mock.expect(b"SH0;", b"SH015;");
        mock.expect(b"LK;", b"LK0;");
        assert_eq!(run(&mock, "IF-NARROW", &["ON"]).unwrap(), Response::Ok);
        assert_eq!(run(&mock, "IF-SHIFT", &["-250"]).unwrap(), Response::Ok);
        assert_eq!(run(&mock, "IF-WIDTH", &[]).unwrap(), Response::value("15"));
        assert_eq!(run(&mock, "LOCK", &[]).unwrap(), Response::value("OFF"));
        assert!(run(&mock, "IF-WIDTH", &["22"]).is_err());
        assert!(run(&mock, "IF-SHIFT", &["2000"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_power() {
        let mock = MockTransport::new();
        mock.expect(b"PC050;", b"");
        mock.expect(b"PC;", b"PC100;");
        assert_eq!(run(&mock, "POWER", &["50"]).unwrap(), Response::Ok);
        assert_eq!(run(&mock, "POWER", &[]).unwrap(), Response::value("100"));
        assert!(run(&mock, "POWER", &["4"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_date_time() {
        let mock = MockTransport::new();
        mock.expect(b"DT020240131;", b"");
        mock.expect(b"DT1;", b"DT1235959;");
        assert_eq!(run(&mock, "DATE", &["20240131"]).unwrap(), Response::Ok);
        assert_eq!(run(&mock, "TIME", &[]).unwrap(), Response::value("235959"));
        assert!(run(&mock, "TIME", &["1230"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_tone_uses_table() {
        let mock = MockTransport::new();
        mock.expect(b"CT02;", b"");
        mock.expect(b"CN00012;", b"");
        assert_eq!(run(&mock, "TONE", &["ENC", "1000"]).unwrap(), Response::Ok);

        mock.expect(b"CT00;", b"");
        assert_eq!(run(&mock, "TONE", &["OFF"]).unwrap(), Response::Ok);

        assert!(matches!(
            run(&mock, "TONE", &["DEC", "1001"]),
            Err(CatError::Validation(ParseError::InvalidTone(_)))
        ));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_split_updates_session() {
        let mock = MockTransport::new();
        mock.expect(b"FT3;", b"");
        mock.expect(b"FT;", b"FT0;");

        let mut port = mock.clone();
        let mut session = Session::default();
        let codec = codec();
        let mut link = Link::new(&mut port, &mut session);
        codec
            .dispatch(&mut link, &Command::new("SPLIT", &["ON"]))
            .unwrap()
            .unwrap();
        assert!(link.session.split);
        let state = codec
            .dispatch(&mut link, &Command::bare("SPLIT"))
            .unwrap()
            .unwrap();
        assert_eq!(state, Response::value("OFF"));
        assert!(!link.session.split);
    }

    #[test]
    fn test_ptt_query_refreshes_shadow() {
        let mock = MockTransport::new();
        mock.expect(b"TX;", b"TX1;");
        let mut port = mock.clone();
        let mut session = Session::default();
        let mut link = Link::new(&mut port, &mut session);
        assert_eq!(codec().ptt(&mut link, None).unwrap(), Response::value("ON"));
        assert!(session.ptt_on);
    }

    #[test]
    fn test_setup_split_on() {
        let mock = MockTransport::new();
        mock.expect(b"MD02;", b"");
        mock.expect(b"FA014076000;", b"");
        mock.expect(b"SV;", b"");
        mock.expect(b"MD02;", b"");
        mock.expect(b"FA014074000;", b"");
        mock.expect(b"FT3;", b"");

        let mut port = mock.clone();
        let mut session = Session::default();
        let plan = SplitPlan {
            vfo_a_hz: 14_074_000,
            mode_a: Some(OperatingMode::Usb),
            split: true,
            vfo_b_hz: 14_076_000,
            mode_b: Some(OperatingMode::Usb),
        };
        codec()
            .setup_split(&mut Link::new(&mut port, &mut session), &plan)
            .unwrap();
        assert!(mock.verify().is_ok());
        assert!(session.split);
    }

    #[test]
    fn test_setup_split_unsupported_mode_sends_nothing() {
        let mock = MockTransport::new();
        let mut port = mock.clone();
        let mut session = Session::default();
        let plan = SplitPlan {
            vfo_a_hz: 14_074_000,
            mode_a: Some(OperatingMode::Usb),
            split: true,
            vfo_b_hz: 14_076_000,
            mode_b: Some(OperatingMode::Pkt),
        };
        assert!(codec()
            .setup_split(&mut Link::new(&mut port, &mut session), &plan)
            .is_err());
        assert!(mock.sent().is_empty());
        assert!(!session.split);
    }

    #[test]
    fn test_setup_split_off_is_best_effort() {
        let mock = MockTransport::new();
        mock.expect(b"FT2;", b"");
        mock.expect(b"MD01;", b"?;");
        mock.expect(b"FA007074000;", b"");

        let mut port = mock.clone();
        let mut session = Session::default();
        let plan = SplitPlan {
            vfo_a_hz: 7_074_000,
            mode_a: Some(OperatingMode::Lsb),
            ..SplitPlan::default()
        };
        codec()
            .setup_split(&mut Link::new(&mut port, &mut session), &plan)
            .unwrap();
        assert!(mock.verify().is_ok());
    }
}
