//! FT-817/857/897 codec (fixed 5-byte binary commands)
//!
//! The radio cannot select a VFO directly, only toggle between them, and
//! has no documented query for the active VFO or split state. Both are
//! read from EEPROM status bytes, so every operation on a named VFO reads
//! the status first and toggles only when needed.

use rigcat_protocol::command::{format_frequency, on_off, parse_signed, parse_unsigned};
use rigcat_protocol::yaesu::{
    self, Reply, YaesuCommand, EEPROM_SPLIT_STATUS, EEPROM_VFO_STATUS, MAX_REPEATER_OFFSET_HZ,
};
use rigcat_protocol::{
    CatError, CatResult, Command, OperatingMode, ParseError, RepeaterShift, Response, RigModel,
    ToneMode, Vfo,
};
use tracing::{debug, warn};

use crate::codec::{mode_arg, on_off_arg, parse_frequency, Link, SplitPlan, VendorCodec};

/// Status byte for an accepted command
const ACK_OK: u8 = 0x00;

/// Fixed-binary Yaesu codec
pub struct Ft817Codec {
    model: RigModel,
}

impl Ft817Codec {
    pub fn new(model: RigModel) -> Self {
        Self { model }
    }

    /// Send one command and read its reply
    fn transact(&self, link: &mut Link<'_>, cmd: YaesuCommand) -> CatResult<Vec<u8>> {
        let request = cmd.encode()?;
        let reply = link.exchange_exact(&request, cmd.reply().len())?;
        if let Reply::Ack { strict: true } = cmd.reply() {
            if reply[0] != ACK_OK {
                return Err(CatError::Rejected(format!("{:?} status {:02X}", cmd, reply[0])));
            }
        }
        Ok(reply)
    }

    fn read_eeprom(&self, link: &mut Link<'_>, address: u16) -> CatResult<[u8; 2]> {
        let reply = self.transact(link, YaesuCommand::ReadEeprom { address })?;
        Ok([reply[0], reply[1]])
    }

    fn get_vfo(&self, link: &mut Link<'_>) -> CatResult<Vfo> {
        let status = self.read_eeprom(link, EEPROM_VFO_STATUS)?;
        let vfo = yaesu::vfo_from_status(status[0]);
        link.session.vfo = vfo;
        Ok(vfo)
    }

    /// Toggle to `target` unless it is already active
    fn set_vfo(&self, link: &mut Link<'_>, target: Vfo) -> CatResult<()> {
        if self.get_vfo(link)? != target {
            self.transact(link, YaesuCommand::ToggleVfo)?;
            link.session.vfo = target;
        }
        Ok(())
    }

    fn get_split(&self, link: &mut Link<'_>) -> CatResult<bool> {
        let status = self.read_eeprom(link, EEPROM_SPLIT_STATUS)?;
        let split = yaesu::split_from_status(status[0]);
        link.session.split = split;
        Ok(split)
    }

    fn set_split(&self, link: &mut Link<'_>, on: bool) -> CatResult<()> {
        self.transact(link, YaesuCommand::Split { on })?;
        link.session.split = on;
        Ok(())
    }

    fn read_frequency_mode(&self, link: &mut Link<'_>) -> CatResult<(u64, u8)> {
        let reply = self.transact(link, YaesuCommand::ReadFrequencyMode)?;
        Ok(yaesu::decode_frequency_mode(&reply)?)
    }

    fn set_frequency(&self, link: &mut Link<'_>, hz: u64) -> CatResult<()> {
        self.transact(link, YaesuCommand::SetFrequency { hz })?;
        Ok(())
    }

    fn set_mode(&self, link: &mut Link<'_>, mode: OperatingMode) -> CatResult<()> {
        let code =
            yaesu::mode_code(mode).ok_or_else(|| ParseError::InvalidMode(mode.to_string()))?;
        self.transact(link, YaesuCommand::SetMode { code })?;
        Ok(())
    }

    /// Run `op` with `vfo` active, then put the original VFO back
    ///
    /// The restore runs even when switching or `op` failed, and a failed
    /// restore fails the whole operation.
    fn on_vfo<T>(
        &self,
        link: &mut Link<'_>,
        vfo: Option<Vfo>,
        op: impl FnOnce(&mut Link<'_>) -> CatResult<T>,
    ) -> CatResult<T> {
        let Some(target) = vfo else {
            return op(link);
        };
        let saved = self.get_vfo(link)?;
        if saved == target {
            return op(link);
        }

        let result = self
            .transact(link, YaesuCommand::ToggleVfo)
            .and_then(|_| op(link));
        let restored = self.set_vfo(link, saved);
        if let Err(e) = &restored {
            warn!("could not restore VFO {}: {}", saved, e);
        }
        let value = result?;
        restored?;
        Ok(value)
    }

    fn frequency(&self, link: &mut Link<'_>, vfo: Option<Vfo>, arg: &str) -> CatResult<Response> {
        let target = match arg {
            "" => None,
            hz => Some(parse_frequency(&self.model, hz)?),
        };
        self.on_vfo(link, vfo, |link| match target {
            Some(hz) => self.set_frequency(link, hz).map(|()| Response::Ok),
            None => self
                .read_frequency_mode(link)
                .map(|(hz, _)| Response::value(format_frequency(hz))),
        })
    }

    fn mode(&self, link: &mut Link<'_>, vfo: Option<Vfo>, arg: &str) -> CatResult<Response> {
        let target = mode_arg(arg)?;
        self.on_vfo(link, vfo, |link| match target {
            Some(mode) => self.set_mode(link, mode).map(|()| Response::Ok),
            None => {
                let (_, code) = self.read_frequency_mode(link)?;
                let mode = yaesu::mode_from_code(code).ok_or_else(|| {
                    CatError::UnexpectedReply(format!("mode code {code:02X}"))
                })?;
                Ok(Response::value(mode.as_str()))
            }
        })
    }

    fn split(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        match on_off_arg(arg)? {
            None => Ok(Response::value(on_off(self.get_split(link)?))),
            Some(on) => self.set_split(link, on).map(|()| Response::Ok),
        }
    }

    fn vfo(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        match arg {
            "" => Ok(Response::value(self.get_vfo(link)?.as_str())),
            vfo => {
                let target = vfo.parse::<Vfo>()?;
                self.set_vfo(link, target).map(|()| Response::Ok)
            }
        }
    }

    fn clarifier(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let on = rigcat_protocol::command::parse_on_off(arg)?;
        self.transact(link, YaesuCommand::Clarifier { on })?;
        Ok(Response::Ok)
    }

    fn clarifier_offset(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let hz = parse_signed(arg)?;
        self.transact(link, YaesuCommand::ClarifierOffset { hz })?;
        Ok(Response::Ok)
    }

    /// Shift direction first, then the magnitude unless simplex
    fn repeater_offset(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let hz = parse_signed(arg)?;
        if hz.unsigned_abs() > MAX_REPEATER_OFFSET_HZ.unsigned_abs() {
            return Err(ParseError::OutOfRange {
                what: "repeater offset",
                value: hz,
                min: -MAX_REPEATER_OFFSET_HZ,
                max: MAX_REPEATER_OFFSET_HZ,
            }
            .into());
        }
        let shift = RepeaterShift::for_offset(hz);
        self.transact(link, YaesuCommand::RepeaterShift(shift))?;
        if shift != RepeaterShift::Simplex {
            self.transact(
                link,
                YaesuCommand::RepeaterOffset {
                    hz: hz.unsigned_abs(),
                },
            )?;
        }
        Ok(Response::Ok)
    }

    /// Tone mode first, then the tone frequency unless OFF
    fn tone(&self, link: &mut Link<'_>, mode: &str, freq: &str) -> CatResult<Response> {
        let mode = mode.parse::<ToneMode>()?;
        let tone = match mode {
            ToneMode::Off => None,
            ToneMode::Encode | ToneMode::Decode => {
                let cmd = YaesuCommand::CtcssTone {
                    tenths_hz: parse_unsigned(freq)?,
                };
                cmd.encode()?;
                Some(cmd)
            }
        };
        self.transact(link, YaesuCommand::CtcssMode(mode))?;
        if let Some(cmd) = tone {
            self.transact(link, cmd)?;
        }
        Ok(Response::Ok)
    }

    fn status(&self, link: &mut Link<'_>, cmd: YaesuCommand) -> CatResult<Response> {
        let reply = self.transact(link, cmd)?;
        Ok(Response::value(format!("{:02X}", reply[0])))
    }

    fn eeprom_read(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let address = yaesu::parse_eeprom_address(arg)?;
        let [first, second] = self.read_eeprom(link, address)?;
        debug!("EEPROM {:04X}: {:02X} {:02X}", address, first, second);
        Ok(Response::value(format!("OK {first:02X} {second:02X}")))
    }
}

impl VendorCodec for Ft817Codec {
    fn name(&self) -> &'static str {
        "FT-817"
    }

    fn dispatch(&self, link: &mut Link<'_>, cmd: &Command) -> Option<CatResult<Response>> {
        let arg = cmd.arg(0);
        let result = match cmd.name() {
            "FREQ" => self.frequency(link, None, arg),
            "FREQA" => self.frequency(link, Some(Vfo::A), arg),
            "FREQB" => self.frequency(link, Some(Vfo::B), arg),
            "MODE" => self.mode(link, None, arg),
            "MODEA" => self.mode(link, Some(Vfo::A), arg),
            "MODEB" => self.mode(link, Some(Vfo::B), arg),
            "SPLIT" => self.split(link, arg),
            "VFO" => self.vfo(link, arg),
            "RIT" | "CLAR" => self.clarifier(link, arg),
            "RIT-FREQ" | "CLAR-FREQ" => self.clarifier_offset(link, arg),
            "RPT-OFFSET" => self.repeater_offset(link, arg),
            "TONE" => self.tone(link, arg, cmd.arg(1)),
            "RX-STATUS" => self.status(link, YaesuCommand::ReadRxStatus),
            "TX-STATUS" => self.status(link, YaesuCommand::ReadTxStatus),
            "EEPROM-READ" => self.eeprom_read(link, arg),
            _ => return None,
        };
        Some(result)
    }

    fn ptt(&self, link: &mut Link<'_>, on: Option<bool>) -> CatResult<Response> {
        match on {
            None => Ok(Response::value(on_off(link.session.ptt_on))),
            Some(on) => {
                self.transact(link, YaesuCommand::Ptt { on })?;
                Ok(Response::Ok)
            }
        }
    }

    fn setup_split(&self, link: &mut Link<'_>, plan: &SplitPlan) -> CatResult<()> {
        plan.check(&self.model, |mode| yaesu::mode_code(mode).is_some())?;

        self.set_vfo(link, Vfo::B)?;
        if plan.vfo_b_hz > 0 {
            self.set_frequency(link, plan.vfo_b_hz)?;
        }
        if let Some(mode) = plan.mode_b {
            self.set_mode(link, mode)?;
        }

        self.set_vfo(link, Vfo::A)?;
        if plan.vfo_a_hz > 0 {
            self.set_frequency(link, plan.vfo_a_hz)?;
        }
        if let Some(mode) = plan.mode_a {
            self.set_mode(link, mode)?;
        }

        self.set_split(link, plan.split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use rigcat_protocol::RigDatabase;
    use rigcat_sim::MockTransport;

    const READ_VFO: [u8; 5] = [0x00, 0x55, 0x00, 0x00, 0xBB];
    const TOGGLE: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0x81];
    const READ_FREQ: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0x03];

    fn codec() -> Ft817Codec {
        Ft817Codec::new(RigDatabase::find("FT-817").unwrap())
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
    fn test_frequency_get() {
        let mock = MockTransport::new();
        mock.expect(READ_FREQ, [0x01, 0x42, 0x50, 0x00, 0x01]);
        assert_eq!(run(&mock, "FREQ", &[]).unwrap(), Response::value("014250000"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_frequency_set_needs_zero_ack() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x70, 0x74, 0x00, 0x01], [0x00]);
        assert_eq!(run(&mock, "FREQ", &["7074000"]).unwrap(), Response::Ok);

        mock.expect([0x00, 0x70, 0x74, 0x00, 0x01], [0xF0]);
        assert!(matches!(
            run(&mock, "FREQ", &["7074000"]),
            Err(CatError::Rejected(_))
        ));
    }

    #[test]
    fn test_frequency_out_of_range_sends_nothing() {
        let mock = MockTransport::new();
        assert!(run(&mock, "FREQ", &["99999"]).is_err());
        assert!(run(&mock, "FREQA", &["450000001"]).is_err());
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_frequency_on_active_vfo_does_not_toggle() {
        let mock = MockTransport::new();
        mock.expect(READ_VFO, [0x00, 0x00]);
        mock.expect(READ_FREQ, [0x00, 0x70, 0x74, 0x00, 0x01]);
        assert_eq!(run(&mock, "FREQA", &[]).unwrap(), Response::value("007074000"));
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_mode_get_and_set() {
        let mock = MockTransport::new();
        mock.expect(READ_FREQ, [0x01, 0x42, 0x50, 0x00, 0x0A]);
        assert_eq!(run(&mock, "MODE", &[]).unwrap(), Response::value("DIGI"));

        mock.expect(READ_FREQ, [0x01, 0x42, 0x50, 0x00, 0x06]);
        assert_eq!(run(&mock, "MODE", &[]).unwrap(), Response::value("FM-W"));

        mock.expect([0x03, 0x00, 0x00, 0x00, 0x07], [0x00]);
        assert_eq!(run(&mock, "MODE", &["cw-r"]).unwrap(), Response::Ok);
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_unmapped_mode_is_error() {
        let mock = MockTransport::new();
        assert!(run(&mock, "MODE", &["RTTY"]).is_err());
        assert!(run(&mock, "MODE", &["FM-W"]).is_err());
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_vfo_get_and_set() {
        let mock = MockTransport::new();
        mock.expect(READ_VFO, [0x01, 0x00]);
        assert_eq!(run(&mock, "VFO", &[]).unwrap(), Response::value("B"));

        mock.expect(READ_VFO, [0x01, 0x00]);
        assert_eq!(run(&mock, "VFO", &["B"]).unwrap(), Response::Ok);

        mock.expect(READ_VFO, [0x01, 0x00]);
        mock.expect(TOGGLE, [0x00]);
        assert_eq!(run(&mock, "VFO", &["A"]).unwrap(), Response::Ok);
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_split() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x7A, 0x00, 0x00, 0xBB], [0x80, 0x00]);
        assert_eq!(run(&mock, "SPLIT", &[]).unwrap(), Response::value("ON"));

        mock.expect([0x00, 0x00, 0x00, 0x00, 0x82], [0xF0]);
        assert_eq!(run(&mock, "SPLIT", &["OFF"]).unwrap(), Response::Ok);
        assert!(run(&mock, "SPLIT", &["MAYBE"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_clarifier() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x00, 0x00, 0x00, 0x05], [0x00]);
        assert_eq!(run(&mock, "RIT", &["ON"]).unwrap(), Response::Ok);

        mock.expect([0x01, 0x00, 0x01, 0x23, 0xF5], [0x00]);
        assert_eq!(run(&mock, "CLAR-FREQ", &["-1234"]).unwrap(), Response::Ok);

        assert!(run(&mock, "RIT-FREQ", &["10000"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_repeater_offset() {
        let mock = MockTransport::new();
        mock.expect([0x09, 0x00, 0x00, 0x00, 0x09], [0x00]);
        mock.expect([0x00, 0x60, 0x00, 0x00, 0xF9], [0x00]);
        assert_eq!(run(&mock, "RPT-OFFSET", &["-600000"]).unwrap(), Response::Ok);

        mock.expect([0x89, 0x00, 0x00, 0x00, 0x09], [0x00]);
        assert_eq!(run(&mock, "RPT-OFFSET", &["0"]).unwrap(), Response::Ok);
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_repeater_offset_stops_when_shift_fails() {
        let mock = MockTransport::new();
        mock.expect([0x49, 0x00, 0x00, 0x00, 0x09], [0x01]);
        assert!(run(&mock, "RPT-OFFSET", &["5000000"]).is_err());
        assert_eq!(mock.sent().len(), 1);

        assert!(run(&mock, "RPT-OFFSET", &["10000000"]).is_err());
        assert_eq!(mock.sent().len(), 1);
    }

    #[test]
    fn test_repeater_offset_extreme_values_rejected() {
        let mock = MockTransport::new();
        assert!(run(&mock, "RPT-OFFSET", &["-9223372036854775808"]).is_err());
        assert!(run(&mock, "RPT-OFFSET", &["9223372036854775807"]).is_err());
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_tone() {
        let mock = MockTransport::new();
        mock.expect([0x4A, 0x00, 0x00, 0x00, 0x0A], [0x00]);
        mock.expect([0x08, 0x85, 0x00, 0x00, 0x0B], [0x00]);
        assert_eq!(run(&mock, "TONE", &["ENC", "885"]).unwrap(), Response::Ok);

        mock.expect([0x8A, 0x00, 0x00, 0x00, 0x0A], [0x00]);
        assert_eq!(run(&mock, "TONE", &["OFF"]).unwrap(), Response::Ok);

        assert!(run(&mock, "TONE", &["DEC", "600"]).is_err());
        assert!(run(&mock, "TONE", &["LOUD"]).is_err());
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_status_reads() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x00, 0x00, 0x00, 0xE7], [0x0A]);
        mock.expect([0x00, 0x00, 0x00, 0x00, 0xF7], [0x8F]);
        assert_eq!(run(&mock, "RX-STATUS", &[]).unwrap(), Response::value("0A"));
        assert_eq!(run(&mock, "TX-STATUS", &[]).unwrap(), Response::value("8F"));
    }

    #[test]
    fn test_eeprom_read() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x7A, 0x00, 0x00, 0xBB], [0x12, 0xAB]);
        assert_eq!(
            run(&mock, "EEPROM-READ", &["122"]).unwrap(),
            Response::value("OK 12 AB")
        );

        mock.expect([0x00, 0x7A, 0x00, 0x00, 0xBB], [0x12]);
        assert!(run(&mock, "EEPROM-READ", &["0x7a"]).is_err());
        assert!(run(&mock, "EEPROM-READ", &["0x1926"]).is_err());
    }

    #[test]
    fn test_setup_split() {
        let mock = MockTransport::new();
        mock.expect(READ_VFO, [0x00, 0x00]);
        mock.expect(TOGGLE, [0x00]);
        mock.expect([0x01, 0x40, 0x76, 0x00, 0x01], [0x00]);
        mock.expect(READ_VFO, [0x01, 0x00]);
        mock.expect(TOGGLE, [0x00]);
        mock.expect([0x01, 0x40, 0x74, 0x00, 0x01], [0x00]);
        mock.expect([0x01, 0x00, 0x00, 0x00, 0x07], [0x00]);
        mock.expect([0x00, 0x00, 0x00, 0x00, 0x02], [0x00]);

        let mut port = mock.clone();
        let mut session = Session::default();
        let plan = SplitPlan {
            vfo_a_hz: 14_074_000,
            mode_a: Some(OperatingMode::Usb),
            split: true,
            vfo_b_hz: 14_076_000,
            mode_b: None,
        };
        codec()
            .setup_split(&mut Link::new(&mut port, &mut session), &plan)
            .unwrap();
        assert!(mock.verify().is_ok());
        assert!(session.split);
        assert_eq!(session.vfo, Vfo::A);
    }
}
