//! Icom CI-V codec
//!
//! CI-V has no query for the selected VFO or the split state, so both live
//! only in the session shadow and are updated after each successful set.
//! Several of the extended (0x1A) menu addresses are model specific; the
//! ones used here match the IC-7000.

use rigcat_protocol::command::{format_frequency, on_off, parse_percent, parse_signed, parse_unsigned};
use rigcat_protocol::icom::{
    self, extended, function, CivCommand, CivFrame, LEVEL_RF_POWER, MAX_REPEATER_OFFSET_HZ,
    TRANSMIT_PTT,
};
use rigcat_protocol::{
    CatError, CatResult, Command, OperatingMode, ParseError, RepeaterShift, Response, RigModel,
    ToneMode, Vfo,
};
use tracing::warn;

use crate::codec::{compound, mode_arg, on_off_arg, parse_frequency, Link, SplitPlan, VendorCodec};

/// Tone type byte for the transmit tone
const TONE_TRANSMIT: u8 = 0x00;
/// Tone type byte for the squelch tone
const TONE_SQUELCH: u8 = 0x01;

/// Generic CI-V codec
pub struct CivCodec {
    model: RigModel,
    address: u8,
    echo: bool,
}

impl CivCodec {
    pub fn new(model: RigModel, address: u8, echo: bool) -> Self {
        Self {
            model,
            address,
            echo,
        }
    }

    fn frame(&self, cmd: CivCommand) -> CivFrame {
        CivFrame::new(self.address, cmd)
    }

    /// Send `frame` and return up to `max_data` payload bytes of the answer
    ///
    /// The payload starts after the command byte, so it includes any
    /// sub-command the radio repeats back.
    fn xcvr(&self, link: &mut Link<'_>, frame: CivFrame, max_data: usize) -> CatResult<Vec<u8>> {
        let request = frame.encode();
        let expected = icom::reply_len(request.len(), max_data, self.echo);
        let reply = link.exchange(&request, expected)?;
        icom::extract_payload(&reply, request.len(), max_data, self.echo)
    }

    /// Send a set command and require an OK frame
    fn set(&self, link: &mut Link<'_>, frame: CivFrame) -> CatResult<()> {
        self.xcvr(link, frame, 0).map(|_| ())
    }

    fn read_extended(
        &self,
        link: &mut Link<'_>,
        sub: [u8; 3],
        len: usize,
    ) -> CatResult<Vec<u8>> {
        let data = self.xcvr(link, self.frame(CivCommand::Extended).sub(&sub), sub.len() + len)?;
        Ok(data[sub.len()..].to_vec())
    }

    fn set_extended(&self, link: &mut Link<'_>, sub: [u8; 3], data: &[u8]) -> CatResult<()> {
        self.set(link, self.frame(CivCommand::Extended).sub(&sub).data(data))
    }

    fn set_vfo(&self, link: &mut Link<'_>, vfo: Vfo) -> CatResult<()> {
        let sub = match vfo {
            Vfo::A => 0x00,
            Vfo::B => 0x01,
        };
        self.set(link, self.frame(CivCommand::Vfo).sub(&[sub]))?;
        link.session.vfo = vfo;
        Ok(())
    }

    fn set_split(&self, link: &mut Link<'_>, on: bool) -> CatResult<()> {
        self.set(link, self.frame(CivCommand::Split).sub(&[u8::from(on)]))?;
        link.session.split = on;
        Ok(())
    }

    fn read_frequency(&self, link: &mut Link<'_>) -> CatResult<u64> {
        let data = self.xcvr(link, self.frame(CivCommand::ReadFrequency), icom::FREQUENCY_LEN)?;
        match icom::decode_frequency(&data)? {
            0 => Err(CatError::UnexpectedReply("zero frequency".into())),
            hz => Ok(hz),
        }
    }

    fn set_frequency(&self, link: &mut Link<'_>, hz: u64) -> CatResult<()> {
        let data = icom::encode_frequency(hz)?;
        self.set(link, self.frame(CivCommand::SetFrequency).data(&data))
    }

    fn mode_code(&self, mode: OperatingMode) -> Result<u8, ParseError> {
        icom::mode_code(mode, self.model.has_data_modes)
            .ok_or_else(|| ParseError::InvalidMode(mode.to_string()))
    }

    fn set_mode(&self, link: &mut Link<'_>, mode: OperatingMode) -> CatResult<()> {
        let code = self.mode_code(mode)?;
        self.set(link, self.frame(CivCommand::SetMode).sub(&[code]))
    }

    /// Run `op` with `vfo` selected, then select the shadowed VFO again
    fn on_vfo<T>(
        &self,
        link: &mut Link<'_>,
        vfo: Option<Vfo>,
        op: impl FnOnce(&mut Link<'_>) -> CatResult<T>,
    ) -> CatResult<T> {
        let saved = link.session.vfo;
        let target = match vfo {
            Some(target) if target != saved => target,
            _ => return op(link),
        };

        self.set_vfo(link, target)?;
        let result = op(link);
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
                .read_frequency(link)
                .map(|hz| Response::value(format_frequency(hz))),
        })
    }

    fn mode(&self, link: &mut Link<'_>, vfo: Option<Vfo>, arg: &str) -> CatResult<Response> {
        let target = mode_arg(arg)?;
        if let Some(mode) = target {
            self.mode_code(mode)?;
        }
        self.on_vfo(link, vfo, |link| match target {
            Some(mode) => self.set_mode(link, mode).map(|()| Response::Ok),
            None => {
                let data = self.xcvr(link, self.frame(CivCommand::ReadMode), 2)?;
                let mode = icom::mode_from_code(data[0]).ok_or_else(|| {
                    CatError::UnexpectedReply(format!("mode code {:02X}", data[0]))
                })?;
                Ok(Response::value(mode.as_str()))
            }
        })
    }

    fn vfo(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        match arg {
            "" => Ok(Response::value(link.session.vfo.as_str())),
            vfo => {
                let target = vfo.parse::<Vfo>()?;
                self.set_vfo(link, target).map(|()| Response::Ok)
            }
        }
    }

    fn split(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        match on_off_arg(arg)? {
            None => Ok(Response::value(on_off(link.session.split))),
            Some(on) => self.set_split(link, on).map(|()| Response::Ok),
        }
    }

    fn get_function(&self, link: &mut Link<'_>, sub: u8) -> CatResult<bool> {
        let data = self.xcvr(link, self.frame(CivCommand::Function).sub(&[sub]), 2)?;
        Ok(data[1] != 0)
    }

    fn set_function(&self, link: &mut Link<'_>, sub: u8, on: bool) -> CatResult<()> {
        self.set(
            link,
            self.frame(CivCommand::Function).sub(&[sub]).data(&[u8::from(on)]),
        )
    }

    /// NB, NR and PREAMP switches
    fn switch(&self, link: &mut Link<'_>, sub: u8, arg: &str) -> CatResult<Response> {
        match on_off_arg(arg)? {
            None => Ok(Response::value(on_off(self.get_function(link, sub)?))),
            Some(on) => self.set_function(link, sub, on).map(|()| Response::Ok),
        }
    }

    fn monitor_level(&self, link: &mut Link<'_>) -> CatResult<u8> {
        let data = self.read_extended(link, extended::MONITOR_LEVEL, 2)?;
        Ok(icom::byte_to_percent(icom::decode_level(data[0], data[1])))
    }

    fn set_monitor_level(&self, link: &mut Link<'_>, percent: u8) -> CatResult<()> {
        let level = icom::encode_level(icom::percent_to_byte(percent))?;
        self.set_extended(link, extended::MONITOR_LEVEL, &level)
    }

    fn monitor(&self, link: &mut Link<'_>, flag: &str, level: &str) -> CatResult<Response> {
        let level = optional_percent(level)?;
        match on_off_arg(flag)? {
            None => {
                let data = self.read_extended(link, extended::MONITOR, 1)?;
                let current = self.monitor_level(link).map(|p| p.to_string());
                Ok(compound(on_off(data[0] != 0), current))
            }
            Some(on) => {
                self.set_extended(link, extended::MONITOR, &[u8::from(on)])?;
                let applied = match level {
                    Some(percent) if on => self.set_monitor_level(link, percent),
                    _ => Ok(()),
                };
                Ok(compound(Response::Ok.as_str(), ok_text(applied)))
            }
        }
    }

    fn speech(&self, link: &mut Link<'_>, flag: &str, level: &str) -> CatResult<Response> {
        let level = optional_percent(level)?;
        match on_off_arg(flag)? {
            None => {
                let enabled = self.get_function(link, function::SPEECH)?;
                let current = self
                    .read_extended(link, extended::SPEECH_LEVEL, 1)
                    .map(|data| icom::speech_level_percent(data[0]).to_string());
                Ok(compound(on_off(enabled), current))
            }
            Some(on) => {
                self.set_function(link, function::SPEECH, on)?;
                let applied = match level {
                    Some(percent) if on => self.set_extended(
                        link,
                        extended::SPEECH_LEVEL,
                        &[icom::speech_level_byte(percent)],
                    ),
                    _ => Ok(()),
                };
                Ok(compound(Response::Ok.as_str(), ok_text(applied)))
            }
        }
    }

    fn power(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let frame = self.frame(CivCommand::Level).sub(&[LEVEL_RF_POWER]);
        match optional_percent(arg)? {
            None => {
                let data = self.xcvr(link, frame, 3)?;
                let percent = icom::byte_to_percent(icom::decode_level(data[1], data[2]));
                Ok(Response::value(percent.to_string()))
            }
            Some(percent) => {
                let level = icom::encode_level(icom::percent_to_byte(percent))?;
                self.set(link, frame.data(&level)).map(|()| Response::Ok)
            }
        }
    }

    /// Duplex direction, then the offset in the register for the current band
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
        let frequency = self.read_frequency(link)?;
        let shift = RepeaterShift::for_offset(hz);
        self.set(
            link,
            self.frame(CivCommand::Split).sub(&[icom::shift_subcommand(shift)]),
        )?;
        if shift != RepeaterShift::Simplex {
            let offset = icom::encode_repeater_offset(hz)?;
            let register = [0x05, 0x00, icom::repeater_register(frequency)];
            self.set_extended(link, register, &offset)?;
        }
        Ok(Response::Ok)
    }

    /// Tone and tone-squelch switches, then the tone for each enabled path
    fn tone(&self, link: &mut Link<'_>, mode: &str, freq: &str) -> CatResult<Response> {
        let mode = mode.parse::<ToneMode>()?;
        let tone = match mode {
            ToneMode::Off => None,
            ToneMode::Encode | ToneMode::Decode => Some(icom::encode_tone(parse_unsigned(freq)?)?),
        };

        let (tone_on, squelch_on) = icom::tone_enables(mode);
        self.set_function(link, function::TONE, tone_on != 0)?;
        self.set_function(link, function::TONE_SQUELCH, squelch_on != 0)?;

        if let Some(tone) = tone {
            self.set(link, self.frame(CivCommand::Tone).sub(&[TONE_TRANSMIT]).data(&tone))?;
            if mode == ToneMode::Decode {
                self.set(link, self.frame(CivCommand::Tone).sub(&[TONE_SQUELCH]).data(&tone))?;
            }
        }
        Ok(Response::Ok)
    }

    /// `YYYYMMDD`, sent as a year group and a month/day group; characters
    /// past the eighth are ignored
    fn date(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        if arg.is_empty() {
            let year = self.read_extended(link, extended::YEAR, 2)?;
            let month_day = self.read_extended(link, extended::DATE, 2)?;
            let date = icom::unpack_clock_digits(&year)? + &icom::unpack_clock_digits(&month_day)?;
            return Ok(Response::value(date));
        }

        let Some(date) = arg.get(..8).filter(|d| d.is_ascii()) else {
            return Err(ParseError::InvalidArgument(format!("date {arg:?} is not YYYYMMDD")).into());
        };
        let year = icom::pack_clock_digits(&date[..4], 4)?;
        let month_day = icom::pack_clock_digits(&date[4..], 4)?;
        self.set_extended(link, extended::YEAR, &year)?;
        self.set_extended(link, extended::DATE, &month_day)?;
        Ok(Response::Ok)
    }

    /// `HHMM`
    fn time(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        if arg.is_empty() {
            let time = self.read_extended(link, extended::TIME, 2)?;
            return Ok(Response::value(icom::unpack_clock_digits(&time)?));
        }
        let time = icom::pack_clock_digits(arg, 4)?;
        self.set_extended(link, extended::TIME, &time)?;
        Ok(Response::Ok)
    }

    fn vfo_memory(&self, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
        let cmd = match arg.to_ascii_uppercase().as_str() {
            "VFO" => CivCommand::Vfo,
            "MEM" => CivCommand::Memory,
            _ => return Err(ParseError::InvalidArgument(format!("{arg:?} is not VFO or MEM")).into()),
        };
        self.set(link, self.frame(cmd)).map(|()| Response::Ok)
    }
}

fn optional_percent(arg: &str) -> Result<Option<u8>, ParseError> {
    match arg {
        "" => Ok(None),
        value => parse_percent(value).map(Some),
    }
}

fn ok_text(result: CatResult<()>) -> CatResult<String> {
    result.map(|()| Response::Ok.as_str().to_string())
}

impl VendorCodec for CivCodec {
    fn name(&self) -> &'static str {
        "CI-V"
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
            "VFO" => self.vfo(link, arg),
            "SPLIT" => self.split(link, arg),
            "NB" => self.switch(link, function::NOISE_BLANKER, arg),
            "NR" => self.switch(link, function::NOISE_REDUCTION, arg),
            "PREAMP" => self.switch(link, function::PREAMP, arg),
            "MONITOR" => self.monitor(link, arg, cmd.arg(1)),
            "SPEECH" => self.speech(link, arg, cmd.arg(1)),
            "POWER" => self.power(link, arg),
            "RPT-OFFSET" => self.repeater_offset(link, arg),
            "TONE" => self.tone(link, arg, cmd.arg(1)),
            "DATE" => self.date(link, arg),
            "TIME" => self.time(link, arg),
            "VFOMEM" => self.vfo_memory(link, arg),
            _ => return None,
        };
        Some(result)
    }

    fn ptt(&self, link: &mut Link<'_>, on: Option<bool>) -> CatResult<Response> {
        let frame = self.frame(CivCommand::Transmit).sub(&[TRANSMIT_PTT]);
        match on {
            None => {
                let data = self.xcvr(link, frame, 2)?;
                Ok(Response::value(on_off(data[1] != 0)))
            }
            Some(on) => self
                .set(link, frame.data(&[u8::from(on)]))
                .map(|()| Response::Ok),
        }
    }

    fn setup_split(&self, link: &mut Link<'_>, plan: &SplitPlan) -> CatResult<()> {
        plan.check(&self.model, |mode| self.mode_code(mode).is_ok())?;

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
