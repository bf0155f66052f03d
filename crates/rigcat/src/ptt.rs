//! Push-to-talk state machine
//!
//! PTT is keyed one of three ways: a CAT command handled by the codec, or
//! asserting DTR or RTS on the serial port. Either way a get reports the
//! shadow state (the CAT codecs may query the radio instead) and a set
//! only changes the shadow after the action succeeds. No method reads the
//! transmitter state back from the hardware lines.

use rigcat_protocol::command::{on_off, parse_on_off};
use rigcat_protocol::{CatError, CatResult, ControlLine, PttMethod, Response};
use tracing::debug;

use crate::codec::{Link, VendorCodec};

/// Handle a `PTT [ON|OFF]` command
pub fn transact(codec: &dyn VendorCodec, link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
    let request = match arg.trim() {
        "" => None,
        token => Some(parse_on_off(token)?),
    };

    match link.session.ptt_method {
        PttMethod::None => Err(CatError::Unsupported("PTT method is NONE")),
        PttMethod::Cat => {
            let response = codec.ptt(link, request)?;
            if let Some(on) = request {
                link.session.ptt_on = on;
            }
            Ok(response)
        }
        PttMethod::Dtr => key_line(link, ControlLine::Dtr, request),
        PttMethod::Rts => key_line(link, ControlLine::Rts, request),
    }
}

fn key_line(link: &mut Link<'_>, line: ControlLine, request: Option<bool>) -> CatResult<Response> {
    let Some(on) = request else {
        return Ok(Response::value(on_off(link.session.ptt_on)));
    };
    link.transport.set_control_line(line, on)?;
    link.session.ptt_on = on;
    debug!("PTT {} via {}", on_off(on), line);
    Ok(Response::Ok)
}

/// Handle a `PTT-METHOD [NONE|CAT|DTR|RTS]` command
pub fn method(link: &mut Link<'_>, arg: &str) -> CatResult<Response> {
    match arg.trim() {
        "" => Ok(Response::value(link.session.ptt_method.as_str())),
        token => {
            link.session.ptt_method = token.parse::<PttMethod>()?;
            Ok(Response::Ok)
        }
    }
}
