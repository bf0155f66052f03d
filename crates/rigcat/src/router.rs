//! Command router
//!
//! Every command goes through the generic handlers first (PTT, PTT-METHOD,
//! raw ASCII and raw hex passthrough, split setup) and only then to the
//! vendor codec, so a codec can never shadow a generic command. Failures of
//! any kind collapse to `ERROR`; `NOT FOUND` means that no handler knows
//! the command name.

use rigcat_protocol::{
    CatError, CatResult, Command, ParseError, Response, RigDatabase, RigModel, Transport,
};
use tracing::{debug, info};

use crate::codec::{create_codec, CodecOptions, Link, SplitPlan, VendorCodec};
use crate::error::RigError;
use crate::ptt;
use crate::session::Session;

/// Most bytes read back by a raw passthrough command
pub const RAW_REPLY_MAX: usize = 1000;

/// A radio: its codec, the port it is on and the shadow state
pub struct Rig {
    model: RigModel,
    transport: Box<dyn Transport>,
    session: Session,
    codec: Box<dyn VendorCodec>,
}

impl Rig {
    /// Bind a codec for `model` to `transport` and initialise it
    pub fn new(
        model: RigModel,
        transport: Box<dyn Transport>,
        options: &CodecOptions,
    ) -> Result<Self, RigError> {
        let codec = create_codec(&model, options)?;
        let mut rig = Self {
            model,
            transport,
            session: Session::new(),
            codec,
        };
        rig.init();
        info!("{} bound to {} codec", rig.model.name, rig.codec.name());
        Ok(rig)
    }

    /// Look `model` up in the rig database and bind it
    pub fn open(
        model: &str,
        transport: Box<dyn Transport>,
        options: &CodecOptions,
    ) -> Result<Self, RigError> {
        let model =
            RigDatabase::find(model).ok_or_else(|| RigError::UnknownModel(model.to_string()))?;
        Self::new(model, transport, options)
    }

    /// Put the session back into the codec's starting state
    pub fn init(&mut self) {
        let Self {
            transport,
            session,
            codec,
            ..
        } = self;
        codec.init(&mut Link::new(&mut **transport, session));
    }

    pub fn model(&self) -> &RigModel {
        &self.model
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command given as name and arguments
    pub fn dispatch<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Response {
        self.execute(&Command::new(name, args))
    }

    /// Run one command
    pub fn execute(&mut self, cmd: &Command) -> Response {
        let Self {
            transport,
            session,
            codec,
            ..
        } = self;
        let mut link = Link::new(&mut **transport, session);

        let result = match generic(&**codec, &mut link, cmd) {
            Some(result) => result,
            None => match codec.dispatch(&mut link, cmd) {
                Some(result) => result,
                None => {
                    debug!("{}: unknown command {}", codec.name(), cmd.name());
                    return Response::NotFound;
                }
            },
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                debug!("{} failed: {}", cmd, e);
                Response::Error
            }
        }
    }

    /// Program both VFOs and the split state
    pub fn setup_split(&mut self, plan: &SplitPlan) -> Response {
        let Self {
            transport,
            session,
            codec,
            ..
        } = self;
        match codec.setup_split(&mut Link::new(&mut **transport, session), plan) {
            Ok(()) => Response::Ok,
            Err(e) => {
                debug!("split setup failed: {}", e);
                Response::Error
            }
        }
    }
}

/// Commands every family shares
fn generic(
    codec: &dyn VendorCodec,
    link: &mut Link<'_>,
    cmd: &Command,
) -> Option<CatResult<Response>> {
    let result = match cmd.name() {
        "PTT" => ptt::transact(codec, link, cmd.arg(0)),
        "PTT-METHOD" => ptt::method(link, cmd.arg(0)),
        "ASCII" => raw_ascii(link, cmd),
        "HEX" => raw_hex(link, cmd),
        "SETUP-SPLIT" => SplitPlan::parse(cmd)
            .map_err(CatError::from)
            .and_then(|plan| codec.setup_split(link, &plan))
            .map(|()| Response::Ok),
        _ => return None,
    };
    Some(result)
}

/// Send the arguments joined by spaces and return whatever text comes back
fn raw_ascii(link: &mut Link<'_>, cmd: &Command) -> CatResult<Response> {
    let text = cmd.args().join(" ");
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::InvalidArgument("nothing to send".into()).into());
    }
    let reply = link.exchange(text.as_bytes(), RAW_REPLY_MAX)?;
    Ok(Response::value(String::from_utf8_lossy(&reply)))
}

/// Send the arguments as hex bytes and return the reply as hex
fn raw_hex(link: &mut Link<'_>, cmd: &Command) -> CatResult<Response> {
    let bytes = cmd
        .args()
        .iter()
        .map(|arg| parse_hex_byte(arg))
        .collect::<Result<Vec<u8>, _>>()?;
    if bytes.is_empty() {
        return Err(ParseError::InvalidArgument("nothing to send".into()).into());
    }
    let reply = link.exchange(&bytes, RAW_REPLY_MAX)?;
    Ok(Response::value(format_hex(&reply)))
}

fn parse_hex_byte(arg: &str) -> Result<u8, ParseError> {
    let arg = arg.trim();
    if arg.len() != 2 || !arg.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHex(arg.to_string()));
    }
    u8::from_str_radix(arg, 16).map_err(|_| ParseError::InvalidHex(arg.to_string()))
}

/// `[0x00, 0xAB]` -> `00 AB`
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
