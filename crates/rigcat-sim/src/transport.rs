//! Scripted transport
//!
//! Each expectation pairs the request the codec should write with the bytes
//! the simulated radio answers. A write consumes the next expectation; the
//! following read returns its reply, truncated to the requested length the
//! way a real port stops at `max_bytes`. Writes beyond the script get no
//! answer, which looks like a radio that timed out.
//!
//! The transport is a cheap handle around shared state: hand one clone to
//! the code under test and keep another to inspect what was sent.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use rigcat_protocol::{ControlLine, Transport, TransportError};
use tracing::trace;

/// One scripted request/reply pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Bytes the codec must write; `None` accepts anything
    pub request: Option<Vec<u8>>,
    /// Bytes returned by the next read
    pub reply: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    expectations: VecDeque<Expectation>,
    pending_reply: Option<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    control_lines: Vec<(ControlLine, bool)>,
    mismatches: Vec<String>,
    fail_writes: bool,
    fail_control_lines: bool,
    accept_limit: Option<usize>,
}

/// Scripted request/response transport
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Expect `request` and answer with `reply`
    pub fn expect(&self, request: impl AsRef<[u8]>, reply: impl AsRef<[u8]>) -> &Self {
        self.state().expectations.push_back(Expectation {
            request: Some(request.as_ref().to_vec()),
            reply: reply.as_ref().to_vec(),
        });
        self
    }

    /// Expect `request` and answer with an echo of it followed by `reply`,
    /// as a radio on a shared CI-V bus does
    pub fn expect_echoed(&self, request: impl AsRef<[u8]>, reply: impl AsRef<[u8]>) -> &Self {
        let request = request.as_ref();
        let mut echoed = request.to_vec();
        echoed.extend_from_slice(reply.as_ref());
        self.expect(request, echoed)
    }

    /// Accept any request and answer with `reply`
    pub fn expect_any(&self, reply: impl AsRef<[u8]>) -> &Self {
        self.state().expectations.push_back(Expectation {
            request: None,
            reply: reply.as_ref().to_vec(),
        });
        self
    }

    /// Make every write fail with an I/O error
    pub fn fail_writes(&self, fail: bool) -> &Self {
        self.state().fail_writes = fail;
        self
    }

    /// Make every control line change fail
    pub fn fail_control_lines(&self, fail: bool) -> &Self {
        self.state().fail_control_lines = fail;
        self
    }

    /// Report at most `limit` bytes accepted per write
    pub fn accept_only(&self, limit: Option<usize>) -> &Self {
        self.state().accept_limit = limit;
        self
    }

    /// Every buffer written so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state().sent.clone()
    }

    /// Every buffer written so far, as text
    pub fn sent_text(&self) -> Vec<String> {
        self.state()
            .sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Control line changes in order
    pub fn control_lines(&self) -> Vec<(ControlLine, bool)> {
        self.state().control_lines.clone()
    }

    /// Expectations not yet consumed
    pub fn remaining(&self) -> usize {
        self.state().expectations.len()
    }

    /// Check that every write matched and the script was used up
    pub fn verify(&self) -> Result<(), String> {
        let state = self.state();
        if let Some(first) = state.mismatches.first() {
            return Err(first.clone());
        }
        if !state.expectations.is_empty() {
            return Err(format!(
                "{} expectation(s) never written, next {:02X?}",
                state.expectations.len(),
                state.expectations.front().and_then(|e| e.request.clone())
            ));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        state.sent.push(data.to_vec());
        trace!("mock TX {:02X?}", data);

        let reply = match state.expectations.pop_front() {
            Some(Expectation {
                request: Some(expected),
                reply,
            }) => {
                if expected == data {
                    Some(reply)
                } else {
                    let msg = format!("expected {:02X?}, got {:02X?}", expected, data);
                    state.mismatches.push(msg);
                    None
                }
            }
            Some(Expectation {
                request: None,
                reply,
            }) => Some(reply),
            None => {
                state
                    .mismatches
                    .push(format!("unexpected write {:02X?}", data));
                None
            }
        };
        state.pending_reply = reply;

        Ok(state.accept_limit.map_or(data.len(), |limit| limit.min(data.len())))
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let mut reply = self.state().pending_reply.take().unwrap_or_default();
        reply.truncate(max_bytes);
        Ok(reply)
    }

    fn set_control_line(
        &mut self,
        line: ControlLine,
        asserted: bool,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.fail_control_lines {
            return Err(TransportError::ControlLine {
                line,
                reason: "simulated failure".to_string(),
            });
        }
        state.control_lines.push((line, asserted));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_exchange() {
        let mock = MockTransport::new();
        mock.expect([0x00, 0x00, 0x00, 0x00, 0x03], [0x01, 0x42, 0x50, 0x00, 0x01]);

        let mut port = mock.clone();
        assert_eq!(port.write(&[0x00, 0x00, 0x00, 0x00, 0x03]).unwrap(), 5);
        assert_eq!(port.read(5).unwrap(), vec![0x01, 0x42, 0x50, 0x00, 0x01]);
        assert_eq!(mock.remaining(), 0);
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn test_reply_truncated_to_request() {
        let mock = MockTransport::new();
        mock.expect_any(b"FA007074000;extra");
        let mut port = mock.clone();
        port.write(b"FA;").unwrap();
        assert_eq!(port.read(12).unwrap(), b"FA007074000;");
        assert!(port.read(12).unwrap().is_empty());
    }

    #[test]
    fn test_mismatch_gets_no_reply() {
        let mock = MockTransport::new();
        mock.expect(b"FA;", b"FA007074000;");
        let mut port = mock.clone();
        port.write(b"FB;").unwrap();
        assert!(port.read(12).unwrap().is_empty());
        assert!(mock.verify().is_err());
    }

    #[test]
    fn test_unscripted_write_times_out() {
        let mock = MockTransport::new();
        let mut port = mock.clone();
        port.write(b"SV;").unwrap();
        assert!(port.read(2).unwrap().is_empty());
        assert_eq!(mock.sent_text(), vec!["SV;"]);
        assert!(mock.verify().is_err());
    }

    #[test]
    fn test_echoed_reply() {
        let mock = MockTransport::new();
        mock.expect_echoed([0xFE, 0xFE, 0x70, 0xE0, 0x07, 0x01, 0xFD], [0xFE, 0xFE, 0xE0, 0x70, 0xFB, 0xFD]);
        let mut port = mock.clone();
        port.write(&[0xFE, 0xFE, 0x70, 0xE0, 0x07, 0x01, 0xFD]).unwrap();
        let reply = port.read(13).unwrap();
        assert_eq!(reply.len(), 13);
        assert_eq!(&reply[..7], &[0xFE, 0xFE, 0x70, 0xE0, 0x07, 0x01, 0xFD]);
    }

    #[test]
    fn test_failure_injection() {
        let mock = MockTransport::new();
        mock.fail_writes(true).fail_control_lines(true);
        let mut port = mock.clone();
        assert!(port.write(b"TX1;").is_err());
        assert!(port.set_control_line(ControlLine::Rts, true).is_err());
        assert!(mock.control_lines().is_empty());

        mock.fail_control_lines(false);
        port.set_control_line(ControlLine::Dtr, true).unwrap();
        assert_eq!(mock.control_lines(), vec![(ControlLine::Dtr, true)]);
    }

    #[test]
    fn test_short_write() {
        let mock = MockTransport::new();
        mock.accept_only(Some(2));
        let mut port = mock.clone();
        assert_eq!(port.write(&[1, 2, 3, 4, 5]).unwrap(), 2);
    }
}
