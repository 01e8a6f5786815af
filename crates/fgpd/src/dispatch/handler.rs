//! Connection handler that serves framed requests.
//!
//! Each connection is served sequentially: requests are read, dispatched,
//! and answered strictly in arrival order. A connection may carry any
//! number of requests and stays open until the client hangs up, a framing
//! error occurs, or the daemon drains.

use fgp_daemon_types::{ErrorCode, ErrorEnvelope, Response};
use tracing::{debug, warn};

use crate::transport::{CONNECTION_POLL_INTERVAL, ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::dispatcher::Dispatcher;
use super::errors::MalformedRequest;
use super::frame::{Frame, FrameReader};
use super::request::decode_request;
use super::response::ResponseWriter;

/// Connection handler that parses and dispatches framed requests.
#[derive(Debug)]
pub(crate) struct DispatchConnectionHandler {
    dispatcher: Dispatcher,
}

impl DispatchConnectionHandler {
    pub(crate) const fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    fn serve(&self, stream: &ConnectionStream) {
        if let Err(error) = stream.set_poll_interval(CONNECTION_POLL_INTERVAL) {
            warn!(target: DISPATCH_TARGET, %error, "failed to set read timeout");
            return;
        }
        let mut reader = FrameReader::new(stream.socket());
        let mut writer = ResponseWriter::new(stream.socket());

        loop {
            let line = match reader.next_frame() {
                Ok(Frame::Line(line)) => line,
                Ok(Frame::Idle) => {
                    if stream.drain_requested() {
                        debug!(target: DISPATCH_TARGET, "closing idle connection for shutdown");
                        return;
                    }
                    continue;
                }
                Ok(Frame::Closed) => {
                    debug!(target: DISPATCH_TARGET, "client closed connection");
                    return;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                    return;
                }
            };

            let request = match decode_request(&line) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(malformed) => {
                    reject(&mut writer, malformed);
                    return;
                }
            };

            let Some(response) = self.dispatcher.dispatch(request) else {
                continue;
            };
            if let Err(error) = writer.write_response(&response) {
                warn!(target: DISPATCH_TARGET, %error, "failed to write response");
                return;
            }
        }
    }
}

/// Answers a malformed line when it carried an id, then gives up on the
/// connection.
fn reject<W: std::io::Write>(writer: &mut ResponseWriter<W>, malformed: MalformedRequest) {
    warn!(target: DISPATCH_TARGET, error = %malformed, "malformed request; closing connection");
    let MalformedRequest { id, source } = malformed;
    if id.is_none() {
        return;
    }
    let response = Response::failure(
        id,
        ErrorEnvelope::new(ErrorCode::ProtocolError, source.to_string()),
    );
    if let Err(error) = writer.write_response(&response) {
        debug!(target: DISPATCH_TARGET, %error, "failed to report protocol error");
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn is_ready(&self) -> bool {
        self.dispatcher.host().is_ready()
    }

    fn handle(&self, stream: ConnectionStream) {
        self.serve(&stream);
    }
}
