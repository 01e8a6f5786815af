//! Minimal line-oriented client used by socket-level tests.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};

use fgp_daemon_types::{Params, Request, Response};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client speaking the newline-delimited protocol.
pub struct TestClient {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
}

impl TestClient {
    pub fn new(stream: UnixStream) -> Self {
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set client read timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone client stream"));
        Self {
            writer: stream,
            reader,
        }
    }

    pub fn connect(path: &Path) -> std::io::Result<Self> {
        UnixStream::connect(path).map(Self::new)
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.try_send_raw(bytes).expect("write to daemon");
    }

    pub fn try_send_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }

    pub fn send(&mut self, request: &Request) {
        let mut line = serde_json::to_vec(request).expect("encode request");
        line.push(b'\n');
        self.send_raw(&line);
    }

    /// Reads the next response; `None` once the daemon closed the socket.
    pub fn read_response(&mut self) -> Option<Response> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read from daemon");
        if read == 0 {
            return None;
        }
        Some(serde_json::from_str(&line).expect("decode response"))
    }

    pub fn call(&mut self, request: &Request) -> Response {
        self.send(request);
        self.read_response().expect("daemon closed the connection")
    }

    /// Shorthand for a request with id `id`, method, and object params.
    pub fn call_method(&mut self, id: &str, method: &str, params: Value) -> Response {
        self.call(&request(id, method, params))
    }

    /// Returns `true` when the daemon has closed its side of the socket.
    pub fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(read) => read == 0,
            Err(error) => error.kind() == std::io::ErrorKind::ConnectionReset,
        }
    }

    pub fn close_write(&self) {
        self.writer
            .shutdown(std::net::Shutdown::Write)
            .expect("half-close client");
    }
}

/// Builds a request carrying `id` and the fields of `params`.
pub fn request(id: &str, method: &str, params: Value) -> Request {
    let params = match params {
        Value::Object(map) => map,
        Value::Null => Params::new(),
        other => Params::from_iter([("value".to_owned(), other)]),
    };
    Request::new(method).with_id(json!(id)).with_params(params)
}
