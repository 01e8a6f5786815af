//! Newline-delimited framing over a byte stream.
//!
//! Bytes following a newline stay buffered for the next call, so a client
//! may pipeline several requests in a single write.

use std::io::{self, Read};
use std::mem;

use super::errors::DispatchError;

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Result of waiting for the next frame.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    /// A complete line, including its delimiter when one was present.
    Line(Vec<u8>),
    /// The read timed out before a full line arrived.
    Idle,
    /// The peer closed the stream and nothing is buffered.
    Closed,
}

/// Reads newline-delimited frames with a bounded line length.
pub(crate) struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader enforcing [`MAX_REQUEST_BYTES`].
    pub(crate) const fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_REQUEST_BYTES)
    }

    /// Creates a reader enforcing `max_bytes` per line.
    pub(crate) const fn with_limit(reader: R, max_bytes: usize) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    /// Returns the next frame.
    ///
    /// A trailing partial line is returned as a final frame when the peer
    /// closes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RequestTooLarge`] when a line exceeds the
    /// limit and [`DispatchError::Io`] for socket failures other than
    /// interrupts and read timeouts.
    pub(crate) fn next_frame(&mut self) -> Result<Frame, DispatchError> {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(Frame::Line(line));
            }

            match self.reader.read(&mut chunk) {
                Ok(0) if self.buffer.is_empty() => return Ok(Frame::Closed),
                Ok(0) => return Ok(Frame::Line(mem::take(&mut self.buffer))),
                Ok(read) => self.buffer.extend_from_slice(&chunk[..read]),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(Frame::Idle);
                }
                Err(error) => return Err(DispatchError::Io(error)),
            }
        }
    }

    fn take_line(&mut self) -> Result<Option<Vec<u8>>, DispatchError> {
        match self.buffer.iter().position(|byte| *byte == b'\n') {
            Some(newline) => {
                enforce_limit(newline, self.max_bytes)?;
                let rest = self.buffer.split_off(newline + 1);
                Ok(Some(mem::replace(&mut self.buffer, rest)))
            }
            None => {
                enforce_limit(self.buffer.len(), self.max_bytes)?;
                Ok(None)
            }
        }
    }
}

/// Enforces the maximum request size limit.
fn enforce_limit(size: usize, max_size: usize) -> Result<(), DispatchError> {
    if size > max_size {
        return Err(DispatchError::request_too_large(size, max_size));
    }
    Ok(())
}
