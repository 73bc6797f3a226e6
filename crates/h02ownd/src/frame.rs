//! Splits a tracker byte stream into `#`-terminated frames

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Longest frame accepted, terminator excluded
pub const MAX_FRAME_LEN: usize = 1024;

const TERMINATOR: u8 = b'#';

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no frame terminator within {} bytes", MAX_FRAME_LEN)]
    TooLong,
}

/// Reads frames from a tracker connection.
///
/// Frames come back without their terminator and trimmed of surrounding
/// whitespace; empty frames are skipped. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, so the parser reports the frame as
/// malformed. `next_frame` keeps its state in the reader and can be raced
/// against other futures without losing data.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: Box<[u8; MAX_FRAME_LEN + 1]>,
    read_pos: usize,
    write_pos: usize,
    no_terminator_until: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Box::new([0; MAX_FRAME_LEN + 1]),
            read_pos: 0,
            write_pos: 0,
            no_terminator_until: 0,
        }
    }

    /// Next complete frame, or `None` once the peer closes the stream.
    ///
    /// A trailing partial frame at end of stream is discarded.
    pub async fn next_frame(&mut self) -> Result<Option<String>, FrameError> {
        loop {
            while let Some(frame) = self.take_frame() {
                if !frame.is_empty() {
                    return Ok(Some(frame));
                }
            }

            self.compact();
            if self.write_pos == self.buffer.len() {
                return Err(FrameError::TooLong);
            }

            let read = self.reader.read(&mut self.buffer[self.write_pos..]).await?;
            if read == 0 {
                let pending = &self.buffer[self.read_pos..self.write_pos];
                if pending.iter().any(|b| !b.is_ascii_whitespace()) {
                    debug!(bytes = pending.len(), "Discarding unterminated frame");
                }
                return Ok(None);
            }
            self.write_pos += read;
        }
    }

    fn take_frame(&mut self) -> Option<String> {
        let offset = self.buffer[self.no_terminator_until..self.write_pos]
            .iter()
            .position(|b| *b == TERMINATOR);

        match offset {
            Some(offset) => {
                let end = self.no_terminator_until + offset;
                let frame = String::from_utf8_lossy(&self.buffer[self.read_pos..end])
                    .trim()
                    .to_string();
                self.read_pos = end + 1;
                self.no_terminator_until = self.read_pos;
                Some(frame)
            }
            None => {
                self.no_terminator_until = self.write_pos;
                None
            }
        }
    }

    fn compact(&mut self) {
        if self.read_pos == 0 {
            return;
        }
        self.buffer.copy_within(self.read_pos..self.write_pos, 0);
        self.write_pos -= self.read_pos;
        self.no_terminator_until -= self.read_pos;
        self.read_pos = 0;
    }
}
