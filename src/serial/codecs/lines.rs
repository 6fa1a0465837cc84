use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{command::Command, serial::error::ConnectionError};

/// Splits incoming bytes on `\n` and writes [`Command`]s as single lines.
///
/// Incoming lines are decoded lossily, since the car may emit
/// anything on boot or after a reset.
/// A trailing `\r` is not part of the yielded line.
#[derive(Debug, Default, Clone)]
pub struct LinesCodec {
    /// How far we have looked for a newline into the buffer
    cursor: usize,
}

impl LinesCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LinesCodec {
    type Item = String;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = src.len();

        let look_at = &src[self.cursor..read_to];

        if let Some(position) = look_at.iter().position(|&byte| byte == b'\n') {
            // The cursor may have skipped ahead of the buffer start.
            let actual_position = self.cursor + position;

            self.cursor = 0;

            let line = src.split_to(actual_position);

            // Skip the newline itself.
            src.advance(1);

            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);

            Ok(Some(String::from_utf8_lossy(line).into_owned()))
        } else {
            // No full line yet. Bytes already scanned need not be scanned again.
            self.cursor = read_to;

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                // A partial line at the very end is not a response.
                src.clear();
                self.cursor = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<&Command> for LinesCodec {
    type Error = ConnectionError;

    fn encode(&mut self, item: &Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.to_line().as_bytes());
        Ok(())
    }
}
