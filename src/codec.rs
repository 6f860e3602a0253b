//! Newline delimited JSON framing for log streams and files.

use crate::error::Error;
use bytes::{BufMut, BytesMut};
use serde_json::{Map, Value};
use tokio_util::codec::{Decoder, Encoder};

pub type JsonObject = Map<String, Value>;

/// Encodes JSON objects as single lines and decodes log files back into them.
/// Blank lines are skipped.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct JsonLinesCodec {
    // Bytes of the buffer already searched for a newline
    next_index: usize,
}

impl JsonLinesCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

impl Encoder<JsonObject> for JsonLinesCodec {
    type Error = Error;

    fn encode(&mut self, item: JsonObject, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = serde_json::to_vec(&item)?;
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(&line);
        dst.put_u8(b'\n');
        Ok(())
    }
}

impl Decoder for JsonLinesCodec {
    type Item = JsonObject;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                return Ok(None);
            };
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            let line = trim_line(&line);
            if line.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_slice(line)?));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(obj) = self.decode(src)? {
            return Ok(Some(obj));
        }
        // Final line without a trailing newline
        let rest = src.split_to(src.len());
        self.next_index = 0;
        let line = trim_line(&rest);
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(serde_json::from_slice(line)?))
        }
    }
}
