//! Incremental newline-delimited JSON decoding.

use serde::de::DeserializeOwned;

/// Splits a byte stream into JSON lines.
///
/// Network chunks do not line up with records, so bytes are buffered
/// until a `\n` arrives. Splitting happens on raw bytes, which keeps
/// multi-byte UTF-8 sequences intact across chunk boundaries.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and decode every complete line it finishes.
    pub fn push<T: DeserializeOwned>(
        &mut self,
        chunk: &[u8],
    ) -> Vec<Result<T, serde_json::Error>> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = trim_ascii(&line[..line.len() - 1]);
            if line.is_empty() {
                continue;
            }
            records.push(serde_json::from_slice(line));
        }
        records
    }

    /// Decode whatever is left once the stream has ended.
    ///
    /// Backends are not required to terminate the last record with `\n`.
    pub fn finish<T: DeserializeOwned>(&mut self) -> Option<Result<T, serde_json::Error>> {
        let rest = std::mem::take(&mut self.buffer);
        let line = trim_ascii(&rest);
        if line.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(line))
        }
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
