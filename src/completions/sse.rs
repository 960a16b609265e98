//! Server-sent-event decoding for streamed chat completions.

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::completions::response::{ChatCompletionChunk, convert_to_delta};
use crate::core::{CompletionDelta, LlmError};

const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available, so a line (or a
/// multi-byte character) split across network chunks is reassembled
/// before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the payload of every completed `data:` line.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = parse_data_line(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        parse_data_line(&line)
    }
}

fn parse_data_line(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

fn decode_chunk(data: &str) -> Result<CompletionDelta, LlmError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| LlmError::Parse {
        message: format!("Failed to parse stream chunk: {data}"),
        source: Box::new(e),
    })?;
    convert_to_delta(chunk)
}

/// Turn a streamed response body into completion fragments, stopping at `[DONE]`.
pub(crate) fn delta_stream<S>(
    body: S,
) -> impl Stream<Item = Result<CompletionDelta, LlmError>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    try_stream! {
        let mut body = Box::pin(body);
        let mut decoder = SseDecoder::new();
        let mut done = false;

        while !done {
            let Some(next) = body.next().await else {
                break;
            };
            let bytes = next.map_err(|e| LlmError::Network {
                message: "Failed to read stream chunk".to_string(),
                source: Box::new(e),
            })?;

            for data in decoder.feed(&bytes) {
                if data == DONE_SENTINEL {
                    done = true;
                    break;
                }
                yield decode_chunk(&data)?;
            }
        }

        if !done {
            if let Some(data) = decoder.finish().filter(|data| data != DONE_SENTINEL) {
                yield decode_chunk(&data)?;
            }
        }
    }
}
