//! NDJSON line parser for streaming generation responses.
//!
//! Ollama streams one JSON object per line over chunked HTTP. Chunk
//! boundaries do not align with line boundaries, so this module provides a
//! buffering parser that:
//! - Accumulates incoming bytes
//! - Splits on newlines (tolerating `\r\n`)
//! - Skips blank lines and invalid UTF-8
//! - Flushes any trailing buffered line when the stream ends

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

/// Parse newline-delimited JSON lines from a byte stream.
///
/// Yields each non-empty line as a `String` for provider-specific parsing.
/// Read errors end the stream after a warning; the caller observes a short
/// stream rather than an error item.
pub fn parse_json_lines<S>(byte_stream: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                // Check buffer for a complete line (\n)
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    // Remove trailing \n
                    line_bytes.truncate(line_bytes.len() - 1);
                    // Remove trailing \r if present
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    let line = match std::str::from_utf8(&line_bytes) {
                        Ok(s) => s.trim(),
                        Err(_) => continue, // skip invalid UTF-8 lines
                    };
                    if line.is_empty() {
                        continue;
                    }
                    return Some((line.to_string(), (stream, buffer, false)));
                }

                // Read next chunk — append raw bytes, no conversion
                match stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        warn!("generation stream read error: {e}");
                        return None;
                    }
                    None => {
                        // Stream ended — flush remaining buffer as a final line
                        if !buffer.is_empty() {
                            if let Ok(line) = std::str::from_utf8(&buffer) {
                                let line = line.trim().to_string();
                                buffer.clear();
                                if !line.is_empty() {
                                    return Some((line, (stream, buffer, true)));
                                }
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}
