//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module converts the raw byte stream of a `streamGenerateContent`
//! response into a stream of [`GenerateContentResponse`] frames. Frames
//! arrive as `data: {json}` lines delimited by blank lines, and a frame's
//! JSON routinely splits across network chunk boundaries, so the processor
//! buffers until a complete frame is available. A frame whose payload does
//! not parse as JSON is skipped rather than surfaced as an error: chunk
//! boundaries do not align with JSON-object boundaries, and a partial
//! payload is expected noise, not a failure.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability::{STREAM_CHUNKS, STREAM_ERRORS, STREAM_FRAMES, STREAM_FRAMES_SKIPPED};
use crate::types::GenerateContentResponse;

/// Process a stream of bytes into a stream of decoded response frames.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let byte_stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let raw: Vec<u8> = Vec::new();
    let buffer = String::new();
    let ended = false;

    stream::unfold(
        (byte_stream, raw, buffer, ended),
        move |(mut byte_stream, mut raw, mut buffer, mut ended)| async move {
            loop {
                // First drain any complete frame already in the buffer.
                if let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        Some(response) => {
                            STREAM_FRAMES.click();
                            return Some((Ok(response), (byte_stream, raw, buffer, ended)));
                        }
                        None => {
                            // Malformed or empty frame, skipped.
                            STREAM_FRAMES_SKIPPED.click();
                            continue;
                        }
                    }
                }

                if ended {
                    return None;
                }

                // Read more data
                match byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_CHUNKS.click();
                        // Chunk boundaries fall anywhere, including inside a
                        // multi-byte codepoint; decode only the complete
                        // prefix and carry the tail into the next chunk.
                        raw.extend_from_slice(&bytes);
                        match take_complete_utf8(&mut raw) {
                            Ok(mut text) => {
                                // Hold back a trailing CR so a CRLF split
                                // across chunks still normalizes.
                                if text.ends_with('\r') {
                                    text.pop();
                                    raw.insert(0, b'\r');
                                }
                                buffer.push_str(&text.replace("\r\n", "\n"));
                            }
                            Err(err) => {
                                STREAM_ERRORS.click();
                                ended = true;
                                return Some((Err(err), (byte_stream, raw, buffer, ended)));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (byte_stream, raw, buffer, ended)));
                    }
                    None => {
                        // End of stream. A final frame may sit in the buffer
                        // without its trailing blank line; terminate it so
                        // the extraction loop above can drain it.
                        ended = true;
                        if !raw.is_empty() {
                            // Whatever bytes remain must decode whole now.
                            match String::from_utf8(std::mem::take(&mut raw)) {
                                Ok(text) => buffer.push_str(&text.replace("\r\n", "\n")),
                                Err(e) => {
                                    STREAM_ERRORS.click();
                                    return Some((
                                        Err(Error::encoding(
                                            format!("Invalid UTF-8 in stream: {e}"),
                                            Some(Box::new(e)),
                                        )),
                                        (byte_stream, raw, buffer, ended),
                                    ));
                                }
                            }
                        }
                        if !buffer.is_empty() {
                            buffer.push_str("\n\n");
                        }
                    }
                }
            }
        },
    )
}

/// Takes the longest complete UTF-8 prefix out of `raw`, leaving a trailing
/// incomplete codepoint in place for the next chunk to finish. Fails only on
/// byte sequences no continuation could make valid.
fn take_complete_utf8(raw: &mut Vec<u8>) -> Result<String> {
    let valid_up_to = match std::str::from_utf8(raw) {
        Ok(_) => raw.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => {
            return Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ));
        }
    };
    let tail = raw.split_off(valid_up_to);
    let head = std::mem::replace(raw, tail);
    String::from_utf8(head)
        .map_err(|e| Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e))))
}

/// Extract one complete SSE frame from the buffer.
///
/// Returns `None` when no complete frame (terminated by a blank line) is
/// buffered yet. Otherwise returns the decoded frame, or `Some((None, ..))`
/// for a frame that carries no parseable `data:` payload, along with the
/// remainder of the buffer.
fn extract_frame(buffer: &str) -> Option<(Option<GenerateContentResponse>, String)> {
    let (frame_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let mut data = None;
    for line in frame_text.lines() {
        if let Some(payload) = line.strip_prefix("data:") {
            data = Some(payload.trim());
        }
    }

    let Some(payload) = data else {
        // Comment or keep-alive frame without a data line.
        return Some((None, rest));
    };

    match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(response) => Some((Some(response), rest)),
        Err(_) => Some((None, rest)),
    }
}
