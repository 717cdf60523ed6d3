//! AWS event-stream framing (`application/vnd.amazon.eventstream`).
//!
//! Bedrock's `invoke-with-response-stream` answers with binary frames:
//!
//! ```text
//! | total len u32 | headers len u32 | prelude crc u32 | headers | payload | message crc u32 |
//! ```
//!
//! Each header is `name len u8, name, value type u8, value`. The decoder is
//! incremental: push bytes as they arrive and pull whole messages out.
//! Checksums are not verified; the transport is TLS.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::LlmError;

const PRELUDE_LEN: usize = 12;
const MESSAGE_CRC_LEN: usize = 4;
const MIN_MESSAGE_LEN: usize = PRELUDE_LEN + MESSAGE_CRC_LEN;
/// Frames larger than this are treated as corruption.
const MAX_MESSAGE_LEN: usize = 24 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    ByteArray(Bytes),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One decoded event-stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Bytes,
}

impl Message {
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(HeaderValue::as_str)
    }

    /// `:message-type`: `event`, `exception` or `error`.
    pub fn message_type(&self) -> Option<&str> {
        self.header_str(":message-type")
    }

    /// `:event-type`, e.g. `chunk`.
    pub fn event_type(&self) -> Option<&str> {
        self.header_str(":event-type")
    }

    /// `:exception-type`, e.g. `throttlingException`.
    pub fn exception_type(&self) -> Option<&str> {
        self.header_str(":exception-type")
            .or_else(|| self.header_str(":error-code"))
    }
}

/// Incremental frame decoder.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: BytesMut,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes received but not yet part of a whole message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Next complete message, `Ok(None)` if more bytes are needed.
    pub fn next_message(&mut self) -> Result<Option<Message>, LlmError> {
        if self.buffer.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let mut prelude = &self.buffer[..PRELUDE_LEN];
        let total_len = prelude.get_u32() as usize;
        let headers_len = prelude.get_u32() as usize;

        if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&total_len) {
            return Err(LlmError::StreamError(format!(
                "invalid event-stream frame length {total_len}"
            )));
        }
        if headers_len > total_len - MIN_MESSAGE_LEN {
            return Err(LlmError::StreamError(format!(
                "event-stream headers length {headers_len} exceeds frame length {total_len}"
            )));
        }
        if self.buffer.len() < total_len {
            return Ok(None);
        }

        let mut frame = self.buffer.split_to(total_len).freeze();
        frame.advance(PRELUDE_LEN);
        let headers = parse_headers(frame.split_to(headers_len))?;
        let payload = frame.split_to(total_len - MIN_MESSAGE_LEN - headers_len);

        Ok(Some(Message { headers, payload }))
    }
}

fn need(buf: &Bytes, n: usize) -> Result<(), LlmError> {
    if buf.remaining() < n {
        return Err(LlmError::StreamError(
            "truncated event-stream header".to_string(),
        ));
    }
    Ok(())
}

fn parse_headers(mut buf: Bytes) -> Result<Vec<(String, HeaderValue)>, LlmError> {
    let mut headers = Vec::new();
    while buf.has_remaining() {
        let name_len = buf.get_u8() as usize;
        need(&buf, name_len + 1)?;
        let name = String::from_utf8(buf.split_to(name_len).to_vec())
            .map_err(|e| LlmError::StreamError(format!("header name is not UTF-8: {e}")))?;

        let value = match buf.get_u8() {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => {
                need(&buf, 1)?;
                HeaderValue::Byte(buf.get_i8())
            }
            3 => {
                need(&buf, 2)?;
                HeaderValue::Short(buf.get_i16())
            }
            4 => {
                need(&buf, 4)?;
                HeaderValue::Int(buf.get_i32())
            }
            5 => {
                need(&buf, 8)?;
                HeaderValue::Long(buf.get_i64())
            }
            6 => {
                need(&buf, 2)?;
                let len = buf.get_u16() as usize;
                need(&buf, len)?;
                HeaderValue::ByteArray(buf.split_to(len))
            }
            7 => {
                need(&buf, 2)?;
                let len = buf.get_u16() as usize;
                need(&buf, len)?;
                let s = String::from_utf8(buf.split_to(len).to_vec()).map_err(|e| {
                    LlmError::StreamError(format!("header `{name}` is not UTF-8: {e}"))
                })?;
                HeaderValue::String(s)
            }
            8 => {
                need(&buf, 8)?;
                HeaderValue::Timestamp(buf.get_i64())
            }
            9 => {
                need(&buf, 16)?;
                let mut uuid = [0u8; 16];
                buf.copy_to_slice(&mut uuid);
                HeaderValue::Uuid(uuid)
            }
            other => {
                return Err(LlmError::StreamError(format!(
                    "unknown event-stream header type {other} for `{name}`"
                )));
            }
        };
        headers.push((name, value));
    }
    Ok(headers)
}

/// Encode a message with string headers. Checksums are written as zero, which
/// [`EventStreamDecoder`] accepts; useful for fixtures and local relays.
pub fn encode_message(headers: &[(&str, &str)], payload: &[u8]) -> Bytes {
    let mut header_bytes = BytesMut::new();
    for (name, value) in headers {
        header_bytes.put_u8(name.len() as u8);
        header_bytes.put_slice(name.as_bytes());
        header_bytes.put_u8(7);
        header_bytes.put_u16(value.len() as u16);
        header_bytes.put_slice(value.as_bytes());
    }

    let total_len = MIN_MESSAGE_LEN + header_bytes.len() + payload.len();
    let mut out = BytesMut::with_capacity(total_len);
    out.put_u32(total_len as u32);
    out.put_u32(header_bytes.len() as u32);
    out.put_u32(0);
    out.put_slice(&header_bytes);
    out.put_slice(payload);
    out.put_u32(0);
    out.freeze()
}
