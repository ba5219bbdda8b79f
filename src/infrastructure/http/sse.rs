//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes are buffered until a full line is available, so multi-byte
//! characters split across network chunks decode correctly. Lines may end
//! in LF or CRLF. `retry:` is ignored because the reconnect delay is fixed
//! on this side. A line or an event larger than the configured limit is an
//! error; the caller should drop the connection.

use thiserror::Error;

use crate::domain::ports::notification_stream::StreamFrame;

pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_EVENT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SseError {
    #[error("Event stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("Event stream event exceeds {limit} bytes")]
    EventTooLarge { limit: usize },
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline
    scanned: usize,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_event_id: Option<String>,
    started: bool,
    max_line_bytes: usize,
    max_event_bytes: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_LINE_BYTES, DEFAULT_MAX_EVENT_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_line_bytes: usize, max_event_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            event: None,
            data: String::new(),
            has_data: false,
            last_event_id: None,
            started: false,
            max_line_bytes,
            max_event_bytes,
        }
    }

    /// Feed a chunk of the body and collect every frame it completes
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamFrame>, SseError> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut line_start = 0;
        let mut cursor = self.scanned;

        while let Some(offset) = self.buffer[cursor..].iter().position(|b| *b == b'\n') {
            let end = cursor + offset;
            let mut raw = &self.buffer[line_start..end];
            if raw.last() == Some(&b'\r') {
                raw = &raw[..raw.len() - 1];
            }
            if raw.len() > self.max_line_bytes {
                return Err(SseError::LineTooLong {
                    limit: self.max_line_bytes,
                });
            }

            let line = String::from_utf8_lossy(raw).into_owned();
            line_start = end + 1;
            cursor = line_start;

            if let Some(frame) = self.process_line(&line)? {
                frames.push(frame);
            }
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_bytes {
            return Err(SseError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }

        Ok(frames)
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    fn process_line(&mut self, line: &str) -> Result<Option<StreamFrame>, SseError> {
        let line = if self.started {
            line
        } else {
            self.started = true;
            line.strip_prefix('\u{feff}').unwrap_or(line)
        };

        if line.is_empty() {
            return Ok(self.dispatch());
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.data.len() + value.len() + 1 > self.max_event_bytes {
                    return Err(SseError::EventTooLarge {
                        limit: self.max_event_bytes,
                    });
                }
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            _ => {}
        }

        Ok(None)
    }

    fn dispatch(&mut self) -> Option<StreamFrame> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;

        Some(StreamFrame {
            event: event.filter(|name| !name.is_empty()),
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        })
    }
}
