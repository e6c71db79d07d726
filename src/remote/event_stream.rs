//! Incremental decoder for `text/event-stream` bodies.

use thiserror::Error;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name; `message` when the server did not name it.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream.
    pub id: Option<String>,
}

const DEFAULT_EVENT: &str = "message";
const BOM: &[u8] = b"\xEF\xBB\xBF";
/// Longest line accepted before the stream is considered broken.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// A line grew past the decoder's limit without a terminator.
#[derive(Debug, Error)]
#[error("event-stream line exceeds {limit} bytes")]
pub struct LineTooLong {
    pub limit: usize,
}

/// Splits raw body chunks into events.
///
/// Chunks may cut lines (and `\r\n` pairs) anywhere; incomplete input is
/// buffered until the next [`feed`](Self::feed).
#[derive(Debug)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    line_limit: usize,
    started: bool,
    /// Last line ended on `\r`; a leading `\n` in the next chunk belongs to it.
    skip_lf: bool,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_limit(line_limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            line_limit,
            started: false,
            skip_lf: false,
            event: None,
            data: Vec::new(),
            last_id: None,
        }
    }

    /// Consume `chunk` and return every event it completed.
    ///
    /// Fails once an unterminated line outgrows the limit; the decoder should
    /// then be dropped along with its connection.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, LineTooLong> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        if !self.started {
            if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                return Ok(events);
            }
            if self.buffer.starts_with(BOM) {
                self.buffer.drain(..BOM.len());
            }
            self.started = true;
        }

        let mut consumed = 0;
        if self.skip_lf && !self.buffer.is_empty() {
            if self.buffer[0] == b'\n' {
                consumed = 1;
            }
            self.skip_lf = false;
        }

        loop {
            let rest = &self.buffer[consumed..];
            let Some(end) = rest.iter().position(|byte| *byte == b'\n' || *byte == b'\r') else {
                break;
            };
            let ends_with_cr = rest[end] == b'\r';
            let line = String::from_utf8_lossy(&rest[..end]).into_owned();
            consumed += end + 1;

            if ends_with_cr {
                match self.buffer.get(consumed) {
                    Some(b'\n') => consumed += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        self.buffer.drain(..consumed);

        if self.buffer.len() > self.line_limit {
            self.buffer.clear();
            return Err(LineTooLong {
                limit: self.line_limit,
            });
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.last_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_event() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"event: results\ndata: {\"win\":7,\"place\":3,\"show\":12}\n\n").unwrap();

        assert_eq!(
            events,
            vec![SseEvent {
                event: "results".into(),
                data: r#"{"win":7,"place":3,"show":12}"#.into(),
                id: None,
            }]
        );
    }

    #[test]
    fn unnamed_event_defaults_to_message_and_joins_data_lines() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"data: first\ndata:second\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_keep_alives_are_skipped() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b": keep-alive\n\n").unwrap().is_empty());
        assert!(decoder.feed(b"event: results\n\n").unwrap().is_empty());

        // the name of a data-less event does not leak into the next one
        let events = decoder.feed(b"data: x\n\n").unwrap();
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn handles_chunks_split_mid_line_and_mid_crlf() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"id: 4\r\nevent: res").unwrap().is_empty());
        assert!(decoder.feed(b"ults\r\ndata: {\"win\":1,").unwrap().is_empty());
        assert!(decoder.feed(b"\"place\":2,\"show\":3}\r").unwrap().is_empty());
        let events = decoder.feed(b"\n\r\n").unwrap();

        assert_eq!(
            events,
            vec![SseEvent {
                event: "results".into(),
                data: r#"{"win":1,"place":2,"show":3}"#.into(),
                id: Some("4".into()),
            }]
        );
    }

    #[test]
    fn bare_cr_line_ends_dispatch_without_waiting_for_more_input() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"event: results\rdata: a\r\r").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");

        // a `\n` arriving later completes the earlier `\r\n` instead of
        // ending another line
        assert!(decoder.feed(b"\ndata: b\r").unwrap().is_empty());
        let events = decoder.feed(b"\n\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "b");
    }

    #[test]
    fn unterminated_line_past_the_limit_fails() {
        let mut decoder = EventDecoder::with_line_limit(16);
        assert!(decoder.feed(b"data: 0123456789").unwrap().is_empty());

        let err = decoder.feed(b"abcdef").unwrap_err();
        assert_eq!(err.limit, 16);
    }

    #[test]
    fn long_lines_with_terminators_are_fine() {
        let mut decoder = EventDecoder::with_line_limit(16);
        let events = decoder.feed(b"data: 0123456789abcdef\n\n").unwrap();
        assert_eq!(events[0].data, "0123456789abcdef");
    }

    #[test]
    fn strips_byte_order_mark() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"\xEF\xBB\xBFdata: hi\n\n").unwrap();
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn several_events_in_one_chunk() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"data: a\n\ndata: b\r\rdata: c\n").unwrap();

        assert_eq!(
            events.iter().map(|e| e.data.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(decoder.feed(b"\n").unwrap()[0].data, "c");
    }
}
