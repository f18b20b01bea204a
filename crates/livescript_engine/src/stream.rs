//! Line-oriented parser for the gateway's server-sent-event style responses.
//!
//! The parser is independent of the network layer: feed it raw byte chunks in
//! arrival order and it yields structured events for every complete line.

const DONE_MARKER: &str = "[done]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A `data:` payload (or a bare JSON line) with the event context it arrived in.
    Data {
        event: Option<String>,
        payload: String,
    },
    /// The `[done]` marker; nothing after it is parsed.
    Done { event: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ParserState {
    #[default]
    AwaitingLine,
    InEvent(String),
    Done,
}

#[derive(Debug, Default)]
pub struct StreamParser {
    state: ParserState,
    pending: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consume a chunk and return events for every line it completes.
    ///
    /// Bytes after the last newline stay buffered, so multi-byte characters
    /// split across chunks decode correctly.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(event) = self.parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.pending);
        self.parse_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }

    fn parse_line(&mut self, raw: &str) -> Option<StreamEvent> {
        if self.is_done() {
            return None;
        }
        let line = raw.trim();
        if line.is_empty() {
            self.state = ParserState::AwaitingLine;
            return None;
        }
        if let Some(name) = line.strip_prefix("event:") {
            self.state = ParserState::InEvent(name.trim().to_string());
            return None;
        }

        let payload = match line.strip_prefix("data:") {
            Some(payload) => payload.trim(),
            // Some gateway versions emit bare JSON lines without the prefix.
            None if line.starts_with('{') => line,
            None => return None,
        };
        if payload.is_empty() {
            return None;
        }

        let event = match &self.state {
            ParserState::InEvent(name) => Some(name.clone()),
            ParserState::AwaitingLine | ParserState::Done => None,
        };
        if payload == DONE_MARKER {
            self.state = ParserState::Done;
            return Some(StreamEvent::Done { event });
        }
        Some(StreamEvent::Data {
            event,
            payload: payload.to_string(),
        })
    }
}

/// Parse a complete response body in one go.
pub fn parse_stream(raw: &[u8]) -> Vec<StreamEvent> {
    let mut parser = StreamParser::new();
    let mut events = parser.feed(raw);
    events.extend(parser.finish());
    events
}
