//! Attribution of streamed model text to signature fields
//!
//! The chat adapter asks the model to separate fields with
//! `[[ ## name ## ]]` headers. [`FieldStreamer`] follows those headers across
//! arbitrary chunk boundaries and yields text for the fields someone listens
//! to. Text it cannot attribute (a reply that ignores the format) comes out
//! as [`Segment::Raw`].

use crate::adapter::COMPLETED_FIELD;

const HEADER_OPEN: &str = "[[ ## ";
const HEADER_CLOSE: &str = " ## ]]";

/// Bytes of unstructured text held back before the first header
///
/// Past this the preamble is flushed as raw text. Headers are still
/// recognized afterwards.
const PREAMBLE_LIMIT: usize = 400;

/// Request for chunk events of one signature field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamListener {
    pub signature_field_name: String,
}

impl StreamListener {
    pub fn new(signature_field_name: impl Into<String>) -> Self {
        Self {
            signature_field_name: signature_field_name.into(),
        }
    }
}

/// A piece of streamed output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text belonging to a listened field
    Field { name: String, text: String },
    /// Text no field header accounts for
    Raw(String),
}

#[derive(Debug)]
enum State {
    Preamble,
    Field(String),
    Raw,
    Completed,
}

/// Incremental header parser for one model response
#[derive(Debug)]
pub struct FieldStreamer<'a> {
    listeners: &'a [StreamListener],
    state: State,
    buffer: String,
    preamble: String,
    at_field_start: bool,
}

impl<'a> FieldStreamer<'a> {
    pub const fn new(listeners: &'a [StreamListener]) -> Self {
        Self {
            listeners,
            state: State::Preamble,
            buffer: String::new(),
            preamble: String::new(),
            at_field_start: true,
        }
    }

    /// Feed the next content delta
    pub fn push(&mut self, delta: &str) -> Vec<Segment> {
        self.buffer.push_str(delta);
        let mut out = Vec::new();

        loop {
            if matches!(self.state, State::Completed) {
                self.buffer.clear();
                break;
            }

            let Some(start) = self.buffer.find(HEADER_OPEN) else {
                // Hold back anything that may turn into a header, and
                // trailing whitespace that may precede one
                let hold = partial_open_len(&self.buffer);
                let ready = self.buffer[..self.buffer.len() - hold].trim_end().len();
                let text: String = self.buffer.drain(..ready).collect();
                self.emit(&text, &mut out);
                break;
            };

            let name_start = start + HEADER_OPEN.len();
            let Some(name_len) = self.buffer[name_start..].find(HEADER_CLOSE) else {
                let ready = self.buffer[..start].trim_end().len();
                let text: String = self.buffer.drain(..ready).collect();
                self.emit(&text, &mut out);
                break;
            };

            let name = self.buffer[name_start..name_start + name_len].trim().to_owned();
            let before = self.buffer[..start].trim_end().to_owned();
            self.emit(&before, &mut out);
            self.buffer.drain(..name_start + name_len + HEADER_CLOSE.len());

            self.preamble.clear();
            self.at_field_start = true;
            self.state = if name == COMPLETED_FIELD {
                State::Completed
            } else {
                State::Field(name)
            };
        }

        out
    }

    /// Flush whatever is still held once the response has ended
    pub fn finish(mut self) -> Vec<Segment> {
        let rest = std::mem::take(&mut self.buffer);
        let mut out = Vec::new();

        match self.state {
            State::Preamble => {
                self.preamble.push_str(&rest);
                let text = self.preamble.trim();
                if !text.is_empty() {
                    out.push(Segment::Raw(text.to_owned()));
                }
            }
            State::Raw => {
                if !rest.trim_end().is_empty() {
                    out.push(Segment::Raw(rest.trim_end().to_owned()));
                }
            }
            State::Field(_) => self.emit(rest.trim_end(), &mut out),
            State::Completed => {}
        }

        out
    }

    fn is_listened(&self, name: &str) -> bool {
        self.listeners.iter().any(|l| l.signature_field_name == name)
    }

    fn emit(&mut self, text: &str, out: &mut Vec<Segment>) {
        let text = if self.at_field_start { text.trim_start() } else { text };
        if text.is_empty() {
            return;
        }
        self.at_field_start = false;

        match &self.state {
            State::Preamble => {
                self.preamble.push_str(text);
                if self.preamble.len() > PREAMBLE_LIMIT {
                    self.state = State::Raw;
                    out.push(Segment::Raw(std::mem::take(&mut self.preamble)));
                }
            }
            State::Field(name) => {
                if self.is_listened(name) {
                    out.push(Segment::Field {
                        name: name.clone(),
                        text: text.to_owned(),
                    });
                }
            }
            State::Raw => out.push(Segment::Raw(text.to_owned())),
            State::Completed => {}
        }
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of a header
fn partial_open_len(text: &str) -> usize {
    (1..HEADER_OPEN.len())
        .rev()
        .find(|&len| text.ends_with(&HEADER_OPEN[..len]))
        .unwrap_or(0)
}
