pub mod error;
pub mod event;

use error::TokenizeError;
use event::{Attributes, TagEvent};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smol_str::SmolStr;
use std::borrow::Cow;

use crate::range::Range;

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

#[derive(Debug, Clone)]
pub struct Options {
    /// Close HTML void elements (`<input>`, `<br>`, ...) as soon as they open.
    pub void_elements: bool,
    /// Keep the content of `<script>` and `<style>` as verbatim text.
    pub raw_text_elements: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            void_elements: true,
            raw_text_elements: true,
        }
    }
}

/// Turns template markup into a flat stream of open/text/close events.
///
/// Names keep their case and entities are left undecoded, so expressions inside attribute
/// values and text reach the compiler exactly as written.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    options: Options,
}

#[derive(Debug, Default)]
struct EventBuffer {
    events: Vec<TagEvent>,
    text: String,
    text_range: Option<Range>,
}

impl EventBuffer {
    fn push_text(&mut self, text: &str, range: Range) {
        self.text.push_str(text);
        self.text_range = Some(match self.text_range {
            Some(current) => Range::new(current.start, range.end),
            None => range,
        });
    }

    fn push(&mut self, event: TagEvent) {
        self.flush_text();
        self.events.push(event);
    }

    fn flush_text(&mut self) {
        if let Some(range) = self.text_range.take() {
            self.events.push(TagEvent::Text {
                text: std::mem::take(&mut self.text),
                range,
            });
        }
    }
}

impl Tokenizer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn tokenize(&self, input: &str) -> Result<Vec<TagEvent>, TokenizeError> {
        let mut buffer = EventBuffer::default();
        let mut base = 0;

        // A raw text element is scanned by hand, after which reading resumes on a fresh
        // reader positioned behind its end tag. A `<` that cannot start markup ends the
        // reader's input the same way and is kept as text.
        'resume: loop {
            let end = find_stray_angle(input, base).unwrap_or(input.len());
            let mut reader = Reader::from_str(&input[base..end]);
            let config = reader.config_mut();
            config.trim_text(false);
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.allow_dangling_amp = true;

            loop {
                let start = base + reader.buffer_position() as usize;
                let event = reader
                    .read_event()
                    .map_err(|e| TokenizeError::Malformed {
                        message: e.to_string(),
                        range: Range::new(start, base + reader.buffer_position() as usize),
                    })?;
                let range = Range::new(start, base + reader.buffer_position() as usize);

                match event {
                    Event::Start(e) => {
                        let name = tag_name(e.name().as_ref());
                        buffer.push(TagEvent::Open {
                            name: name.clone(),
                            attributes: attributes(&e, range)?,
                            range,
                        });

                        if self.is_void(&name) {
                            buffer.push(TagEvent::Close {
                                name,
                                range: Range::new(range.end, range.end),
                            });
                        } else if self.is_raw_text(&name) {
                            let (text_end, close_end) = find_raw_text_end(input, range.end, &name)
                                .ok_or_else(|| TokenizeError::UnterminatedRawText {
                                    name: name.to_string(),
                                    range,
                                })?;

                            if text_end > range.end {
                                buffer.push_text(
                                    &input[range.end..text_end],
                                    Range::new(range.end, text_end),
                                );
                            }

                            buffer.push(TagEvent::Close {
                                name,
                                range: Range::new(text_end, close_end),
                            });
                            base = close_end;
                            continue 'resume;
                        }
                    }
                    Event::Empty(e) => {
                        let name = tag_name(e.name().as_ref());
                        buffer.push(TagEvent::Open {
                            name: name.clone(),
                            attributes: attributes(&e, range)?,
                            range,
                        });
                        buffer.push(TagEvent::Close {
                            name,
                            range: Range::new(range.end, range.end),
                        });
                    }
                    Event::End(e) => {
                        let name = tag_name(e.name().as_ref());

                        if self.is_void(&name) {
                            log::trace!("ignoring end tag of void element `{}`", name);
                            continue;
                        }

                        buffer.push(TagEvent::Close { name, range });
                    }
                    Event::Text(e) => buffer.push_text(&String::from_utf8_lossy(&e), range),
                    Event::CData(e) => buffer.push_text(&String::from_utf8_lossy(&e), range),
                    Event::GeneralRef(e) => {
                        buffer.push_text(&format!("&{};", String::from_utf8_lossy(&e)), range)
                    }
                    Event::Eof if end < input.len() => {
                        buffer.push_text("<", Range::new(end, end + 1));
                        base = end + 1;
                        continue 'resume;
                    }
                    Event::Eof => break 'resume,
                    // Comments, declarations, processing instructions and doctypes.
                    _ => {}
                }
            }
        }

        buffer.flush_text();
        Ok(buffer.events)
    }

    fn is_void(&self, name: &str) -> bool {
        self.options.void_elements && VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
    }

    fn is_raw_text(&self, name: &str) -> bool {
        self.options.raw_text_elements
            && RAW_TEXT_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
    }
}

fn tag_name(name: &[u8]) -> SmolStr {
    SmolStr::new(String::from_utf8_lossy(name))
}

fn attributes(start: &BytesStart, range: Range) -> Result<Attributes, TokenizeError> {
    let mut attributes = Attributes::new();
    let mut iter = start.html_attributes();
    iter.with_checks(false);

    for attribute in iter {
        let attribute = attribute.map_err(|e| TokenizeError::Malformed {
            message: e.to_string(),
            range,
        })?;
        let name: Cow<str> = String::from_utf8_lossy(attribute.key.as_ref());
        attributes.insert(
            name.as_ref(),
            String::from_utf8_lossy(&attribute.value).into_owned(),
        );
    }

    Ok(attributes)
}

/// Finds the first `<` at or after `from` that is not followed by a tag name, `/`, `!` or `?`,
/// as in `{a < b}`. Tags, comments and CDATA sections are stepped over whole, so a `<` inside a
/// quoted attribute value is not reported.
fn find_stray_angle(input: &str, from: usize) -> Option<usize> {
    let mut cursor = from;

    while let Some(found) = input[cursor..].find('<') {
        let at = cursor + found;
        let rest = &input[at..];

        cursor = match rest.as_bytes().get(1).copied() {
            Some(c) if c.is_ascii_alphabetic() || c == b'/' || c == b'?' => {
                at + tag_length(rest)?
            }
            Some(b'!') if rest.starts_with("<!--") => at + rest.find("-->")? + 3,
            Some(b'!') if rest.starts_with("<![CDATA[") => at + rest.find("]]>")? + 3,
            Some(b'!') => at + tag_length(rest)?,
            _ => return Some(at),
        };
    }

    None
}

/// Length of the tag starting `markup`, up to and including the `>` outside quotes.
fn tag_length(markup: &str) -> Option<usize> {
    let mut quote = None;

    for (i, c) in markup.char_indices().skip(1) {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), c) if c == open => quote = None,
            (None, '>') => return Some(i + 1),
            _ => {}
        }
    }

    None
}

/// Finds the end tag closing a raw text element opened right before `from`.
///
/// Returns the offset where the element's text stops and the offset right after the end tag.
fn find_raw_text_end(input: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    // ASCII lowercasing keeps byte offsets intact.
    let rest = input[from..].to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());
    let mut cursor = 0;

    while let Some(found) = rest[cursor..].find(&needle) {
        let tag_start = cursor + found;
        let after = tag_start + needle.len();

        match rest[after..].chars().next() {
            Some(c) if c == '>' || c.is_ascii_whitespace() => {
                let close = rest[after..].find('>')? + after + 1;
                return Some((from + tag_start, from + close));
            }
            _ => cursor = after,
        }
    }

    None
}
