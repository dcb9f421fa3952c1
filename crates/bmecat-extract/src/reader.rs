//! Pull-based item reader.
//!
//! Only the subtree of the item currently being read is materialized; once
//! an item is yielded nothing of it is retained, so memory stays bounded by
//! the largest single item rather than the document.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::element::Element;
use crate::error::ExtractError;

/// Yields every element whose local name equals the item tag, as an owned
/// [`Element`] tree.
///
/// Parsing is recovering: ill-formed markup is logged and skipped, and a
/// syntax error ends the stream (emitting any item that was open) instead
/// of failing it. Only I/O errors are surfaced to the caller.
pub struct ItemReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    item_tag: String,
    open: Vec<Element>,
    finished: bool,
}

impl ItemReader<BufReader<File>> {
    /// Open an XML file for item reading.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the file cannot be opened.
    pub fn open(path: &Path, item_tag: &str) -> Result<Self, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::new(BufReader::new(file), item_tag))
    }
}

impl<R: BufRead> ItemReader<R> {
    pub fn new(input: R, item_tag: &str) -> Self {
        let mut reader = Reader::from_reader(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = false;

        Self {
            reader,
            buf: Vec::new(),
            item_tag: item_tag.to_string(),
            open: Vec::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for ItemReader<R> {
    type Item = Result<Element, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            let decoder = self.reader.decoder();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(start)) => {
                    let element = start_element(&start, decoder);
                    if !self.open.is_empty() || element.name == self.item_tag {
                        self.open.push(element);
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(closed) = self.open.pop() {
                        match self.open.last_mut() {
                            Some(parent) => parent.children.push(closed),
                            None => return Some(Ok(closed)),
                        }
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(current) = leading_text_target(&mut self.open) {
                        match text.unescape() {
                            Ok(unescaped) => current.text.push_str(&unescaped),
                            Err(_) => current.text.push_str(&decode_lossy(decoder, &text)),
                        }
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(current) = leading_text_target(&mut self.open) {
                        current.text.push_str(&decode_lossy(decoder, &data));
                    }
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return close_partial(&mut self.open).map(Ok);
                }
                Ok(_) => {}
                Err(quick_xml::Error::IllFormed(e)) => {
                    tracing::warn!(
                        error = %e,
                        position = self.reader.buffer_position(),
                        "skipping ill-formed markup"
                    );
                }
                Err(e @ quick_xml::Error::Io(_)) => {
                    self.finished = true;
                    return Some(Err(ExtractError::Xml(e)));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        position = self.reader.buffer_position(),
                        "stopping at malformed XML"
                    );
                    self.finished = true;
                    return close_partial(&mut self.open).map(Ok);
                }
            }
        }
    }
}

fn start_element(start: &BytesStart<'_>, decoder: Decoder) -> Element {
    let mut element = Element::new(decode_lossy(decoder, start.local_name().as_ref()));
    for attr in start.attributes().with_checks(false).flatten() {
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = decode_lossy(decoder, attr.key.local_name().as_ref());
        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(value) => value.into_owned(),
            Err(_) => decode_lossy(decoder, &attr.value),
        };
        element.attributes.push((key, value));
    }
    element
}

/// The innermost open element, if it has not yet seen a child. Text after
/// the first child is tail text and is not kept. Comments and processing
/// instructions are not children, so text on both sides of one is joined.
fn leading_text_target(open: &mut [Element]) -> Option<&mut Element> {
    open.last_mut().filter(|el| el.children.is_empty())
}

/// Fold any still-open elements into their item root.
fn close_partial(open: &mut Vec<Element>) -> Option<Element> {
    let mut current = open.pop()?;
    while let Some(mut parent) = open.pop() {
        parent.children.push(current);
        current = parent;
    }
    tracing::warn!(item = %current.name, "document ended inside an item, emitting it as read so far");
    Some(current)
}

fn decode_lossy(decoder: Decoder, bytes: &[u8]) -> String {
    match decoder.decode(bytes) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;
