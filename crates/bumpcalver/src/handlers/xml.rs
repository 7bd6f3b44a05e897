use super::{Error, FileType, Locator, VersionHandler, splice};
use quick_xml::events::Event;
use std::ops::Range;

/// Element text content, e.g. the `version` of a maven `pom.xml`.
///
/// The locator is an element path relative to the root element, such as `version`,
/// `./properties/revision` or `.//version` to search all descendants.
/// Element names are matched by their local name, namespace prefixes are ignored.
/// `{namespace}name` segments are accepted as well.
/// Only the text of the matched element is rewritten, a version inside a single CDATA
/// section stays in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlHandler;

#[derive(Debug, PartialEq, Eq)]
struct Query<'a> {
    descendant: bool,
    segments: Vec<&'a str>,
}

/// Strips a `prefix:` or `{namespace}` from an element name.
fn local_name(name: &str) -> &str {
    let name = name.rsplit_once('}').map_or(name, |(_, local)| local);
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Splits an element path on `/`, except inside a `{namespace}`.
fn split_path(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in path.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&path[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

impl<'a> Query<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let path = path.trim();
        let (descendant, path) = match path.strip_prefix(".//") {
            Some(path) => (true, path),
            None => (false, path.strip_prefix("./").unwrap_or(path)),
        };
        let segments: Vec<&str> = split_path(path)
            .into_iter()
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(local_name)
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            descendant,
            segments,
        })
    }

    /// Does the element at the top of `stack` match?
    ///
    /// The first entry of `stack` is the root element, which is never matched itself.
    fn matches(&self, stack: &[String]) -> bool {
        let Some((_root, below_root)) = stack.split_first() else {
            return false;
        };
        if self.descendant {
            below_root.len() >= self.segments.len()
                && below_root[below_root.len() - self.segments.len()..]
                    .iter()
                    .zip(&self.segments)
                    .all(|(name, segment)| name == segment)
        } else {
            below_root.len() == self.segments.len()
                && below_root
                    .iter()
                    .zip(&self.segments)
                    .all(|(name, segment)| name == segment)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Found {
    /// Byte range of the text content of `<name>text</name>`.
    Text(Range<usize>),
    /// Byte range of a self closing `<name/>` element.
    Empty { span: Range<usize>, name: String },
}

fn position(reader: &quick_xml::Reader<&[u8]>) -> Result<usize, Error> {
    usize::try_from(reader.buffer_position()).map_err(|err| Error::parse(FileType::Xml, err))
}

fn utf8_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn locate(contents: &str, query: &Query<'_>) -> Result<Option<Found>, Error> {
    let mut reader = quick_xml::Reader::from_str(contents);
    let mut stack: Vec<String> = Vec::new();
    let mut text_start: Option<usize> = None;
    loop {
        let before = position(&reader)?;
        let event = reader
            .read_event()
            .map_err(|err| Error::parse(FileType::Xml, err))?;
        let after = position(&reader)?;

        if let Some(start) = text_start {
            match event {
                Event::Text(_) | Event::CData(_) => continue,
                _ => return Ok(Some(Found::Text(start..before))),
            }
        }

        match event {
            Event::Start(element) => {
                stack.push(utf8_name(element.local_name().as_ref()));
                if query.matches(&stack) {
                    text_start = Some(after);
                }
            }
            Event::Empty(element) => {
                stack.push(utf8_name(element.local_name().as_ref()));
                if query.matches(&stack) {
                    return Ok(Some(Found::Empty {
                        span: before..after,
                        name: utf8_name(element.name().as_ref()),
                    }));
                }
                stack.pop();
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn query(locator: &Locator) -> Result<Query<'_>, Error> {
    match locator {
        Locator::Variable(path) => Query::parse(path),
        Locator::Section { .. } | Locator::Pattern(_) => None,
    }
    .ok_or_else(|| Error::unsupported_locator(FileType::Xml, locator))
}

/// The range of `span` without leading and trailing whitespace.
fn trimmed(contents: &str, span: Range<usize>) -> Range<usize> {
    let text = &contents[span.clone()];
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return span;
    }
    let start = span.start + (text.len() - text.trim_start().len());
    start..start + trimmed.len()
}

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// The content range when `span` is exactly one CDATA section.
fn cdata_content(contents: &str, span: &Range<usize>) -> Option<Range<usize>> {
    let inner = contents[span.clone()]
        .strip_prefix(CDATA_OPEN)?
        .strip_suffix(CDATA_CLOSE)?;
    if inner.contains(CDATA_CLOSE) {
        return None;
    }
    let start = span.start + CDATA_OPEN.len();
    Some(start..start + inner.len())
}

/// The character data of a run of text and CDATA sections.
fn text_value(mut run: &str) -> Result<String, Error> {
    let mut value = String::new();
    while let Some(open) = run.find(CDATA_OPEN) {
        let text = quick_xml::escape::unescape(&run[..open])
            .map_err(|err| Error::parse(FileType::Xml, err))?;
        value.push_str(&text);
        let cdata = &run[open + CDATA_OPEN.len()..];
        let close = cdata.find(CDATA_CLOSE).unwrap_or(cdata.len());
        value.push_str(&cdata[..close]);
        run = cdata.get(close + CDATA_CLOSE.len()..).unwrap_or_default();
    }
    let text =
        quick_xml::escape::unescape(run).map_err(|err| Error::parse(FileType::Xml, err))?;
    value.push_str(&text);
    Ok(value.trim().to_string())
}

impl VersionHandler for XmlHandler {
    fn file_type(&self) -> FileType {
        FileType::Xml
    }

    fn supports(&self, locator: &Locator) -> bool {
        query(locator).is_ok()
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        let query = query(locator)?;
        match locate(contents, &query)? {
            Some(Found::Text(span)) => {
                let text = text_value(&contents[span])?;
                Ok((!text.is_empty()).then_some(text))
            }
            Some(Found::Empty { .. }) | None => Ok(None),
        }
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        let query = query(locator)?;
        let escaped = quick_xml::escape::escape(new_version);
        let updated = match locate(contents, &query)? {
            Some(Found::Text(span)) => {
                let span = trimmed(contents, span);
                match cdata_content(contents, &span) {
                    Some(inner) if !new_version.contains(CDATA_CLOSE) => {
                        splice(contents, trimmed(contents, inner), new_version)
                    }
                    // mixed text and CDATA collapses into escaped text
                    _ => splice(contents, span, &escaped),
                }
            }
            Some(Found::Empty { span, name }) => {
                let open = contents[span.clone()]
                    .trim_end_matches('>')
                    .trim_end_matches('/')
                    .trim_end();
                let element = format!("{open}>{escaped}</{name}>");
                splice(contents, span, &element)
            }
            None => return Ok(None),
        };
        Ok(Some(updated))
    }
}
