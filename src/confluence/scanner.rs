//! Diagram macro scanner
//!
//! Finds `<ac:structured-macro ac:name="gliffy">` elements in stored-format
//! markup and reports, per occurrence, the exact byte span of the whole
//! element plus the diagram filename declared in its `name` parameter.
//!
//! This is a deliberate tokenizer rather than a regex: spans must be exact
//! so the rewriter can splice replacements without disturbing any other
//! byte, and macros are matched structurally on the `ac:name` attribute
//! value so unrelated structured macros never false-positive. The scanner
//! treats the document as flat text; it only tracks nesting of
//! `ac:structured-macro` elements to find the matching close tag.

use std::ops::Range;

const MACRO_OPEN: &str = "<ac:structured-macro";
const MACRO_CLOSE: &str = "</ac:structured-macro>";
const PARAM_OPEN: &str = "<ac:parameter";
const PARAM_CLOSE: &str = "</ac:parameter>";

/// Macro type identifier of the diagram macro.
pub const DIAGRAM_MACRO_NAME: &str = "gliffy";

/// Parameter key whose value is the diagram attachment filename.
pub const FILENAME_PARAMETER: &str = "name";

/// One diagram macro found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroOccurrence {
    /// Half-open byte range of the full element, opening tag through
    /// closing tag, in the source markup.
    pub span: Range<usize>,
    /// Attributes of the opening tag, in source order.
    pub attributes: Vec<(String, String)>,
    /// Value of the filename parameter; never empty.
    pub filename: String,
}

/// Scan markup for diagram macros, in ascending span order.
///
/// Malformed occurrences (unclosed element, missing or empty filename
/// parameter, self-closing macro with no body) are skipped silently; a
/// broken page must not abort the whole transform.
pub fn scan(markup: &str) -> Vec<MacroOccurrence> {
    let mut occurrences = Vec::new();
    let mut pos = 0;

    while let Some(rel) = markup[pos..].find(MACRO_OPEN) {
        let start = pos + rel;
        if !token_boundary(markup, start + MACRO_OPEN.len()) {
            pos = start + MACRO_OPEN.len();
            continue;
        }
        let Some(tag) = read_open_tag(markup, start, MACRO_OPEN) else {
            // Unterminated tag; nothing after it can be well formed.
            break;
        };
        pos = tag.end;

        let is_diagram = tag
            .attributes
            .iter()
            .any(|(name, value)| name == "ac:name" && value == DIAGRAM_MACRO_NAME);
        if !is_diagram || tag.self_closing {
            continue;
        }

        let Some(end) = find_element_end(markup, tag.end) else {
            continue;
        };
        let body = &markup[tag.end..end - MACRO_CLOSE.len()];
        match parameter_value(body, FILENAME_PARAMETER) {
            Some(filename) if !filename.trim().is_empty() => {
                occurrences.push(MacroOccurrence {
                    span: start..end,
                    attributes: tag.attributes,
                    filename,
                });
                pos = end;
            }
            // No usable filename: not an occurrence. Resume right after
            // the opening tag so nested macros still get scanned.
            _ => {}
        }
    }

    occurrences
}

struct OpenTag {
    /// Index one past the closing `>`.
    end: usize,
    self_closing: bool,
    attributes: Vec<(String, String)>,
}

/// The token must be followed by whitespace, `/`, or `>` so that e.g.
/// `<ac:structured-macros>` is not mistaken for a macro element.
fn token_boundary(markup: &str, idx: usize) -> bool {
    match markup.as_bytes().get(idx) {
        Some(b) => b.is_ascii_whitespace() || *b == b'/' || *b == b'>',
        None => false,
    }
}

/// Read an opening tag starting at `start` (which must point at `token`),
/// honoring quotes so `>` inside attribute values does not end the tag.
fn read_open_tag(markup: &str, start: usize, token: &str) -> Option<OpenTag> {
    let bytes = markup.as_bytes();
    let mut i = start + token.len();
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                let inner = &markup[start + token.len()..i];
                let (inner, self_closing) = match inner.strip_suffix('/') {
                    Some(stripped) => (stripped, true),
                    None => (inner, false),
                };
                return Some(OpenTag {
                    end: i + 1,
                    self_closing,
                    attributes: parse_attributes(inner),
                });
            }
            None => {}
        }
        i += 1;
    }
    None
}

/// Parse `name="value"` pairs. Bare attributes and unquoted values are
/// ignored; stored format always quotes.
fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let bytes = s.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == name_start {
            i += 1;
            continue;
        }
        let name = &s[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            continue;
        }
        let q = bytes[i];
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != q {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        attrs.push((name.to_string(), s[value_start..i].to_string()));
        i += 1;
    }

    attrs
}

/// From just past an opening tag, find the index one past the matching
/// `</ac:structured-macro>`, counting nested macro elements.
fn find_element_end(markup: &str, mut pos: usize) -> Option<usize> {
    let mut depth = 1usize;

    loop {
        let next_open = markup[pos..].find(MACRO_OPEN).map(|i| pos + i);
        let next_close = markup[pos..].find(MACRO_CLOSE).map(|i| pos + i);

        match (next_open, next_close) {
            (Some(open), Some(close)) if open < close => {
                if !token_boundary(markup, open + MACRO_OPEN.len()) {
                    pos = open + MACRO_OPEN.len();
                    continue;
                }
                let tag = read_open_tag(markup, open, MACRO_OPEN)?;
                if !tag.self_closing {
                    depth += 1;
                }
                pos = tag.end;
            }
            (_, Some(close)) => {
                depth -= 1;
                pos = close + MACRO_CLOSE.len();
                if depth == 0 {
                    return Some(pos);
                }
            }
            (_, None) => return None,
        }
    }
}

/// Inner text of the first `<ac:parameter ac:name="{param}">` element in
/// a macro body.
fn parameter_value(body: &str, param: &str) -> Option<String> {
    let mut pos = 0;

    while let Some(rel) = body[pos..].find(PARAM_OPEN) {
        let start = pos + rel;
        if !token_boundary(body, start + PARAM_OPEN.len()) {
            pos = start + PARAM_OPEN.len();
            continue;
        }
        let tag = read_open_tag(body, start, PARAM_OPEN)?;
        let matches = tag
            .attributes
            .iter()
            .any(|(name, value)| name == "ac:name" && value == param);
        if !matches || tag.self_closing {
            pos = tag.end;
            continue;
        }
        let close = body[tag.end..].find(PARAM_CLOSE)?;
        return Some(body[tag.end..tag.end + close].to_string());
    }
    None
}
