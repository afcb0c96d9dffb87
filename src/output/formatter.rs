//! Response body formatters
//!
//! A formatter decides from the `Content-Type` how to render a body. Bodies
//! a formatter cannot handle are passed through untouched.

use serde_json::Value;
use std::borrow::Cow;

/// Renders a response body for display
pub trait ResponseFormatter: Send + Sync {
    /// Format `body`, given the response's `Content-Type` if it had one
    fn format_body<'a>(&self, content_type: Option<&str>, body: &'a [u8]) -> Cow<'a, [u8]>;
}

/// How response bodies are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Body exactly as received
    #[default]
    Raw,
    /// Re-indented JSON and XML
    Pretty,
}

impl OutputFormat {
    /// The formatter for this output format
    pub fn formatter(self) -> Box<dyn ResponseFormatter> {
        match self {
            OutputFormat::Raw => Box::new(RawFormatter),
            OutputFormat::Pretty => Box::new(PrettyFormatter),
        }
    }
}

/// Passes bodies through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFormatter;

impl ResponseFormatter for RawFormatter {
    fn format_body<'a>(&self, _content_type: Option<&str>, body: &'a [u8]) -> Cow<'a, [u8]> {
        Cow::Borrowed(body)
    }
}

/// Re-indents JSON and XML bodies with two spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyFormatter;

impl PrettyFormatter {
    /// Pretty-print a JSON document; `None` if it does not parse
    pub fn format_json(body: &[u8]) -> Option<Vec<u8>> {
        let value: Value = serde_json::from_slice(body).ok()?;
        serde_json::to_vec_pretty(&value).ok()
    }

    /// Re-indent an XML document; `None` if it is not well formed
    pub fn format_xml(body: &[u8]) -> Option<Vec<u8>> {
        let text = std::str::from_utf8(body).ok()?;
        reindent_xml(text).map(String::into_bytes)
    }
}

impl ResponseFormatter for PrettyFormatter {
    fn format_body<'a>(&self, content_type: Option<&str>, body: &'a [u8]) -> Cow<'a, [u8]> {
        if body.is_empty() {
            return Cow::Borrowed(body);
        }

        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

        let formatted = match BodyKind::from_content_type(&content_type) {
            Some(BodyKind::Json) => Self::format_json(body),
            Some(BodyKind::Xml) => Self::format_xml(body),
            None => None,
        };

        formatted.map_or(Cow::Borrowed(body), Cow::Owned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Xml,
}

impl BodyKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.contains("application/json") || content_type.contains("text/json") {
            Some(BodyKind::Json)
        } else if content_type.contains("application/xml") || content_type.contains("text/xml") {
            Some(BodyKind::Xml)
        } else {
            None
        }
    }
}

// ============================================================================
// XML re-indentation
// ============================================================================

/// Put every element on its own line, indented by depth
///
/// Whitespace-only text is dropped and other text is trimmed. An element
/// holding only text keeps its end tag on the same line.
fn reindent_xml(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    let mut open: Vec<&str> = Vec::new();
    // True until the innermost open element gets a child
    let mut inline = false;
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        let text = rest[..start].trim();
        if !text.is_empty() {
            if open.is_empty() {
                return None;
            }
            out.push_str(text);
        }
        rest = &rest[start..];

        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after.find("]]>")?;
            if open.is_empty() {
                return None;
            }
            let cdata_len = "<![CDATA[".len() + end + "]]>".len();
            out.push_str(&rest[..cdata_len]);
            rest = &rest[cdata_len..];
            continue;
        }

        let tag_len = if rest.starts_with("<!--") {
            rest.find("-->")? + "-->".len()
        } else if rest.starts_with("<?") {
            rest.find("?>")? + "?>".len()
        } else {
            tag_end(rest)? + 1
        };
        let (tag, remaining) = rest.split_at(tag_len);
        rest = remaining;

        if let Some(closing) = tag.strip_prefix("</") {
            let name = closing.trim_end_matches('>').trim();
            if open.pop()? != name {
                return None;
            }
            if !inline {
                newline_indent(&mut out, open.len());
            }
            out.push_str(tag);
            inline = false;
        } else if tag.starts_with("<!") || tag.starts_with("<?") {
            newline_indent(&mut out, open.len());
            out.push_str(tag);
            inline = false;
        } else {
            let name = element_name(tag)?;
            newline_indent(&mut out, open.len());
            out.push_str(tag);
            if tag.ends_with("/>") {
                inline = false;
            } else {
                open.push(name);
                inline = true;
            }
        }
    }

    if !rest.trim().is_empty() || !open.is_empty() {
        return None;
    }

    Some(out)
}

fn newline_indent(out: &mut String, depth: usize) {
    if !out.is_empty() {
        out.push('\n');
    }
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Byte offset of the `>` closing a tag, skipping quoted attribute values
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;

    for (i, c) in tag.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }

    None
}

fn element_name(tag: &str) -> Option<&str> {
    let inner = tag.strip_prefix('<')?;
    let end = inner.find(|c: char| c.is_whitespace() || c == '/' || c == '>')?;
    let name = &inner[..end];
    (!name.is_empty()).then_some(name)
}
