use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped when a slug becomes a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A cleaned `Slug` header, percent-encoded as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl Slug {
    /// Decode and clean a raw `Slug` header.
    ///
    /// Anything after `#` or `?` is dropped; whitespace and `/` become `_`.
    /// The result is re-encoded so it matches the raw request path that
    /// later addresses the resource.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let decoded = percent_decode_str(value?).decode_utf8().ok()?;
        let cleaned: String = decoded
            .split(['#', '?'])
            .next()
            .unwrap_or_default()
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
            .collect();

        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            return None;
        }
        Some(Slug(utf8_percent_encode(&cleaned, PATH_SEGMENT).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
