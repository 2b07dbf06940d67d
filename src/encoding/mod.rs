//! Encoding detection and declaration rewriting.
//!
//! Bridges raw bytes to decoded text through `encoding_rs`. The detection
//! order is fixed, and the first step that yields text wins:
//!
//! 1. An encoding named by the caller. Trusted: invalid bytes become U+FFFD.
//! 2. A Byte Order Mark (UTF-8, UTF-16LE, UTF-16BE). The BOM is stripped.
//! 3. A declaration in the first 1024 bytes: the XML declaration's
//!    `encoding="..."`, `<meta charset=...>`, or the `charset=` of a
//!    `<meta http-equiv="Content-Type">`. Used only if the label is known and
//!    the bytes decode without error.
//! 4. A guess: UTF-16 by its NUL pattern, then pure ASCII, then strict
//!    UTF-8, then the best-scoring legacy single- and multi-byte encoding.
//! 5. UTF-8 with replacement characters.
//!
//! Detection never fails. Once the tree is built, declarations that name an
//! encoding other than the one used are rewritten (see
//! [`rewrite_declarations`]).

use std::sync::LazyLock;

use encoding_rs::{
    Encoding, BIG5, EUC_JP, EUC_KR, GBK, ISO_8859_7, ISO_8859_8, KOI8_R, SHIFT_JIS, UTF_16BE,
    UTF_16LE, UTF_8, WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1255,
    WINDOWS_1256,
};
use log::{trace, warn};
use regex::bytes::Regex as BytesRegex;
use regex::{Captures, Regex};

use crate::tree::{AttrValue, Document, NodeKind, StringKind};

/// How many leading bytes are searched for an encoding declaration.
const DECLARATION_SCAN_LIMIT: usize = 1024;

/// `<?xml ... encoding="..."?>` at the start of the input.
#[allow(clippy::expect_used)]
static XML_DECLARATION_RE: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(r#"(?i-u)^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("valid regex")
});

/// `<meta charset=...>` or the `charset=` inside a meta `content` value.
#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?([^"'\s>;/]+)"#).expect("valid regex")
});

/// The `charset=` part of a content-type value.
#[allow(clippy::expect_used)]
static CONTENT_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(charset\s*=\s*)([^;"'\s]+)"#).expect("valid regex")
});

/// The `encoding="..."` pseudo-attribute of an XML declaration.
#[allow(clippy::expect_used)]
static PI_ENCODING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(encoding\s*=\s*["'])([^"']*)(["'])"#).expect("valid regex")
});

/// Legacy encodings tried by the guessing step, in tie-break order.
fn legacy_candidates() -> [&'static Encoding; 14] {
    [
        WINDOWS_1252,
        WINDOWS_1251,
        KOI8_R,
        SHIFT_JIS,
        EUC_JP,
        GBK,
        BIG5,
        EUC_KR,
        WINDOWS_1250,
        ISO_8859_7,
        WINDOWS_1253,
        ISO_8859_8,
        WINDOWS_1255,
        WINDOWS_1256,
    ]
}

/// Which detection step chose the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionSource {
    /// The caller named the encoding.
    Override,
    /// A Byte Order Mark at the start of the input.
    ByteOrderMark,
    /// An XML declaration or `<meta>` tag in the document.
    Declaration,
    /// Inferred from the byte content.
    Heuristic,
    /// Nothing matched; UTF-8 with replacement characters.
    Fallback,
}

/// The result of [`detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// Name of the encoding used to produce `text`.
    pub encoding: String,
    /// The label the document declared for itself, usable or not.
    pub declared: Option<String>,
    pub source: DetectionSource,
}

/// Decodes `bytes`, choosing the encoding as described in the module docs.
///
/// # Examples
///
/// ```
/// use soupkit::encoding::{detect, DetectionSource};
///
/// let decoded = detect(b"<p>caf\xe9</p>", None);
/// assert_eq!(decoded.text, "<p>caf\u{e9}</p>");
/// assert_eq!(decoded.encoding, "windows-1252");
/// assert_eq!(decoded.source, DetectionSource::Heuristic);
/// ```
pub fn detect(bytes: &[u8], override_encoding: Option<&str>) -> Decoded {
    let prefix = &bytes[..bytes.len().min(DECLARATION_SCAN_LIMIT)];
    let raw_declared = find_declared_encoding(prefix);

    let (text, encoding, source) = decode(bytes, override_encoding, raw_declared.as_deref());

    // A BOM-marked or guessed UTF-16 document declares itself in its text.
    let declared = raw_declared.or_else(|| {
        let text_prefix = text
            .char_indices()
            .nth(DECLARATION_SCAN_LIMIT)
            .map_or(text.as_str(), |(end, _)| &text[..end]);
        find_declared_encoding(text_prefix.as_bytes())
    });

    Decoded {
        text,
        encoding,
        declared,
        source,
    }
}

fn decode(
    bytes: &[u8],
    override_encoding: Option<&str>,
    declared: Option<&str>,
) -> (String, String, DetectionSource) {
    if let Some(label) = override_encoding {
        let label = label.trim();
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (text, _) = encoding.decode_without_bom_handling(bytes);
                let text = text.strip_prefix('\u{FEFF}').unwrap_or(&*text).to_string();
                return (text, label.to_string(), DetectionSource::Override);
            }
            None => warn!("unknown encoding override {label:?}; detecting instead"),
        }
    }

    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return (
            text.into_owned(),
            encoding.name().to_string(),
            DetectionSource::ByteOrderMark,
        );
    }

    if let Some(label) = declared {
        // The declaration was readable as ASCII, so a UTF-16 label is wrong
        // about the byte layout; output_encoding maps it to UTF-8.
        if let Some(encoding) = Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding) {
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
                return (
                    text.into_owned(),
                    encoding.name().to_string(),
                    DetectionSource::Declaration,
                );
            }
            trace!("declared encoding {label:?} does not decode the input");
        }
    }

    if let Some((text, name)) = guess(bytes) {
        return (text, name, DetectionSource::Heuristic);
    }

    let text = String::from_utf8_lossy(bytes).into_owned();
    (text, UTF_8.name().to_string(), DetectionSource::Fallback)
}

/// Finds an encoding label declared in the leading bytes of a document.
fn find_declared_encoding(prefix: &[u8]) -> Option<String> {
    XML_DECLARATION_RE
        .captures(prefix)
        .or_else(|| META_CHARSET_RE.captures(prefix))
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

// --- Guessing ---

fn guess(bytes: &[u8]) -> Option<(String, String)> {
    // NUL bytes are ASCII, so UTF-16 has to be ruled out first.
    if let Some(encoding) = utf16_by_nul_pattern(bytes) {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Some((text.into_owned(), encoding.name().to_string()));
        }
    }
    if bytes.is_ascii() {
        return Some((String::from_utf8_lossy(bytes).into_owned(), "ascii".to_string()));
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((text.to_string(), UTF_8.name().to_string()));
    }

    let mut best: Option<(i64, String, &'static Encoding)> = None;
    for encoding in legacy_candidates() {
        let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) else {
            continue;
        };
        let score = score_text(&text);
        trace!("encoding candidate {}: score {score}", encoding.name());
        let better = match &best {
            Some((top, _, _)) => score > *top,
            None => true,
        };
        if better {
            best = Some((score, text.into_owned(), encoding));
        }
    }
    best.map(|(_, text, encoding)| (text, encoding.name().to_string()))
}

/// Recognises UTF-16 text that is mostly ASCII by its zero high bytes.
fn utf16_by_nul_pattern(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return None;
    }
    let pairs = bytes.len() / 2;
    let even_zeros = bytes.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_zeros = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
    if odd_zeros * 2 > pairs && even_zeros == 0 {
        Some(UTF_16LE)
    } else if even_zeros * 2 > pairs && odd_zeros == 0 {
        Some(UTF_16BE)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Greek,
    Cyrillic,
    Hebrew,
    Arabic,
    Cjk,
    Other,
}

fn script_of(ch: char) -> Script {
    match ch {
        'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' => Script::Latin,
        '\u{0370}'..='\u{03FF}' => Script::Greek,
        '\u{0400}'..='\u{04FF}' => Script::Cyrillic,
        '\u{0590}'..='\u{05FF}' => Script::Hebrew,
        '\u{0600}'..='\u{06FF}' => Script::Arabic,
        '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{FF00}'..='\u{FFEF}' => Script::Cjk,
        _ => Script::Other,
    }
}

/// Scores how plausible `text` is as natural-language content.
///
/// Letters score, and score more when a word stays in one script. Accented
/// Latin letters next to each other, script changes inside a word, control
/// characters, and stray symbols all cost points.
fn score_text(text: &str) -> i64 {
    let mut score = 0i64;
    let mut previous: Option<char> = None;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            score += 2;
            if let Some(prev) = previous.filter(|p| p.is_alphabetic()) {
                let (script, prev_script) = (script_of(ch), script_of(prev));
                if script != prev_script {
                    score -= 2;
                } else if script == Script::Latin && !ch.is_ascii() && !prev.is_ascii() {
                    score -= 1;
                } else {
                    score += 1;
                }
            }
        } else if ch.is_control() && !matches!(ch, '\t' | '\n' | '\r' | '\x0C') {
            score -= 10;
        } else if !ch.is_ascii() && !ch.is_whitespace() {
            score -= 1;
        }
        previous = Some(ch);
    }
    score
}

// --- Declaration rewriting ---

/// Returns `true` if two labels name the same encoding.
pub(crate) fn same_encoding(a: &str, b: &str) -> bool {
    match (Encoding::for_label(a.as_bytes()), Encoding::for_label(b.as_bytes())) {
        (Some(x), Some(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Replaces the `charset=` of a content-type value. `None` if it has none.
pub(crate) fn substitute_content_charset(value: &str, encoding: &str) -> Option<String> {
    CONTENT_CHARSET_RE.is_match(value).then(|| {
        CONTENT_CHARSET_RE
            .replace(value, |caps: &Captures<'_>| format!("{}{encoding}", &caps[1]))
            .into_owned()
    })
}

/// Replaces the encoding named by an XML declaration body (`xml version=...`).
/// `None` if `content` is not an XML declaration with an encoding.
pub(crate) fn substitute_declaration_encoding(content: &str, encoding: &str) -> Option<String> {
    let is_declaration = content
        .get(..3)
        .is_some_and(|start| start.eq_ignore_ascii_case("xml"))
        && content[3..].starts_with(|c: char| c.is_ascii_whitespace());
    if !is_declaration || !PI_ENCODING_RE.is_match(content) {
        return None;
    }
    Some(
        PI_ENCODING_RE
            .replace(content, |caps: &Captures<'_>| {
                format!("{}{encoding}{}", &caps[1], &caps[3])
            })
            .into_owned(),
    )
}

/// The replacement value for a `<meta>` attribute naming an encoding.
pub(crate) fn substitute_meta_attribute(attribute: &str, value: &str, encoding: &str) -> Option<String> {
    match attribute {
        "charset" => Some(encoding.to_string()),
        "content" => substitute_content_charset(value, encoding),
        _ => None,
    }
}

/// Points every encoding declaration in `doc` at `encoding`: XML
/// declarations, `<meta charset>`, and `<meta http-equiv>` content values.
pub fn rewrite_declarations(doc: &mut Document, encoding: &str) {
    let ids: Vec<_> = doc.descendants(doc.root()).collect();
    for id in ids {
        match &mut doc.node_mut(id).kind {
            NodeKind::Tag(tag) if tag.name.eq_ignore_ascii_case("meta") => {
                let replacements: Vec<(String, String)> = tag
                    .attributes
                    .iter()
                    .filter_map(|attr| {
                        let value = attr.value.joined();
                        substitute_meta_attribute(&attr.name.to_ascii_lowercase(), &value, encoding)
                            .map(|new| (attr.name.clone(), new))
                    })
                    .collect();
                for (name, value) in replacements {
                    tag.attributes.insert(name, AttrValue::Single(value));
                }
            }
            NodeKind::String(s) if s.kind == StringKind::ProcessingInstruction => {
                if let Some(content) = substitute_declaration_encoding(&s.content, encoding) {
                    s.content = content;
                }
            }
            _ => {}
        }
    }
}
