//! Encoding detection on byte input and re-encoding on output.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use soupkit::{parse_html, parse_xml, DetectionSource, Document, EncodeError, ParseOptions};

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    bytes
}

fn utf16be_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    bytes
}

#[test]
fn test_utf16_bom_beats_conflicting_declaration() {
    let bytes = utf16le_with_bom("<?xml version=\"1.0\" encoding=\"windows-1252\"?><r>caf\u{e9}</r>");
    let doc = parse_xml(&bytes);

    assert_eq!(doc.original_encoding(), Some("UTF-16LE"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::ByteOrderMark));
    assert_eq!(doc.declared_encoding(), Some("windows-1252"));
    let r = doc.tag(doc.root(), "r").unwrap();
    assert_eq!(doc.string(r), Some("caf\u{e9}"));
    assert_eq!(
        doc.decode(),
        "<?xml version=\"1.0\" encoding=\"UTF-16LE\"?><r>caf\u{e9}</r>"
    );
}

#[test]
fn test_utf16be_bom_html_meta() {
    let bytes = utf16be_with_bom("<meta charset=\"iso-8859-1\"><p>\u{263a}</p>");
    let doc = parse_html(&bytes);

    assert_eq!(doc.original_encoding(), Some("UTF-16BE"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::ByteOrderMark));
    assert_eq!(doc.decode(), "<meta charset=\"UTF-16BE\"/><p>\u{263a}</p>");
}

#[test]
fn test_utf8_bom_is_stripped() {
    let doc = parse_html(b"\xef\xbb\xbf<p>\xc3\xa9</p>");
    assert_eq!(doc.original_encoding(), Some("UTF-8"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::ByteOrderMark));
    assert_eq!(doc.decode(), "<p>\u{e9}</p>");
}

#[test]
fn test_declared_multibyte_encoding() {
    let doc = parse_html(b"<meta charset=\"shift_jis\"><p>\x82\xa0</p>");
    assert_eq!(doc.original_encoding(), Some("Shift_JIS"));
    assert_eq!(doc.declared_encoding(), Some("shift_jis"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::Declaration));
    // The declaration already names the encoding used, so it is kept as is.
    assert_eq!(doc.decode(), "<meta charset=\"shift_jis\"/><p>\u{3042}</p>");
}

#[test]
fn test_http_equiv_declaration() {
    let bytes: &[u8] =
        b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\"><p>\xe9</p>";
    let doc = parse_html(bytes);
    assert_eq!(doc.original_encoding(), Some("windows-1252"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::Declaration));

    let out = doc.encode("utf-8").unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\"/><p>\u{e9}</p>"
    );
}

#[test]
fn test_wrong_declaration_falls_back_to_guess() {
    // "Привет" in windows-1251, declared as UTF-8.
    let doc = parse_html(b"<meta charset=\"utf-8\"><p>\xcf\xf0\xe8\xe2\xe5\xf2</p>");
    assert_eq!(doc.original_encoding(), Some("windows-1251"));
    assert_eq!(doc.declared_encoding(), Some("utf-8"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::Heuristic));
    assert_eq!(
        doc.decode(),
        "<meta charset=\"windows-1251\"/><p>\u{41f}\u{440}\u{438}\u{432}\u{435}\u{442}</p>"
    );
}

#[test]
fn test_override_is_trusted() {
    let opts = ParseOptions::default().from_encoding("koi8-r");
    let doc = Document::parse(b"<p>\xf0\xd2\xc9\xd7\xc5\xd4</p>".as_slice(), &opts).unwrap();
    assert_eq!(doc.original_encoding(), Some("koi8-r"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::Override));
    assert_eq!(doc.decode(), "<p>\u{41f}\u{440}\u{438}\u{432}\u{435}\u{442}</p>");
}

#[test]
fn test_ascii_and_utf8_guesses() {
    let doc = parse_html(b"<p>plain</p>");
    assert_eq!(doc.original_encoding(), Some("ascii"));
    assert_eq!(doc.encoding_source(), Some(DetectionSource::Heuristic));

    let doc = parse_html("<p>\u{e9}t\u{e9}</p>".as_bytes());
    assert_eq!(doc.original_encoding(), Some("UTF-8"));
}

#[test]
fn test_text_input_skips_detection() {
    let doc = parse_html("<meta charset='latin-1'><p>x</p>");
    assert_eq!(doc.original_encoding(), None);
    assert_eq!(doc.declared_encoding(), None);
    assert_eq!(doc.decode(), "<meta charset=\"latin-1\"/><p>x</p>");
}

#[test]
fn test_encode_targets() {
    let doc = parse_xml("<?xml version='1.0' encoding='utf-8'?><r>\u{e9}\u{263a}</r>");

    let latin = doc.encode("latin-1").unwrap();
    assert_eq!(
        latin,
        b"<?xml version='1.0' encoding='latin-1'?><r>\xe9&#9786;</r>".to_vec()
    );

    let utf16 = doc.encode("utf-16be").unwrap();
    let expected: Vec<u8> = "<?xml version='1.0' encoding='utf-16be'?><r>\u{e9}\u{263a}</r>"
        .encode_utf16()
        .flat_map(u16::to_be_bytes)
        .collect();
    assert_eq!(utf16, expected);

    assert_eq!(
        doc.encode("no-such-encoding"),
        Err(EncodeError::UnknownEncoding("no-such-encoding".to_string()))
    );
}
