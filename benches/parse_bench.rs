#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use soupkit::{parse_html, parse_xml, Filter, Query};
use std::fmt::Write;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates an HTML page with `sections` repeated blocks.
fn make_html_doc(sections: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <title>Benchmark Page</title>\n\
         <meta charset=\"utf-8\">\n\
         <link rel=\"stylesheet\" href=\"style.css\">\n\
         </head>\n<body>\n<h1>Benchmark</h1>\n",
    );
    for i in 0..sections {
        let _ = writeln!(
            html,
            "<div class=\"section s{}\" id=\"s{i}\">\
             <p>Paragraph {i} with <b>bold</b> and <i>italic</i> text &amp; more.</p>\
             <ul><li>Item A</li><li>Item B</li><li>Item C</li></ul>\
             <img src=\"img{i}.png\" alt=\"Image {i}\">\
             <a href=\"#s{i}\">Link {i}</a>\
             </div>",
            i % 7
        );
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// HTML that leans on recovery: optional end tags, stray and misnested tags.
fn make_sloppy_html(rows: usize) -> String {
    let mut html = String::from("<table>");
    for i in 0..rows {
        let _ = write!(html, "<tr><td>{i}<td><b>cell<i>{i}</b></i></span><p>a<p>b");
    }
    html
}

/// Generates an XML document with `records` records.
fn make_xml_doc(records: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..records {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// A windows-1252 document with no declaration, so detection has to guess.
fn make_legacy_bytes() -> Vec<u8> {
    let mut bytes = b"<html><body>".to_vec();
    for _ in 0..200 {
        bytes.extend_from_slice(b"<p>Caf\xe9 cr\xe8me br\xfbl\xe9e, na\xefve r\xe9sum\xe9.</p>");
    }
    bytes.extend_from_slice(b"</body></html>");
    bytes
}

// ---------------------------------------------------------------------------
// Parsing benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_html(c: &mut Criterion) {
    let html = make_html_doc(50);
    c.bench_function("parse_html", |b| {
        b.iter(|| parse_html(black_box(&html)));
    });
}

fn bench_parse_html_large(c: &mut Criterion) {
    let html = make_html_doc(1000);
    c.bench_function("parse_html_large", |b| {
        b.iter(|| parse_html(black_box(&html)));
    });
}

fn bench_parse_sloppy_html(c: &mut Criterion) {
    let html = make_sloppy_html(500);
    c.bench_function("parse_sloppy_html", |b| {
        b.iter(|| parse_html(black_box(&html)));
    });
}

fn bench_parse_xml(c: &mut Criterion) {
    let xml = make_xml_doc(1000);
    c.bench_function("parse_xml", |b| {
        b.iter(|| parse_xml(black_box(&xml)));
    });
}

fn bench_detect_encoding(c: &mut Criterion) {
    let bytes = make_legacy_bytes();
    c.bench_function("parse_legacy_bytes", |b| {
        b.iter(|| parse_html(black_box(&bytes)));
    });
}

// ---------------------------------------------------------------------------
// Search benchmarks
// ---------------------------------------------------------------------------

fn bench_find_all_by_name(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    let query = Query::name("li");
    c.bench_function("find_all_by_name", |b| {
        b.iter(|| doc.find_all(doc.root(), black_box(&query), true, None));
    });
}

fn bench_find_all_by_class_pattern(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    let query = Query::name("div").class(Filter::pattern("^s[0-3]$").expect("valid pattern"));
    c.bench_function("find_all_by_class_pattern", |b| {
        b.iter(|| doc.find_all(doc.root(), black_box(&query), true, None));
    });
}

fn bench_find_text(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    let query = Query::new().text("Link 999");
    c.bench_function("find_text", |b| {
        b.iter(|| doc.find(doc.root(), black_box(&query)));
    });
}

// ---------------------------------------------------------------------------
// Serialization benchmarks
// ---------------------------------------------------------------------------

fn bench_decode(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    c.bench_function("decode", |b| {
        b.iter(|| black_box(&doc).decode());
    });
}

fn bench_prettify(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    c.bench_function("prettify", |b| {
        b.iter(|| black_box(&doc).prettify());
    });
}

fn bench_encode_latin1(c: &mut Criterion) {
    let doc = parse_html(&make_html_doc(1000));
    c.bench_function("encode_latin1", |b| {
        b.iter(|| black_box(&doc).encode("latin-1").expect("known label"));
    });
}

criterion_group!(
    parsing,
    bench_parse_html,
    bench_parse_html_large,
    bench_parse_sloppy_html,
    bench_parse_xml,
    bench_detect_encoding,
);
criterion_group!(
    search,
    bench_find_all_by_name,
    bench_find_all_by_class_pattern,
    bench_find_text,
);
criterion_group!(serialization, bench_decode, bench_prettify, bench_encode_latin1);
criterion_main!(parsing, search, serialization);
