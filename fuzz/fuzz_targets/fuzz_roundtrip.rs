#![no_main]
use libfuzzer_sys::fuzz_target;
use soupkit::{parse_html, parse_xml};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse -> serialize -> parse should never panic
        let output = parse_html(s).decode();
        let _ = parse_html(&output);
        let output = parse_xml(s).decode();
        let _ = parse_xml(&output);
    }
});
