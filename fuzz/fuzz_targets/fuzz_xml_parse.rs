#![no_main]
use libfuzzer_sys::fuzz_target;
use soupkit::parse_xml;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let doc = parse_xml(s);
        let _ = doc.decode();
    }
});
