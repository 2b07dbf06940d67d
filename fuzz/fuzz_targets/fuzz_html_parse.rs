#![no_main]
use libfuzzer_sys::fuzz_target;
use soupkit::parse_html;

fuzz_target!(|data: &[u8]| {
    // Byte input exercises encoding detection as well as tree building.
    let doc = parse_html(data);
    let _ = doc.prettify();
});
