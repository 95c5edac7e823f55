#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary input must produce statements or a syntax error, never a panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = rita::dsl::parse(source);
    }
});
