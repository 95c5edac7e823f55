#![no_main]

use libfuzzer_sys::fuzz_target;

use rita::config::SessionConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let mut config = SessionConfig::default();
        if let Ok(groups) = rita::compile_rules(source, &mut config) {
            // Rendering and regex building must fail cleanly too
            let _ = rita::engine::standalone::compile_rules(&groups, &mut config);
        }
    }
});
