#![no_main]

use libfuzzer_sys::fuzz_target;

// When the byte state machine (the ground truth) accepts an input, the
// SPORT and TURBO fast paths must agree with it byte-for-byte. When it
// rejects, the fast paths are free to differ (SPORT/TURBO may be lenient
// about trailing commas), so only the accept case is compared.
fuzz_target!(|data: &[u8]| {
    let Ok(expected) = turbomin_core::eco::minify_eco(data) else {
        return;
    };

    if let Ok(sport) = turbomin_core::sport::minify_strict(data) {
        assert_eq!(sport, expected, "SPORT disagreed with the state machine");
    }

    let config = turbomin_core::turbo::TurboConfig {
        chunk_size: Some(16),
        ..Default::default()
    };
    if let Ok(turbo) = turbomin_core::turbo::minify_turbo(data, &config) {
        assert_eq!(turbo, expected, "TURBO disagreed with the state machine");
    }
});
