#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must never panic the minifier: the result is always
// either a successful minification or a structured `Error`, never a
// crash, regardless of how malformed the input is.
fuzz_target!(|data: &[u8]| {
    let _ = turbomin_core::eco::minify_eco(data);
    let _ = turbomin_core::sport::minify_lenient(data);
});
