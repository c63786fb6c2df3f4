//! Fuzz target for delimited data loading.

#![no_main]

use libfuzzer_sys::fuzz_target;
use refinery::Loader;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let _ = Loader::new().load_reader("fuzz", data);
});
