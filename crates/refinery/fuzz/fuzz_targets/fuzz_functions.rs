//! Fuzz target for the function library.
//!
//! Every catalog function must be total: arbitrary values and arguments
//! either transform or fall back to the input, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use refinery::functions::catalog;
use refinery::{EngineConfig, FunctionLibrary, Value};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let text = String::from_utf8_lossy(data);
    let mut parts = text.split('\u{1f}');
    let value = Value::from_raw(parts.next().unwrap_or_default());
    let args: Vec<Value> = parts.take(4).map(Value::from_raw).collect();

    let library = FunctionLibrary::new(EngineConfig::default());
    for spec in catalog() {
        if spec.is_aggregate() {
            let column = vec![value.clone(), Value::number(1.0), Value::Null];
            let _ = library.apply_column(spec.name, &column, &args);
        } else {
            let _ = library.apply(spec.name, &value, &args);
        }
    }
});
