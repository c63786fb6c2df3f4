//! Fuzz target for the expression parser.
//!
//! Parsing must never panic, and a call must re-parse to the same function
//! name from its own text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use refinery::expression::leading_function_name;
use refinery::{Expression, parse};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let expression = parse(&text);

    if let Expression::Call(call) = &expression {
        assert_eq!(
            leading_function_name(&text).as_deref(),
            Some(call.function_name.as_str())
        );
    }
});
