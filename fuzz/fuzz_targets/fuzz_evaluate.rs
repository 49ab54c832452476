// Copyright (c) 2026 DQSN
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // evaluate() must never panic on untrusted input, including malformed
    // UTF-8/JSON and deeply nested or oversized trees.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(s) {
            let req: dqsnet::core::contract::value::RequestValue = v.into();
            let _ = dqsnet::core::contract::evaluate(&req);
        }
    }
});
