// Copyright (c) 2026 DQSN
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The canonical hasher must never panic on arbitrary JSON, and must be
    // stable under key-order permutation implied by round-tripping through
    // a HashMap-backed parse.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(s) {
            let _ = dqsnet::core::contract::canon::canonical_sha256(&v);
        }
    }
});
