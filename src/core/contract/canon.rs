// Copyright (c) 2026 DQSN
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! Canonical JSON encoding and content hashing.
//!
//! Canonical form: object keys sorted by code point, `,`/`:` separators with
//! no surrounding whitespace, UTF-8 output, non-ASCII emitted literally. Two
//! conforming implementations that canonicalize the same logical value must
//! produce byte-identical output, because the `context_hash` in every
//! response is defined over this encoding.

use ring::digest;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Canonicalization/hashing error.
#[derive(Debug, Error)]
pub enum CanonError {
    /// The value could not be represented as JSON at all.
    #[error("value is not representable as JSON")]
    NotSerializable,
}

/// Recursively rebuild a [`Value`] so every object is sorted by key.
///
/// `serde_json::Map` is backed by a `BTreeMap` in this crate's configuration
/// (the `preserve_order` feature is never enabled), which already yields
/// sorted iteration; this function does the sort explicitly and recursively
/// so the guarantee does not rely on that implementation detail holding
/// through future dependency changes.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for k in keys {
                sorted.insert(k.clone(), canonicalize(&map[k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Encode `payload` as canonical JSON bytes.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, CanonError> {
    let value = serde_json::to_value(payload).map_err(|_| CanonError::NotSerializable)?;
    let canon = canonicalize(&value);
    serde_json::to_vec(&canon).map_err(|_| CanonError::NotSerializable)
}

/// Lowercase 64-hex SHA-256 of the canonical JSON encoding of `payload`.
pub fn canonical_sha256<T: Serialize>(payload: &T) -> Result<String, CanonError> {
    let bytes = canonical_bytes(payload)?;
    let digest = digest::digest(&digest::SHA256, &bytes);
    Ok(hex::encode(digest.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_and_uses_minimal_separators() {
        let v = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let bytes = canonical_bytes(&v).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"c":3,"d":2},"b":1}"#
        );
    }

    #[test]
    fn non_ascii_is_emitted_literally() {
        let v = json!({"name": "caf\u{e9}"});
        let bytes = canonical_bytes(&v).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(s.contains('\u{e9}'));
        assert!(!s.contains("\\u00e9"));
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(canonical_sha256(&a).unwrap(), canonical_sha256(&b).unwrap());
    }

    #[test]
    fn hash_is_64_lowercase_hex_chars() {
        let h = canonical_sha256(&json!({"k": "v"})).unwrap();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
