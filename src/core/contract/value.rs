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

//! An untrusted, JSON-shaped value tree: the input type of the validator.
//!
//! `serde_json::Value` cannot hold NaN or +/-Infinity (`serde_json::Number`
//! rejects them at construction), which would make this contract's
//! NaN/Infinity rejection untestable and the "mapping in, mapping out"
//! function contract from the spec (which does not mandate the caller parsed
//! the request from wire bytes — an in-process caller may hand `evaluate` a
//! value tree it built directly) unrepresentable. [`RequestValue`] is the
//! minimal value tree that can.
//!
//! It also keeps integers and floats distinct by construction, matching the
//! JSON-schema requirement that `contract_version` be an integer and not,
//! say, `3.0`.

use std::collections::BTreeMap;

/// An untrusted, JSON-shaped value.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestValue {
    /// JSON `null`.
    Null,
    /// JSON boolean. Never accepted where a number is required.
    Bool(bool),
    /// An integer-shaped JSON number (no fractional part in its literal).
    Int(i64),
    /// A float-shaped JSON number. May be NaN or +/-Infinity.
    Float(f64),
    /// A JSON string.
    String(String),
    /// A JSON array, order preserved.
    Array(Vec<RequestValue>),
    /// A JSON object. Stored sorted by key so any downstream serialization of
    /// already-validated data is trivially in canonical key order.
    Object(BTreeMap<String, RequestValue>),
}

impl RequestValue {
    /// Build an object from key/value pairs.
    pub fn object<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RequestValue)>,
        K: Into<String>,
    {
        RequestValue::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = RequestValue>,
    {
        RequestValue::Array(items.into_iter().collect())
    }

    /// Build a string value.
    pub fn str(s: impl Into<String>) -> Self {
        RequestValue::String(s.into())
    }

    /// Build an integer value.
    pub fn int(v: i64) -> Self {
        RequestValue::Int(v)
    }

    /// Build a float value (may be non-finite).
    pub fn float(v: f64) -> Self {
        RequestValue::Float(v)
    }

    /// View as an object map, if this is one.
    pub fn as_object(&self) -> Option<&BTreeMap<String, RequestValue>> {
        match self {
            RequestValue::Object(m) => Some(m),
            _ => None,
        }
    }

    /// View as an array, if this is one.
    pub fn as_array(&self) -> Option<&[RequestValue]> {
        match self {
            RequestValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// View as a string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// View as an integer, if this is an integer-shaped number. Booleans are
    /// never coerced into integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RequestValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// View as a bool, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RequestValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value as `f64` for either integer- or float-shaped numbers.
    /// Booleans are never coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RequestValue::Int(i) => Some(*i as f64),
            RequestValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// True if this value is a number (int or float) and not a boolean.
    pub fn is_number(&self) -> bool {
        matches!(self, RequestValue::Int(_) | RequestValue::Float(_))
    }

    /// Approximate canonical-JSON encoded size in bytes.
    ///
    /// This walks the tree iteratively (an explicit work stack, not
    /// recursion) so a maliciously deep `evidence`/`meta` payload cannot blow
    /// the call stack before the size cap even gets a chance to reject it.
    /// Non-finite numbers are counted using their Rust `Display` form; this
    /// function is only used for the payload-size bound (step 8), never for
    /// hashing — the hash-bearing canonical form in `canon` only ever sees
    /// already-validated, finite data.
    pub fn canonical_size_bytes(&self) -> usize {
        let mut total = 0usize;
        let mut stack: Vec<&RequestValue> = vec![self];
        while let Some(v) = stack.pop() {
            match v {
                RequestValue::Null => total += 4,
                RequestValue::Bool(b) => total += if *b { 4 } else { 5 },
                RequestValue::Int(i) => total += i.to_string().len(),
                RequestValue::Float(f) => total += f.to_string().len(),
                RequestValue::String(s) => total += s.len() + 2 + extra_escape_bytes(s),
                RequestValue::Array(items) => {
                    total += 2 + items.len().saturating_sub(1);
                    stack.extend(items.iter());
                }
                RequestValue::Object(map) => {
                    total += 2 + map.len().saturating_sub(1);
                    for (k, val) in map.iter() {
                        total += k.len() + 3 + extra_escape_bytes(k); // quotes + ':'
                        stack.push(val);
                    }
                }
            }
        }
        total
    }

    /// Iteratively walk the tree, counting nodes (cap `node_cap`) and
    /// checking every number is finite.
    ///
    /// Returns `Ok(())` if the whole tree is within the node cap and every
    /// number is finite. Object keys are always Rust `String`s by
    /// construction, so the "non-string key" failure mode from the spec can
    /// never actually trigger here; the check is kept so the function's
    /// contract stays exact if `RequestValue` ever grows a non-string-keyed
    /// variant.
    pub fn numeric_hygiene_sweep(&self, node_cap: usize) -> Result<(), super::reason_code::ReasonCode> {
        use super::reason_code::ReasonCode;

        let mut stack: Vec<&RequestValue> = vec![self];
        let mut visited = 0usize;
        while let Some(v) = stack.pop() {
            visited += 1;
            if visited > node_cap {
                return Err(ReasonCode::ErrorPayloadTooLarge);
            }
            match v {
                RequestValue::Float(f) if !f.is_finite() => return Err(ReasonCode::ErrorBadNumber),
                RequestValue::Array(items) => stack.extend(items.iter()),
                RequestValue::Object(map) => stack.extend(map.values()),
                _ => {}
            }
        }
        Ok(())
    }
}

fn extra_escape_bytes(s: &str) -> usize {
    s.chars()
        .filter(|c| matches!(c, '"' | '\\' | '\n' | '\r' | '\t'))
        .count()
}

impl From<serde_json::Value> for RequestValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => RequestValue::Null,
            serde_json::Value::Bool(b) => RequestValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RequestValue::Int(i)
                } else {
                    // serde_json::Number is always finite; unwrap_or is unreachable in practice.
                    RequestValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => RequestValue::String(s),
            serde_json::Value::Array(items) => {
                RequestValue::Array(items.into_iter().map(RequestValue::from).collect())
            }
            serde_json::Value::Object(map) => RequestValue::Object(
                map.into_iter().map(|(k, v)| (k, RequestValue::from(v))).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hygiene_sweep_rejects_nan_and_infinity() {
        let v = RequestValue::object([("score", RequestValue::float(f64::NAN))]);
        assert!(v.numeric_hygiene_sweep(1000).is_err());

        let v = RequestValue::object([("score", RequestValue::float(f64::INFINITY))]);
        assert!(v.numeric_hygiene_sweep(1000).is_err());
    }

    #[test]
    fn hygiene_sweep_accepts_finite_numbers() {
        let v = RequestValue::object([
            ("a", RequestValue::int(3)),
            ("b", RequestValue::float(0.5)),
        ]);
        assert!(v.numeric_hygiene_sweep(1000).is_ok());
    }

    #[test]
    fn hygiene_sweep_enforces_node_cap() {
        let deep = RequestValue::array((0..10).map(RequestValue::int));
        assert!(deep.numeric_hygiene_sweep(5).is_err());
        assert!(deep.numeric_hygiene_sweep(20).is_ok());
    }

    #[test]
    fn from_serde_json_distinguishes_int_and_float() {
        let v: RequestValue = serde_json::json!(3).into();
        assert_eq!(v.as_int(), Some(3));

        let v: RequestValue = serde_json::json!(3.0).into();
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_f64(), Some(3.0));
    }
}
