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

//! Shield Contract v3: the deterministic risk-signal aggregation core.
//!
//! The only externally observable entry point is [`evaluate`]. Everything
//! else in this module tree is an implementation detail reachable through
//! that one pure function: parse (`validator`), identify (`canon`), and
//! combine (`aggregator`) a request into a response, using the closed
//! vocabulary in `reason_code`.

pub mod aggregator;
pub mod canon;
pub mod reason_code;
pub mod types;
pub mod value;
pub mod validator;

use aggregator::ResponseEnvelope;
use reason_code::ReasonCode;
use value::RequestValue;

/// Best-effort component/request_id extraction for building an error
/// envelope when the request didn't even validate far enough to produce a
/// [`types::ValidatedRequest`]. Falls back to `"dqsn"`/`""` — the response is
/// fail-closed either way, and the reason code is what an auditor actually
/// keys on.
fn best_effort_identity(raw: &RequestValue) -> (String, String) {
    let component = raw
        .as_object()
        .and_then(|m| m.get("component"))
        .and_then(RequestValue::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| validator::COMPONENT.to_string());
    let request_id = raw
        .as_object()
        .and_then(|m| m.get("request_id"))
        .and_then(RequestValue::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_default();
    (component, request_id)
}

/// Evaluate a Shield Contract v3 request, returning a fully-formed response
/// envelope. Never panics for untrusted input: any internal fault is caught
/// via [`std::panic::catch_unwind`] and remapped to
/// [`ReasonCode::ErrorInvalidRequest`], matching §4.5 and §7 of the contract.
///
/// This function performs no I/O and consults no environment or clock; it is
/// a pure function of `request`.
pub fn evaluate(request: &RequestValue) -> ResponseEnvelope {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        match validator::validate(request) {
            Ok(validated) => aggregator::aggregate(&validated),
            Err(reason) => {
                let (component, request_id) = best_effort_identity(request);
                aggregator::build_error(&component, &request_id, reason)
            }
        }
    }));

    outcome.unwrap_or_else(|_| {
        let (component, request_id) = best_effort_identity(request);
        aggregator::build_error(&component, &request_id, ReasonCode::ErrorInvalidRequest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request() -> RequestValue {
        RequestValue::object([
            ("contract_version", RequestValue::int(3)),
            ("component", RequestValue::str("dqsn")),
            ("request_id", RequestValue::str("rq1")),
            ("signals", RequestValue::array([])),
            ("constraints", RequestValue::object::<_, String>([])),
        ])
    }

    #[test]
    fn evaluate_is_pure() {
        let req = minimal_request();
        let a = serde_json::to_string(&evaluate(&req)).unwrap();
        let b = serde_json::to_string(&evaluate(&req)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn evaluate_never_panics_on_non_object_input() {
        let resp = evaluate(&RequestValue::Null);
        assert_eq!(resp.reason_codes, vec!["DQSN_ERROR_INVALID_REQUEST"]);
    }

    #[test]
    fn evaluate_fails_closed_on_meta() {
        let req = minimal_request();
        let resp = evaluate(&req);
        assert!(resp.meta.fail_closed);
        assert_eq!(resp.meta.latency_ms, 0);
    }
}
