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

//! Strict, order-fixed validator for Shield Contract v3 requests.
//!
//! Each failure maps to exactly one [`ReasonCode`]; the first failing check
//! short-circuits the rest. The check order below is part of the contract —
//! two conforming implementations fed the same malformed input must report
//! the same error, which only holds if they check in the same order.

use super::reason_code::ReasonCode;
use super::types::{
    ScoreLike, UpstreamDecision, ValidatedConstraints, ValidatedRequest, ValidatedRisk,
    ValidatedSignal,
};
use super::value::RequestValue;

/// Maximum canonical-JSON encoded size of a request, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 500_000;
/// Maximum number of tree nodes visited during the numeric hygiene sweep.
pub const MAX_TREE_NODES: usize = 50_000;
/// Maximum number of signals in a single request.
pub const MAX_SIGNALS: usize = 256;
/// Maximum number of `reason_codes` entries on a single signal.
pub const MAX_REASON_CODES: usize = 64;
/// Maximum length of a single `reason_codes` entry.
pub const MAX_REASON_CODE_LEN: usize = 96;
/// Lower bound on `constraints.max_latency_ms` after clamping.
pub const MIN_LATENCY_MS: i64 = 0;
/// Upper bound on `constraints.max_latency_ms` after clamping.
pub const MAX_LATENCY_MS: i64 = 60_000;
/// Default `constraints.max_latency_ms` when absent.
pub const DEFAULT_LATENCY_MS: u32 = 2500;

/// The contract version this validator accepts.
pub const CONTRACT_VERSION: i64 = 3;
/// The sole recognized component identity.
pub const COMPONENT: &str = "dqsn";

const TOP_LEVEL_KEYS: &[&str] = &["contract_version", "component", "request_id", "signals", "constraints"];
const SIGNAL_KEYS: &[&str] = &[
    "contract_version",
    "component",
    "request_id",
    "context_hash",
    "decision",
    "risk",
    "reason_codes",
    "evidence",
    "meta",
];
const RISK_KEYS: &[&str] = &["score", "tier"];
const META_KEYS: &[&str] = &["fail_closed"];
const CONSTRAINTS_KEYS: &[&str] = &["max_latency_ms"];

fn non_empty_trimmed(v: &RequestValue) -> Option<String> {
    let s = v.as_str()?;
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn unknown_key(map: &std::collections::BTreeMap<String, RequestValue>, allowed: &[&str]) -> bool {
    map.keys().any(|k| !allowed.contains(&k.as_str()))
}

/// Validate a raw request, producing either a fully typed [`ValidatedRequest`]
/// or the single [`ReasonCode`] identifying the first violated check.
pub fn validate(raw: &RequestValue) -> Result<ValidatedRequest, ReasonCode> {
    // 1. top-level shape
    let top = raw.as_object().ok_or(ReasonCode::ErrorInvalidRequest)?;

    // 2. unknown top-level key
    if unknown_key(top, TOP_LEVEL_KEYS) {
        return Err(ReasonCode::ErrorUnknownTopLevelKey);
    }

    // 3. contract_version
    let contract_version = top
        .get("contract_version")
        .and_then(RequestValue::as_int)
        .ok_or(ReasonCode::ErrorSchemaVersion)?;

    // 4. component
    let component = top
        .get("component")
        .and_then(non_empty_trimmed)
        .ok_or(ReasonCode::ErrorInvalidRequest)?;

    // 5. request_id
    let request_id = top
        .get("request_id")
        .and_then(non_empty_trimmed)
        .ok_or(ReasonCode::ErrorInvalidRequest)?;

    // 6. signals present and is a sequence
    let raw_signals = top
        .get("signals")
        .and_then(RequestValue::as_array)
        .ok_or(ReasonCode::ErrorSignalsRequired)?;

    // 7. signal count cap
    if raw_signals.len() > MAX_SIGNALS {
        return Err(ReasonCode::ErrorSignalTooMany);
    }

    // 8. payload size cap
    if raw.canonical_size_bytes() > MAX_PAYLOAD_BYTES {
        return Err(ReasonCode::ErrorPayloadTooLarge);
    }

    // 9. whole-tree numeric hygiene
    raw.numeric_hygiene_sweep(MAX_TREE_NODES)?;

    // 10. per-signal validation, in order
    let mut signals = Vec::with_capacity(raw_signals.len());
    for s in raw_signals {
        signals.push(validate_signal(s)?);
    }

    // 11. constraints
    let constraints = match top.get("constraints") {
        None => ValidatedConstraints::default(),
        Some(v) => validate_constraints(v)?,
    };

    Ok(ValidatedRequest {
        contract_version,
        component,
        request_id,
        signals,
        constraints,
    })
}

fn validate_signal(raw: &RequestValue) -> Result<ValidatedSignal, ReasonCode> {
    let map = raw.as_object().ok_or(ReasonCode::ErrorSignalInvalid)?;

    let keys: std::collections::BTreeSet<&str> = map.keys().map(|k| k.as_str()).collect();
    let required: std::collections::BTreeSet<&str> = SIGNAL_KEYS.iter().copied().collect();
    if keys != required {
        if unknown_key(map, SIGNAL_KEYS) {
            return Err(ReasonCode::ErrorUnknownSignalKey);
        }
        return Err(ReasonCode::ErrorSignalInvalid);
    }

    let contract_version = map
        .get("contract_version")
        .and_then(RequestValue::as_int)
        .ok_or(ReasonCode::ErrorSignalInvalid)?;
    if contract_version != CONTRACT_VERSION {
        return Err(ReasonCode::ErrorSignalInvalid);
    }

    let component = map
        .get("component")
        .and_then(non_empty_trimmed)
        .ok_or(ReasonCode::ErrorSignalInvalid)?;
    let request_id = map
        .get("request_id")
        .and_then(non_empty_trimmed)
        .ok_or(ReasonCode::ErrorSignalInvalid)?;
    let context_hash = map
        .get("context_hash")
        .and_then(non_empty_trimmed)
        .ok_or(ReasonCode::ErrorSignalInvalid)?;

    let decision_raw = map
        .get("decision")
        .and_then(RequestValue::as_str)
        .ok_or(ReasonCode::ErrorSignalInvalid)?;
    let decision = UpstreamDecision::parse(decision_raw).ok_or(ReasonCode::ErrorSignalInvalid)?;

    let risk = validate_risk(map.get("risk").ok_or(ReasonCode::ErrorSignalInvalid)?)?;

    let reason_codes = validate_reason_codes(
        map.get("reason_codes").ok_or(ReasonCode::ErrorSignalInvalid)?,
    )?;

    let evidence = map.get("evidence").ok_or(ReasonCode::ErrorSignalInvalid)?;
    if evidence.as_object().is_none() {
        return Err(ReasonCode::ErrorSignalInvalid);
    }

    let meta = map.get("meta").ok_or(ReasonCode::ErrorSignalInvalid)?;
    let fail_closed = validate_signal_meta(meta)?;

    Ok(ValidatedSignal {
        component,
        request_id,
        context_hash,
        decision,
        risk,
        reason_codes,
        fail_closed,
    })
}

fn validate_risk(v: &RequestValue) -> Result<ValidatedRisk, ReasonCode> {
    let map = v.as_object().ok_or(ReasonCode::ErrorSignalInvalid)?;
    let keys: std::collections::BTreeSet<&str> = map.keys().map(|k| k.as_str()).collect();
    let required: std::collections::BTreeSet<&str> = RISK_KEYS.iter().copied().collect();
    if keys != required {
        return Err(ReasonCode::ErrorSignalInvalid);
    }

    let score_value = map.get("score").ok_or(ReasonCode::ErrorSignalInvalid)?;
    if !score_value.is_number() {
        return Err(ReasonCode::ErrorSignalInvalid);
    }
    let score = ScoreLike::Raw(score_value.as_f64().ok_or(ReasonCode::ErrorSignalInvalid)?).into_f64();
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ReasonCode::ErrorSignalInvalid);
    }

    let tier_raw = map.get("tier").and_then(RequestValue::as_str).ok_or(ReasonCode::ErrorSignalInvalid)?;
    let tier = super::types::RiskTier::parse(tier_raw).ok_or(ReasonCode::ErrorSignalInvalid)?;

    Ok(ValidatedRisk { score, tier })
}

fn validate_reason_codes(v: &RequestValue) -> Result<Vec<String>, ReasonCode> {
    let items = v.as_array().ok_or(ReasonCode::ErrorSignalInvalid)?;
    if items.len() > MAX_REASON_CODES {
        return Err(ReasonCode::ErrorSignalInvalid);
    }
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let s = item.as_str().ok_or(ReasonCode::ErrorSignalInvalid)?;
        if s.is_empty() || s.len() > MAX_REASON_CODE_LEN {
            return Err(ReasonCode::ErrorSignalInvalid);
        }
        out.push(s.to_string());
    }
    Ok(out)
}

fn validate_signal_meta(v: &RequestValue) -> Result<bool, ReasonCode> {
    let map = v.as_object().ok_or(ReasonCode::ErrorSignalInvalid)?;
    if unknown_key(map, META_KEYS) {
        return Err(ReasonCode::ErrorSignalInvalid);
    }
    match map.get("fail_closed") {
        None => Ok(false),
        Some(b) => b.as_bool().ok_or(ReasonCode::ErrorSignalInvalid),
    }
}

/// Unlike the top-level/signal/risk/meta objects (§3 Invariants names exactly
/// those three as unknown-key-rejected), `constraints` is not in that
/// rejection list — only `max_latency_ms` is "recognized" (§3), implying
/// other keys are silently ignored rather than rejected. `CONSTRAINTS_KEYS`
/// is kept as the documented recognized set even though it is unused for
/// rejection, so the recognized-vs-rejected asymmetry stays visible in code.
fn validate_constraints(v: &RequestValue) -> Result<ValidatedConstraints, ReasonCode> {
    let map = v.as_object().ok_or(ReasonCode::ErrorInvalidRequest)?;
    let max_latency_ms = match map.get("max_latency_ms") {
        None => DEFAULT_LATENCY_MS,
        Some(v) => {
            let raw = v.as_int().ok_or(ReasonCode::ErrorInvalidRequest)?;
            raw.clamp(MIN_LATENCY_MS, MAX_LATENCY_MS) as u32
        }
    };
    Ok(ValidatedConstraints { max_latency_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signal(context_hash: &str) -> RequestValue {
        RequestValue::object([
            ("contract_version", RequestValue::int(3)),
            ("component", RequestValue::str("wallet-guardian")),
            ("request_id", RequestValue::str("sig-1")),
            ("context_hash", RequestValue::str(context_hash)),
            ("decision", RequestValue::str("warn")),
            (
                "risk",
                RequestValue::object([
                    ("score", RequestValue::float(0.5)),
                    ("tier", RequestValue::str("medium")),
                ]),
            ),
            ("reason_codes", RequestValue::array([RequestValue::str("LOW_ENTROPY")])),
            ("evidence", RequestValue::object::<_, String>([])),
            ("meta", RequestValue::object::<_, String>([])),
        ])
    }

    fn valid_request(signals: Vec<RequestValue>) -> RequestValue {
        RequestValue::object([
            ("contract_version", RequestValue::int(3)),
            ("component", RequestValue::str("dqsn")),
            ("request_id", RequestValue::str("rq1")),
            ("signals", RequestValue::array(signals)),
            ("constraints", RequestValue::object::<_, String>([])),
        ])
    }

    #[test]
    fn accepts_minimal_empty_request() {
        let req = valid_request(vec![]);
        let v = validate(&req).unwrap();
        assert_eq!(v.contract_version, 3);
        assert_eq!(v.component, "dqsn");
        assert!(v.signals.is_empty());
        assert_eq!(v.constraints.max_latency_ms, DEFAULT_LATENCY_MS);
    }

    #[test]
    fn accepts_valid_signal() {
        let req = valid_request(vec![valid_signal("h1")]);
        let v = validate(&req).unwrap();
        assert_eq!(v.signals.len(), 1);
        assert_eq!(v.signals[0].decision, UpstreamDecision::Warn);
    }

    #[test]
    fn rejects_non_mapping_request() {
        assert_eq!(validate(&RequestValue::str("nope")), Err(ReasonCode::ErrorInvalidRequest));
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let mut req = valid_request(vec![]);
        if let RequestValue::Object(m) = &mut req {
            m.insert("extra".into(), RequestValue::str("x"));
        }
        assert_eq!(validate(&req), Err(ReasonCode::ErrorUnknownTopLevelKey));
    }

    #[test]
    fn rejects_non_integer_contract_version() {
        let mut req = valid_request(vec![]);
        if let RequestValue::Object(m) = &mut req {
            m.insert("contract_version".into(), RequestValue::Bool(true));
        }
        assert_eq!(validate(&req), Err(ReasonCode::ErrorSchemaVersion));
    }

    #[test]
    fn rejects_missing_signals() {
        let mut req = valid_request(vec![]);
        if let RequestValue::Object(m) = &mut req {
            m.remove("signals");
        }
        assert_eq!(validate(&req), Err(ReasonCode::ErrorSignalsRequired));
    }

    #[test]
    fn rejects_too_many_signals() {
        let signals: Vec<_> = (0..257).map(|i| valid_signal(&format!("h{i}"))).collect();
        let req = valid_request(signals);
        assert_eq!(validate(&req), Err(ReasonCode::ErrorSignalTooMany));
    }

    #[test]
    fn rejects_nan_anywhere_in_tree() {
        let mut sig = valid_signal("h1");
        if let RequestValue::Object(m) = &mut sig {
            m.insert(
                "risk".into(),
                RequestValue::object([
                    ("score", RequestValue::float(f64::NAN)),
                    ("tier", RequestValue::str("medium")),
                ]),
            );
        }
        let req = valid_request(vec![sig]);
        assert_eq!(validate(&req), Err(ReasonCode::ErrorBadNumber));
    }

    #[test]
    fn rejects_signal_missing_required_key() {
        let mut sig = valid_signal("h1");
        if let RequestValue::Object(m) = &mut sig {
            m.remove("evidence");
        }
        let req = valid_request(vec![sig]);
        assert_eq!(validate(&req), Err(ReasonCode::ErrorSignalInvalid));
    }

    #[test]
    fn rejects_signal_with_extra_key() {
        let mut sig = valid_signal("h1");
        if let RequestValue::Object(m) = &mut sig {
            m.insert("extra".into(), RequestValue::str("x"));
        }
        let req = valid_request(vec![sig]);
        let err = validate(&req).unwrap_err();
        assert!(err == ReasonCode::ErrorUnknownSignalKey || err == ReasonCode::ErrorSignalInvalid);
    }

    #[test]
    fn rejects_score_out_of_range() {
        let mut sig = valid_signal("h1");
        if let RequestValue::Object(m) = &mut sig {
            m.insert(
                "risk".into(),
                RequestValue::object([
                    ("score", RequestValue::float(1.5)),
                    ("tier", RequestValue::str("medium")),
                ]),
            );
        }
        let req = valid_request(vec![sig]);
        assert_eq!(validate(&req), Err(ReasonCode::ErrorSignalInvalid));
    }

    #[test]
    fn clamps_max_latency_ms() {
        let mut req = valid_request(vec![]);
        if let RequestValue::Object(m) = &mut req {
            m.insert(
                "constraints".into(),
                RequestValue::object([("max_latency_ms", RequestValue::int(999_999))]),
            );
        }
        let v = validate(&req).unwrap();
        assert_eq!(v.constraints.max_latency_ms, MAX_LATENCY_MS as u32);
    }

    #[test]
    fn normalizes_decision_and_tier_case() {
        let req = valid_request(vec![valid_signal("h1")]);
        let v = validate(&req).unwrap();
        assert_eq!(v.signals[0].decision.as_str(), "WARN");
        assert_eq!(v.signals[0].risk.tier.as_str(), "MEDIUM");
    }
}
