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

//! Dedup, rollup, and response-envelope construction for a validated request.
//!
//! This module has no knowledge of the wire format; it consumes a
//! [`ValidatedRequest`] (already free of schema violations) and produces a
//! [`ResponseEnvelope`]. The only remaining checks here are the two semantic
//! gates the validator cannot make (contract version and component identity,
//! §4.4 step A), because those two fields are checked against fixed constants
//! rather than against "is this syntactically well-formed."

use serde::Serialize;

use super::canon::canonical_sha256;
use super::reason_code::ReasonCode;
use super::types::{RiskTier, UpstreamDecision, ValidatedRequest, ValidatedSignal};
use super::validator::{COMPONENT, CONTRACT_VERSION};

/// Response-side decision vocabulary. `WARN` is renamed to `ESCALATE` here to
/// signal that DQSN aggregated a warning rather than observed one directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// No kept signal warned, blocked, or errored.
    Allow,
    /// At least one kept signal warned; none blocked or errored.
    Escalate,
    /// At least one kept signal blocked (and none errored).
    Block,
    /// At least one kept signal errored, or the request itself failed validation.
    Error,
}

/// Risk summary carried on every response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RiskSummary {
    /// Maximum upstream score over the kept set (`0.0` if empty), or `1.0` on error.
    pub score: f64,
    /// Tier derived from `score`, or `CRITICAL` on error.
    pub tier: RiskTier,
}

/// Stable, evidence-safe view of a single kept signal.
///
/// Deliberately excludes `evidence`, `meta`, and `contract_version` — those
/// never leak past the validator into the response.
#[derive(Clone, Debug, Serialize)]
pub struct SignalView {
    /// Sender component identity.
    pub component: String,
    /// Sender request identity.
    pub request_id: String,
    /// Opaque content identity used for dedup.
    pub context_hash: String,
    /// Normalized upstream decision.
    pub decision: UpstreamDecision,
    /// Validated risk.
    pub risk: SignalRisk,
    /// Upstream reason codes, order preserved.
    pub reason_codes: Vec<String>,
}

/// Per-signal risk view (mirrors [`RiskSummary`] but always upstream-sourced).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SignalRisk {
    /// Upstream score.
    pub score: f64,
    /// Upstream tier.
    pub tier: RiskTier,
}

/// Dedup bookkeeping surfaced in `evidence.dedup`.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DedupSummary {
    /// Number of signals present on the input request (pre-dedup).
    pub input_signals: usize,
    /// Number of signals remaining after dedup by `context_hash`.
    pub unique_signals: usize,
}

/// `evidence` on a successful response.
#[derive(Clone, Debug, Serialize)]
pub struct SuccessEvidence {
    /// Dedup counts.
    pub dedup: DedupSummary,
    /// Stable view of each kept signal, in sorted-dedup order.
    pub signals: Vec<SignalView>,
}

/// The nested `{error: ...}` object under `evidence.details` on an ERROR response.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorDetails {
    /// The reason code string that caused the failure.
    pub error: String,
}

/// `evidence` on an ERROR response.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorEvidence {
    /// Error detail payload.
    pub details: ErrorDetails,
}

/// Tagged evidence payload: either a successful aggregation or an error detail.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Evidence {
    /// Populated on `ALLOW`/`ESCALATE`/`BLOCK` responses.
    Success(SuccessEvidence),
    /// Populated on `ERROR` responses.
    Error(ErrorEvidence),
}

/// Fixed response metadata. Always the same two values: `evaluate` never
/// measures wall-clock time and always fails closed.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ResponseMeta {
    /// Always `0`; a deliberate determinism decision, never measured time.
    pub latency_ms: u32,
    /// Always `true`.
    pub fail_closed: bool,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            fail_closed: true,
        }
    }
}

/// The full Shield Contract v3 response envelope.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseEnvelope {
    /// Always `3`.
    pub contract_version: i64,
    /// Always `"dqsn"`.
    pub component: String,
    /// Echoed verbatim from the request.
    pub request_id: String,
    /// Canonical SHA-256 hex of the decision-carrying state.
    pub context_hash: String,
    /// Aggregate decision.
    pub decision: Decision,
    /// Aggregate risk.
    pub risk: RiskSummary,
    /// Ordered reason codes (see §4.4 step F for the exact ordering rule).
    pub reason_codes: Vec<String>,
    /// Evidence payload; shape depends on `decision`.
    pub evidence: Evidence,
    /// Fixed response metadata.
    pub meta: ResponseMeta,
}

/// Canonicalization projection used for the success-path `context_hash`
/// (§4.4 step H). A plain struct rather than reusing [`ResponseEnvelope`]
/// because the hash input excludes `reason_codes`, `evidence`, and `meta`.
#[derive(Serialize)]
struct SuccessHashContext<'a> {
    component: &'a str,
    contract_version: i64,
    request_id: &'a str,
    signals: &'a [SignalView],
    decision: Decision,
    risk: RiskSummary,
}

/// Canonicalization projection used for the error-path `context_hash`.
#[derive(Serialize)]
struct ErrorHashContext<'a> {
    component: &'a str,
    contract_version: i64,
    request_id: &'a str,
    reason_codes: &'a [String],
}

fn stable_view(signal: &ValidatedSignal) -> SignalView {
    SignalView {
        component: signal.component.clone(),
        request_id: signal.request_id.clone(),
        context_hash: signal.context_hash.clone(),
        decision: signal.decision,
        risk: SignalRisk {
            score: signal.risk.score,
            tier: signal.risk.tier,
        },
        reason_codes: signal.reason_codes.clone(),
    }
}

/// Sort signals by `(context_hash, component, request_id)`, then keep the
/// first occurrence of each `context_hash` (§4.4 steps B-C).
fn sort_and_dedup(mut signals: Vec<ValidatedSignal>) -> (usize, Vec<ValidatedSignal>) {
    let input_signals = signals.len();
    signals.sort();
    let mut seen = std::collections::BTreeSet::new();
    let mut kept: Vec<ValidatedSignal> = Vec::with_capacity(signals.len());
    for s in signals {
        if seen.insert(s.context_hash.clone()) {
            kept.push(s);
        }
    }
    (input_signals, kept)
}

/// Monotone severity rollup over the kept set (§4.4 step D).
fn rollup_decision(kept: &[ValidatedSignal]) -> Decision {
    if kept.iter().any(|s| s.decision == UpstreamDecision::Error) {
        Decision::Error
    } else if kept.iter().any(|s| s.decision == UpstreamDecision::Block) {
        Decision::Block
    } else if kept.iter().any(|s| s.decision == UpstreamDecision::Warn) {
        Decision::Escalate
    } else {
        Decision::Allow
    }
}

/// Max upstream score over the kept set, and its derived tier (§4.4 step E).
fn rollup_risk(kept: &[ValidatedSignal]) -> RiskSummary {
    let score = kept
        .iter()
        .map(|s| s.risk.score)
        .fold(0.0f64, |acc, v| acc.max(v));
    RiskSummary {
        score,
        tier: RiskTier::from_score(score),
    }
}

/// Outcome reason code prefix matching a rolled-up decision (§4.4 step F.1).
fn outcome_code(decision: Decision) -> ReasonCode {
    match decision {
        Decision::Allow => ReasonCode::OkAllow,
        Decision::Escalate => ReasonCode::EscalateWarn,
        Decision::Block | Decision::Error => ReasonCode::DenyBlock,
    }
}

/// Build the response for a gate-passed, validated request: the rolled-up
/// decision (§4.4 step D) routes to either the ordinary aggregated envelope
/// or, when a kept signal's own `decision = ERROR` rolls the aggregate up to
/// `Decision::Error`, the same fail-closed error envelope a validation
/// failure gets (§4.4 "Error responses") — risk `{1.0, CRITICAL}`, no
/// leaked signal list.
fn build_success(request: &ValidatedRequest) -> ResponseEnvelope {
    let (input_signals, kept) = sort_and_dedup(request.signals.clone());
    let decision = rollup_decision(&kept);

    if decision == Decision::Error {
        return build_error(&request.component, &request.request_id, outcome_code(decision));
    }

    let risk = rollup_risk(&kept);
    let views: Vec<SignalView> = kept.iter().map(stable_view).collect();

    let mut reason_codes = vec![outcome_code(decision).as_str().to_string()];
    if !kept.is_empty() {
        reason_codes.push(ReasonCode::OkSignalAggregated.as_str().to_string());
    }

    let hash_ctx = SuccessHashContext {
        component: &request.component,
        contract_version: request.contract_version,
        request_id: &request.request_id,
        signals: &views,
        decision,
        risk,
    };
    let context_hash = canonical_sha256(&hash_ctx).unwrap_or_default();

    ResponseEnvelope {
        contract_version: CONTRACT_VERSION,
        component: COMPONENT.to_string(),
        request_id: request.request_id.clone(),
        context_hash,
        decision,
        risk,
        reason_codes,
        evidence: Evidence::Success(SuccessEvidence {
            dedup: DedupSummary {
                input_signals,
                unique_signals: kept.len(),
            },
            signals: views,
        }),
        meta: ResponseMeta::default(),
    }
}

/// Build a fail-closed ERROR response for the given `request_id`/`component`
/// and reason code. Used both for validator failures (where `request_id`
/// and `component` may not have validated, hence the raw `&str` inputs) and
/// for the version/identity gate failures in [`aggregate`].
pub fn build_error(component: &str, request_id: &str, reason: ReasonCode) -> ResponseEnvelope {
    let reason_codes = vec![reason.as_str().to_string()];
    let hash_ctx = ErrorHashContext {
        component,
        contract_version: CONTRACT_VERSION,
        request_id,
        reason_codes: &reason_codes,
    };
    let context_hash = canonical_sha256(&hash_ctx).unwrap_or_default();

    ResponseEnvelope {
        contract_version: CONTRACT_VERSION,
        component: COMPONENT.to_string(),
        request_id: request_id.to_string(),
        context_hash,
        decision: Decision::Error,
        risk: RiskSummary {
            score: 1.0,
            tier: RiskTier::Critical,
        },
        reason_codes,
        evidence: Evidence::Error(ErrorEvidence {
            details: ErrorDetails {
                error: reason.as_str().to_string(),
            },
        }),
        meta: ResponseMeta::default(),
    }
}

/// Aggregate a validated request into a response envelope (§4.4).
///
/// Performs the version/component gate (step A) that the validator leaves to
/// this layer because it is a semantic check against fixed constants, not a
/// structural one, then dedups, rolls up, and builds the envelope.
pub fn aggregate(request: &ValidatedRequest) -> ResponseEnvelope {
    if request.contract_version != CONTRACT_VERSION {
        return build_error(&request.component, &request.request_id, ReasonCode::ErrorSchemaVersion);
    }
    if request.component != COMPONENT {
        return build_error(
            &request.component,
            &request.request_id,
            ReasonCode::ErrorComponentMismatch,
        );
    }
    build_success(request)
}
