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

//! Validated, typed contract shapes produced by the validator and consumed
//! by the aggregator. Nothing in this module performs validation itself;
//! values of these types are assumed to already satisfy the Shield Contract
//! v3 invariants.

use serde::Serialize;
use std::cmp::Ordering;

/// Upstream decision vocabulary accepted on a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamDecision {
    /// No concern.
    Allow,
    /// Concern worth surfacing, not blocking on its own.
    Warn,
    /// Must be denied.
    Block,
    /// The upstream component itself failed closed.
    Error,
}

impl UpstreamDecision {
    /// Parse a trimmed, case-insensitive token into the closed enum.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Some(Self::Allow),
            "WARN" => Some(Self::Warn),
            "BLOCK" => Some(Self::Block),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Canonical upper-case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Warn => "WARN",
            Self::Block => "BLOCK",
            Self::Error => "ERROR",
        }
    }
}

impl Serialize for UpstreamDecision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Risk tier vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskTier {
    /// `< 0.25`.
    Low,
    /// `< 0.60`.
    Medium,
    /// `< 0.85`.
    High,
    /// `>= 0.85`.
    Critical,
}

impl RiskTier {
    /// Parse a trimmed, case-insensitive token into the closed enum.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Canonical upper-case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Derive a tier from a score already known to be finite and in `[0, 1]`.
    ///
    /// Thresholds are contract-stable: `<0.25 LOW`, `<0.60 MEDIUM`, `<0.85
    /// HIGH`, else `CRITICAL`.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            Self::Low
        } else if score < 0.60 {
            Self::Medium
        } else if score < 0.85 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl Serialize for RiskTier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Sum type for upstream score containers.
///
/// The wire contract only ever carries a raw number, but the upstream
/// ecosystem this contract grew out of also had an older advisory layer that
/// tagged scores with a provenance channel. Modeling the acceptance as a sum
/// type with one coercion point (`into_f64`) keeps that historical affordance
/// from leaking duck-typed `isinstance` checks across the validator; today
/// only `Raw` is ever produced by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreLike {
    /// A bare numeric score.
    Raw(f64),
    /// A score tagged with the channel that produced it.
    Tagged {
        /// The numeric value.
        value: f64,
        /// Free-form provenance label (e.g. `"consensus"`, `"wallet"`).
        channel: String,
    },
}

impl ScoreLike {
    /// The single coercion point from a `ScoreLike` to its numeric value.
    pub fn into_f64(self) -> f64 {
        match self {
            ScoreLike::Raw(v) => v,
            ScoreLike::Tagged { value, .. } => value,
        }
    }
}

/// Validated `risk` object on a signal.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedRisk {
    /// Finite score in `[0.0, 1.0]`.
    pub score: f64,
    /// Normalized tier.
    pub tier: RiskTier,
}

/// A validated upstream signal.
#[derive(Clone, Debug)]
pub struct ValidatedSignal {
    /// Sender component identity (trimmed, non-empty).
    pub component: String,
    /// Sender request identity (trimmed, non-empty).
    pub request_id: String,
    /// Opaque stable content identity (trimmed, non-empty).
    pub context_hash: String,
    /// Normalized decision.
    pub decision: UpstreamDecision,
    /// Validated risk.
    pub risk: ValidatedRisk,
    /// Upstream reason codes, order preserved.
    pub reason_codes: Vec<String>,
    /// Whether the signal's own `meta.fail_closed` was set to `true`.
    pub fail_closed: bool,
}

impl ValidatedSignal {
    /// Stable ordering key used for the pre-dedup sort: `(context_hash,
    /// component, request_id)`.
    fn sort_key(&self) -> (&str, &str, &str) {
        (&self.context_hash, &self.component, &self.request_id)
    }
}

impl PartialEq for ValidatedSignal {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for ValidatedSignal {}
impl PartialOrd for ValidatedSignal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ValidatedSignal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Validated request-level constraints. Only `max_latency_ms` is recognized;
/// `fail_closed` is always forced to `true` regardless of input and is not
/// stored here because it never varies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedConstraints {
    /// Clamped to `[0, 60000]`; defaults to `2500` when absent.
    pub max_latency_ms: u32,
}

impl Default for ValidatedConstraints {
    fn default() -> Self {
        Self {
            max_latency_ms: 2500,
        }
    }
}

/// A fully validated request, ready for aggregation.
#[derive(Clone, Debug)]
pub struct ValidatedRequest {
    /// Always `3`.
    pub contract_version: i64,
    /// Always `"dqsn"`.
    pub component: String,
    /// Echoed verbatim in the response.
    pub request_id: String,
    /// Validated signals, input order preserved.
    pub signals: Vec<ValidatedSignal>,
    /// Validated constraints.
    pub constraints: ValidatedConstraints,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parse_is_case_insensitive() {
        assert_eq!(UpstreamDecision::parse(" warn "), Some(UpstreamDecision::Warn));
        assert_eq!(UpstreamDecision::parse("BLOCK"), Some(UpstreamDecision::Block));
        assert_eq!(UpstreamDecision::parse("bogus"), None);
    }

    #[test]
    fn tier_thresholds_match_boundary_table() {
        assert_eq!(RiskTier::from_score(0.0).as_str(), "LOW");
        assert_eq!(RiskTier::from_score(0.2499).as_str(), "LOW");
        assert_eq!(RiskTier::from_score(0.25).as_str(), "MEDIUM");
        assert_eq!(RiskTier::from_score(0.5999).as_str(), "MEDIUM");
        assert_eq!(RiskTier::from_score(0.60).as_str(), "HIGH");
        assert_eq!(RiskTier::from_score(0.8499).as_str(), "HIGH");
        assert_eq!(RiskTier::from_score(0.85).as_str(), "CRITICAL");
        assert_eq!(RiskTier::from_score(1.0).as_str(), "CRITICAL");
    }

    #[test]
    fn score_like_coerces_through_single_seam() {
        assert_eq!(ScoreLike::Raw(0.5).into_f64(), 0.5);
        assert_eq!(
            ScoreLike::Tagged {
                value: 0.75,
                channel: "wallet".to_string()
            }
            .into_f64(),
            0.75
        );
    }

    #[test]
    fn signal_sort_key_orders_by_context_hash_then_component_then_request_id() {
        let a = ValidatedSignal {
            component: "z".into(),
            request_id: "z".into(),
            context_hash: "a".into(),
            decision: UpstreamDecision::Allow,
            risk: ValidatedRisk { score: 0.0, tier: RiskTier::Low },
            reason_codes: vec![],
            fail_closed: true,
        };
        let b = ValidatedSignal {
            component: "a".into(),
            request_id: "a".into(),
            context_hash: "b".into(),
            decision: UpstreamDecision::Allow,
            risk: ValidatedRisk { score: 0.0, tier: RiskTier::Low },
            reason_codes: vec![],
            fail_closed: true,
        };
        assert!(a < b);
    }
}
