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

//! Closed, contract-stable reason code vocabulary for Shield Contract v3.
//!
//! These string values are part of the external wire contract. Renaming,
//! reordering, or removing a variant is a breaking change.

use serde::Serialize;
use thiserror::Error;

/// A contract-stable outcome or failure identifier.
///
/// The `Display`/`as_str` value is always the identifier's own name; the two
/// never diverge, which is what lets an auditor grep for `DQSN_ERROR_` across
/// independently-implemented services and get identical tokens back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ReasonCode {
    /// All kept signals allow; no escalation or block observed.
    #[error("DQSN_OK_ALLOW")]
    OkAllow,
    /// At least one kept signal warned; no block or error observed.
    #[error("DQSN_ESCALATE_WARN")]
    EscalateWarn,
    /// At least one kept signal blocked or errored.
    #[error("DQSN_DENY_BLOCK")]
    DenyBlock,
    /// The kept signal set is non-empty (always paired with an outcome code).
    #[error("DQSN_OK_SIGNAL_AGGREGATED")]
    OkSignalAggregated,

    /// `contract_version` is not the supported version.
    #[error("DQSN_ERROR_SCHEMA_VERSION")]
    ErrorSchemaVersion,
    /// The request is structurally invalid in a way no more specific code covers.
    #[error("DQSN_ERROR_INVALID_REQUEST")]
    ErrorInvalidRequest,
    /// The top-level request object contains a key outside the allowed set.
    #[error("DQSN_ERROR_UNKNOWN_TOP_LEVEL_KEY")]
    ErrorUnknownTopLevelKey,
    /// A signal object contains a key outside the allowed set.
    #[error("DQSN_ERROR_UNKNOWN_SIGNAL_KEY")]
    ErrorUnknownSignalKey,
    /// A numeric value anywhere in the request tree is NaN or +/-Infinity.
    #[error("DQSN_ERROR_BAD_NUMBER")]
    ErrorBadNumber,
    /// The canonical-JSON encoded size of the request exceeds the cap.
    #[error("DQSN_ERROR_PAYLOAD_TOO_LARGE")]
    ErrorPayloadTooLarge,
    /// `signals` contains more entries than the cap allows.
    #[error("DQSN_ERROR_SIGNAL_TOO_MANY")]
    ErrorSignalTooMany,
    /// A signal failed per-signal structural validation.
    #[error("DQSN_ERROR_SIGNAL_INVALID")]
    ErrorSignalInvalid,
    /// The request's `component` does not match this aggregator's identity.
    #[error("DQSN_ERROR_COMPONENT_MISMATCH")]
    ErrorComponentMismatch,
    /// `signals` is missing or is not a sequence.
    #[error("DQSN_ERROR_SIGNALS_REQUIRED")]
    ErrorSignalsRequired,
}

impl ReasonCode {
    /// Return the contract-stable string form of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::OkAllow => "DQSN_OK_ALLOW",
            ReasonCode::EscalateWarn => "DQSN_ESCALATE_WARN",
            ReasonCode::DenyBlock => "DQSN_DENY_BLOCK",
            ReasonCode::OkSignalAggregated => "DQSN_OK_SIGNAL_AGGREGATED",
            ReasonCode::ErrorSchemaVersion => "DQSN_ERROR_SCHEMA_VERSION",
            ReasonCode::ErrorInvalidRequest => "DQSN_ERROR_INVALID_REQUEST",
            ReasonCode::ErrorUnknownTopLevelKey => "DQSN_ERROR_UNKNOWN_TOP_LEVEL_KEY",
            ReasonCode::ErrorUnknownSignalKey => "DQSN_ERROR_UNKNOWN_SIGNAL_KEY",
            ReasonCode::ErrorBadNumber => "DQSN_ERROR_BAD_NUMBER",
            ReasonCode::ErrorPayloadTooLarge => "DQSN_ERROR_PAYLOAD_TOO_LARGE",
            ReasonCode::ErrorSignalTooMany => "DQSN_ERROR_SIGNAL_TOO_MANY",
            ReasonCode::ErrorSignalInvalid => "DQSN_ERROR_SIGNAL_INVALID",
            ReasonCode::ErrorComponentMismatch => "DQSN_ERROR_COMPONENT_MISMATCH",
            ReasonCode::ErrorSignalsRequired => "DQSN_ERROR_SIGNALS_REQUIRED",
        }
    }

    /// True if this code represents a fail-closed error outcome.
    pub fn is_error(&self) -> bool {
        self.as_str().starts_with("DQSN_ERROR_")
    }
}

impl Serialize for ReasonCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        for code in [
            ReasonCode::OkAllow,
            ReasonCode::EscalateWarn,
            ReasonCode::DenyBlock,
            ReasonCode::OkSignalAggregated,
            ReasonCode::ErrorSchemaVersion,
            ReasonCode::ErrorInvalidRequest,
            ReasonCode::ErrorUnknownTopLevelKey,
            ReasonCode::ErrorUnknownSignalKey,
            ReasonCode::ErrorBadNumber,
            ReasonCode::ErrorPayloadTooLarge,
            ReasonCode::ErrorSignalTooMany,
            ReasonCode::ErrorSignalInvalid,
            ReasonCode::ErrorComponentMismatch,
            ReasonCode::ErrorSignalsRequired,
        ] {
            assert_eq!(code.to_string(), code.as_str());
        }
    }

    #[test]
    fn error_codes_are_tagged() {
        assert!(ReasonCode::ErrorBadNumber.is_error());
        assert!(!ReasonCode::OkAllow.is_error());
        assert!(!ReasonCode::OkSignalAggregated.is_error());
    }
}
