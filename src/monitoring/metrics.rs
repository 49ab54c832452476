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
#![warn(missing_docs)]

//! Request-count metrics for the HTTP surface, registered against a
//! [`prometheus::Registry`] and exposed via `/metrics`.
//!
//! The core never increments these; the Axum handler does, once per call to
//! [`crate::core::contract::evaluate`].

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use thiserror::Error;

/// Metrics registration errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric failed to construct or register against the registry.
    #[error("prometheus registration failed")]
    Prom,
}

/// Request-count metrics for the Shield Contract v3 HTTP surface.
#[derive(Clone)]
pub struct Metrics {
    /// Registry backing `/metrics`.
    pub registry: Registry,
    /// Total requests received, regardless of outcome.
    pub requests_total: IntCounter,
    /// Requests by output decision (`ALLOW`, `ESCALATE`, `BLOCK`, `ERROR`).
    pub decisions_total: IntCounterVec,
    /// ERROR responses by reason code.
    pub errors_total: IntCounterVec,
}

impl Metrics {
    /// Construct and register all metrics against a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounter::new("dqsn_requests_total", "Total evaluate() calls")
            .map_err(|_| MetricsError::Prom)?;

        let decisions_total = IntCounterVec::new(
            Opts::new("dqsn_decisions_total", "Responses by aggregate decision"),
            &["decision"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let errors_total = IntCounterVec::new(
            Opts::new("dqsn_errors_total", "ERROR responses by reason code"),
            &["reason_code"],
        )
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(decisions_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(errors_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            requests_total,
            decisions_total,
            errors_total,
        })
    }

    /// Record one completed `evaluate()` call.
    pub fn record(&self, response: &crate::core::contract::aggregator::ResponseEnvelope) {
        self.requests_total.inc();
        let decision_label = match response.decision {
            crate::core::contract::aggregator::Decision::Allow => "ALLOW",
            crate::core::contract::aggregator::Decision::Escalate => "ESCALATE",
            crate::core::contract::aggregator::Decision::Block => "BLOCK",
            crate::core::contract::aggregator::Decision::Error => "ERROR",
        };
        self.decisions_total.with_label_values(&[decision_label]).inc();
        if let Some(code) = response.reason_codes.first() {
            if code.starts_with("DQSN_ERROR_") {
                self.errors_total.with_label_values(&[code]).inc();
            }
        }
    }
}
