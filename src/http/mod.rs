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

//! The one documented external route (§6 of the contract), plus liveness
//! and metrics endpoints. This module is pure plumbing: it deserializes the
//! HTTP body, calls [`crate::core::contract::evaluate`], serializes the
//! result, and records a metric. No contract logic lives here.

use std::sync::Arc;

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::core::contract::{evaluate, value::RequestValue};
use crate::monitoring::metrics::Metrics;

/// Shared state handed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Request/decision/error counters.
    pub metrics: Arc<Metrics>,
}

/// Body shape for `POST /dqsnet/v3/evaluate`: `{"request": <request envelope>}`.
#[derive(Deserialize)]
pub struct EvaluateBody {
    request: serde_json::Value,
}

/// Build the Axum router exposing the evaluate, health, and metrics routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dqsnet/v3/evaluate", post(evaluate_handler))
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn evaluate_handler(
    State(state): State<AppState>,
    Json(body): Json<EvaluateBody>,
) -> Json<serde_json::Value> {
    let request: RequestValue = body.request.into();
    let response = evaluate(&request);
    state.metrics.record(&response);
    info!(
        decision = ?response.decision,
        request_id = %response.request_id,
        "dqsn evaluate"
    );
    Json(serde_json::to_value(&response).unwrap_or(serde_json::Value::Null))
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_ok() {
        assert_eq!(healthz_handler().await, "ok");
    }

    #[tokio::test]
    async fn evaluate_handler_roundtrips_minimal_request() {
        let state = AppState {
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        let body = EvaluateBody {
            request: serde_json::json!({
                "contract_version": 3,
                "component": "dqsn",
                "request_id": "rq1",
                "signals": [],
                "constraints": {}
            }),
        };
        let Json(resp) = evaluate_handler(State(state), Json(body)).await;
        assert_eq!(resp["decision"], "ALLOW");
        assert_eq!(resp["meta"]["fail_closed"], true);
    }
}
