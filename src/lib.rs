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

//! DQSN - deterministic risk-signal aggregation service.
//!
//! This crate implements Shield Contract v3: a strict-schema validator, a
//! canonical JSON hasher, and an order-independent aggregation engine,
//! exposed as the single pure function [`core::contract::evaluate`]. A thin
//! Axum HTTP surface and Prometheus metrics wrap that function for
//! standalone deployment; neither is consulted by the core itself.

/// Core protocol primitives: the Shield Contract v3 aggregation engine.
pub mod core;
/// Typed service configuration for the HTTP/metrics shell.
pub mod config;
/// The `POST /dqsnet/v3/evaluate` HTTP surface, plus health and metrics routes.
pub mod http;
/// Observability (Prometheus counters) for the surrounding service.
pub mod monitoring;
