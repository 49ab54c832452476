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

//! DQSN aggregator entrypoint: loads config, starts the HTTP surface, blocks.

use std::sync::Arc;

use tracing::{info, warn};

use dqsnet::config::{LogFormat, ServiceConfig};
use dqsnet::http::{router, AppState};
use dqsnet::monitoring::metrics::Metrics;

fn init_logging(format: LogFormat) {
    let result = match format {
        LogFormat::Compact => tracing_subscriber::fmt().with_target(false).compact().try_init(),
        LogFormat::Json => tracing_subscriber::fmt().json().try_init(),
    };
    if result.is_err() {
        eprintln!("tracing subscriber already initialized; continuing");
    }
}

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config, falling back to defaults: {e}");
            ServiceConfig::default()
        }
    };

    init_logging(config.log_format);

    let metrics = Arc::new(Metrics::new().expect("metrics registration failed"));
    let state = AppState { metrics };

    info!(node = %config.node_name, addr = %config.http.listen_addr, "dqsn aggregator starting");

    let listener = match tokio::net::TcpListener::bind(&config.http.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("failed to bind {}: {e}", config.http.listen_addr);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router(state)).await {
        warn!(?e, "http server exited");
    }
}
