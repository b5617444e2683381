/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Prometheus exporter for HP iLO management processors.
//!
//! Each scrape request names one iLO; the handler opens a RIBCL session,
//! walks the embedded health tree, translates status strings into small
//! integer codes and publishes them through a process-wide registry.

use std::sync::Arc;

use ilo_ribcl::RibclConnector;

pub mod command_line;
pub mod config;
pub mod handler;
pub mod metrics;
pub mod status;

pub use config::{Config, DefaultCredentials};
pub use handler::AppState;
pub use metrics::ExporterMetrics;

#[derive(thiserror::Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prometheus Error {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<String> for ExporterError {
    fn from(err: String) -> Self {
        ExporterError::Config(err)
    }
}

/// Run the exporter until the listener shuts down.
pub async fn run_service(
    config: Config,
    default_credentials: DefaultCredentials,
) -> Result<(), ExporterError> {
    let listen_addr = config.listen_addr()?;

    let metrics = Arc::new(ExporterMetrics::new()?);
    let connector = Arc::new(RibclConnector::new(
        config.ilo.connect_timeout,
        config.ilo.accept_invalid_certs,
        config.ilo.use_tls,
    ));

    let state = AppState {
        connector,
        metrics,
        default_credentials,
    };
    let app = handler::router(&config.listen, state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(
        endpoint = %listen_addr,
        path = %config.listen.telemetry_path,
        "Starting HP iLO exporter"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
