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

//! The scrape handler: one request in, one controller session, one walk
//! over the health snapshot, one rendered registry out.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use ilo_ribcl::{IloConnector, IloError, IloSession, IloTarget};
use serde::Deserialize;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{DefaultCredentials, ListenConfig};
use crate::metrics::{ExporterMetrics, ServerLabels, Subsystem};
use crate::status::{map_status, StatusCategory};

/// Management processor generation without reliable NIC status reporting.
const OLDEST_SUPPORTED_GENERATION: &str = "iLO3";

const FALLBACK_PRODUCT_NAME: &str = "Unknown HP Server";

const INDEX_PAGE: &str = "<html>\
<head><title>HP iLO Exporter</title></head>\
<body>\
<h1>HP iLO Exporter</h1>\
<p>Visit <a href=\"/metrics\">Metrics</a> to use.</p>\
</body>\
</html>";

#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn IloConnector>,
    pub metrics: Arc<ExporterMetrics>,
    pub default_credentials: DefaultCredentials,
}

pub fn router(listen: &ListenConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(&listen.telemetry_path, get(scrape))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(listen.scrape_timeout))
        .layer(ConcurrencyLimitLayer::new(listen.max_concurrent_scrapes))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    ilo_host: Option<String>,
    ilo_port: Option<String>,
    ilo_user: Option<String>,
    ilo_password: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("missing parameter {0}")]
    MissingParameter(&'static str),

    #[error("unparseable parameter {0}")]
    InvalidParameter(&'static str),

    #[error(transparent)]
    Ilo(#[from] IloError),

    #[error("no gauge registered for subsystem {0:?}")]
    UnknownSubsystem(String),

    #[error(transparent)]
    Render(#[from] prometheus::Error),
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        match &self {
            ScrapeError::MissingParameter(parameter)
            | ScrapeError::InvalidParameter(parameter) => {
                tracing::warn!(parameter = %parameter, "rejecting scrape request");
            }
            ScrapeError::Ilo(IloError::LoginFailed) => {
                tracing::warn!("iLO login failed");
            }
            ScrapeError::Ilo(IloError::InvalidAddress { .. }) => {
                tracing::warn!(error = %self, "iLO invalid address or port");
            }
            other => {
                tracing::error!(error = %other, "scrape failed");
            }
        }
        // Every failure surfaces to the caller as a bare 500; the detail
        // above stays in the log.
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

async fn scrape(State(state): State<AppState>, Query(params): Query<ScrapeParams>) -> Response {
    let started = Instant::now();
    match run_scrape(&state, params).await {
        Ok(body) => {
            tracing::debug!(elapsed = ?started.elapsed(), "scrape complete");
            ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Resolve the scrape target from query parameters and the startup
/// environment. Environment credentials win; the query is only consulted
/// for fields the environment left unset. Every field must end up
/// non-empty, and nothing contacts the controller until all do.
fn resolve_target(
    params: ScrapeParams,
    defaults: &DefaultCredentials,
) -> Result<IloTarget, ScrapeError> {
    let host = params
        .ilo_host
        .filter(|v| !v.is_empty())
        .ok_or(ScrapeError::MissingParameter("ilo_host"))?;

    let port = params
        .ilo_port
        .filter(|v| !v.is_empty())
        .ok_or(ScrapeError::MissingParameter("ilo_port"))?
        .parse::<u16>()
        .map_err(|_| ScrapeError::InvalidParameter("ilo_port"))?;

    let username = defaults
        .username
        .clone()
        .or(params.ilo_user)
        .filter(|v| !v.is_empty())
        .ok_or(ScrapeError::MissingParameter("ilo_user"))?;

    let password = defaults
        .password
        .clone()
        .or(params.ilo_password)
        .filter(|v| !v.is_empty())
        .ok_or(ScrapeError::MissingParameter("ilo_password"))?;

    Ok(IloTarget {
        host,
        port,
        username,
        password,
    })
}

async fn run_scrape(state: &AppState, params: ScrapeParams) -> Result<Vec<u8>, ScrapeError> {
    let target = resolve_target(params, &state.default_credentials)?;

    // Any connect failure aborts the scrape, including transient
    // communication faults: nothing useful can be collected without a
    // session.
    let session = state.connector.connect(&target).await?;

    let server = identify(session.as_ref(), &target.host).await;

    let health = session.embedded_health().await?;

    for (name, status) in &health.health_at_a_glance {
        let subsystem = Subsystem::from_key(name)
            .ok_or_else(|| ScrapeError::UnknownSubsystem(name.clone()))?;
        let code = map_status(StatusCategory::SubsystemHealth, status);
        state.metrics.set_subsystem(&server, subsystem, code);
    }

    // Fetched once; drives both the NIC-walk generation check and the
    // firmware info metric.
    let firmware = session.fw_version().await?;

    if firmware.management_processor == OLDEST_SUPPORTED_GENERATION {
        tracing::warn!(
            generation = %firmware.management_processor,
            "NIC status is not reliable on this generation, skipping NIC walk"
        );
    } else {
        for (nic_name, nic) in &health.nics {
            let code = map_status(StatusCategory::NicStatus, &nic.status);
            state
                .metrics
                .set_nic_status(&server, nic_name, &nic.ip_address, code);
        }
    }

    for fan in &health.fans {
        let code = map_status(StatusCategory::FanStatus, &fan.status);
        state.metrics.set_fan_status(&server, &fan.label, code);
        if let Some(speed) = &fan.speed {
            state.metrics.set_fan_speed(&server, &fan.label, speed.value);
        }
    }

    for sensor in &health.temperatures {
        let code = map_status(StatusCategory::TemperatureStatus, &sensor.status);
        state.metrics.set_temp_status(&server, &sensor.label, code);
        if let Some(current) = &sensor.current {
            state.metrics.set_temp(&server, &sensor.label, current.value);
        }
        if let Some(caution) = &sensor.caution {
            state
                .metrics
                .set_temp_caution(&server, &sensor.label, caution.value);
        }
        if let Some(critical) = &sensor.critical {
            state
                .metrics
                .set_temp_critical(&server, &sensor.label, critical.value);
        }
    }

    state
        .metrics
        .set_firmware_version(&server, &firmware.firmware_version);

    let power_state = session.host_power_status().await?;
    let code = map_status(StatusCategory::HostPower, &power_state);
    state.metrics.set_host_power(&server, code);

    match session.server_power_on_minutes().await {
        Ok(minutes) => state.metrics.set_host_uptime(&server, minutes),
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch power-on time, omitting uptime");
        }
    }

    let network = session.network_settings().await?;
    state.metrics.set_ip_address(&server, &network.ip_address);

    Ok(state.metrics.render()?)
}

/// Fetch product and server name with their documented fallbacks; identity
/// lookups never abort a scrape.
async fn identify(session: &dyn IloSession, host: &str) -> ServerLabels {
    let product_name = match session.product_name().await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch product name");
            FALLBACK_PRODUCT_NAME.to_string()
        }
    };

    let server_name = match session.server_name().await {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => host.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch server name");
            host.to_string()
        }
    };

    ServerLabels {
        product_name,
        server_name,
    }
}
