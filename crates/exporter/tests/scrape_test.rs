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

//! End-to-end scrapes: a real exporter talking RIBCL over HTTP to the mock
//! iLO, checked through the public HTTP surface only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hpilo_exporter::config::ListenConfig;
use hpilo_exporter::handler::{self, AppState};
use hpilo_exporter::{DefaultCredentials, ExporterMetrics};
use ilo_mock::MockIlo;
use ilo_ribcl::RibclConnector;

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

async fn spawn_mock(mock: MockIlo) -> SocketAddr {
    spawn_server(ilo_mock::router(Arc::new(mock))).await
}

async fn spawn_exporter(default_credentials: DefaultCredentials) -> SocketAddr {
    let state = AppState {
        // plain HTTP: the mock has no TLS listener
        connector: Arc::new(RibclConnector::new(Duration::from_secs(5), true, false)),
        metrics: Arc::new(ExporterMetrics::new().unwrap()),
        default_credentials,
    };
    spawn_server(handler::router(&ListenConfig::default(), state)).await
}

fn scrape_url(exporter: SocketAddr, mock: SocketAddr) -> String {
    format!(
        "http://{exporter}/metrics?ilo_host=127.0.0.1&ilo_port={}&ilo_user=admin&ilo_password=secret",
        mock.port()
    )
}

#[tokio::test]
async fn full_scrape_end_to_end() {
    let mock = spawn_mock(MockIlo::default()).await;
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let response = reqwest::get(scrape_url(exporter, mock)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let body = response.text().await.unwrap();
    let labels = "product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"";

    assert!(body.contains(&format!("hpilo_bios_hardware{{{labels}}} 0")));
    assert!(body.contains(&format!("hpilo_storage{{{labels}}} 0")));
    assert!(body.contains(&format!(
        "hpilo_fan_status{{fan_name=\"Fan 1\",{labels}}} 0"
    )));
    assert!(body.contains(&format!(
        "hpilo_fan_speed{{fan_name=\"Fan 1\",{labels}}} 23"
    )));
    // Fan 2 reports no speed reading
    assert!(body.contains(&format!(
        "hpilo_fan_status{{fan_name=\"Fan 2\",{labels}}} 2"
    )));
    assert!(!body.contains("hpilo_fan_speed{fan_name=\"Fan 2\""));
    assert!(body.contains(&format!(
        "hpilo_temp{{{labels},thermometer_name=\"01-Inlet Ambient\"}} 21"
    )));
    assert!(body.contains(&format!(
        "hpilo_temp_caution{{{labels},thermometer_name=\"01-Inlet Ambient\"}} 42"
    )));
    assert!(body.contains(&format!(
        "hpilo_temp_critical{{{labels},thermometer_name=\"01-Inlet Ambient\"}} 46"
    )));
    assert!(body.contains(&format!(
        "hpilo_nic_status{{ip_address=\"10.0.0.5\",nic_name=\"iLO 4 Network Port\",{labels}}} 0"
    )));
    assert!(body.contains(&format!("hpilo_host_power{{{labels}}} 1")));
    assert!(body.contains(&format!("hpilo_host_uptime{{{labels}}} 5172")));
    assert!(body.contains("firmware_version=\"2.50\""));
    assert!(body.contains("ip_address=\"10.0.0.42\""));
}

#[tokio::test]
async fn wrong_credentials_return_error_status() {
    let mock = spawn_mock(MockIlo::default()).await;
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let url = format!(
        "http://{exporter}/metrics?ilo_host=127.0.0.1&ilo_port={}&ilo_user=admin&ilo_password=wrong",
        mock.port()
    );
    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn missing_parameter_returns_error_status() {
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let url = format!("http://{exporter}/metrics?ilo_host=127.0.0.1&ilo_user=admin&ilo_password=secret");
    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn environment_defaults_substitute_for_query_credentials() {
    let mock = spawn_mock(MockIlo::default()).await;
    let exporter = spawn_exporter(DefaultCredentials {
        username: Some("admin".to_string()),
        password: Some("secret".to_string()),
    })
    .await;

    let url = format!(
        "http://{exporter}/metrics?ilo_host=127.0.0.1&ilo_port={}",
        mock.port()
    );
    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unsupported_power_on_time_is_omitted() {
    let mock = spawn_mock(MockIlo {
        power_on_minutes: None,
        ..MockIlo::default()
    })
    .await;
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let response = reqwest::get(scrape_url(exporter, mock)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(!body.contains("hpilo_host_uptime{"));
    assert!(body.contains("hpilo_host_power{"));
}

#[tokio::test]
async fn oldest_generation_exposes_no_nic_series() {
    let mut mock = MockIlo::default();
    mock.firmware.management_processor = "iLO3".to_string();
    let mock = spawn_mock(mock).await;
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let response = reqwest::get(scrape_url(exporter, mock)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(!body.contains("hpilo_nic_status{"));
    assert!(body.contains("hpilo_fan_status{"));
}

#[tokio::test]
async fn consecutive_scrapes_render_identical_bodies() {
    let mock = spawn_mock(MockIlo::default()).await;
    let exporter = spawn_exporter(DefaultCredentials::default()).await;
    let url = scrape_url(exporter, mock);

    let first = reqwest::get(&url).await.unwrap().text().await.unwrap();
    let second = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn index_and_unknown_paths() {
    let exporter = spawn_exporter(DefaultCredentials::default()).await;

    let response = reqwest::get(format!("http://{exporter}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let response = reqwest::get(format!("http://{exporter}/nope")).await.unwrap();
    assert_eq!(response.status(), 404);
}
