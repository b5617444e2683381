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

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::ribcl::{self, Element, Section};
use crate::types::{EmbeddedHealth, FirmwareInfo, NetworkSettings};
use crate::{IloError, IloTarget};

/// Opens sessions to iLO endpoints. The exporter's scrape handler only sees
/// this trait, so tests substitute a fake.
#[async_trait::async_trait]
pub trait IloConnector: Send + Sync {
    async fn connect(&self, target: &IloTarget) -> Result<Box<dyn IloSession>, IloError>;
}

/// One authenticated conversation with an iLO.
///
/// RIBCL carries credentials on every exchange, so the session holds the
/// target and an HTTP connection pool; both are released when the session is
/// dropped, on every exit path.
#[async_trait::async_trait]
pub trait IloSession: Send + Sync {
    async fn product_name(&self) -> Result<String, IloError>;
    async fn server_name(&self) -> Result<String, IloError>;
    async fn embedded_health(&self) -> Result<EmbeddedHealth, IloError>;
    async fn fw_version(&self) -> Result<FirmwareInfo, IloError>;
    async fn host_power_status(&self) -> Result<String, IloError>;
    async fn server_power_on_minutes(&self) -> Result<f64, IloError>;
    async fn network_settings(&self) -> Result<NetworkSettings, IloError>;
}

/// Connector for real iLO hardware.
#[derive(Debug, Clone)]
pub struct RibclConnector {
    connect_timeout: Duration,
    accept_invalid_certs: bool,
    use_tls: bool,
}

impl RibclConnector {
    pub fn new(connect_timeout: Duration, accept_invalid_certs: bool, use_tls: bool) -> Self {
        Self {
            connect_timeout,
            accept_invalid_certs,
            use_tls,
        }
    }
}

#[async_trait::async_trait]
impl IloConnector for RibclConnector {
    async fn connect(&self, target: &IloTarget) -> Result<Box<dyn IloSession>, IloError> {
        tracing::debug!(ilo = ?target, "opening RIBCL session");

        // Resolve up front so an unreachable name is reported as an address
        // problem rather than a transport fault.
        let resolved = tokio::net::lookup_host((target.host.as_str(), target.port))
            .await
            .map_err(|e| IloError::InvalidAddress {
                host: target.host.clone(),
                port: target.port,
                reason: e.to_string(),
            })?;
        if resolved.count() == 0 {
            return Err(IloError::InvalidAddress {
                host: target.host.clone(),
                port: target.port,
                reason: "no addresses returned".to_string(),
            });
        }

        // BMCs ship self-signed certificates; certificate validation is
        // configurable but off by default.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.connect_timeout)
            .build()
            .map_err(|e| IloError::Communication(e.to_string()))?;

        let scheme = if self.use_tls { "https" } else { "http" };
        let session = RibclSession {
            client,
            url: format!("{scheme}://{}:{}/ribcl", target.host, target.port),
            username: target.username.clone(),
            password: target.password.clone(),
        };
        session.probe_login().await?;
        Ok(Box::new(session))
    }
}

struct RibclSession {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl RibclSession {
    async fn post(&self, body: String) -> Result<Vec<Element>, IloError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| IloError::Communication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IloError::Communication(format!(
                "iLO answered HTTP {status}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| IloError::Communication(e.to_string()))?;
        let roots = ribcl::parse_documents(&text)?;
        ribcl::check_responses(&roots)?;
        Ok(roots)
    }

    async fn probe_login(&self) -> Result<(), IloError> {
        self.post(ribcl::login_request(&self.username, &self.password))
            .await
            .map(|_| ())
    }

    async fn execute(&self, section: Section, command: &str) -> Result<Vec<Element>, IloError> {
        self.post(ribcl::command_request(
            &self.username,
            &self.password,
            section,
            command,
        ))
        .await
    }
}

#[async_trait::async_trait]
impl IloSession for RibclSession {
    async fn product_name(&self) -> Result<String, IloError> {
        let roots = self
            .execute(Section::ServerInfo, "GET_PRODUCT_NAME")
            .await?;
        ribcl::parse_product_name(&roots)
    }

    async fn server_name(&self) -> Result<String, IloError> {
        let roots = self.execute(Section::ServerInfo, "GET_SERVER_NAME").await?;
        ribcl::parse_server_name(&roots)
    }

    async fn embedded_health(&self) -> Result<EmbeddedHealth, IloError> {
        let roots = self
            .execute(Section::ServerInfo, "GET_EMBEDDED_HEALTH")
            .await?;
        ribcl::parse_embedded_health(&roots)
    }

    async fn fw_version(&self) -> Result<FirmwareInfo, IloError> {
        let roots = self.execute(Section::RibInfo, "GET_FW_VERSION").await?;
        ribcl::parse_fw_version(&roots)
    }

    async fn host_power_status(&self) -> Result<String, IloError> {
        let roots = self
            .execute(Section::ServerInfo, "GET_HOST_POWER_STATUS")
            .await?;
        ribcl::parse_host_power(&roots)
    }

    async fn server_power_on_minutes(&self) -> Result<f64, IloError> {
        let roots = self
            .execute(Section::ServerInfo, "GET_SERVER_POWER_ON_TIME")
            .await?;
        ribcl::parse_power_on_minutes(&roots)
    }

    async fn network_settings(&self) -> Result<NetworkSettings, IloError> {
        let roots = self.execute(Section::RibInfo, "GET_NETWORK_SETTINGS").await?;
        ribcl::parse_network_settings(&roots)
    }
}
