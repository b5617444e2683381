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

//! ilo-mock behaves like the RIBCL endpoint of an HP iLO management
//! processor. It answers `POST /ribcl` with canned XML built from a
//! [`MockIlo`] fixture, which integration tests (and `cargo run`) point the
//! real client at.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use ilo_ribcl::types::{EmbeddedHealth, Fan, FirmwareInfo, Nic, Reading, TemperatureSensor};

/// One fake server: identity, health tree and failure switches.
#[derive(Debug, Clone)]
pub struct MockIlo {
    pub username: String,
    pub password: String,
    pub product_name: String,
    pub server_name: String,
    pub firmware: FirmwareInfo,
    pub health: EmbeddedHealth,
    pub host_power: String,
    /// `None` makes the power-on-time command fail, like firmware that does
    /// not implement it.
    pub power_on_minutes: Option<f64>,
    pub network_ip: String,
    /// Reject every request as if the credentials were wrong.
    pub reject_login: bool,
}

impl Default for MockIlo {
    fn default() -> Self {
        let mut health = EmbeddedHealth::default();
        for subsystem in [
            "bios_hardware",
            "fans",
            "memory",
            "network",
            "power_supplies",
            "processor",
            "storage",
            "temperature",
        ] {
            health
                .health_at_a_glance
                .insert(subsystem.to_string(), "OK".to_string());
        }
        health.fans.push(Fan {
            label: "Fan 1".to_string(),
            status: "OK".to_string(),
            speed: Some(Reading {
                value: 23.0,
                unit: "Percentage".to_string(),
            }),
        });
        health.fans.push(Fan {
            label: "Fan 2".to_string(),
            status: "Not Installed".to_string(),
            speed: None,
        });
        health.temperatures.push(TemperatureSensor {
            label: "01-Inlet Ambient".to_string(),
            status: "OK".to_string(),
            current: Some(Reading {
                value: 21.0,
                unit: "Celsius".to_string(),
            }),
            caution: Some(Reading {
                value: 42.0,
                unit: "Celsius".to_string(),
            }),
            critical: Some(Reading {
                value: 46.0,
                unit: "Celsius".to_string(),
            }),
        });
        health.nics = BTreeMap::from([(
            "iLO 4 Network Port".to_string(),
            Nic {
                status: "OK".to_string(),
                ip_address: "10.0.0.5".to_string(),
            },
        )]);

        Self {
            username: "admin".to_string(),
            password: "secret".to_string(),
            product_name: "ProLiant DL380 Gen9".to_string(),
            server_name: "srv01".to_string(),
            firmware: FirmwareInfo {
                firmware_version: "2.50".to_string(),
                management_processor: "iLO4".to_string(),
            },
            health,
            host_power: "ON".to_string(),
            power_on_minutes: Some(5172.0),
            network_ip: "10.0.0.42".to_string(),
            reject_login: false,
        }
    }
}

pub fn router(state: Arc<MockIlo>) -> Router {
    Router::new()
        .route("/ribcl", post(handle_ribcl))
        .with_state(state)
}

async fn handle_ribcl(State(state): State<Arc<MockIlo>>, body: String) -> Response {
    let credentials_ok = body.contains(&format!("USER_LOGIN=\"{}\"", escape(&state.username)))
        && body.contains(&format!("PASSWORD=\"{}\"", escape(&state.password)));
    if state.reject_login || !credentials_ok {
        return xml_response(error_doc(0x005f, "Login failed."));
    }

    let body = if body.contains("<GET_EMBEDDED_HEALTH/>") {
        ok_with(&render_health(&state.health))
    } else if body.contains("<GET_PRODUCT_NAME/>") {
        ok_with(&format!(
            "<GET_PRODUCT_NAME>\n  <PRODUCT_NAME VALUE=\"{}\"/>\n</GET_PRODUCT_NAME>",
            escape(&state.product_name)
        ))
    } else if body.contains("<GET_SERVER_NAME/>") {
        ok_with(&format!(
            "<SERVER_NAME VALUE=\"{}\"/>",
            escape(&state.server_name)
        ))
    } else if body.contains("<GET_FW_VERSION/>") {
        ok_with(&format!(
            "<GET_FW_VERSION FIRMWARE_VERSION=\"{}\" MANAGEMENT_PROCESSOR=\"{}\"/>",
            escape(&state.firmware.firmware_version),
            escape(&state.firmware.management_processor)
        ))
    } else if body.contains("<GET_HOST_POWER_STATUS/>") {
        ok_with(&format!(
            "<GET_HOST_POWER HOST_POWER=\"{}\"/>",
            escape(&state.host_power)
        ))
    } else if body.contains("<GET_SERVER_POWER_ON_TIME/>") {
        match state.power_on_minutes {
            Some(minutes) => ok_with(&format!("<SERVER_POWER_ON_MINUTES VALUE=\"{minutes}\"/>")),
            None => error_doc(0x003c, "Feature not supported."),
        }
    } else if body.contains("<GET_NETWORK_SETTINGS/>") {
        ok_with(&format!(
            "<GET_NETWORK_SETTINGS>\n  <IP_ADDRESS VALUE=\"{}\"/>\n  <SUBNET_MASK VALUE=\"255.255.255.0\"/>\n</GET_NETWORK_SETTINGS>",
            escape(&state.network_ip)
        ))
    } else {
        // bare login probe
        ok_doc()
    };

    xml_response(body)
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        body,
    )
        .into_response()
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn ok_doc() -> String {
    "<?xml version=\"1.0\"?>\r\n<RIBCL VERSION=\"2.22\">\n\
     <RESPONSE STATUS=\"0x0000\" MESSAGE=\"No error\"/>\n</RIBCL>\r\n"
        .to_string()
}

/// Real firmware emits one document per processing stage; the payload rides
/// in the second one.
fn ok_with(payload: &str) -> String {
    format!(
        "{}<?xml version=\"1.0\"?>\r\n<RIBCL VERSION=\"2.22\">\n\
         <RESPONSE STATUS=\"0x0000\" MESSAGE=\"No error\"/>\n{payload}\n</RIBCL>\r\n",
        ok_doc()
    )
}

fn error_doc(status: u32, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\r\n<RIBCL VERSION=\"2.22\">\n\
         <RESPONSE STATUS=\"{status:#06x}\" MESSAGE=\"{}\"/>\n</RIBCL>\r\n",
        escape(message)
    )
}

fn render_reading(tag: &str, reading: Option<&Reading>) -> String {
    match reading {
        Some(r) => format!("<{tag} VALUE=\"{}\" UNIT=\"{}\"/>", r.value, escape(&r.unit)),
        None => format!("<{tag} VALUE=\"N/A\" UNIT=\"\"/>"),
    }
}

fn render_health(health: &EmbeddedHealth) -> String {
    let mut out = String::from("<GET_EMBEDDED_HEALTH_DATA>\n<HEALTH_AT_A_GLANCE>\n");
    for (subsystem, status) in &health.health_at_a_glance {
        out.push_str(&format!(
            "  <{} STATUS=\"{}\"/>\n",
            subsystem.to_uppercase(),
            escape(status)
        ));
    }
    out.push_str("</HEALTH_AT_A_GLANCE>\n<FANS>\n");
    for fan in &health.fans {
        out.push_str(&format!(
            "  <FAN>\n    <LABEL VALUE=\"{}\"/>\n    <STATUS VALUE=\"{}\"/>\n    {}\n  </FAN>\n",
            escape(&fan.label),
            escape(&fan.status),
            render_reading("SPEED", fan.speed.as_ref())
        ));
    }
    out.push_str("</FANS>\n<TEMPERATURE>\n");
    for sensor in &health.temperatures {
        out.push_str(&format!(
            "  <TEMP>\n    <LABEL VALUE=\"{}\"/>\n    <STATUS VALUE=\"{}\"/>\n    {}\n    {}\n    {}\n  </TEMP>\n",
            escape(&sensor.label),
            escape(&sensor.status),
            render_reading("CURRENTREADING", sensor.current.as_ref()),
            render_reading("CAUTION", sensor.caution.as_ref()),
            render_reading("CRITICAL", sensor.critical.as_ref()),
        ));
    }
    out.push_str("</TEMPERATURE>\n<NIC_INFORMATION>\n");
    for (name, nic) in &health.nics {
        out.push_str(&format!(
            "  <NIC>\n    <NETWORK_PORT VALUE=\"{}\"/>\n    <STATUS VALUE=\"{}\"/>\n    <IP_ADDRESS VALUE=\"{}\"/>\n  </NIC>\n",
            escape(name),
            escape(&nic.status),
            escape(&nic.ip_address)
        ));
    }
    out.push_str("</NIC_INFORMATION>\n</GET_EMBEDDED_HEALTH_DATA>");
    out
}

#[cfg(test)]
mod tests {
    use ilo_ribcl::ribcl;

    use super::*;

    #[test]
    fn rendered_health_parses_with_the_client_codec() {
        let mock = MockIlo::default();
        let body = ok_with(&render_health(&mock.health));

        let roots = ribcl::parse_documents(&body).unwrap();
        ribcl::check_responses(&roots).unwrap();
        let health = ribcl::parse_embedded_health(&roots).unwrap();

        assert_eq!(health.health_at_a_glance.len(), 8);
        assert_eq!(health.fans.len(), 2);
        assert!(health.fans[1].speed.is_none());
        assert_eq!(health.temperatures.len(), 1);
        assert_eq!(health.nics.len(), 1);
    }

    #[test]
    fn error_documents_carry_the_status() {
        let body = error_doc(0x005f, "Login failed.");
        let roots = ribcl::parse_documents(&body).unwrap();
        assert!(matches!(
            ribcl::check_responses(&roots),
            Err(ilo_ribcl::IloError::LoginFailed)
        ));
    }
}
