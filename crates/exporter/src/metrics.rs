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

//! The process-wide metric registry.
//!
//! Built once at startup and handed to the scrape handler as an owned
//! service. Every gauge carries at least the `product_name`/`server_name`
//! pair; per-device gauges add the device label. Series written for targets
//! that are no longer scraped persist until the process restarts — that is
//! a documented characteristic of the exporter, not a leak to clean up.

use std::collections::HashMap;
use std::sync::Mutex;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// The identity labels attached to every sample of one scraped server.
#[derive(Debug, Clone)]
pub struct ServerLabels {
    pub product_name: String,
    pub server_name: String,
}

/// The closed set of health-at-a-glance subsystems iLO reports. A snapshot
/// naming anything outside this set is registry/data-model drift and fails
/// the scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    BiosHardware,
    Fans,
    Memory,
    Network,
    PowerSupplies,
    Processor,
    Storage,
    Temperature,
    Vrm,
    Drive,
    Battery,
}

impl Subsystem {
    pub const ALL: [Subsystem; 11] = [
        Subsystem::BiosHardware,
        Subsystem::Fans,
        Subsystem::Memory,
        Subsystem::Network,
        Subsystem::PowerSupplies,
        Subsystem::Processor,
        Subsystem::Storage,
        Subsystem::Temperature,
        Subsystem::Vrm,
        Subsystem::Drive,
        Subsystem::Battery,
    ];

    /// The subsystem key as it appears in the embedded health tree.
    pub fn key(self) -> &'static str {
        match self {
            Subsystem::BiosHardware => "bios_hardware",
            Subsystem::Fans => "fans",
            Subsystem::Memory => "memory",
            Subsystem::Network => "network",
            Subsystem::PowerSupplies => "power_supplies",
            Subsystem::Processor => "processor",
            Subsystem::Storage => "storage",
            Subsystem::Temperature => "temperature",
            Subsystem::Vrm => "vrm",
            Subsystem::Drive => "drive",
            Subsystem::Battery => "battery",
        }
    }

    pub fn from_key(key: &str) -> Option<Subsystem> {
        Subsystem::ALL.into_iter().find(|s| s.key() == key)
    }

    fn metric_name(self) -> String {
        format!("hpilo_{}", self.key())
    }
}

/// An info metric: a constant-1 gauge whose payload rides in a label.
/// Re-writing a server's payload replaces the previous series instead of
/// accumulating one series per historical value.
struct InfoMetric {
    gauge: GaugeVec,
    current: Mutex<HashMap<(String, String), String>>,
}

impl InfoMetric {
    fn new(
        registry: &Registry,
        name: &str,
        help: &str,
        payload_label: &str,
    ) -> Result<Self, prometheus::Error> {
        let gauge = GaugeVec::new(
            Opts::new(name, help),
            &["product_name", "server_name", payload_label],
        )?;
        registry.register(Box::new(gauge.clone()))?;
        Ok(Self {
            gauge,
            current: Mutex::new(HashMap::new()),
        })
    }

    fn set(&self, server: &ServerLabels, payload: &str) {
        let mut current = self.current.lock().expect("info metric lock poisoned");
        let key = (server.product_name.clone(), server.server_name.clone());
        if let Some(previous) = current.get(&key) {
            if previous != payload {
                let _ = self
                    .gauge
                    .remove_label_values(&[&key.0, &key.1, previous]);
            }
        }
        self.gauge
            .with_label_values(&[&server.product_name, &server.server_name, payload])
            .set(1.0);
        current.insert(key, payload.to_string());
    }
}

pub struct ExporterMetrics {
    registry: Registry,
    subsystems: HashMap<Subsystem, GaugeVec>,
    nic_status: GaugeVec,
    fan_status: GaugeVec,
    fan_speed: GaugeVec,
    temp: GaugeVec,
    temp_status: GaugeVec,
    temp_caution: GaugeVec,
    temp_critical: GaugeVec,
    host_power: GaugeVec,
    host_uptime: GaugeVec,
    firmware_version: InfoMetric,
    ip_address: InfoMetric,
}

const SERVER_LABELS: [&str; 2] = ["product_name", "server_name"];

fn register_gauge(
    registry: &Registry,
    name: &str,
    help: &str,
    extra_labels: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
    let mut labels = SERVER_LABELS.to_vec();
    labels.extend_from_slice(extra_labels);
    let gauge = GaugeVec::new(Opts::new(name, help), &labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl ExporterMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let mut subsystems = HashMap::new();
        for subsystem in Subsystem::ALL {
            let gauge = register_gauge(
                &registry,
                &subsystem.metric_name(),
                &format!("HP iLO {} status", subsystem.key()),
                &[],
            )?;
            subsystems.insert(subsystem, gauge);
        }

        Ok(Self {
            nic_status: register_gauge(
                &registry,
                "hpilo_nic_status",
                "HP iLO NIC status",
                &["nic_name", "ip_address"],
            )?,
            fan_status: register_gauge(
                &registry,
                "hpilo_fan_status",
                "HP iLO fan status",
                &["fan_name"],
            )?,
            fan_speed: register_gauge(
                &registry,
                "hpilo_fan_speed",
                "HP iLO fan speed",
                &["fan_name"],
            )?,
            temp: register_gauge(
                &registry,
                "hpilo_temp",
                "HP iLO temperature",
                &["thermometer_name"],
            )?,
            temp_status: register_gauge(
                &registry,
                "hpilo_temp_status",
                "HP iLO thermometer status",
                &["thermometer_name"],
            )?,
            temp_caution: register_gauge(
                &registry,
                "hpilo_temp_caution",
                "HP iLO temperature caution point",
                &["thermometer_name"],
            )?,
            temp_critical: register_gauge(
                &registry,
                "hpilo_temp_critical",
                "HP iLO temperature critical point",
                &["thermometer_name"],
            )?,
            host_power: register_gauge(
                &registry,
                "hpilo_host_power",
                "HP iLO host power status",
                &[],
            )?,
            host_uptime: register_gauge(
                &registry,
                "hpilo_host_uptime",
                "HP iLO minutes host has been powered on",
                &[],
            )?,
            firmware_version: InfoMetric::new(
                &registry,
                "hpilo_firmware_version",
                "HP iLO firmware version",
                "firmware_version",
            )?,
            ip_address: InfoMetric::new(
                &registry,
                "hpilo_ip_address",
                "HP iLO IP address",
                "ip_address",
            )?,
            subsystems,
            registry,
        })
    }

    pub fn set_subsystem(&self, server: &ServerLabels, subsystem: Subsystem, code: u8) {
        self.subsystems
            .get(&subsystem)
            .expect("subsystem gauge table is exhaustive")
            .with_label_values(&[&server.product_name, &server.server_name])
            .set(code as f64);
    }

    pub fn set_nic_status(&self, server: &ServerLabels, nic_name: &str, ip_address: &str, code: u8) {
        self.nic_status
            .with_label_values(&[&server.product_name, &server.server_name, nic_name, ip_address])
            .set(code as f64);
    }

    pub fn set_fan_status(&self, server: &ServerLabels, fan_name: &str, code: u8) {
        self.fan_status
            .with_label_values(&[&server.product_name, &server.server_name, fan_name])
            .set(code as f64);
    }

    pub fn set_fan_speed(&self, server: &ServerLabels, fan_name: &str, speed: f64) {
        self.fan_speed
            .with_label_values(&[&server.product_name, &server.server_name, fan_name])
            .set(speed);
    }

    pub fn set_temp_status(&self, server: &ServerLabels, thermometer: &str, code: u8) {
        self.temp_status
            .with_label_values(&[&server.product_name, &server.server_name, thermometer])
            .set(code as f64);
    }

    pub fn set_temp(&self, server: &ServerLabels, thermometer: &str, value: f64) {
        self.temp
            .with_label_values(&[&server.product_name, &server.server_name, thermometer])
            .set(value);
    }

    pub fn set_temp_caution(&self, server: &ServerLabels, thermometer: &str, value: f64) {
        self.temp_caution
            .with_label_values(&[&server.product_name, &server.server_name, thermometer])
            .set(value);
    }

    pub fn set_temp_critical(&self, server: &ServerLabels, thermometer: &str, value: f64) {
        self.temp_critical
            .with_label_values(&[&server.product_name, &server.server_name, thermometer])
            .set(value);
    }

    pub fn set_host_power(&self, server: &ServerLabels, code: u8) {
        self.host_power
            .with_label_values(&[&server.product_name, &server.server_name])
            .set(code as f64);
    }

    pub fn set_host_uptime(&self, server: &ServerLabels, minutes: f64) {
        self.host_uptime
            .with_label_values(&[&server.product_name, &server.server_name])
            .set(minutes);
    }

    pub fn set_firmware_version(&self, server: &ServerLabels, version: &str) {
        self.firmware_version.set(server, version);
    }

    pub fn set_ip_address(&self, server: &ServerLabels, ip_address: &str) {
        self.ip_address.set(server, ip_address);
    }

    /// Serialize everything currently held into the text exposition format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerLabels {
        ServerLabels {
            product_name: "ProLiant DL380 Gen9".to_string(),
            server_name: "srv01".to_string(),
        }
    }

    fn render_string(metrics: &ExporterMetrics) -> String {
        String::from_utf8(metrics.render().unwrap()).unwrap()
    }

    #[test]
    fn every_subsystem_has_a_gauge_and_a_key() {
        let metrics = ExporterMetrics::new().unwrap();
        for subsystem in Subsystem::ALL {
            assert_eq!(Subsystem::from_key(subsystem.key()), Some(subsystem));
            // set through the table; a missing entry would panic
            metrics.set_subsystem(&server(), subsystem, 0);
        }
        assert_eq!(Subsystem::from_key("flux_capacitor"), None);
    }

    #[test]
    fn gauge_updates_render_with_device_labels() {
        let metrics = ExporterMetrics::new().unwrap();
        let server = server();
        metrics.set_fan_status(&server, "Fan 1", 3);
        metrics.set_fan_speed(&server, "Fan 1", 1234.0);
        metrics.set_nic_status(&server, "iLO 4 Network Port", "10.0.0.5", 4);

        let body = render_string(&metrics);
        assert!(body.contains(
            "hpilo_fan_status{fan_name=\"Fan 1\",product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"} 3"
        ));
        assert!(body.contains(
            "hpilo_fan_speed{fan_name=\"Fan 1\",product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"} 1234"
        ));
        assert!(body.contains(
            "hpilo_nic_status{ip_address=\"10.0.0.5\",nic_name=\"iLO 4 Network Port\",product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"} 4"
        ));
    }

    #[test]
    fn rewriting_a_gauge_overwrites_in_place() {
        let metrics = ExporterMetrics::new().unwrap();
        let server = server();
        metrics.set_host_power(&server, 0);
        metrics.set_host_power(&server, 1);

        let body = render_string(&metrics);
        assert!(body.contains("hpilo_host_power{product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"} 1"));
        assert!(!body.contains("hpilo_host_power{product_name=\"ProLiant DL380 Gen9\",server_name=\"srv01\"} 0"));
    }

    #[test]
    fn info_payload_is_replaced_not_accumulated() {
        let metrics = ExporterMetrics::new().unwrap();
        let server = server();
        metrics.set_firmware_version(&server, "2.50");
        metrics.set_firmware_version(&server, "2.61");

        let body = render_string(&metrics);
        assert!(body.contains("firmware_version=\"2.61\""));
        assert!(!body.contains("firmware_version=\"2.50\""));
    }

    #[test]
    fn stale_targets_persist_across_scrapes() {
        let metrics = ExporterMetrics::new().unwrap();
        let old = ServerLabels {
            product_name: "ProLiant DL360 Gen8".to_string(),
            server_name: "decommissioned".to_string(),
        };
        metrics.set_host_power(&old, 1);
        metrics.set_host_power(&server(), 1);

        let body = render_string(&metrics);
        assert!(body.contains("server_name=\"decommissioned\""));
        assert!(body.contains("server_name=\"srv01\""));
    }
}
