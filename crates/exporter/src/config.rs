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

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,

    pub ilo: IloConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            ilo: IloConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Exporter listener.
    pub endpoint: String,

    /// Path the scrape handler is mounted on.
    pub telemetry_path: String,

    /// Maximum number of scrapes handled concurrently; further requests
    /// queue on the listener.
    pub max_concurrent_scrapes: usize,

    /// Wall-clock budget for a single scrape request.
    #[serde(with = "humantime_serde")]
    pub scrape_timeout: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            endpoint: "0.0.0.0:8080".to_string(),
            telemetry_path: "/metrics".to_string(),
            max_concurrent_scrapes: 30,
            scrape_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IloConfig {
    /// Timeout for each RIBCL exchange with the management processor.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// iLOs ship self-signed certificates, so validation is off by default.
    pub accept_invalid_certs: bool,

    /// Talk RIBCL over HTTPS. Plain HTTP is only useful against a mock.
    pub use_tls: bool,
}

impl Default for IloConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: true,
            use_tls: true,
        }
    }
}

impl Config {
    /// Load configuration from optional path
    pub fn load(config_path: Option<&Path>) -> Result<Self, String> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("ILO_EXPORTER__").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| format!("Failed to load configuration: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Get the exporter listener address
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        self.listen
            .endpoint
            .parse()
            .map_err(|_| format!("Invalid listen endpoint: {}", self.listen.endpoint))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listen_addr()?;

        if !self.listen.telemetry_path.starts_with('/') {
            return Err(format!(
                "telemetry_path must start with '/', got {}",
                self.listen.telemetry_path
            ));
        }

        if self.listen.max_concurrent_scrapes == 0 {
            return Err("max_concurrent_scrapes must be greater than 0".to_string());
        }

        if self.listen.scrape_timeout.is_zero() {
            return Err("scrape_timeout must be greater than 0".to_string());
        }

        if self.ilo.connect_timeout.is_zero() {
            return Err("ilo connect_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Credential defaults sourced from the environment at startup. When a
/// variable is set it takes precedence over the matching query parameter;
/// the query is only consulted for fields the environment leaves unset.
#[derive(Clone, Default)]
pub struct DefaultCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DefaultCredentials {
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("ILO_USERNAME").ok().filter(|v| !v.is_empty()),
            password: std::env::var("ILO_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_config() {
        let toml_content = include_str!("../example/config.example.toml");
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml_content))
            .extract()
            .expect("could not parse config toml file");

        assert_eq!(config.listen.endpoint, "0.0.0.0:9416");
        assert_eq!(config.listen.telemetry_path, "/metrics");
        assert_eq!(config.listen.max_concurrent_scrapes, 30);
        assert_eq!(config.listen.scrape_timeout, Duration::from_secs(30));
        assert_eq!(config.ilo.connect_timeout, Duration::from_secs(10));
        assert!(config.ilo.accept_invalid_certs);
        assert!(config.ilo.use_tls);

        config.validate().expect("config should be valid");
    }

    #[test]
    fn test_partial_config() {
        let toml_content = r#"
[listen]
endpoint = "127.0.0.1:9999"
scrape_timeout = "45s"

[ilo]
connect_timeout = "5s"
"#;

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml_content))
            .extract()
            .expect("failed to parse");

        assert_eq!(config.listen.endpoint, "127.0.0.1:9999");
        assert_eq!(config.listen.scrape_timeout, Duration::from_secs(45));
        // untouched sections keep their defaults
        assert_eq!(config.listen.telemetry_path, "/metrics");
        assert_eq!(config.listen.max_concurrent_scrapes, 30);
        assert_eq!(config.ilo.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.validate().expect("config should be valid");

        config.listen.endpoint = "not-an-address".to_string();
        assert!(config.validate().is_err());
        config.listen.endpoint = "0.0.0.0:8080".to_string();

        config.listen.telemetry_path = "metrics".to_string();
        assert!(config.validate().is_err());
        config.listen.telemetry_path = "/metrics".to_string();

        config.listen.max_concurrent_scrapes = 0;
        assert!(config.validate().is_err());
        config.listen.max_concurrent_scrapes = 30;

        config.validate().expect("config should be valid again");
    }

    #[test]
    fn test_load_defaults() {
        let config = Config::load(None).expect("should load defaults");
        assert_eq!(config.listen.endpoint, "0.0.0.0:8080");
        assert_eq!(config.listen.telemetry_path, "/metrics");
        assert_eq!(config.listen.max_concurrent_scrapes, 30);
    }
}
