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

//! Typed views over the RIBCL health and inventory payloads.

use std::collections::BTreeMap;

/// A sensor reading as iLO reports it: a numeric value plus a unit string.
/// Readings the firmware reports as `N/A` (or any other non-numeric value)
/// are absent rather than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub unit: String,
}

/// The embedded health tree returned by `GET_EMBEDDED_HEALTH`.
///
/// Maps are ordered so that repeated scrapes of unchanged hardware walk the
/// entries in a stable order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedHealth {
    /// Subsystem name (lowercased, e.g. `bios_hardware`) to status string.
    pub health_at_a_glance: BTreeMap<String, String>,
    pub fans: Vec<Fan>,
    pub temperatures: Vec<TemperatureSensor>,
    /// NIC name (e.g. `iLO 4 Network Port`) to per-NIC data.
    pub nics: BTreeMap<String, Nic>,
}

#[derive(Debug, Clone)]
pub struct Fan {
    pub label: String,
    pub status: String,
    pub speed: Option<Reading>,
}

#[derive(Debug, Clone)]
pub struct TemperatureSensor {
    pub label: String,
    pub status: String,
    pub current: Option<Reading>,
    pub caution: Option<Reading>,
    pub critical: Option<Reading>,
}

#[derive(Debug, Clone)]
pub struct Nic {
    pub status: String,
    pub ip_address: String,
}

#[derive(Debug, Clone)]
pub struct FirmwareInfo {
    pub firmware_version: String,
    /// Management processor generation, e.g. `iLO3` or `iLO4`.
    pub management_processor: String,
}

#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub ip_address: String,
}
