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

//! RIBCL request rendering and response parsing.
//!
//! An iLO answers a single POST with a *sequence* of XML documents, one per
//! processing stage, each rooted at `<RIBCL>` and carrying zero or more
//! `<RESPONSE STATUS="0x...">` elements. Payload elements vary by firmware
//! generation, so extraction searches the document trees by element name
//! instead of assuming a fixed layout.

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::{
    EmbeddedHealth, Fan, FirmwareInfo, NetworkSettings, Nic, Reading, TemperatureSensor,
};
use crate::IloError;

/// RIBCL status code iLO reports for bad credentials.
const STATUS_LOGIN_FAILED: u32 = 0x005f;

/// Which RIBCL command section a request targets.
#[derive(Debug, Clone, Copy)]
pub enum Section {
    ServerInfo,
    RibInfo,
}

impl Section {
    fn tag(self) -> &'static str {
        match self {
            Section::ServerInfo => "SERVER_INFO",
            Section::RibInfo => "RIB_INFO",
        }
    }
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a read-mode command request.
pub fn command_request(username: &str, password: &str, section: Section, command: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\r\n<RIBCL VERSION=\"2.0\">\
         <LOGIN USER_LOGIN=\"{user}\" PASSWORD=\"{pass}\">\
         <{section} MODE=\"read\"><{command}/></{section}>\
         </LOGIN></RIBCL>\r\n",
        user = xml_escape(username),
        pass = xml_escape(password),
        section = section.tag(),
        command = command,
    )
}

/// Render the credential probe: a login wrapper with no command, which iLO
/// acknowledges (or rejects) without touching any subsystem.
pub fn login_request(username: &str, password: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\r\n<RIBCL VERSION=\"2.0\">\
         <LOGIN USER_LOGIN=\"{user}\" PASSWORD=\"{pass}\"></LOGIN></RIBCL>\r\n",
        user = xml_escape(username),
        pass = xml_escape(password),
    )
}

/// One parsed XML element. RIBCL payloads put everything in attributes, so
/// text content is not retained.
#[derive(Debug, Default)]
pub struct Element {
    pub name: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, IloError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_uppercase();
        let mut attrs = HashMap::new();
        for attr in start.attributes().with_checks(false).flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_uppercase();
            let value = attr
                .unescape_value()
                .map_err(|e| IloError::Protocol(format!("bad attribute in <{name}>: {e}")))?
                .into_owned();
            attrs.insert(key, value);
        }
        Ok(Element {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Depth-first search for the first element with the given name,
    /// including this one.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Direct-child lookup. Section names reappear as subsystem entries
    /// inside `HEALTH_AT_A_GLANCE` (`FANS`, `TEMPERATURE`), so walking the
    /// health tree must not recurse.
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// The `VALUE`/`UNIT` attribute pair, when `VALUE` is numeric.
    fn reading(&self) -> Option<Reading> {
        let value = self.attr("VALUE")?.trim().parse::<f64>().ok()?;
        Some(Reading {
            value,
            unit: self.attr("UNIT").unwrap_or_default().to_string(),
        })
    }
}

/// Parse a response body into its document roots. The roots appear in the
/// order iLO emitted them.
pub fn parse_documents(body: &str) -> Result<Vec<Element>, IloError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .map_err(|e| IloError::Protocol(e.to_string()))?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| IloError::Protocol("unbalanced close tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(IloError::Protocol("truncated response".to_string()));
    }
    if roots.is_empty() {
        return Err(IloError::Protocol("empty response".to_string()));
    }
    Ok(roots)
}

/// Check every `RESPONSE` element across the documents; the first non-zero
/// status aborts with its message.
pub fn check_responses(roots: &[Element]) -> Result<(), IloError> {
    for root in roots {
        for response in root.children.iter().filter(|c| c.name == "RESPONSE") {
            let status = response
                .attr("STATUS")
                .and_then(parse_status)
                .ok_or(IloError::MissingField("RESPONSE STATUS"))?;
            if status == 0 {
                continue;
            }
            let message = response.attr("MESSAGE").unwrap_or("no message").to_string();
            if status == STATUS_LOGIN_FAILED || message.to_lowercase().contains("login failed") {
                return Err(IloError::LoginFailed);
            }
            return Err(IloError::Protocol(format!(
                "iLO returned status {status:#06x}: {message}"
            )));
        }
    }
    Ok(())
}

fn parse_status(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn find_in_roots<'a>(roots: &'a [Element], name: &str) -> Option<&'a Element> {
    roots.iter().find_map(|root| root.find(name))
}

fn required_value<'a>(
    roots: &'a [Element],
    element: &'static str,
) -> Result<&'a str, IloError> {
    find_in_roots(roots, element)
        .and_then(|e| e.attr("VALUE"))
        .ok_or(IloError::MissingField(element))
}

pub fn parse_product_name(roots: &[Element]) -> Result<String, IloError> {
    required_value(roots, "PRODUCT_NAME").map(str::to_string)
}

pub fn parse_server_name(roots: &[Element]) -> Result<String, IloError> {
    required_value(roots, "SERVER_NAME").map(str::to_string)
}

pub fn parse_fw_version(roots: &[Element]) -> Result<FirmwareInfo, IloError> {
    let element =
        find_in_roots(roots, "GET_FW_VERSION").ok_or(IloError::MissingField("GET_FW_VERSION"))?;
    Ok(FirmwareInfo {
        firmware_version: element
            .attr("FIRMWARE_VERSION")
            .ok_or(IloError::MissingField("FIRMWARE_VERSION"))?
            .to_string(),
        management_processor: element
            .attr("MANAGEMENT_PROCESSOR")
            .ok_or(IloError::MissingField("MANAGEMENT_PROCESSOR"))?
            .to_string(),
    })
}

pub fn parse_host_power(roots: &[Element]) -> Result<String, IloError> {
    find_in_roots(roots, "GET_HOST_POWER")
        .and_then(|e| e.attr("HOST_POWER"))
        .ok_or(IloError::MissingField("GET_HOST_POWER"))
        .map(str::to_string)
}

pub fn parse_power_on_minutes(roots: &[Element]) -> Result<f64, IloError> {
    required_value(roots, "SERVER_POWER_ON_MINUTES")?
        .trim()
        .parse()
        .map_err(|_| IloError::Protocol("non-numeric power-on minutes".to_string()))
}

pub fn parse_network_settings(roots: &[Element]) -> Result<NetworkSettings, IloError> {
    let settings = find_in_roots(roots, "GET_NETWORK_SETTINGS")
        .ok_or(IloError::MissingField("GET_NETWORK_SETTINGS"))?;
    let ip_address = settings
        .find("IP_ADDRESS")
        .and_then(|e| e.attr("VALUE"))
        .ok_or(IloError::MissingField("IP_ADDRESS"))?
        .to_string();
    Ok(NetworkSettings { ip_address })
}

pub fn parse_embedded_health(roots: &[Element]) -> Result<EmbeddedHealth, IloError> {
    let data = find_in_roots(roots, "GET_EMBEDDED_HEALTH_DATA")
        .ok_or(IloError::MissingField("GET_EMBEDDED_HEALTH_DATA"))?;

    let mut health = EmbeddedHealth::default();

    if let Some(glance) = data.child("HEALTH_AT_A_GLANCE") {
        for entry in &glance.children {
            if let Some(status) = entry.attr("STATUS") {
                health
                    .health_at_a_glance
                    .insert(entry.name.to_lowercase(), status.to_string());
            }
        }
    }

    if let Some(fans) = data.child("FANS") {
        for fan in fans.children.iter().filter(|c| c.name == "FAN") {
            let Some(label) = fan.find("LABEL").and_then(|e| e.attr("VALUE")) else {
                continue;
            };
            health.fans.push(Fan {
                label: label.to_string(),
                status: fan
                    .find("STATUS")
                    .and_then(|e| e.attr("VALUE"))
                    .unwrap_or_default()
                    .to_string(),
                speed: fan.find("SPEED").and_then(Element::reading),
            });
        }
    }

    if let Some(temps) = data.child("TEMPERATURE") {
        for temp in temps.children.iter().filter(|c| c.name == "TEMP") {
            let Some(label) = temp.find("LABEL").and_then(|e| e.attr("VALUE")) else {
                continue;
            };
            health.temperatures.push(TemperatureSensor {
                label: label.to_string(),
                status: temp
                    .find("STATUS")
                    .and_then(|e| e.attr("VALUE"))
                    .unwrap_or_default()
                    .to_string(),
                current: temp.find("CURRENTREADING").and_then(Element::reading),
                caution: temp.find("CAUTION").and_then(Element::reading),
                critical: temp.find("CRITICAL").and_then(Element::reading),
            });
        }
    }

    // Older firmware spells the section NIC_INFOMATION.
    let nics = data
        .child("NIC_INFORMATION")
        .or_else(|| data.child("NIC_INFOMATION"));
    if let Some(nics) = nics {
        health.nics = parse_nics(nics);
    }

    Ok(health)
}

fn parse_nics(section: &Element) -> BTreeMap<String, Nic> {
    let mut out = BTreeMap::new();
    for nic in section.children.iter().filter(|c| c.name == "NIC") {
        let name = nic
            .find("NETWORK_PORT")
            .or_else(|| nic.find("PORT_DESCRIPTION"))
            .and_then(|e| e.attr("VALUE"));
        let Some(name) = name else { continue };
        out.insert(
            name.to_string(),
            Nic {
                status: nic
                    .find("STATUS")
                    .and_then(|e| e.attr("VALUE"))
                    .unwrap_or_default()
                    .to_string(),
                ip_address: nic
                    .find("IP_ADDRESS")
                    .and_then(|e| e.attr("VALUE"))
                    .unwrap_or_default()
                    .to_string(),
            },
        );
    }
    out
}
