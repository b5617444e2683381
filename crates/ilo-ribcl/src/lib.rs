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

//! Client for the HP iLO management processor's RIBCL interface.
//!
//! RIBCL is an XML command language posted over the BMC's HTTPS port. Each
//! operation is a single request/response exchange carrying the login
//! credentials, so a [`IloSession`] holds no server-side state; it owns the
//! connection pool and releases it on drop.

use std::fmt::Debug;

pub mod client;
pub mod ribcl;
pub mod types;

pub use client::{IloConnector, IloSession, RibclConnector};
pub use types::{
    EmbeddedHealth, Fan, FirmwareInfo, NetworkSettings, Nic, Reading, TemperatureSensor,
};

#[derive(thiserror::Error, Debug)]
pub enum IloError {
    #[error("iLO rejected the supplied credentials")]
    LoginFailed,

    #[error("cannot resolve iLO address {host}:{port}: {reason}")]
    InvalidAddress {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("iLO communication failure: {0}")]
    Communication(String),

    #[error("malformed RIBCL response: {0}")]
    Protocol(String),

    #[error("RIBCL response is missing {0}")]
    MissingField(&'static str),
}

/// One iLO endpoint with the credentials to reach it.
#[derive(Clone)]
pub struct IloTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Debug structure omits credentials
impl Debug for IloTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IloTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
