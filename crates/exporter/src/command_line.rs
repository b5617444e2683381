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
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[clap(name = "hpilo-exporter")]
pub struct Options {
    #[clap(long, default_value = "false", help = "Print version number and exit")]
    pub version: bool,

    /// The path to the exporter configuration file. Every setting in it can
    /// also be supplied through ILO_EXPORTER__-prefixed environment
    /// variables.
    #[clap(long)]
    pub config_path: Option<PathBuf>,

    #[clap(long, help = "Override the configured listen endpoint, e.g. 0.0.0.0:9416")]
    pub listen: Option<String>,

    #[clap(long, help = "Override the configured telemetry path")]
    pub telemetry_path: Option<String>,
}

impl Options {
    pub fn load() -> Self {
        Self::parse()
    }
}
