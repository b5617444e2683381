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
use std::sync::Arc;

use clap::Parser;
use ilo_mock::MockIlo;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

/// ilo-mock behaves like the RIBCL side of an HP iLO.
/// Run: `cargo run -p ilo-mock`, then point the exporter at it with
/// `use_tls = false`.
#[derive(Parser)]
#[clap(name = "ilo-mock")]
struct Options {
    #[clap(long, default_value = "2381")]
    port: u16,

    #[clap(long, default_value = "admin")]
    username: String,

    #[clap(long, default_value = "secret")]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(LevelFilter::DEBUG.into())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    tracing_subscriber::registry()
        .with(Layer::default().compact())
        .with(env_filter)
        .init();

    let args = Options::parse();
    let state = Arc::new(MockIlo {
        username: args.username,
        password: args.password,
        ..MockIlo::default()
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Serving mock iLO RIBCL endpoint on http://{addr}/ribcl");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ilo_mock::router(state)).await?;
    Ok(())
}
