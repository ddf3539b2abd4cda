// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::process::ExitCode;

use akv_provider::application::{Application, shutdown_signal};
use akv_provider::configuration::ProviderOptions;
use akv_provider::constants::DEBUG_LOG;
use clap::Parser;
use tracing_subscriber::EnvFilter;

// Avoid musl's default allocator due to terrible performance
#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn env_filter() -> EnvFilter {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if std::env::var(DEBUG_LOG).is_ok_and(|v| !v.is_empty()) {
            "debug".into()
        } else {
            "info,tower_http=debug".into()
        }
    });
    EnvFilter::new(directives)
}

fn init_tracing(json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            // this needs to be set to remove duplicated information in the log.
            .with_current_span(false)
            .with_ansi(false)
            // the log collector adds the ingestion time
            .without_time()
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // get configuration options from flags and environment variables
    let options = ProviderOptions::parse();

    init_tracing(options.log_format_json);

    tracing::info!("[provider] {:?}", &options);

    let application = match Application::build(options).await {
        Ok(application) => application,
        Err(err) => {
            tracing::error!("[provider] failed to start: {err:?}");
            return ExitCode::FAILURE;
        }
    };

    match application.run_until_stopped(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("[provider] {err:?}");
            ExitCode::FAILURE
        }
    }
}
