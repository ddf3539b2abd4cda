// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::watch;
use tokio_stream::wrappers::UnixListenerStream;
use tonic_health::ServingStatus;
use tower_http::trace::TraceLayer;

use crate::configuration::ProviderOptions;
use crate::constants::HEALTHZ_READ_HEADER_TIMEOUT;
use crate::healthz::{HealthzState, create_router};
use crate::provider::Provider;
use crate::reporter::{StatsReporter, TracingReporter};
use crate::server::ProviderService;
use crate::utils::{Endpoint, parse_endpoint};
use crate::v1alpha1::csi_driver_provider_server::CsiDriverProviderServer;

pub struct Application {
    socket_path: PathBuf,
    grpc_listener: UnixListener,
    healthz_listener: TcpListener,
    healthz_port: u16,
    healthz_router: Router,
    service: ProviderService,
}

impl Application {
    pub async fn build(options: ProviderOptions) -> Result<Self> {
        let reporter: Arc<dyn StatsReporter> = Arc::new(TracingReporter);
        Self::build_with_reporter(options, reporter).await
    }

    pub async fn build_with_reporter(
        options: ProviderOptions,
        reporter: Arc<dyn StatsReporter>,
    ) -> Result<Self> {
        let socket_path = match parse_endpoint(&options.endpoint)? {
            Endpoint::Unix(path) => PathBuf::from(path),
            Endpoint::Tcp(address) => {
                return Err(anyhow!(
                    "only unix endpoints are supported, got tcp://{address}"
                ));
            }
        };

        // a socket left behind by a previous run blocks the bind
        if socket_path.exists() {
            std::fs::remove_file(&socket_path).map_err(|err| {
                anyhow!(
                    "failed to remove stale socket {}: {err:?}",
                    socket_path.display()
                )
            })?;
        }
        let grpc_listener = UnixListener::bind(&socket_path)
            .map_err(|err| anyhow!("failed to listen on {}: {err:?}", socket_path.display()))?;

        let healthz_listener = TcpListener::bind(("0.0.0.0", options.healthz_port))
            .await
            .map_err(|err| anyhow!("failed to listen on healthz port: {err:?}"))?;
        let healthz_port = healthz_listener.local_addr()?.port();

        let healthz_router = create_router(
            HealthzState {
                socket_path: socket_path.clone(),
                rpc_timeout: options.healthz_timeout,
            },
            &options.healthz_path,
        );

        let provider = Provider::new(&options, reporter.clone())?;
        let service = ProviderService::new(provider, reporter);

        tracing::info!(
            "[provider] listening at unix://{}, healthz at http://0.0.0.0:{}{}",
            socket_path.display(),
            healthz_port,
            options.healthz_path
        );

        Ok(Self {
            socket_path,
            grpc_listener,
            healthz_listener,
            healthz_port,
            healthz_router,
            service,
        })
    }

    pub fn healthz_port(&self) -> u16 {
        self.healthz_port
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Serves until `shutdown` resolves, then removes the socket file.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown.await;
            let _ = stop_tx.send(true);
        });

        let healthz = tokio::spawn(serve_healthz(
            self.healthz_listener,
            self.healthz_router,
            stop_rx.clone(),
        ));

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_service_status("", ServingStatus::Serving)
            .await;

        let mut grpc_stop = stop_rx;
        let result = tonic::transport::Server::builder()
            .layer(TraceLayer::new_for_grpc())
            .add_service(health_service)
            .add_service(CsiDriverProviderServer::new(self.service))
            .serve_with_incoming_shutdown(
                UnixListenerStream::new(self.grpc_listener),
                async move {
                    let _ = grpc_stop.wait_for(|stopped| *stopped).await;
                },
            )
            .await
            .map_err(|err| anyhow!("grpc server failed: {err:?}"));

        healthz.abort();
        if let Err(err) = std::fs::remove_file(&self.socket_path) {
            tracing::warn!(
                "[provider] failed to remove socket {}: {err:?}",
                self.socket_path.display()
            );
        }
        tracing::info!("[provider] stopped");

        result
    }
}

async fn serve_healthz(listener: TcpListener, router: Router, mut stop: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(err) => {
                        tracing::warn!("[provider] healthz accept failed: {err:?}");
                        continue;
                    }
                };
                let service = TowerToHyperService::new(router.clone());
                tokio::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .header_read_timeout(HEALTHZ_READ_HEADER_TIMEOUT)
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::debug!("[provider] healthz connection closed: {err:?}");
                    }
                });
            }
            _ = stop.wait_for(|stopped| *stopped) => break,
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("[provider] failed to listen for ctrl-c: {err:?}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("[provider] failed to listen for SIGTERM: {err:?}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("[provider] shutdown signal received");
}
