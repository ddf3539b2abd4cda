// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP liveness endpoint that probes the gRPC server over its own socket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::transport::{Endpoint, Uri};
use tonic_health::pb::HealthCheckRequest;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tower::service_fn;

#[derive(Debug, Clone)]
pub struct HealthzState {
    pub socket_path: PathBuf,
    /// Bounds both the dial and the health RPC
    pub rpc_timeout: Duration,
}

pub fn create_router(state: HealthzState, path: &str) -> Router {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Router::new()
        .route(&path, get(healthz))
        .with_state(Arc::new(state))
}

/// Returns `200 ok` while the gRPC health service reports `SERVING`.
#[tracing::instrument(skip(state))]
pub async fn healthz(State(state): State<Arc<HealthzState>>) -> Response {
    match check(&state).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(error) => {
            tracing::warn!("[provider] health check failed: {error}");
            (StatusCode::SERVICE_UNAVAILABLE, error).into_response()
        }
    }
}

async fn check(state: &HealthzState) -> Result<(), String> {
    let socket_path = state.socket_path.clone();
    // the authority is ignored, the connector dials the socket
    let channel = Endpoint::from_static("http://[::]:50051")
        .connect_timeout(state.rpc_timeout)
        .timeout(state.rpc_timeout)
        .connect_with_connector(service_fn(move |_: Uri| {
            let socket_path = socket_path.clone();
            async move {
                Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(socket_path).await?))
            }
        }))
        .await
        .map_err(|e| format!("failed to connect to provider: {e}"))?;

    let mut client = HealthClient::new(channel);
    let response = tokio::time::timeout(
        state.rpc_timeout,
        client.check(HealthCheckRequest {
            service: String::new(),
        }),
    )
    .await
    .map_err(|_| "health check timed out".to_string())?
    .map_err(|status| format!("health check failed: {}", status.message()))?;

    match ServingStatus::try_from(response.into_inner().status) {
        Ok(ServingStatus::Serving) => Ok(()),
        Ok(status) => Err(format!("provider is not serving: {}", status.as_str_name())),
        Err(_) => Err("provider returned an unknown serving status".to_string()),
    }
}
