// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Latency and outcome samples for vault fetches and gRPC calls.
//!
//! The mount path only writes to a [`StatsReporter`]; the shipped
//! [`TracingReporter`] turns each sample into a structured log event.

use std::time::Duration;

pub trait StatsReporter: Send + Sync {
    /// One sample per fetched vault object. `error` is `None` on success.
    fn report_keyvault_request(
        &self,
        duration: Duration,
        object_type: &str,
        object_name: &str,
        error: Option<&str>,
    );

    /// One sample per served gRPC call.
    fn report_grpc_request(&self, duration: Duration, method: &str, code: &str, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatsReporter for TracingReporter {
    fn report_keyvault_request(
        &self,
        duration: Duration,
        object_type: &str,
        object_name: &str,
        error: Option<&str>,
    ) {
        match error {
            None => tracing::info!(
                duration_ms = duration.as_millis() as u64,
                object_type,
                object_name,
                status = "success",
                "[provider] keyvault request"
            ),
            Some(error) => tracing::warn!(
                duration_ms = duration.as_millis() as u64,
                object_type,
                object_name,
                status = "error",
                error,
                "[provider] keyvault request"
            ),
        }
    }

    fn report_grpc_request(&self, duration: Duration, method: &str, code: &str, message: &str) {
        tracing::info!(
            duration_ms = duration.as_millis() as u64,
            method,
            code,
            message,
            "[provider] grpc request"
        );
    }
}
