// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Azure Key Vault Provider
//!
//! A Secrets Store CSI driver provider that materializes Azure Key Vault
//! secrets, keys and certificates for pods.
//!
//! The driver calls `Mount` over a unix socket with the volume attributes of
//! a `SecretProviderClass`. The provider authenticates, fetches every
//! requested object, decodes it and returns the files in the response. It
//! never writes to the pod's target path itself.
//!
//! ## Architecture
//!
//! ```text
//! CSI driver -> gRPC (unix socket) -> Provider (this crate) -> Key Vault REST
//!                                          |
//!                                          +-> Azure AD / NMI / IMDS (tokens)
//!
//! kubelet -> HTTP /healthz -> gRPC health check over the same socket
//! ```
//!
//! Per mount: parse attributes, acquire one token, build one vault client,
//! then for each object resolve its versions, fetch and decode each one and
//! append the files. Any failure rejects the whole mount.
//!
//! ## Modules
//!
//! - [`application`]: socket and listener setup, gRPC and healthz serving, shutdown
//! - [`auth`]: the four identity modes and token acquisition
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: attribute keys, endpoints and defaults
//! - [`environment`]: Azure cloud endpoints, including file-loaded Azure Stack clouds
//! - [`errors`]: provider error type with gRPC status mapping
//! - [`healthz`]: HTTP health endpoint backed by the gRPC health service
//! - [`keyvault`]: vault REST client behind the [`keyvault::KeyVault`] trait
//! - [`models`]: object references, REST payloads and returned files
//! - [`parameters`]: mount attribute parsing into [`parameters::MountConfig`]
//! - [`provider`]: mount orchestration and content decoding
//! - [`reporter`]: latency and outcome samples
//! - [`resolver`]: version history expansion
//! - [`server`]: gRPC `Mount` and `Version` handlers
//! - [`utils`]: redaction, endpoint and duration parsing
//!
//! Decoders for PKCS#12, JWK, PEM chains and file encodings live in the
//! `akv-codec` crate.
//!
//! ## Usage
//!
//! ```bash
//! akv-provider --endpoint unix:///etc/kubernetes/secrets-store-csi-providers/azure.sock \
//!     --healthz-port 8989 --construct-pem-chain true
//! ```
//!
//! ## Security Considerations
//!
//! - Tokens are fetched per mount and never cached
//! - Tokens, client secrets and returned file contents are zeroized on drop
//!   and print as `[REDACTED]` in debug output
//! - Logged mount requests omit secret values and service account tokens
//! - Object names and aliases are checked for absolute paths, `..` and
//!   invisible characters before anything is fetched
//! - Versions must be a single path segment, and every vault URL segment is
//!   percent-encoded

pub mod application;
pub mod auth;
pub mod configuration;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod healthz;
pub mod keyvault;
pub mod models;
pub mod parameters;
pub mod provider;
pub mod reporter;
pub mod resolver;
pub mod server;
pub mod utils;

pub mod v1alpha1 {
    #![allow(clippy::all)]
    tonic::include_proto!("v1alpha1");
}
