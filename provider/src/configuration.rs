// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::utils::parse_duration;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ProviderOptions {
    /// Mount socket, `unix://` or `tcp://`
    #[arg(long, default_value = "unix:///tmp/azure.sock", env("PROVIDER_ENDPOINT"))]
    pub endpoint: String,
    #[arg(long, default_value = "8989", env("PROVIDER_HEALTHZ_PORT"))]
    pub healthz_port: u16,
    #[arg(long, default_value = "/healthz", env("PROVIDER_HEALTHZ_PATH"))]
    pub healthz_path: String,
    /// RPC timeout for the health check dial
    #[arg(long, default_value = "5s", env("PROVIDER_HEALTHZ_TIMEOUT"), value_parser = parse_duration)]
    pub healthz_timeout: Duration,
    #[arg(long, default_value = "true", env("PROVIDER_CONSTRUCT_PEM_CHAIN"), action = ArgAction::Set)]
    pub construct_pem_chain: bool,
    #[arg(long, default_value = "false", env("PROVIDER_WRITE_CERT_AND_KEY_IN_SEPARATE_FILES"), action = ArgAction::SetTrue)]
    pub write_cert_and_key_in_separate_files: bool,
    #[arg(long, default_value = "false", env("PROVIDER_LOG_FORMAT_JSON"), action = ArgAction::SetTrue)]
    pub log_format_json: bool,
    /// Port of the node managed identity broker on localhost
    #[arg(long, default_value = "2579", env("PROVIDER_NMI_PORT"))]
    pub nmi_port: u16,
    #[arg(long, default_value = "", env("PROVIDER_CUSTOM_USER_AGENT"))]
    pub custom_user_agent: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        ProviderOptions {
            endpoint: "unix:///tmp/azure.sock".to_string(),
            healthz_port: 8989,
            healthz_path: "/healthz".to_string(),
            healthz_timeout: Duration::from_secs(5),
            construct_pem_chain: true,
            write_cert_and_key_in_separate_files: false,
            log_format_json: false,
            nmi_port: 2579,
            custom_user_agent: String::new(),
        }
    }
}
