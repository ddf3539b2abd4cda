// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::constants::{RUNTIME_NAME, RUNTIME_VERSION};
use crate::errors::ProviderError;

static REDACT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S{4})(\S|\s)*(\S{4})$").expect("redaction pattern should compile")
});

/// Keeps the first and last four characters of `value` and masks the rest.
/// Shorter values are returned unchanged.
pub fn redact(value: &str) -> String {
    REDACT_REGEX
        .replace_all(value, "$1##### REDACTED #####$3")
        .into_owned()
}

/// Where the mount server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(String),
    Tcp(String),
}

/// Parses `unix://path` or `tcp://host:port`. The scheme is case-insensitive.
pub fn parse_endpoint(endpoint: &str) -> Result<Endpoint, ProviderError> {
    let lower = endpoint.to_lowercase();
    if lower.starts_with("unix://") || lower.starts_with("tcp://") {
        if let Some((scheme, address)) = endpoint.split_once("://")
            && !address.is_empty()
        {
            return if scheme.eq_ignore_ascii_case("unix") {
                let path = if address.starts_with('/') {
                    address.to_string()
                } else {
                    format!("/{address}")
                };
                Ok(Endpoint::Unix(path))
            } else {
                Ok(Endpoint::Tcp(address.to_string()))
            };
        }
    }
    Err(ProviderError::ConfigError(format!(
        "invalid endpoint: {endpoint}"
    )))
}

/// Accepts the conventional boolean spellings; an empty value is `false`.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ProviderError> {
    match value {
        "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        other => Err(ProviderError::ConfigError(format!(
            "failed to parse {key}: invalid syntax '{other}'"
        ))),
    }
}

/// Parses `500ms`, `5s`, `1m` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(index) => value.split_at(index),
        None => (value, "s"),
    };
    let amount: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        _ => Err(format!("invalid duration unit in '{value}'")),
    }
}

/// The version of a vault object is the last path segment of its id.
pub fn version_from_id(id: &str) -> String {
    id.rsplit('/').next().unwrap_or_default().to_string()
}

pub fn user_agent(custom: &str) -> String {
    let base = format!(
        "{RUNTIME_NAME}/{RUNTIME_VERSION} ({}/{})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    if custom.is_empty() {
        base
    } else {
        format!("{base} {custom}")
    }
}
