// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::Path;

use serde::Deserialize;

use crate::constants::{AZURE_ENVIRONMENT_FILEPATH, MSI_ENDPOINT};
use crate::errors::ProviderError;

const AZURE_STACK_CLOUD: &str = "AZURESTACKCLOUD";

/// Endpoints of one Azure cloud.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AzureEnvironment {
    #[serde(rename = "name")]
    pub name: String,
    /// OAuth authority host, always ending in `/`
    #[serde(rename = "activeDirectoryEndpoint")]
    pub active_directory_endpoint: String,
    #[serde(rename = "keyVaultEndpoint")]
    pub key_vault_endpoint: String,
    #[serde(rename = "keyVaultDNSSuffix")]
    pub key_vault_dns_suffix: String,
    #[serde(skip, default = "default_msi_endpoint")]
    pub msi_endpoint: String,
}

fn default_msi_endpoint() -> String {
    MSI_ENDPOINT.to_string()
}

impl AzureEnvironment {
    fn builtin(name: &str, aad: &str, vault: &str, suffix: &str) -> Self {
        AzureEnvironment {
            name: name.to_string(),
            active_directory_endpoint: aad.to_string(),
            key_vault_endpoint: vault.to_string(),
            key_vault_dns_suffix: suffix.to_string(),
            msi_endpoint: default_msi_endpoint(),
        }
    }

    /// Resolves a cloud name, loading `AzureStackCloud` from a JSON file.
    ///
    /// `env_file` takes precedence over the `AZURE_ENVIRONMENT_FILEPATH`
    /// variable; the variable is only read.
    pub async fn resolve(cloud_name: &str, env_file: &str) -> Result<Self, ProviderError> {
        let upper = cloud_name.trim().to_uppercase();
        match upper.as_str() {
            "" | "AZUREPUBLICCLOUD" | "AZURECLOUD" => Ok(Self::builtin(
                "AzurePublicCloud",
                "https://login.microsoftonline.com/",
                "https://vault.azure.net/",
                "vault.azure.net",
            )),
            "AZURECHINACLOUD" => Ok(Self::builtin(
                "AzureChinaCloud",
                "https://login.chinacloudapi.cn/",
                "https://vault.azure.cn/",
                "vault.azure.cn",
            )),
            "AZUREGERMANCLOUD" => Ok(Self::builtin(
                "AzureGermanCloud",
                "https://login.microsoftonline.de/",
                "https://vault.microsoftazure.de/",
                "vault.microsoftazure.de",
            )),
            "AZUREUSGOVERNMENTCLOUD" | "AZUREUSGOVERNMENT" => Ok(Self::builtin(
                "AzureUSGovernmentCloud",
                "https://login.microsoftonline.us/",
                "https://vault.usgovcloudapi.net/",
                "vault.usgovcloudapi.net",
            )),
            AZURE_STACK_CLOUD => {
                let path = if env_file.is_empty() {
                    std::env::var(AZURE_ENVIRONMENT_FILEPATH).unwrap_or_default()
                } else {
                    env_file.to_string()
                };
                if path.is_empty() {
                    return Err(ProviderError::ConfigError(format!(
                        "cloudEnvFileName or {AZURE_ENVIRONMENT_FILEPATH} must be set for {cloud_name}"
                    )));
                }
                Self::from_file(Path::new(&path)).await
            }
            _ => Err(ProviderError::ConfigError(format!(
                "failed to get environment for cloud name: {cloud_name}"
            ))),
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProviderError::ConfigError(format!(
                "failed to read cloud environment file {}: {e}",
                path.display()
            ))
        })?;
        let mut environment: AzureEnvironment = serde_json::from_str(&content)?;
        if !environment.active_directory_endpoint.ends_with('/') {
            environment.active_directory_endpoint.push('/');
        }
        Ok(environment)
    }

    /// Audience requested for vault tokens.
    pub fn resource(&self) -> &str {
        self.key_vault_endpoint.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_builtin_clouds() {
        let public = AzureEnvironment::resolve("", "").await.unwrap();
        assert_eq!(public.key_vault_dns_suffix, "vault.azure.net");
        assert_eq!(public.resource(), "https://vault.azure.net");
        assert_eq!(public.msi_endpoint, MSI_ENDPOINT);

        assert_eq!(
            AzureEnvironment::resolve("azurepubliccloud", "").await.unwrap(),
            public
        );
        assert_eq!(
            AzureEnvironment::resolve("AzureChinaCloud", "")
                .await
                .unwrap()
                .key_vault_dns_suffix,
            "vault.azure.cn"
        );
        assert_eq!(
            AzureEnvironment::resolve("AzureUSGovernmentCloud", "")
                .await
                .unwrap()
                .active_directory_endpoint,
            "https://login.microsoftonline.us/"
        );
        assert_eq!(
            AzureEnvironment::resolve("AzureGermanCloud", "")
                .await
                .unwrap()
                .key_vault_dns_suffix,
            "vault.microsoftazure.de"
        );
    }

    #[tokio::test]
    async fn test_unknown_cloud() {
        let error = AzureEnvironment::resolve("AzureMoonCloud", "").await.unwrap_err();
        assert!(matches!(error, ProviderError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_stack_cloud_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "AzureStackCloud",
                "activeDirectoryEndpoint": "https://login.stack.example",
                "keyVaultEndpoint": "https://vault.stack.example/",
                "keyVaultDNSSuffix": "vault.stack.example"
            }}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let environment = AzureEnvironment::resolve("AzureStackCloud", path)
            .await
            .unwrap();
        assert_eq!(environment.name, "AzureStackCloud");
        assert_eq!(
            environment.active_directory_endpoint,
            "https://login.stack.example/"
        );
        assert_eq!(environment.key_vault_dns_suffix, "vault.stack.example");
        assert_eq!(environment.resource(), "https://vault.stack.example");
    }

    #[tokio::test]
    async fn test_stack_cloud_missing_file() {
        let error = AzureEnvironment::resolve("AzureStackCloud", "/nonexistent/env.json")
            .await
            .unwrap_err();
        assert!(error.to_string().contains("failed to read cloud environment file"));
    }

    #[tokio::test]
    async fn test_stack_cloud_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let path = file.path().to_str().unwrap();
        assert!(AzureEnvironment::resolve("AzureStackCloud", path).await.is_err());
    }
}
