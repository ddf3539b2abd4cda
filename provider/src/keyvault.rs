// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Minimal client for the vault REST API.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::auth::AccessToken;
use crate::constants::{KEYVAULT_API_VERSION, KEYVAULT_MAX_RESULTS};
use crate::errors::ProviderError;
use crate::models::{
    CertificateBundle, KeyBundle, ObjectVersionEntry, SecretBundle, VersionItem, VersionPage,
};
use crate::utils::version_from_id;

/// Operations the mount path needs from a vault. An empty `version` means
/// the current version.
#[tonic::async_trait]
pub trait KeyVault: Send + Sync {
    async fn get_secret(&self, name: &str, version: &str) -> Result<SecretBundle, ProviderError>;
    async fn get_key(&self, name: &str, version: &str) -> Result<KeyBundle, ProviderError>;
    async fn get_certificate(
        &self,
        name: &str,
        version: &str,
    ) -> Result<CertificateBundle, ProviderError>;
    /// Enabled versions in listing order.
    async fn get_secret_versions(
        &self,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError>;
    async fn get_key_versions(&self, name: &str)
    -> Result<Vec<ObjectVersionEntry>, ProviderError>;
    async fn get_certificate_versions(
        &self,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct KeyVaultClient {
    http: reqwest::Client,
    vault_url: Url,
    token: AccessToken,
}

impl KeyVaultClient {
    /// `vault_url` is the vault base URL, e.g. `https://myvault.vault.azure.net/`.
    pub fn new(
        http: reqwest::Client,
        vault_url: &str,
        token: AccessToken,
    ) -> Result<Self, ProviderError> {
        let vault_url = Url::parse(vault_url).map_err(|err| {
            ProviderError::ConfigError(format!("invalid vault url '{vault_url}': {err}"))
        })?;
        if vault_url.cannot_be_a_base() {
            return Err(ProviderError::ConfigError(format!(
                "invalid vault url '{vault_url}'"
            )));
        }
        Ok(Self {
            http,
            vault_url,
            token,
        })
    }

    /// Each segment is percent-encoded, so names and versions never add path
    /// elements of their own.
    fn object_url(&self, segments: &[&str]) -> Url {
        let mut url = self.vault_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.iter().filter(|segment| !segment.is_empty()));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(self.token.secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| format!("{}: {}", b.error.code, b.error.message))
                .unwrap_or(body);
            return Err(ProviderError::KeyVaultError(format!(
                "request failed with status code: {}, {detail}",
                status.as_u16()
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        collection: &str,
        name: &str,
        version: &str,
    ) -> Result<T, ProviderError> {
        let url = self.object_url(&[collection, name, version]);
        self.get_json(url, &[("api-version", KEYVAULT_API_VERSION)])
            .await
    }

    /// Walks every page of `{collection}/{name}/versions`.
    async fn list_versions(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError> {
        let mut versions = Vec::new();
        let first = self.object_url(&[collection, name, "versions"]);
        let mut page: VersionPage = self
            .get_json(
                first,
                &[
                    ("api-version", KEYVAULT_API_VERSION),
                    ("maxresults", KEYVAULT_MAX_RESULTS),
                ],
            )
            .await?;

        loop {
            versions.extend(page.value.iter().filter_map(version_entry));
            match page.next_link.take().filter(|link| !link.is_empty()) {
                // next links already carry the api-version
                Some(next) => {
                    let next = Url::parse(&next).map_err(|err| {
                        ProviderError::KeyVaultError(format!("invalid next link '{next}': {err}"))
                    })?;
                    page = self.get_json(next, &[]).await?
                }
                None => break,
            }
        }
        Ok(versions)
    }
}

/// Keeps only items explicitly enabled. A missing creation time sorts as the
/// epoch.
fn version_entry(item: &VersionItem) -> Option<ObjectVersionEntry> {
    let attributes = item.attributes.as_ref()?;
    if attributes.enabled != Some(true) {
        return None;
    }
    let id = if item.id.is_empty() { &item.kid } else { &item.id };
    let created = attributes
        .created
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Some(ObjectVersionEntry {
        version: version_from_id(id),
        created,
    })
}

#[tonic::async_trait]
impl KeyVault for KeyVaultClient {
    async fn get_secret(&self, name: &str, version: &str) -> Result<SecretBundle, ProviderError> {
        self.get_object("secrets", name, version).await
    }

    async fn get_key(&self, name: &str, version: &str) -> Result<KeyBundle, ProviderError> {
        self.get_object("keys", name, version).await
    }

    async fn get_certificate(
        &self,
        name: &str,
        version: &str,
    ) -> Result<CertificateBundle, ProviderError> {
        self.get_object("certificates", name, version).await
    }

    async fn get_secret_versions(
        &self,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError> {
        self.list_versions("secrets", name).await
    }

    async fn get_key_versions(
        &self,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError> {
        self.list_versions("keys", name).await
    }

    async fn get_certificate_versions(
        &self,
        name: &str,
    ) -> Result<Vec<ObjectVersionEntry>, ProviderError> {
        self.list_versions("certificates", name).await
    }
}
