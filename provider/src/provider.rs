// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Mount orchestration: attributes in, file manifest out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use akv_codec::blocks::{encode_block, split_cert_and_key};
use akv_codec::constants::{
    CONTENT_TYPE_PEM, CONTENT_TYPE_PKCS12, OBJECT_FORMAT_PFX, PEM_CERTIFICATE,
};
use akv_codec::encoding::{content_bytes, file_permission};
use akv_codec::errors::CodecError;
use akv_codec::jwk::public_key_pem;
use akv_codec::models::ObjectType;
use akv_codec::pkcs12::{DecodeOptions, decode_pkcs12};
use akv_codec::utils::base64_decode;
use validator::Validate;

use crate::auth::TokenRequest;
use crate::configuration::ProviderOptions;
use crate::constants::{CERT_FILE_SUFFIX, HTTP_REQUEST_TIMEOUT, KEY_FILE_SUFFIX, NMI_HOST};
use crate::errors::ProviderError;
use crate::keyvault::{KeyVault, KeyVaultClient};
use crate::models::{KeyVaultObject, SecretBundle, SecretFile};
use crate::parameters::MountConfig;
use crate::reporter::StatsReporter;
use crate::resolver::resolve_versions;
use crate::utils::{user_agent, version_from_id};

/// Process-wide settings that shape every mount.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub decode: DecodeOptions,
    pub write_cert_and_key_in_separate_files: bool,
    /// Identity broker base URL, e.g. `http://localhost:2579`
    pub nmi_endpoint: String,
}

impl From<&ProviderOptions> for ProviderConfig {
    fn from(options: &ProviderOptions) -> Self {
        ProviderConfig {
            decode: DecodeOptions {
                construct_pem_chain: options.construct_pem_chain,
            },
            write_cert_and_key_in_separate_files: options.write_cert_and_key_in_separate_files,
            nmi_endpoint: format!("{NMI_HOST}:{}", options.nmi_port),
        }
    }
}

/// Decoded content of one resolved object.
struct ObjectContent {
    content: String,
    version: String,
    /// PEM holding a certificate and its key, eligible for `.crt`/`.key` files
    cert_and_key: bool,
}

pub struct Provider {
    http: reqwest::Client,
    config: ProviderConfig,
    reporter: Arc<dyn StatsReporter>,
}

impl Provider {
    pub fn new(
        options: &ProviderOptions,
        reporter: Arc<dyn StatsReporter>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent(&options.custom_user_agent))
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::InternalError(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(http, ProviderConfig::from(options), reporter))
    }

    pub fn with_client(
        http: reqwest::Client,
        config: ProviderConfig,
        reporter: Arc<dyn StatsReporter>,
    ) -> Self {
        Self {
            http,
            config,
            reporter,
        }
    }

    /// Fetches every object named in `attributes` and returns the files to
    /// write. The result is all or nothing.
    #[tracing::instrument(skip_all)]
    pub async fn get_secrets_store_object_content(
        &self,
        attributes: &HashMap<String, String>,
        secrets: &HashMap<String, String>,
        default_file_mode: i32,
    ) -> Result<Vec<SecretFile>, ProviderError> {
        let config = MountConfig::parse(attributes, secrets).await?;
        let vault_url = config.vault_url();
        tracing::info!("[provider] vault url: {vault_url}");

        let request = TokenRequest {
            pod_name: &config.pod_name,
            pod_namespace: &config.pod_namespace,
            resource: config.environment.resource(),
            aad_endpoint: &config.environment.active_directory_endpoint,
            tenant_id: &config.tenant_id,
            nmi_endpoint: &self.config.nmi_endpoint,
            msi_endpoint: &config.environment.msi_endpoint,
        };
        let token = config.auth.acquire(&self.http, &request).await?;
        let client = KeyVaultClient::new(self.http.clone(), &vault_url, token)?;

        self.fetch_objects(&client, &config.objects, default_file_mode)
            .await
    }

    /// Resolves, fetches and decodes `objects` in order.
    pub async fn fetch_objects(
        &self,
        client: &dyn KeyVault,
        objects: &[KeyVaultObject],
        default_file_mode: i32,
    ) -> Result<Vec<SecretFile>, ProviderError> {
        let mut files = Vec::new();
        for object in objects {
            let wrap = |e: ProviderError| {
                e.for_object(
                    &object.object_type,
                    &object.object_name,
                    &object.object_version,
                )
            };

            object.validate().map_err(|e| wrap(e.into()))?;
            let resolved = resolve_versions(client, object).await.map_err(wrap)?;

            for resolved in resolved {
                let wrap = |e: ProviderError| {
                    e.for_object(
                        &resolved.object_type,
                        &resolved.object_name,
                        &resolved.object_version,
                    )
                };
                resolved.validate().map_err(|e| wrap(e.into()))?;

                let started = Instant::now();
                let fetched = self.get_object_content(client, &resolved).await;
                let error = fetched.as_ref().err().map(ToString::to_string);
                self.reporter.report_keyvault_request(
                    started.elapsed(),
                    &resolved.object_type,
                    &resolved.object_name,
                    error.as_deref(),
                );

                let content = fetched.map_err(wrap)?;
                files.extend(
                    self.build_files(&resolved, content, default_file_mode)
                        .map_err(wrap)?,
                );
            }
        }
        Ok(files)
    }

    fn build_files(
        &self,
        object: &KeyVaultObject,
        content: ObjectContent,
        default_file_mode: i32,
    ) -> Result<Vec<SecretFile>, ProviderError> {
        let file_mode = file_permission(&object.file_permission, default_file_mode)
            .map_err(|e| ProviderError::ValidationError(e.to_string()))?;
        let file_name = object.file_name();
        let uid = object.uid();

        let mut parts = Vec::new();
        if self.config.write_cert_and_key_in_separate_files && content.cert_and_key {
            let (certs, keys) = split_cert_and_key(&content.content)?;
            parts.push((format!("{file_name}{CERT_FILE_SUFFIX}"), certs));
            parts.push((format!("{file_name}{KEY_FILE_SUFFIX}"), keys));
        }
        parts.push((file_name.to_string(), content.content.clone()));

        parts
            .into_iter()
            .map(|(path, text)| {
                Ok(SecretFile {
                    path,
                    content: content_bytes(&text, &object.object_type, &object.object_encoding)?,
                    file_mode,
                    uid: uid.clone(),
                    version: content.version.clone(),
                })
            })
            .collect()
    }

    async fn get_object_content(
        &self,
        client: &dyn KeyVault,
        object: &KeyVaultObject,
    ) -> Result<ObjectContent, ProviderError> {
        let object_type: ObjectType = object
            .object_type
            .parse()
            .map_err(|e: CodecError| ProviderError::ValidationError(e.to_string()))?;
        let name = &object.object_name;
        let version = &object.object_version;

        match object_type {
            ObjectType::Secret => {
                let secret = client.get_secret(name, version).await?;
                let (content, cert_and_key) = self.secret_content(&secret, object)?;
                Ok(ObjectContent {
                    content,
                    version: version_from_id(&secret.id),
                    cert_and_key,
                })
            }
            ObjectType::Key => {
                let key = client.get_key(name, version).await?;
                Ok(ObjectContent {
                    content: public_key_pem(&key.key)?,
                    version: version_from_id(&key.key.kid),
                    cert_and_key: false,
                })
            }
            ObjectType::Cert => {
                let cert = client.get_certificate(name, version).await?;
                let der = base64_decode(&cert.cer)?;
                Ok(ObjectContent {
                    content: encode_block(PEM_CERTIFICATE, &der),
                    version: version_from_id(&cert.id),
                    cert_and_key: false,
                })
            }
        }
    }

    /// Secrets that back a certificate come as PEM or PKCS#12; anything else
    /// is returned verbatim.
    fn secret_content(
        &self,
        secret: &SecretBundle,
        object: &KeyVaultObject,
    ) -> Result<(String, bool), ProviderError> {
        if secret.kid.is_empty() {
            return Ok((secret.value.clone(), false));
        }
        match secret.content_type.as_str() {
            CONTENT_TYPE_PEM => Ok((secret.value.clone(), true)),
            CONTENT_TYPE_PKCS12 => {
                if object.object_format.eq_ignore_ascii_case(OBJECT_FORMAT_PFX) {
                    return Ok((secret.value.clone(), false));
                }
                Ok((decode_pkcs12(&secret.value, &self.config.decode)?, true))
            }
            other => Err(CodecError::UnknownContentType(other.to_string()).into()),
        }
    }
}
