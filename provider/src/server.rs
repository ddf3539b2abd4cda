// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! gRPC handlers for the driver-facing provider service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tonic::{Request, Response, Status};

use crate::constants::{
    API_VERSION, ATTRIBUTE_SERVICE_ACCOUNT_TOKENS, REDACTED, RUNTIME_NAME, RUNTIME_VERSION,
};
use crate::errors::ProviderError;
use crate::provider::Provider;
use crate::reporter::StatsReporter;
use crate::v1alpha1::csi_driver_provider_server::CsiDriverProvider;
use crate::v1alpha1::{
    File, MountRequest, MountResponse, ObjectVersion, VersionRequest, VersionResponse,
};

pub struct ProviderService {
    provider: Provider,
    reporter: Arc<dyn StatsReporter>,
}

impl ProviderService {
    pub fn new(provider: Provider, reporter: Arc<dyn StatsReporter>) -> Self {
        Self { provider, reporter }
    }

    async fn handle_mount(&self, request: &MountRequest) -> Result<MountResponse, ProviderError> {
        let attributes: HashMap<String, String> = serde_json::from_str(&request.attributes)
            .map_err(|e| ProviderError::ConfigError(format!("failed to unmarshal attributes: {e}")))?;
        let secrets: HashMap<String, String> = serde_json::from_str(&request.secrets)
            .map_err(|e| ProviderError::ConfigError(format!("failed to unmarshal secrets: {e}")))?;
        let permission: i32 = serde_json::from_str(&request.permission).map_err(|e| {
            ProviderError::ConfigError(format!("failed to unmarshal file permission: {e}"))
        })?;

        let files = self
            .provider
            .get_secrets_store_object_content(&attributes, &secrets, permission)
            .await?;

        let mut seen = HashSet::new();
        let object_version = files
            .iter()
            .filter(|file| seen.insert(file.uid.clone()))
            .map(|file| ObjectVersion {
                id: file.uid.clone(),
                version: file.version.clone(),
            })
            .collect();
        let files = files
            .into_iter()
            .map(|mut file| File {
                path: std::mem::take(&mut file.path),
                mode: file.file_mode,
                contents: std::mem::take(&mut file.content),
            })
            .collect();

        Ok(MountResponse {
            object_version,
            error: None,
            files,
        })
    }
}

/// Request as it may be logged: secret values and service account tokens
/// replaced.
fn sanitize_request(request: &MountRequest) -> String {
    let attributes = serde_json::from_str::<HashMap<String, String>>(&request.attributes)
        .map(|mut attributes| {
            if let Some(tokens) = attributes.get_mut(ATTRIBUTE_SERVICE_ACCOUNT_TOKENS) {
                *tokens = REDACTED.to_string();
            }
            format!("{attributes:?}")
        })
        .unwrap_or_else(|_| "<unparsable>".to_string());
    let secrets = serde_json::from_str::<HashMap<String, String>>(&request.secrets)
        .map(|secrets| format!("{:?}", secrets.keys().collect::<Vec<_>>()))
        .unwrap_or_else(|_| "<unparsable>".to_string());
    format!(
        "attributes: {attributes}, secrets: {secrets} {REDACTED}, target_path: {}, permission: {}",
        request.target_path, request.permission
    )
}

fn sanitize_response(response: &MountResponse) -> String {
    let versions: Vec<String> = response
        .object_version
        .iter()
        .map(|v| format!("{}@{}", v.id, v.version))
        .collect();
    let paths: Vec<&str> = response.files.iter().map(|f| f.path.as_str()).collect();
    format!("object_version: {versions:?}, files: {paths:?}")
}

#[tonic::async_trait]
impl CsiDriverProvider for ProviderService {
    async fn version(
        &self,
        _request: Request<VersionRequest>,
    ) -> Result<Response<VersionResponse>, Status> {
        Ok(Response::new(VersionResponse {
            version: API_VERSION.to_string(),
            runtime_name: RUNTIME_NAME.to_string(),
            runtime_version: RUNTIME_VERSION.to_string(),
        }))
    }

    async fn mount(
        &self,
        request: Request<MountRequest>,
    ) -> Result<Response<MountResponse>, Status> {
        let started = Instant::now();
        let request = request.into_inner();
        tracing::info!("[provider] mount request: {}", sanitize_request(&request));

        let result = self.handle_mount(&request).await;

        let (code, message) = match &result {
            Ok(_) => (tonic::Code::Ok, String::new()),
            Err(error) => (error.code(), error.to_string()),
        };
        self.reporter.report_grpc_request(
            started.elapsed(),
            "Mount",
            &format!("{code:?}"),
            &message,
        );

        match result {
            Ok(response) => {
                tracing::info!("[provider] mount response: {}", sanitize_response(&response));
                Ok(Response::new(response))
            }
            Err(error) => {
                tracing::error!("[provider] mount failed: {error}");
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use akv_codec::pkcs12::DecodeOptions;

    use super::*;
    use crate::provider::ProviderConfig;
    use crate::reporter::tests::RecordingReporter;

    fn service() -> (ProviderService, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        let provider = Provider::with_client(
            reqwest::Client::new(),
            ProviderConfig {
                decode: DecodeOptions::default(),
                write_cert_and_key_in_separate_files: false,
                nmi_endpoint: "http://127.0.0.1:1".to_string(),
            },
            reporter.clone(),
        );
        (ProviderService::new(provider, reporter.clone()), reporter)
    }

    fn mount_request(attributes: &str, secrets: &str, permission: &str) -> MountRequest {
        MountRequest {
            attributes: attributes.to_string(),
            secrets: secrets.to_string(),
            target_path: "/var/lib/kubelet/pods/x/volumes".to_string(),
            permission: permission.to_string(),
            current_object_version: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_version() {
        let (service, _) = service();
        let response = CsiDriverProvider::version(
            &service,
            Request::new(VersionRequest {
                version: "v1alpha1".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_inner();

        assert_eq!(response.version, "v1alpha1");
        assert_eq!(response.runtime_name, "akv-provider");
        assert_eq!(response.runtime_version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_mount_rejects_malformed_json() {
        let (service, reporter) = service();

        let status = CsiDriverProvider::mount(&service, Request::new(mount_request("{", "{}", "420")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("failed to unmarshal attributes"));

        let status = CsiDriverProvider::mount(&service, Request::new(mount_request("{}", "[", "420")))
            .await
            .unwrap_err();
        assert!(status.message().contains("failed to unmarshal secrets"));

        let status =
            CsiDriverProvider::mount(&service, Request::new(mount_request("{}", "{}", "\"rw\"")))
                .await
                .unwrap_err();
        assert!(status.message().contains("failed to unmarshal file permission"));

        let samples = reporter.grpc.lock().unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], ("Mount".to_string(), "InvalidArgument".to_string()));
    }

    #[tokio::test]
    async fn test_mount_missing_vault_name() {
        let (service, _) = service();
        let status = CsiDriverProvider::mount(
            &service,
            Request::new(mount_request(r#"{"tenantId":"t"}"#, "{}", "420")),
        )
        .await
        .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("keyvaultName is not set"));
    }

    #[test]
    fn test_sanitize_request_hides_secrets() {
        let request = mount_request(
            r#"{"keyvaultName":"kv1","csi.storage.k8s.io/serviceAccount.tokens":"jwt-value"}"#,
            r#"{"clientid":"id","clientsecret":"hunter2"}"#,
            "420",
        );
        let logged = sanitize_request(&request);
        assert!(logged.contains("kv1"));
        assert!(!logged.contains("jwt-value"));
        assert!(!logged.contains("hunter2"));
        assert!(logged.contains("clientsecret"));
    }

    #[test]
    fn test_sanitize_response_omits_contents() {
        let response = MountResponse {
            object_version: vec![ObjectVersion {
                id: "secret/s".to_string(),
                version: "v1".to_string(),
            }],
            error: None,
            files: vec![File {
                path: "s".to_string(),
                mode: 0o644,
                contents: b"plaintext".to_vec(),
            }],
        };
        let logged = sanitize_response(&response);
        assert!(logged.contains("secret/s@v1"));
        assert!(!logged.contains("plaintext"));
    }
}
