// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Bearer tokens for the vault.
//!
//! [`AuthConfig`] is chosen once per mount from the mount attributes and the
//! node publish secrets. [`AuthConfig::acquire`] then fetches a fresh token;
//! nothing is cached between mounts.

use std::collections::HashMap;
use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    CLIENT_ASSERTION_TYPE, IMDS_API_VERSION, NMI_TOKEN_PATH, POD_NAME_HEADER,
    POD_NAMESPACE_HEADER, REDACTED, SECRET_CLIENT_ID, SECRET_CLIENT_SECRET,
    TOKEN_EXCHANGE_AUDIENCE,
};
use crate::errors::ProviderError;
use crate::utils::redact;

#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Client credentials from the node publish secrets
    ServicePrincipal {
        client_id: String,
        client_secret: String,
    },
    /// Federated service account token exchanged for a vault token
    WorkloadIdentity { client_id: String, assertion: String },
    /// Node managed identity broker
    PodIdentity,
    /// Instance metadata service; `None` selects the system-assigned identity
    ManagedIdentity { client_id: Option<String> },
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServicePrincipal { client_id, .. } => f
                .debug_struct("ServicePrincipal")
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .finish(),
            Self::WorkloadIdentity { client_id, .. } => f
                .debug_struct("WorkloadIdentity")
                .field("client_id", client_id)
                .field("assertion", &REDACTED)
                .finish(),
            Self::PodIdentity => f.write_str("PodIdentity"),
            Self::ManagedIdentity { client_id } => f
                .debug_struct("ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
        }
    }
}

impl Drop for AuthConfig {
    fn drop(&mut self) {
        match self {
            Self::ServicePrincipal { client_secret, .. } => client_secret.zeroize(),
            Self::WorkloadIdentity { assertion, .. } => assertion.zeroize(),
            Self::PodIdentity | Self::ManagedIdentity { .. } => {}
        }
    }
}

/// Mount attributes that select an identity.
#[derive(Debug, Default, Clone)]
pub struct IdentityOptions<'a> {
    pub use_pod_identity: bool,
    pub use_vm_managed_identity: bool,
    pub user_assigned_identity_id: &'a str,
    pub client_id: &'a str,
    /// Raw `csi.storage.k8s.io/serviceAccount.tokens` attribute
    pub service_account_tokens: &'a str,
}

impl AuthConfig {
    /// Picks the identity mode: pod identity, then VM managed identity, then
    /// workload identity when a client id is set, then static credentials.
    pub fn new(
        identity: &IdentityOptions<'_>,
        secrets: &HashMap<String, String>,
    ) -> Result<Self, ProviderError> {
        if identity.use_pod_identity && identity.use_vm_managed_identity {
            return Err(ProviderError::ConfigError(
                "cannot enable both pod identity and user-assigned managed identity".to_string(),
            ));
        }
        if identity.use_pod_identity {
            return Ok(AuthConfig::PodIdentity);
        }
        if identity.use_vm_managed_identity {
            let client_id = Some(identity.user_assigned_identity_id)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            return Ok(AuthConfig::ManagedIdentity { client_id });
        }
        if !identity.client_id.is_empty() {
            let assertion = service_account_token(identity.service_account_tokens)?;
            return Ok(AuthConfig::WorkloadIdentity {
                client_id: identity.client_id.to_string(),
                assertion,
            });
        }

        let client_id = lookup_secret(secrets, SECRET_CLIENT_ID)
            .ok_or_else(|| ProviderError::AuthError("could not find clientid in secrets".into()))?;
        let client_secret = lookup_secret(secrets, SECRET_CLIENT_SECRET).ok_or_else(|| {
            ProviderError::AuthError("could not find clientsecret in secrets".into())
        })?;
        Ok(AuthConfig::ServicePrincipal {
            client_id,
            client_secret,
        })
    }

    /// Fetches a bearer token for `request.resource`.
    #[tracing::instrument(skip(self, http))]
    pub async fn acquire(
        &self,
        http: &reqwest::Client,
        request: &TokenRequest<'_>,
    ) -> Result<AccessToken, ProviderError> {
        match self {
            Self::ServicePrincipal {
                client_id,
                client_secret,
            } => {
                let scope = scope(request.resource);
                let form = [
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", scope.as_str()),
                ];
                token_exchange(http, request, &form).await
            }
            Self::WorkloadIdentity {
                client_id,
                assertion,
            } => {
                let scope = scope(request.resource);
                let form = [
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_assertion_type", CLIENT_ASSERTION_TYPE),
                    ("client_assertion", assertion.as_str()),
                    ("scope", scope.as_str()),
                ];
                token_exchange(http, request, &form).await
            }
            Self::PodIdentity => pod_identity_token(http, request).await,
            Self::ManagedIdentity { client_id } => {
                managed_identity_token(http, request, client_id.as_deref()).await
            }
        }
    }
}

fn lookup_secret(secrets: &HashMap<String, String>, key: &str) -> Option<String> {
    secrets
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn scope(resource: &str) -> String {
    format!("{}/.default", resource.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct ServiceAccountToken {
    #[serde(default)]
    token: String,
}

/// Picks the token issued for the federated token exchange audience.
fn service_account_token(raw: &str) -> Result<String, ProviderError> {
    if raw.trim().is_empty() {
        return Err(ProviderError::AuthError(
            "service account tokens not found".to_string(),
        ));
    }
    let mut tokens: HashMap<String, ServiceAccountToken> = serde_json::from_str(raw)
        .map_err(|e| ProviderError::AuthError(format!("failed to parse service account tokens: {e}")))?;
    tokens
        .remove(TOKEN_EXCHANGE_AUDIENCE)
        .map(|token| token.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ProviderError::AuthError(format!(
                "token for audience {TOKEN_EXCHANGE_AUDIENCE} not found"
            ))
        })
}

/// Inputs for one token acquisition.
#[derive(Debug, Clone, Copy)]
pub struct TokenRequest<'a> {
    pub pod_name: &'a str,
    pub pod_namespace: &'a str,
    /// Vault audience, e.g. `https://vault.azure.net`
    pub resource: &'a str,
    pub aad_endpoint: &'a str,
    pub tenant_id: &'a str,
    pub nmi_endpoint: &'a str,
    pub msi_endpoint: &'a str,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken {
    token: String,
}

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &REDACTED)
            .finish()
    }
}

#[derive(Default, Deserialize)]
struct OAuthToken {
    #[serde(default)]
    access_token: String,
}

#[derive(Default, Deserialize)]
struct NmiResponse {
    #[serde(default)]
    token: OAuthToken,
    #[serde(default)]
    clientid: String,
}

async fn token_exchange(
    http: &reqwest::Client,
    request: &TokenRequest<'_>,
    form: &[(&str, &str)],
) -> Result<AccessToken, ProviderError> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        request.aad_endpoint.trim_end_matches('/'),
        request.tenant_id
    );
    let response = http
        .post(&url)
        .form(form)
        .send()
        .await
        .map_err(|e| ProviderError::AuthError(format!("failed to acquire token: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::AuthError(format!(
            "failed to acquire token, status code: {}, response body: {body}",
            status.as_u16()
        )));
    }

    let token: OAuthToken = response
        .json()
        .await
        .map_err(|e| ProviderError::AuthError(format!("failed to parse token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(ProviderError::AuthError(
            "token response did not contain an access token".to_string(),
        ));
    }
    tracing::debug!("[provider] accessToken: {}", redact(&token.access_token));
    Ok(AccessToken::new(token.access_token))
}

async fn pod_identity_token(
    http: &reqwest::Client,
    request: &TokenRequest<'_>,
) -> Result<AccessToken, ProviderError> {
    if request.pod_name.is_empty() || request.pod_namespace.is_empty() {
        return Err(ProviderError::AuthError(
            "pod information is not available. deploy a CSIDriver object to set podInfoOnMount"
                .to_string(),
        ));
    }

    let url = format!(
        "{}{NMI_TOKEN_PATH}",
        request.nmi_endpoint.trim_end_matches('/')
    );
    let response = http
        .get(&url)
        .query(&[("resource", request.resource)])
        .header(POD_NAME_HEADER, request.pod_name)
        .header(POD_NAMESPACE_HEADER, request.pod_namespace)
        .send()
        .await
        .map_err(|e| ProviderError::AuthError(format!("failed to query nmi: {e}")))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status != StatusCode::OK {
        return Err(ProviderError::AuthError(format!(
            "nmi response failed with status code: {}, response body: {body}",
            status.as_u16()
        )));
    }

    let nmi: NmiResponse = serde_json::from_str(&body)
        .map_err(|e| ProviderError::AuthError(format!("failed to parse nmi response: {e}")))?;
    if nmi.token.access_token.is_empty() || nmi.clientid.is_empty() {
        return Err(ProviderError::AuthError(
            "nmi did not return expected values in response: token and clientid".to_string(),
        ));
    }

    tracing::info!(
        "[provider] accessToken: {}, clientID: {}",
        redact(&nmi.token.access_token),
        redact(&nmi.clientid)
    );
    Ok(AccessToken::new(nmi.token.access_token))
}

async fn managed_identity_token(
    http: &reqwest::Client,
    request: &TokenRequest<'_>,
    client_id: Option<&str>,
) -> Result<AccessToken, ProviderError> {
    let mut query = vec![
        ("api-version", IMDS_API_VERSION),
        ("resource", request.resource),
    ];
    if let Some(client_id) = client_id {
        query.push(("client_id", client_id));
    }

    let response = http
        .get(request.msi_endpoint)
        .query(&query)
        .header("Metadata", "true")
        .send()
        .await
        .map_err(|e| {
            ProviderError::AuthError(format!("failed to query instance metadata service: {e}"))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::AuthError(format!(
            "managed identity token request failed with status code: {}, response body: {body}",
            status.as_u16()
        )));
    }

    let token: OAuthToken = response.json().await.map_err(|e| {
        ProviderError::AuthError(format!("failed to parse managed identity response: {e}"))
    })?;
    if token.access_token.is_empty() {
        return Err(ProviderError::AuthError(
            "managed identity response did not contain an access token".to_string(),
        ));
    }
    Ok(AccessToken::new(token.access_token))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn secrets(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request<'a>(server: &'a str) -> TokenRequest<'a> {
        TokenRequest {
            pod_name: "pod1",
            pod_namespace: "ns1",
            resource: "https://vault.azure.net",
            aad_endpoint: server,
            tenant_id: "tenant",
            nmi_endpoint: server,
            msi_endpoint: server,
        }
    }

    const SA_TOKENS: &str =
        r#"{"api://AzureADTokenExchange":{"token":"federated-jwt","expirationTimestamp":"2030-01-01T00:00:00Z"}}"#;

    // ==================== Mode Selection Tests ====================

    #[test]
    fn test_pod_and_vm_identity_conflict() {
        let identity = IdentityOptions {
            use_pod_identity: true,
            use_vm_managed_identity: true,
            ..Default::default()
        };
        let error = AuthConfig::new(&identity, &HashMap::new()).unwrap_err();
        assert_eq!(
            error,
            ProviderError::ConfigError(
                "cannot enable both pod identity and user-assigned managed identity".into()
            )
        );
    }

    #[test]
    fn test_mode_order() {
        let pod = IdentityOptions {
            use_pod_identity: true,
            client_id: "ignored",
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&pod, &HashMap::new()).unwrap(),
            AuthConfig::PodIdentity
        );

        let vm = IdentityOptions {
            use_vm_managed_identity: true,
            user_assigned_identity_id: "uami",
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&vm, &HashMap::new()).unwrap(),
            AuthConfig::ManagedIdentity {
                client_id: Some("uami".to_string())
            }
        );

        let system = IdentityOptions {
            use_vm_managed_identity: true,
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&system, &HashMap::new()).unwrap(),
            AuthConfig::ManagedIdentity { client_id: None }
        );

        let workload = IdentityOptions {
            client_id: "wi-client",
            service_account_tokens: SA_TOKENS,
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&workload, &HashMap::new()).unwrap(),
            AuthConfig::WorkloadIdentity {
                client_id: "wi-client".to_string(),
                assertion: "federated-jwt".to_string()
            }
        );
    }

    #[test]
    fn test_static_credentials_case_insensitive() {
        let config = AuthConfig::new(
            &IdentityOptions::default(),
            &secrets(&[("ClientID", "id"), ("CLIENTSECRET", "secret")]),
        )
        .unwrap();
        assert_eq!(
            config,
            AuthConfig::ServicePrincipal {
                client_id: "id".to_string(),
                client_secret: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_static_credentials_missing() {
        let error = AuthConfig::new(&IdentityOptions::default(), &secrets(&[("clientsecret", "s")]))
            .unwrap_err();
        assert_eq!(
            error,
            ProviderError::AuthError("could not find clientid in secrets".into())
        );

        let error = AuthConfig::new(&IdentityOptions::default(), &secrets(&[("clientid", "id")]))
            .unwrap_err();
        assert_eq!(
            error,
            ProviderError::AuthError("could not find clientsecret in secrets".into())
        );
    }

    #[test]
    fn test_workload_identity_token_errors() {
        let missing = IdentityOptions {
            client_id: "wi-client",
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&missing, &HashMap::new()).unwrap_err(),
            ProviderError::AuthError("service account tokens not found".into())
        );

        let wrong_audience = IdentityOptions {
            client_id: "wi-client",
            service_account_tokens: r#"{"other":{"token":"t"}}"#,
            ..Default::default()
        };
        assert_eq!(
            AuthConfig::new(&wrong_audience, &HashMap::new()).unwrap_err(),
            ProviderError::AuthError(
                "token for audience api://AzureADTokenExchange not found".into()
            )
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::ServicePrincipal {
            client_id: "id".to_string(),
            client_secret: "supersecret".to_string(),
        };
        assert!(!format!("{config:?}").contains("supersecret"));
        assert!(!format!("{:?}", AccessToken::new("tok-123".into())).contains("tok-123"));
    }

    // ==================== Token Acquisition Tests ====================

    #[tokio::test]
    async fn test_service_principal_acquire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .and(body_string_contains("client_secret=secret"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=https%3A%2F%2Fvault.azure.net%2F.default"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "sp-token"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = AuthConfig::ServicePrincipal {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        let uri = format!("{}/", server.uri());
        let token = config
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap();
        assert_eq!(token.secret(), "sp-token");
    }

    #[tokio::test]
    async fn test_service_principal_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let config = AuthConfig::ServicePrincipal {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        let uri = server.uri();
        let error = config
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap_err();
        assert!(matches!(error, ProviderError::AuthError(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn test_workload_identity_acquire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .and(body_string_contains("client_assertion=federated-jwt"))
            .and(body_string_contains(
                "client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "wi-token"})),
            )
            .mount(&server)
            .await;

        let config = AuthConfig::WorkloadIdentity {
            client_id: "wi-client".to_string(),
            assertion: "federated-jwt".to_string(),
        };
        let uri = server.uri();
        let token = config
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap();
        assert_eq!(token.secret(), "wi-token");
    }

    #[tokio::test]
    async fn test_pod_identity_acquire() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/host/token/"))
            .and(query_param("resource", "https://vault.azure.net"))
            .and(header("podname", "pod1"))
            .and(header("podns", "ns1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": {"access_token": "nmi-token", "expires_in": "3599"},
                "clientid": "client-1234"
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let token = AuthConfig::PodIdentity
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap();
        assert_eq!(token.secret(), "nmi-token");
    }

    #[tokio::test]
    async fn test_pod_identity_broker_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/host/token/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("broker down"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let error = AuthConfig::PodIdentity
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ProviderError::AuthError(
                "nmi response failed with status code: 500, response body: broker down".into()
            )
        );
    }

    #[tokio::test]
    async fn test_pod_identity_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": {"access_token": "nmi-token"}})),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let error = AuthConfig::PodIdentity
            .acquire(&reqwest::Client::new(), &request(&uri))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("token and clientid"));
    }

    #[tokio::test]
    async fn test_pod_identity_requires_pod_info() {
        let mut req = request("http://127.0.0.1:1");
        req.pod_name = "";
        let error = AuthConfig::PodIdentity
            .acquire(&reqwest::Client::new(), &req)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("podInfoOnMount"));
    }

    #[tokio::test]
    async fn test_managed_identity_acquire() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(header("Metadata", "true"))
            .and(query_param("api-version", "2018-02-01"))
            .and(query_param("client_id", "uami"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "msi-token"})),
            )
            .mount(&server)
            .await;

        let msi = format!("{}/metadata/identity/oauth2/token", server.uri());
        let mut req = request(&msi);
        req.msi_endpoint = &msi;
        let token = AuthConfig::ManagedIdentity {
            client_id: Some("uami".to_string()),
        }
        .acquire(&reqwest::Client::new(), &req)
        .await
        .unwrap();
        assert_eq!(token.secret(), "msi-token");
    }
}
