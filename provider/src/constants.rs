// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

// mount attribute keys
pub const ATTRIBUTE_KEYVAULT_NAME: &str = "keyvaultName";
pub const ATTRIBUTE_CLOUD_NAME: &str = "cloudName";
pub const ATTRIBUTE_CLOUD_ENV_FILE_NAME: &str = "cloudEnvFileName";
pub const ATTRIBUTE_TENANT_ID: &str = "tenantID";
/// Deprecated spelling, read only when `tenantID` is empty.
pub const ATTRIBUTE_TENANT_ID_DEPRECATED: &str = "tenantId";
pub const ATTRIBUTE_USE_POD_IDENTITY: &str = "usePodIdentity";
pub const ATTRIBUTE_USE_VM_MANAGED_IDENTITY: &str = "useVMManagedIdentity";
pub const ATTRIBUTE_USER_ASSIGNED_IDENTITY_ID: &str = "userAssignedIdentityID";
pub const ATTRIBUTE_CLIENT_ID: &str = "clientID";
pub const ATTRIBUTE_POD_NAME: &str = "csi.storage.k8s.io/pod.name";
pub const ATTRIBUTE_POD_NAMESPACE: &str = "csi.storage.k8s.io/pod.namespace";
pub const ATTRIBUTE_SERVICE_ACCOUNT_TOKENS: &str = "csi.storage.k8s.io/serviceAccount.tokens";
pub const ATTRIBUTE_OBJECTS: &str = "objects";

// node publish secret keys, matched case-insensitively
pub const SECRET_CLIENT_ID: &str = "clientid";
pub const SECRET_CLIENT_SECRET: &str = "clientsecret";

pub const AZURE_ENVIRONMENT_FILEPATH: &str = "AZURE_ENVIRONMENT_FILEPATH";
pub const DEBUG_LOG: &str = "DEBUG_LOG";

pub const MSI_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const IMDS_API_VERSION: &str = "2018-02-01";
pub const NMI_HOST: &str = "http://localhost";
pub const NMI_TOKEN_PATH: &str = "/host/token/";
pub const POD_NAME_HEADER: &str = "podname";
pub const POD_NAMESPACE_HEADER: &str = "podns";

pub const TOKEN_EXCHANGE_AUDIENCE: &str = "api://AzureADTokenExchange";
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

pub const KEYVAULT_API_VERSION: &str = "7.4";
pub const KEYVAULT_MAX_RESULTS: &str = "25";

pub const LATEST_VERSION: &str = "latest";
pub const CERT_FILE_SUFFIX: &str = ".crt";
pub const KEY_FILE_SUFFIX: &str = ".key";

pub const API_VERSION: &str = "v1alpha1";
pub const RUNTIME_NAME: &str = env!("CARGO_PKG_NAME");
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_FILE_MODE: i32 = 0o644;
pub const HEALTHZ_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(5);
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const REDACTED: &str = "[REDACTED]";
