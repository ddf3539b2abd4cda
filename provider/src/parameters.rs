// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidationError};

use crate::auth::{AuthConfig, IdentityOptions};
use crate::constants::{
    ATTRIBUTE_CLIENT_ID, ATTRIBUTE_CLOUD_ENV_FILE_NAME, ATTRIBUTE_CLOUD_NAME,
    ATTRIBUTE_KEYVAULT_NAME, ATTRIBUTE_OBJECTS, ATTRIBUTE_POD_NAME, ATTRIBUTE_POD_NAMESPACE,
    ATTRIBUTE_SERVICE_ACCOUNT_TOKENS, ATTRIBUTE_TENANT_ID, ATTRIBUTE_TENANT_ID_DEPRECATED,
    ATTRIBUTE_USE_POD_IDENTITY, ATTRIBUTE_USE_VM_MANAGED_IDENTITY,
    ATTRIBUTE_USER_ASSIGNED_IDENTITY_ID,
};
use crate::environment::AzureEnvironment;
use crate::errors::ProviderError;
use crate::models::{KeyVaultObject, StringArray};
use crate::utils::parse_bool;

static VAULT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-A-Za-z0-9]+$").expect("vault name pattern should compile")
});

/// Everything one mount needs, parsed once from the mount attributes.
#[derive(Debug, Clone, Validate)]
pub struct MountConfig {
    #[validate(
        length(min = 3, max = 24, message = "vault name must be between 3 and 24 characters"),
        custom(function = "validate_vault_name")
    )]
    pub keyvault_name: String,
    pub environment: AzureEnvironment,
    pub tenant_id: String,
    pub auth: AuthConfig,
    pub pod_name: String,
    pub pod_namespace: String,
    pub objects: Vec<KeyVaultObject>,
}

fn validate_vault_name(name: &str) -> Result<(), ValidationError> {
    if VAULT_NAME_REGEX.is_match(name) {
        return Ok(());
    }
    let mut error = ValidationError::new("invalid_vault_name");
    error.message = Some(Cow::Owned(format!(
        "Invalid vault name: {name:?}, must match [-a-zA-Z0-9]{{3,24}}"
    )));
    Err(error)
}

fn attribute<'a>(attributes: &'a HashMap<String, String>, key: &str) -> &'a str {
    attributes.get(key).map(|v| v.trim()).unwrap_or_default()
}

impl MountConfig {
    pub async fn parse(
        attributes: &HashMap<String, String>,
        secrets: &HashMap<String, String>,
    ) -> Result<Self, ProviderError> {
        let keyvault_name = attribute(attributes, ATTRIBUTE_KEYVAULT_NAME);
        let cloud_name = attribute(attributes, ATTRIBUTE_CLOUD_NAME);
        let cloud_env_file_name = attribute(attributes, ATTRIBUTE_CLOUD_ENV_FILE_NAME);
        let mut tenant_id = attribute(attributes, ATTRIBUTE_TENANT_ID);
        if tenant_id.is_empty() {
            tenant_id = attribute(attributes, ATTRIBUTE_TENANT_ID_DEPRECATED);
        }
        let use_pod_identity = parse_bool(
            ATTRIBUTE_USE_POD_IDENTITY,
            attribute(attributes, ATTRIBUTE_USE_POD_IDENTITY),
        )?;
        let use_vm_managed_identity = parse_bool(
            ATTRIBUTE_USE_VM_MANAGED_IDENTITY,
            attribute(attributes, ATTRIBUTE_USE_VM_MANAGED_IDENTITY),
        )?;
        let pod_name = attribute(attributes, ATTRIBUTE_POD_NAME);
        let pod_namespace = attribute(attributes, ATTRIBUTE_POD_NAMESPACE);

        if keyvault_name.is_empty() {
            return Err(ProviderError::ConfigError(
                "keyvaultName is not set".to_string(),
            ));
        }
        if tenant_id.is_empty() {
            return Err(ProviderError::ConfigError("tenantId is not set".to_string()));
        }

        let environment = AzureEnvironment::resolve(cloud_name, cloud_env_file_name).await?;

        let identity = IdentityOptions {
            use_pod_identity,
            use_vm_managed_identity,
            user_assigned_identity_id: attribute(attributes, ATTRIBUTE_USER_ASSIGNED_IDENTITY_ID),
            client_id: attribute(attributes, ATTRIBUTE_CLIENT_ID),
            service_account_tokens: attribute(attributes, ATTRIBUTE_SERVICE_ACCOUNT_TOKENS),
        };
        let auth = AuthConfig::new(&identity, secrets)?;

        let objects = parse_objects(attribute(attributes, ATTRIBUTE_OBJECTS))?;

        let config = MountConfig {
            keyvault_name: keyvault_name.to_string(),
            environment,
            tenant_id: tenant_id.to_string(),
            auth,
            pod_name: pod_name.to_string(),
            pod_namespace: pod_namespace.to_string(),
            objects,
        };
        config.validate()?;

        tracing::info!(
            "[provider] vault: {}, tenant: {}, cloud: {}, objects: {}",
            config.keyvault_name,
            config.tenant_id,
            config.environment.name,
            config.objects.len()
        );
        Ok(config)
    }

    /// `https://{name}.{suffix}/`
    pub fn vault_url(&self) -> String {
        format!(
            "https://{}.{}/",
            self.keyvault_name, self.environment.key_vault_dns_suffix
        )
    }
}

/// Parses `objects`: a YAML `{array: [...]}` whose items are YAML objects.
pub fn parse_objects(raw: &str) -> Result<Vec<KeyVaultObject>, ProviderError> {
    if raw.is_empty() {
        return Err(ProviderError::ConfigError("objects is not set".to_string()));
    }
    let wrapper: StringArray = serde_yaml::from_str(raw).map_err(|e| {
        ProviderError::ConfigError(format!("failed to yaml unmarshal objects: {e}"))
    })?;
    if wrapper.array.is_empty() {
        return Err(ProviderError::ConfigError(
            "objects array is empty".to_string(),
        ));
    }

    wrapper
        .array
        .iter()
        .map(|item| {
            serde_yaml::from_str::<KeyVaultObject>(item)
                .map(KeyVaultObject::trimmed)
                .map_err(|e| {
                    ProviderError::ConfigError(format!(
                        "failed to unmarshal object {item:?}: {e}"
                    ))
                })
        })
        .collect()
}
