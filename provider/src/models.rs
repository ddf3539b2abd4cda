// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::borrow::Cow;
use std::fmt;

use akv_codec::models::JsonWebKey;
use akv_codec::validation::{
    validate_file_name, validate_no_invisible_characters, validate_object_encoding,
    validate_object_format, validate_object_version,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One entry of the `objects` mount attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
#[validate(schema(function = "validate_key_vault_object"))]
pub struct KeyVaultObject {
    pub object_name: String,
    /// File name to write instead of `object_name`
    pub object_alias: String,
    pub object_version: String,
    /// Number of most recent versions to mount, newest first
    pub object_version_history: i32,
    pub object_type: String,
    pub object_format: String,
    pub object_encoding: String,
    /// Octal, e.g. `0644`
    pub file_permission: String,
}

impl KeyVaultObject {
    pub fn trimmed(mut self) -> Self {
        for field in [
            &mut self.object_name,
            &mut self.object_alias,
            &mut self.object_version,
            &mut self.object_type,
            &mut self.object_format,
            &mut self.object_encoding,
            &mut self.file_permission,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }
        self
    }

    pub fn file_name(&self) -> &str {
        if self.object_alias.is_empty() {
            &self.object_name
        } else {
            &self.object_alias
        }
    }

    /// `{type}/{name}`, or `{type}/{name}/{index}` for a resolved history entry.
    pub fn uid(&self) -> String {
        if self.object_version_history > 1 {
            let index = self.object_alias.rsplit('/').next().unwrap_or_default();
            format!("{}/{}/{}", self.object_type, self.object_name, index)
        } else {
            format!("{}/{}", self.object_type, self.object_name)
        }
    }
}

fn invalid(message: String) -> ValidationError {
    let mut error = ValidationError::new("invalid_object");
    error.message = Some(Cow::Owned(message));
    error
}

fn validate_key_vault_object(object: &KeyVaultObject) -> Result<(), ValidationError> {
    for (value, field_name) in [
        (&object.object_name, "objectName"),
        (&object.object_alias, "objectAlias"),
        (&object.object_version, "objectVersion"),
        (&object.object_type, "objectType"),
        (&object.object_format, "objectFormat"),
        (&object.object_encoding, "objectEncoding"),
        (&object.file_permission, "filePermission"),
    ] {
        validate_no_invisible_characters(value, field_name).map_err(|e| invalid(e.to_string()))?;
    }
    // the name is also a vault URL segment, so it is checked even behind an alias
    validate_file_name(&object.object_name).map_err(|e| invalid(e.to_string()))?;
    validate_file_name(object.file_name()).map_err(|e| invalid(e.to_string()))?;
    validate_object_version(&object.object_version).map_err(|e| invalid(e.to_string()))?;
    validate_object_format(&object.object_format, &object.object_type)
        .map_err(|e| invalid(e.to_string()))?;
    validate_object_encoding(&object.object_encoding, &object.object_type)
        .map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

/// `objects` attribute wrapper: `{ array: [<yaml>, ...] }`.
#[derive(Debug, Default, Deserialize)]
pub struct StringArray {
    #[serde(default)]
    pub array: Vec<String>,
}

// ==================== Vault REST ====================

// field defaults only, a container default cannot move out of a `Drop` type
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBundle {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub id: String,
    /// Set when the secret backs a certificate
    #[serde(default)]
    pub kid: String,
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBundle")
            .field("value", &crate::constants::REDACTED)
            .field("content_type", &self.content_type)
            .field("id", &self.id)
            .field("kid", &self.kid)
            .finish()
    }
}

impl Drop for SecretBundle {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyBundle {
    pub key: JsonWebKey,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateBundle {
    pub id: String,
    /// Base64 DER
    pub cer: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemAttributes {
    pub enabled: Option<bool>,
    /// Unix seconds
    pub created: Option<i64>,
}

/// A list-versions item. Keys carry `kid` instead of `id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VersionItem {
    pub id: String,
    pub kid: String,
    pub attributes: Option<ItemAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionPage {
    pub value: Vec<VersionItem>,
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersionEntry {
    pub version: String,
    pub created: DateTime<Utc>,
}

/// A file returned to the driver in the mount response.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretFile {
    pub path: String,
    pub content: Vec<u8>,
    pub file_mode: i32,
    pub uid: String,
    pub version: String,
}

impl fmt::Debug for SecretFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretFile")
            .field("path", &self.path)
            .field("content", &crate::constants::REDACTED)
            .field("file_mode", &self.file_mode)
            .field("uid", &self.uid)
            .field("version", &self.version)
            .finish()
    }
}
