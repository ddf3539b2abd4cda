// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::cmp::Reverse;

use akv_codec::errors::CodecError;
use akv_codec::models::ObjectType;

use crate::constants::LATEST_VERSION;
use crate::errors::ProviderError;
use crate::keyvault::KeyVault;
use crate::models::{KeyVaultObject, ObjectVersionEntry};

/// Expands `object_version_history` into concrete objects, newest first.
///
/// With a history of 0 or 1 the object is returned as is. Otherwise entry `i`
/// gets the alias `{alias or name}/{i}` and its concrete version. When the
/// pinned version is not among the enabled versions nothing is returned.
pub async fn resolve_versions(
    client: &dyn KeyVault,
    object: &KeyVaultObject,
) -> Result<Vec<KeyVaultObject>, ProviderError> {
    if object.object_version_history <= 1 {
        return Ok(vec![object.clone()]);
    }

    let object_type: ObjectType = object
        .object_type
        .parse()
        .map_err(|e: CodecError| ProviderError::ValidationError(e.to_string()))?;
    let versions = match object_type {
        ObjectType::Secret => client.get_secret_versions(&object.object_name).await?,
        ObjectType::Key => client.get_key_versions(&object.object_name).await?,
        ObjectType::Cert => client.get_certificate_versions(&object.object_name).await?,
    };

    let resolved = select_versions(object, versions);
    if resolved.is_empty() {
        tracing::warn!(
            "[provider] version {} of {}/{} not found among enabled versions",
            object.object_version,
            object.object_type,
            object.object_name
        );
    }
    Ok(resolved)
}

fn select_versions(
    object: &KeyVaultObject,
    mut versions: Vec<ObjectVersionEntry>,
) -> Vec<KeyVaultObject> {
    // stable, so equal timestamps keep listing order
    versions.sort_by_key(|entry| Reverse(entry.created));

    let pinned = &object.object_version;
    let start = if pinned.is_empty() || pinned.eq_ignore_ascii_case(LATEST_VERSION) {
        Some(0)
    } else {
        versions.iter().position(|entry| &entry.version == pinned)
    };
    let Some(start) = start else {
        return Vec::new();
    };

    let take = usize::try_from(object.object_version_history).unwrap_or_default();
    let base = object.file_name();
    versions
        .iter()
        .skip(start)
        .take(take)
        .enumerate()
        .map(|(index, entry)| KeyVaultObject {
            object_alias: format!("{base}/{index}"),
            object_version: entry.version.clone(),
            ..object.clone()
        })
        .collect()
}
