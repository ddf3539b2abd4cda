// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use akv_codec::errors::CodecError;
use tonic::{Code, Status};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("authentication error: {0}")]
    AuthError(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("key vault error: {0}")]
    KeyVaultError(String),
    #[error(transparent)]
    DecodeError(#[from] CodecError),
    #[error(
        "failed to get objectType:{object_type}, objectName:{object_name}, objectVersion:{object_version}: {source}"
    )]
    ObjectError {
        object_type: String,
        object_name: String,
        object_version: String,
        source: Box<ProviderError>,
    },
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ProviderError {
    /// Attaches the `{type,name,version}` triple of the object being fetched.
    pub fn for_object(self, object_type: &str, object_name: &str, object_version: &str) -> Self {
        ProviderError::ObjectError {
            object_type: object_type.to_string(),
            object_name: object_name.to_string(),
            object_version: object_version.to_string(),
            source: Box::new(self),
        }
    }

    pub fn code(&self) -> Code {
        match self {
            Self::ConfigError(_) | Self::ValidationError(_) => Code::InvalidArgument,
            Self::AuthError(_) => Code::Unauthenticated,
            Self::KeyVaultError(_) => Code::Unavailable,
            Self::DecodeError(_) | Self::InternalError(_) => Code::Internal,
            Self::ObjectError { source, .. } => source.code(),
        }
    }
}

impl From<ProviderError> for Status {
    fn from(error: ProviderError) -> Self {
        Status::new(error.code(), error.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(source: reqwest::Error) -> Self {
        tracing::error!("{:?}", source);
        ProviderError::KeyVaultError(source.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(source: serde_json::Error) -> Self {
        tracing::error!("{:?}", source);
        ProviderError::ConfigError(source.to_string())
    }
}

impl From<serde_yaml::Error> for ProviderError {
    fn from(source: serde_yaml::Error) -> Self {
        tracing::error!("{:?}", source);
        ProviderError::ConfigError(source.to_string())
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(source: std::io::Error) -> Self {
        tracing::error!("{:?}", source);
        ProviderError::InternalError(source.to_string())
    }
}

impl From<validator::ValidationErrors> for ProviderError {
    fn from(source: validator::ValidationErrors) -> Self {
        tracing::debug!("{:?}", source);
        let mut messages: Vec<String> = source
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field}: {}", error.code),
                })
            })
            .collect();
        messages.sort();
        ProviderError::ValidationError(messages.join("; "))
    }
}
