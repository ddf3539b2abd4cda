// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CodecError {
    #[error("unable to base64 decode input: {0}")]
    Base64Error(String),
    #[error("unable to hex decode input: {0}")]
    HexError(String),
    #[error("failed to decode pkcs12: {0}")]
    Pkcs12Error(String),
    #[error("failed to parse key for type pkcs1, pkcs8 or ec")]
    PrivateKeyError,
    #[error("failed to encode der: {0}")]
    DerError(String),
    #[error("failed to decode pem: {0}")]
    PemError(String),
    #[error("failed to parse certificate: {0}")]
    CertificateError(String),
    #[error("no leaf found")]
    NoLeafError,
    #[error("constructing chain resulted in cycle")]
    CycleError,
    #[error("key type '{0}' currently not supported")]
    UnsupportedKeyType(String),
    #[error("curve {0} is not supported")]
    UnsupportedCurve(String),
    #[error("failed to get certificate. unknown content type '{0}'")]
    UnknownContentType(String),
    #[error("invalid objectEncoding: {0}, should be hex, base64 or utf-8")]
    UnknownEncoding(String),
    #[error("failed to parse file permission '{0}': must be an octal number")]
    FilePermissionError(String),
    #[error("{0}")]
    InvalidObject(String),
}

impl From<base64::DecodeError> for CodecError {
    fn from(source: base64::DecodeError) -> Self {
        tracing::error!("{:?}", source);
        CodecError::Base64Error(source.to_string())
    }
}

impl From<data_encoding::DecodeError> for CodecError {
    fn from(source: data_encoding::DecodeError) -> Self {
        tracing::error!("{:?}", source);
        CodecError::HexError(source.to_string())
    }
}

impl From<pkcs8::der::Error> for CodecError {
    fn from(source: pkcs8::der::Error) -> Self {
        tracing::error!("{:?}", source);
        CodecError::DerError(source.to_string())
    }
}

impl From<pem::PemError> for CodecError {
    fn from(source: pem::PemError) -> Self {
        tracing::error!("{:?}", source);
        CodecError::PemError(source.to_string())
    }
}
