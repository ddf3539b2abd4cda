// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{OBJECT_TYPE_CERT, OBJECT_TYPE_KEY, OBJECT_TYPE_SECRET};
use crate::errors::CodecError;

/// The kind of vault object a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Secret,
    Key,
    Cert,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Secret => OBJECT_TYPE_SECRET,
            ObjectType::Key => OBJECT_TYPE_KEY,
            ObjectType::Cert => OBJECT_TYPE_CERT,
        }
    }
}

impl FromStr for ObjectType {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            OBJECT_TYPE_SECRET => Ok(ObjectType::Secret),
            OBJECT_TYPE_KEY => Ok(ObjectType::Key),
            OBJECT_TYPE_CERT => Ok(ObjectType::Cert),
            _ => Err(CodecError::InvalidObject(
                "Invalid vaultObjectTypes. Should be secret, key, or cert".to_string(),
            )),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public half of a JSON Web Key as returned by the vault.
///
/// RSA keys carry `n` and `e`, EC keys carry `crv`, `x` and `y`. All binary
/// members are base64url encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKey {
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub crv: String,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
    #[serde(default)]
    pub x: String,
    #[serde(default)]
    pub y: String,
}
