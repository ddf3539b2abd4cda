// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use base64::prelude::{BASE64_STANDARD, BASE64_URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::errors::CodecError;

#[inline]
pub fn base64_decode(input: &str) -> Result<Vec<u8>, CodecError> {
    Ok(BASE64_STANDARD.decode(input)?)
}

/// Decodes base64url with or without trailing padding, as JWK members are.
#[inline]
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, CodecError> {
    Ok(BASE64_URL_SAFE_NO_PAD.decode(input.trim_end_matches('='))?)
}
