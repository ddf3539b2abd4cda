// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use data_encoding::HEXLOWER_PERMISSIVE;

use crate::constants::{
    OBJECT_ENCODING_BASE64, OBJECT_ENCODING_HEX, OBJECT_ENCODING_UTF8, OBJECT_TYPE_SECRET,
};
use crate::errors::CodecError;
use crate::utils::base64_decode;

/// Produces the bytes written to disk for an object's content.
///
/// Only secrets honour `object_encoding`; every other type is written as the
/// UTF-8 bytes of its (PEM) content.
pub fn content_bytes(
    content: &str,
    object_type: &str,
    object_encoding: &str,
) -> Result<Vec<u8>, CodecError> {
    if !object_type.eq_ignore_ascii_case(OBJECT_TYPE_SECRET)
        || object_encoding.is_empty()
        || object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_UTF8)
    {
        return Ok(content.as_bytes().to_vec());
    }
    if object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_BASE64) {
        return base64_decode(content);
    }
    if object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_HEX) {
        return Ok(HEXLOWER_PERMISSIVE.decode(content.as_bytes())?);
    }
    Err(CodecError::UnknownEncoding(object_encoding.to_string()))
}

/// Parses an octal file permission such as `0644`, falling back to `default_mode`.
pub fn file_permission(permission: &str, default_mode: i32) -> Result<i32, CodecError> {
    if permission.is_empty() {
        return Ok(default_mode);
    }
    i32::from_str_radix(permission, 8)
        .map_err(|_| CodecError::FilePermissionError(permission.to_string()))
}
