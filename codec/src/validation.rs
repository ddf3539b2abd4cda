// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::constants::{
    OBJECT_ENCODING_BASE64, OBJECT_ENCODING_HEX, OBJECT_ENCODING_UTF8, OBJECT_FORMAT_PEM,
    OBJECT_FORMAT_PFX, OBJECT_TYPE_SECRET, SOFT_HYPHEN,
};
use crate::errors::CodecError;

/// Code points of the Unicode `Cf` (format) category.
const FORMAT_CHARACTERS: &[(char, char)] = &[
    ('\u{00AD}', '\u{00AD}'),
    ('\u{0600}', '\u{0605}'),
    ('\u{061C}', '\u{061C}'),
    ('\u{06DD}', '\u{06DD}'),
    ('\u{070F}', '\u{070F}'),
    ('\u{0890}', '\u{0891}'),
    ('\u{08E2}', '\u{08E2}'),
    ('\u{180E}', '\u{180E}'),
    ('\u{200B}', '\u{200F}'),
    ('\u{202A}', '\u{202E}'),
    ('\u{2060}', '\u{2064}'),
    ('\u{2066}', '\u{206F}'),
    ('\u{FEFF}', '\u{FEFF}'),
    ('\u{FFF9}', '\u{FFFB}'),
    ('\u{110BD}', '\u{110BD}'),
    ('\u{110CD}', '\u{110CD}'),
    ('\u{13430}', '\u{1343F}'),
    ('\u{1BCA0}', '\u{1BCA3}'),
    ('\u{1D173}', '\u{1D17A}'),
    ('\u{E0001}', '\u{E0001}'),
    ('\u{E0020}', '\u{E007F}'),
];

fn named_invisible_character(c: char) -> Option<&'static str> {
    match c {
        '\u{200B}' => Some("Zero Width Space (U+200B)"),
        '\u{200C}' => Some("Zero Width Non-Joiner (U+200C)"),
        '\u{200D}' => Some("Zero Width Joiner (U+200D)"),
        '\u{FEFF}' => Some("Zero Width No-Break Space/BOM (U+FEFF)"),
        '\u{2060}' => Some("Word Joiner (U+2060)"),
        _ => None,
    }
}

fn is_format_character(c: char) -> bool {
    FORMAT_CHARACTERS
        .iter()
        .any(|&(low, high)| (low..=high).contains(&c))
}

/// Ensures a file name is a non-empty relative path that never steps upwards.
pub fn validate_file_name(file_name: &str) -> Result<(), CodecError> {
    if file_name.is_empty() {
        return Err(CodecError::InvalidObject(
            "file name must not be empty".to_string(),
        ));
    }
    if file_name.starts_with('/') || file_name.starts_with('\\') {
        return Err(CodecError::InvalidObject(
            "file name must be a relative path".to_string(),
        ));
    }
    // `..` as a path element, then anywhere as a substring
    if file_name.split(['/', '\\']).any(|part| part == "..") || file_name.contains("..") {
        return Err(CodecError::InvalidObject(
            "file name must not contain '..'".to_string(),
        ));
    }
    Ok(())
}

/// A version is a single path segment of the vault URL. Empty means latest.
pub fn validate_object_version(object_version: &str) -> Result<(), CodecError> {
    if object_version == "."
        || object_version.contains(['/', '\\'])
        || object_version.contains("..")
    {
        return Err(CodecError::InvalidObject(format!(
            "invalid objectVersion: {object_version}, must not contain '/', '\\' or '..'"
        )));
    }
    Ok(())
}

/// `pem` and `pfx` are accepted in any case; `pfx` is only valid for secrets.
pub fn validate_object_format(object_format: &str, object_type: &str) -> Result<(), CodecError> {
    if object_format.is_empty() {
        return Ok(());
    }
    if !object_format.eq_ignore_ascii_case(OBJECT_FORMAT_PEM)
        && !object_format.eq_ignore_ascii_case(OBJECT_FORMAT_PFX)
    {
        return Err(CodecError::InvalidObject(format!(
            "invalid objectFormat: {object_format}, should be PEM or PFX"
        )));
    }
    if object_format.eq_ignore_ascii_case(OBJECT_FORMAT_PFX) && object_type != OBJECT_TYPE_SECRET
    {
        return Err(CodecError::InvalidObject(
            "PFX format only supported for objectType: secret".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_object_encoding(
    object_encoding: &str,
    object_type: &str,
) -> Result<(), CodecError> {
    if object_encoding.is_empty() {
        return Ok(());
    }
    if object_type != OBJECT_TYPE_SECRET {
        return Err(CodecError::InvalidObject(
            "objectEncoding only supported for objectType: secret".to_string(),
        ));
    }
    if !object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_HEX)
        && !object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_BASE64)
        && !object_encoding.eq_ignore_ascii_case(OBJECT_ENCODING_UTF8)
    {
        return Err(CodecError::InvalidObject(format!(
            "invalid objectEncoding: {object_encoding}, should be hex, base64 or utf-8"
        )));
    }
    Ok(())
}

/// Rejects zero-width and other invisible format characters, which are easy
/// to paste into YAML by accident. The soft hyphen is allowed.
///
/// Positions in the error are byte offsets into `value`.
pub fn validate_no_invisible_characters(value: &str, field_name: &str) -> Result<(), CodecError> {
    for (position, c) in value.char_indices() {
        if let Some(description) = named_invisible_character(c) {
            return Err(CodecError::InvalidObject(format!(
                "field {field_name} contains invisible character {description} at position {position}"
            )));
        }
        if c != SOFT_HYPHEN && is_format_character(c) {
            return Err(CodecError::InvalidObject(format!(
                "field {field_name} contains invisible format character (U+{:04X}) at position {position}",
                c as u32
            )));
        }
    }
    Ok(())
}
