// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use pem::{EncodeConfig, LineEnding, Pem};

use crate::constants::PEM_CERTIFICATE;
use crate::errors::CodecError;

/// Encodes a single DER value as a PEM block with 64 character lines and LF endings.
#[inline]
pub fn encode_block(tag: &str, der: &[u8]) -> String {
    let block = Pem::new(tag, der);
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

#[inline]
pub fn parse_blocks(data: &str) -> Result<Vec<Pem>, CodecError> {
    Ok(pem::parse_many(data)?)
}

/// Splits a PEM bundle into its certificate blocks and its private key blocks.
///
/// Both halves keep the order in which the blocks appeared in the bundle.
/// Blocks that are neither certificates nor private keys are dropped.
pub fn split_cert_and_key(data: &str) -> Result<(String, String), CodecError> {
    let mut certs = String::new();
    let mut keys = String::new();

    for block in parse_blocks(data)? {
        if block.tag() == PEM_CERTIFICATE {
            certs.push_str(&encode_block(block.tag(), block.contents()));
        } else if block.tag().ends_with("PRIVATE KEY") {
            keys.push_str(&encode_block(block.tag(), block.contents()));
        }
    }

    Ok((certs, keys))
}
