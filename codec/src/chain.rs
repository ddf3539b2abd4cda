// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Certificate chain ordering.
//!
//! Certificates are linked through their Authority Key Identifier and Subject
//! Key Identifier extensions. The parsed certificates live in a flat arena,
//! each node stores the index of its issuer and the walk from the leaf is
//! bounded by the number of nodes.

use x509_cert::der::oid::AssociatedOid;
use x509_cert::der::Decode;
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, SubjectKeyIdentifier};
use x509_cert::Certificate;

use crate::blocks::{encode_block, parse_blocks};
use crate::constants::PEM_CERTIFICATE;
use crate::errors::CodecError;

#[derive(Debug)]
struct Node {
    der: Vec<u8>,
    subject_key_id: Vec<u8>,
    authority_key_id: Vec<u8>,
    parent: Option<usize>,
    is_parent: bool,
}

impl Node {
    fn parse(der: Vec<u8>) -> Result<Self, CodecError> {
        let cert = Certificate::from_der(&der)
            .map_err(|err| CodecError::CertificateError(err.to_string()))?;

        let mut subject_key_id = Vec::new();
        let mut authority_key_id = Vec::new();

        for extension in cert.tbs_certificate.extensions.iter().flatten() {
            let value = extension.extn_value.as_bytes();
            if extension.extn_id == SubjectKeyIdentifier::OID {
                let ski = SubjectKeyIdentifier::from_der(value)
                    .map_err(|err| CodecError::CertificateError(err.to_string()))?;
                subject_key_id = ski.0.as_bytes().to_vec();
            } else if extension.extn_id == AuthorityKeyIdentifier::OID {
                let aki = AuthorityKeyIdentifier::from_der(value)
                    .map_err(|err| CodecError::CertificateError(err.to_string()))?;
                if let Some(key_identifier) = aki.key_identifier {
                    authority_key_id = key_identifier.as_bytes().to_vec();
                }
            }
        }

        Ok(Self {
            der,
            subject_key_id,
            authority_key_id,
            parent: None,
            is_parent: false,
        })
    }
}

/// Links every node to its issuer and returns the arena indices from the leaf upwards.
fn link_chain(nodes: &mut [Node]) -> Result<Vec<usize>, CodecError> {
    for i in 0..nodes.len() {
        if nodes[i].authority_key_id.is_empty() {
            continue;
        }
        // first match wins
        let parent = (0..nodes.len())
            .find(|&j| j != i && nodes[i].authority_key_id == nodes[j].subject_key_id);
        if let Some(j) = parent {
            nodes[i].parent = Some(j);
            nodes[j].is_parent = true;
        }
    }

    let leaf = nodes
        .iter()
        .position(|node| !node.is_parent)
        .ok_or(CodecError::NoLeafError)?;

    let mut order = Vec::with_capacity(nodes.len());
    let mut current = Some(leaf);
    while let Some(index) = current {
        if order.len() == nodes.len() {
            return Err(CodecError::CycleError);
        }
        order.push(index);
        current = nodes[index].parent;
    }

    Ok(order)
}

/// Reorders a PEM bundle of certificates into leaf, intermediate(s), root.
///
/// A certificate's issuer is the first other certificate whose subject key id
/// equals its authority key id. The leaf is the first certificate that issued
/// nothing else in the bundle.
///
/// # Errors
///
/// - [`CodecError::NoLeafError`] - every certificate issued another one
/// - [`CodecError::CycleError`] - walking issuers visits more nodes than exist
/// - [`CodecError::CertificateError`] - a block is not a valid X.509 certificate
///
/// A chain that stops before covering every certificate is returned as far
/// as it reaches, with a warning.
pub fn fetch_cert_chain(data: &str) -> Result<String, CodecError> {
    let mut nodes = parse_blocks(data)?
        .into_iter()
        .filter(|block| block.tag() == PEM_CERTIFICATE)
        .map(|block| Node::parse(block.into_contents()))
        .collect::<Result<Vec<Node>, CodecError>>()?;

    let order = link_chain(&mut nodes)?;

    let mut chain = String::new();
    for &index in &order {
        chain.push_str(&encode_block(PEM_CERTIFICATE, &nodes[index].der));
    }

    if order.len() < nodes.len() {
        tracing::warn!(
            "certificate chain is not complete due to missing intermediate/root certificates in the cert from key vault"
        );
    }

    Ok(chain)
}
