// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use p12::PFX;
use pkcs8::der::asn1::AnyRef;
use pkcs8::der::{self, Decode, Encode, Reader, Tag};
use pkcs8::{AlgorithmIdentifierRef, PrivateKeyInfo};
use sec1::{EcParameters, EcPrivateKey};
use zeroize::Zeroizing;

use crate::blocks::encode_block;
use crate::chain::fetch_cert_chain;
use crate::constants::{OID_EC_PUBLIC_KEY, OID_RSA_ENCRYPTION, PEM_CERTIFICATE, PEM_PRIVATE_KEY};
use crate::errors::CodecError;
use crate::utils::base64_decode;

const DEFAULT_MAC_ITERATIONS: u32 = 1;

/// Options for converting a PKCS#12 container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reorder the certificates leaf first, root last.
    pub construct_pem_chain: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            construct_pem_chain: true,
        }
    }
}

/// Converts a base64 encoded, password-less PKCS#12 container into PEM.
///
/// The output holds every private key as an unencrypted PKCS#8 `PRIVATE KEY`
/// block followed by the certificates. When [`DecodeOptions::construct_pem_chain`]
/// is set the certificates are emitted leaf first.
pub fn decode_pkcs12(value: &str, options: &DecodeOptions) -> Result<String, CodecError> {
    let raw = Zeroizing::new(base64_decode(value)?);
    let raw = Zeroizing::new(
        with_explicit_mac_iterations(&raw)
            .map_err(|err| CodecError::Pkcs12Error(err.to_string()))?,
    );

    let pfx = PFX::parse(&raw).map_err(|err| CodecError::Pkcs12Error(format!("{err:?}")))?;
    if !pfx.verify_mac("") {
        return Err(CodecError::Pkcs12Error("mac verification failed".to_string()));
    }
    let keys = pfx
        .key_bags("")
        .map_err(|err| CodecError::Pkcs12Error(format!("{err:?}")))?;
    let certs = pfx
        .cert_x509_bags("")
        .map_err(|err| CodecError::Pkcs12Error(format!("{err:?}")))?;

    let mut pem_keys = String::new();
    for key in keys {
        let key = Zeroizing::new(key);
        let pkcs8 = marshal_pkcs8(&key)?;
        pem_keys.push_str(&encode_block(PEM_PRIVATE_KEY, &pkcs8));
    }

    let mut pem_certs = String::new();
    for cert in &certs {
        pem_certs.push_str(&encode_block(PEM_CERTIFICATE, cert));
    }
    if options.construct_pem_chain && !certs.is_empty() {
        pem_certs = fetch_cert_chain(&pem_certs)?;
    }

    pem_keys.push_str(&pem_certs);
    Ok(pem_keys)
}

/// Re-encodes `PFX` with the `MacData` iteration count spelled out.
///
/// The count is `DEFAULT 1` and Windows exports omit it, which `p12` cannot
/// parse. Containers without `MacData` are returned unchanged.
fn with_explicit_mac_iterations(pfx: &[u8]) -> der::Result<Vec<u8>> {
    AnyRef::from_der(pfx)?.sequence(|reader| {
        let version = AnyRef::decode(reader)?;
        let auth_safe = AnyRef::decode(reader)?;
        if reader.is_finished() {
            return Ok(pfx.to_vec());
        }

        let mac_data = AnyRef::decode(reader)?.sequence(|mac| {
            let digest = AnyRef::decode(mac)?;
            let salt = AnyRef::decode(mac)?;
            let iterations = if mac.is_finished() {
                DEFAULT_MAC_ITERATIONS
            } else {
                u32::decode(mac)?
            };
            encode_sequence(&[digest.to_der()?, salt.to_der()?, iterations.to_der()?])
        })?;

        encode_sequence(&[version.to_der()?, auth_safe.to_der()?, mac_data])
    })
}

fn encode_sequence(fields: &[Vec<u8>]) -> der::Result<Vec<u8>> {
    let body = fields.concat();
    AnyRef::new(Tag::Sequence, &body)?.to_der()
}

/// Re-encodes a private key as an unencrypted PKCS#8 structure.
///
/// PKCS#1 RSA, PKCS#8 and SEC1 EC encodings are tried in that order. EC keys
/// are normalized so the curve is named only in the PKCS#8 algorithm identifier.
pub fn marshal_pkcs8(der: &[u8]) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    if pkcs1::RsaPrivateKey::from_der(der).is_ok() {
        let algorithm = AlgorithmIdentifierRef {
            oid: OID_RSA_ENCRYPTION,
            parameters: Some(AnyRef::NULL),
        };
        return Ok(Zeroizing::new(PrivateKeyInfo::new(algorithm, der).to_der()?));
    }

    if let Ok(info) = PrivateKeyInfo::from_der(der) {
        if info.algorithm.oid == OID_EC_PUBLIC_KEY {
            let key =
                EcPrivateKey::from_der(info.private_key).map_err(|_| CodecError::PrivateKeyError)?;
            return marshal_ec(key, info.algorithm);
        }
        return Ok(Zeroizing::new(
            PrivateKeyInfo::new(info.algorithm, info.private_key).to_der()?,
        ));
    }

    if let Ok(key) = EcPrivateKey::from_der(der) {
        let curve = match key.parameters {
            Some(EcParameters::NamedCurve(oid)) => oid,
            _ => return Err(CodecError::PrivateKeyError),
        };
        let algorithm = AlgorithmIdentifierRef {
            oid: OID_EC_PUBLIC_KEY,
            parameters: Some(AnyRef::from(&curve)),
        };
        return marshal_ec(key, algorithm);
    }

    Err(CodecError::PrivateKeyError)
}

fn marshal_ec(
    key: EcPrivateKey<'_>,
    algorithm: AlgorithmIdentifierRef<'_>,
) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    let inner = EcPrivateKey {
        private_key: key.private_key,
        parameters: None,
        public_key: key.public_key,
    };
    let inner = Zeroizing::new(inner.to_der()?);
    Ok(Zeroizing::new(PrivateKeyInfo::new(algorithm, &inner).to_der()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OID_SECP256R1;

    // version 1, 32 byte private key, P-256 named curve, no public key
    fn sec1_p256() -> Vec<u8> {
        let mut der = vec![0x30, 0x31, 0x02, 0x01, 0x01, 0x04, 0x20];
        der.extend_from_slice(&[0x42; 32]);
        der.extend_from_slice(&[0xa0, 0x0a, 0x06, 0x08]);
        der.extend_from_slice(&[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07]);
        der
    }

    #[test]
    fn test_decode_pkcs12_invalid_base64() {
        let result = decode_pkcs12("%%%", &DecodeOptions::default());
        assert!(matches!(result, Err(CodecError::Base64Error(_))));
    }

    #[test]
    fn test_decode_pkcs12_invalid_container() {
        let result = decode_pkcs12("aGVsbG8=", &DecodeOptions::default());
        assert!(matches!(result, Err(CodecError::Pkcs12Error(_))));
    }

    #[test]
    fn test_marshal_pkcs8_rejects_garbage() {
        assert_eq!(
            marshal_pkcs8(&[0x01, 0x02, 0x03]).unwrap_err(),
            CodecError::PrivateKeyError
        );
    }

    #[test]
    fn test_marshal_pkcs8_from_sec1() {
        let pkcs8 = marshal_pkcs8(&sec1_p256()).unwrap();
        let info = PrivateKeyInfo::from_der(&pkcs8).unwrap();
        assert_eq!(info.algorithm.oid, OID_EC_PUBLIC_KEY);
        assert_eq!(info.algorithm.parameters_oid().unwrap(), OID_SECP256R1);

        let inner = EcPrivateKey::from_der(info.private_key).unwrap();
        assert!(inner.parameters.is_none());
        assert_eq!(inner.private_key, &[0x42; 32]);
    }

    #[test]
    fn test_marshal_pkcs8_is_idempotent() {
        let first = marshal_pkcs8(&sec1_p256()).unwrap();
        let second = marshal_pkcs8(&first).unwrap();
        assert_eq!(*first, *second);
    }

    // SEQUENCE { INTEGER 3, SEQUENCE {}, SEQUENCE { SEQUENCE {}, OCTET STRING 0xAA } }
    const PFX_WITHOUT_MAC_ITERATIONS: &[u8] = &[
        0x30, 0x0c, 0x02, 0x01, 0x03, 0x30, 0x00, 0x30, 0x05, 0x30, 0x00, 0x04, 0x01, 0xaa,
    ];

    #[test]
    fn test_mac_iterations_default_is_written() {
        let rewritten = with_explicit_mac_iterations(PFX_WITHOUT_MAC_ITERATIONS).unwrap();
        assert_eq!(
            rewritten,
            vec![
                0x30, 0x0f, 0x02, 0x01, 0x03, 0x30, 0x00, 0x30, 0x08, 0x30, 0x00, 0x04, 0x01,
                0xaa, 0x02, 0x01, 0x01,
            ]
        );
    }

    #[test]
    fn test_mac_iterations_present_is_kept() {
        let with_count = [
            0x30, 0x0f, 0x02, 0x01, 0x03, 0x30, 0x00, 0x30, 0x08, 0x30, 0x00, 0x04, 0x01, 0xaa,
            0x02, 0x01, 0x07,
        ];
        assert_eq!(with_explicit_mac_iterations(&with_count).unwrap(), with_count);
    }

    #[test]
    fn test_mac_data_absent_is_unchanged() {
        let without_mac = [0x30, 0x05, 0x02, 0x01, 0x03, 0x30, 0x00];
        assert_eq!(with_explicit_mac_iterations(&without_mac).unwrap(), without_mac);
    }

    #[test]
    fn test_decode_options_default_constructs_chain() {
        assert!(DecodeOptions::default().construct_pem_chain);
    }
}
