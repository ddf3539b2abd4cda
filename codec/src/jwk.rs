// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use pkcs8::der::asn1::{AnyRef, BitStringRef, UintRef};
use pkcs8::der::Encode;
use pkcs8::{AlgorithmIdentifierRef, ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::blocks::encode_block;
use crate::constants::{
    CURVE_P256, CURVE_P384, CURVE_P521, KEY_TYPE_EC, KEY_TYPE_EC_HSM, KEY_TYPE_RSA,
    KEY_TYPE_RSA_HSM, OID_EC_PUBLIC_KEY, OID_RSA_ENCRYPTION, OID_SECP256R1, OID_SECP384R1,
    OID_SECP521R1, PEM_PUBLIC_KEY,
};
use crate::errors::CodecError;
use crate::models::JsonWebKey;
use crate::utils::base64url_decode;

/// Converts the public part of a JWK into a PKIX `PUBLIC KEY` PEM block.
///
/// # Errors
///
/// - [`CodecError::UnsupportedKeyType`] - `kty` is not RSA, RSA-HSM, EC or EC-HSM
/// - [`CodecError::UnsupportedCurve`] - `crv` is not P-256, P-384 or P-521
/// - [`CodecError::Base64Error`] - a member is not valid base64url
pub fn public_key_pem(jwk: &JsonWebKey) -> Result<String, CodecError> {
    let der = match jwk.kty.as_str() {
        KEY_TYPE_RSA | KEY_TYPE_RSA_HSM => rsa_public_key(&jwk.n, &jwk.e)?,
        KEY_TYPE_EC | KEY_TYPE_EC_HSM => ec_public_key(&jwk.crv, &jwk.x, &jwk.y)?,
        other => return Err(CodecError::UnsupportedKeyType(other.to_string())),
    };
    Ok(encode_block(PEM_PUBLIC_KEY, &der))
}

/// Curve OID and field size in bytes for a JWK curve name.
pub fn curve(crv: &str) -> Result<(ObjectIdentifier, usize), CodecError> {
    match crv {
        CURVE_P256 => Ok((OID_SECP256R1, 32)),
        CURVE_P384 => Ok((OID_SECP384R1, 48)),
        CURVE_P521 => Ok((OID_SECP521R1, 66)),
        other => Err(CodecError::UnsupportedCurve(other.to_string())),
    }
}

fn rsa_public_key(n: &str, e: &str) -> Result<Vec<u8>, CodecError> {
    let modulus = base64url_decode(n)?;
    let exponent = base64url_decode(e)?;
    if modulus.is_empty() || exponent.is_empty() {
        return Err(CodecError::InvalidObject(
            "RSA key is missing its modulus or exponent".to_string(),
        ));
    }

    let key = pkcs1::RsaPublicKey {
        modulus: UintRef::new(&modulus)?,
        public_exponent: UintRef::new(&exponent)?,
    };
    let key_der = key.to_der()?;

    let info = SubjectPublicKeyInfoRef {
        algorithm: AlgorithmIdentifierRef {
            oid: OID_RSA_ENCRYPTION,
            parameters: Some(AnyRef::NULL),
        },
        subject_public_key: BitStringRef::from_bytes(&key_der)?,
    };
    Ok(info.to_der()?)
}

fn ec_public_key(crv: &str, x: &str, y: &str) -> Result<Vec<u8>, CodecError> {
    let (curve_oid, size) = curve(crv)?;
    let x = base64url_decode(x)?;
    let y = base64url_decode(y)?;
    if x.is_empty() || y.is_empty() || x.len() > size || y.len() > size {
        return Err(CodecError::InvalidObject(format!(
            "invalid {crv} public key coordinates"
        )));
    }

    // uncompressed point: 0x04 || X || Y, each coordinate left-padded to the field size
    let mut point = vec![0u8; 1 + 2 * size];
    point[0] = 0x04;
    point[1 + size - x.len()..1 + size].copy_from_slice(&x);
    point[1 + 2 * size - y.len()..].copy_from_slice(&y);

    let info = SubjectPublicKeyInfoRef {
        algorithm: AlgorithmIdentifierRef {
            oid: OID_EC_PUBLIC_KEY,
            parameters: Some(AnyRef::from(&curve_oid)),
        },
        subject_public_key: BitStringRef::from_bytes(&point)?,
    };
    Ok(info.to_der()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse_blocks;
    use base64::prelude::BASE64_URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use pkcs8::der::Decode;

    fn decode_spki(pem: &str) -> Vec<u8> {
        let blocks = parse_blocks(pem).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag(), PEM_PUBLIC_KEY);
        blocks[0].contents().to_vec()
    }

    fn rsa_jwk(kty: &str, modulus: &[u8]) -> JsonWebKey {
        JsonWebKey {
            kty: kty.to_string(),
            n: BASE64_URL_SAFE_NO_PAD.encode(modulus),
            e: "AQAB".to_string(),
            ..Default::default()
        }
    }

    fn ec_jwk(crv: &str, size: usize) -> JsonWebKey {
        JsonWebKey {
            kty: KEY_TYPE_EC.to_string(),
            crv: crv.to_string(),
            x: BASE64_URL_SAFE_NO_PAD.encode(vec![0x11; size]),
            y: BASE64_URL_SAFE_NO_PAD.encode(vec![0x22; size]),
            ..Default::default()
        }
    }

    // ==================== RSA Tests ====================

    #[test]
    fn test_rsa_public_key_modulus_round_trips() {
        let mut modulus = vec![0xc5u8; 256];
        modulus[255] = 0x01;
        let pem = public_key_pem(&rsa_jwk(KEY_TYPE_RSA, &modulus)).unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));

        let der = decode_spki(&pem);
        let spki = SubjectPublicKeyInfoRef::from_der(&der).unwrap();
        assert_eq!(spki.algorithm.oid, OID_RSA_ENCRYPTION);

        let key = pkcs1::RsaPublicKey::from_der(spki.subject_public_key.raw_bytes()).unwrap();
        assert_eq!(key.modulus.as_bytes(), modulus.as_slice());
        assert_eq!(key.public_exponent.as_bytes(), &[1, 0, 1]);
    }

    #[test]
    fn test_rsa_hsm_public_key() {
        let pem = public_key_pem(&rsa_jwk(KEY_TYPE_RSA_HSM, &[0x7f; 128])).unwrap();
        assert!(pem.contains("PUBLIC KEY"));
    }

    #[test]
    fn test_rsa_public_key_missing_modulus() {
        let result = public_key_pem(&rsa_jwk(KEY_TYPE_RSA, &[]));
        assert!(matches!(result, Err(CodecError::InvalidObject(_))));
    }

    // ==================== EC Tests ====================

    #[test]
    fn test_ec_public_key_curves() {
        for (crv, oid, size) in [
            (CURVE_P256, OID_SECP256R1, 32),
            (CURVE_P384, OID_SECP384R1, 48),
            (CURVE_P521, OID_SECP521R1, 66),
        ] {
            let der = decode_spki(&public_key_pem(&ec_jwk(crv, size)).unwrap());
            let spki = SubjectPublicKeyInfoRef::from_der(&der).unwrap();
            assert_eq!(spki.algorithm.oid, OID_EC_PUBLIC_KEY);
            assert_eq!(spki.algorithm.parameters_oid().unwrap(), oid);

            let point = spki.subject_public_key.raw_bytes();
            assert_eq!(point.len(), 1 + 2 * size);
            assert_eq!(point[0], 0x04);
            assert_eq!(point[1], 0x11);
            assert_eq!(point[1 + size], 0x22);
        }
    }

    #[test]
    fn test_ec_public_key_pads_short_coordinates() {
        let mut jwk = ec_jwk(CURVE_P256, 32);
        jwk.x = BASE64_URL_SAFE_NO_PAD.encode([0x33; 31]);
        let der = decode_spki(&public_key_pem(&jwk).unwrap());
        let spki = SubjectPublicKeyInfoRef::from_der(&der).unwrap();
        let point = spki.subject_public_key.raw_bytes();
        assert_eq!(point[1], 0x00);
        assert_eq!(point[2], 0x33);
    }

    #[test]
    fn test_ec_hsm_public_key() {
        let mut jwk = ec_jwk(CURVE_P384, 48);
        jwk.kty = KEY_TYPE_EC_HSM.to_string();
        assert!(public_key_pem(&jwk).is_ok());
    }

    #[test]
    fn test_ec_public_key_oversized_coordinate() {
        let mut jwk = ec_jwk(CURVE_P256, 32);
        jwk.y = BASE64_URL_SAFE_NO_PAD.encode([0x44; 33]);
        assert!(matches!(
            public_key_pem(&jwk),
            Err(CodecError::InvalidObject(_))
        ));
    }

    // ==================== Unsupported Tests ====================

    #[test]
    fn test_unsupported_curve() {
        let err = public_key_pem(&ec_jwk("P-256K", 32)).unwrap_err();
        assert_eq!(err.to_string(), "curve P-256K is not supported");
    }

    #[test]
    fn test_unsupported_key_type() {
        let jwk = JsonWebKey {
            kty: "oct".to_string(),
            ..Default::default()
        };
        let err = public_key_pem(&jwk).unwrap_err();
        assert_eq!(err.to_string(), "key type 'oct' currently not supported");
    }

    #[test]
    fn test_curve_lookup() {
        assert_eq!(curve(CURVE_P384).unwrap(), (OID_SECP384R1, 48));
        assert!(curve("").is_err());
    }
}
