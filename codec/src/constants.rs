// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use pkcs8::ObjectIdentifier;

pub const OBJECT_TYPE_SECRET: &str = "secret";
pub const OBJECT_TYPE_KEY: &str = "key";
pub const OBJECT_TYPE_CERT: &str = "cert";

pub const CONTENT_TYPE_PEM: &str = "application/x-pem-file";
pub const CONTENT_TYPE_PKCS12: &str = "application/x-pkcs12";

pub const OBJECT_FORMAT_PEM: &str = "pem";
pub const OBJECT_FORMAT_PFX: &str = "pfx";

pub const OBJECT_ENCODING_UTF8: &str = "utf-8";
pub const OBJECT_ENCODING_BASE64: &str = "base64";
pub const OBJECT_ENCODING_HEX: &str = "hex";

pub const PEM_CERTIFICATE: &str = "CERTIFICATE";
pub const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";
pub const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";

pub const KEY_TYPE_RSA: &str = "RSA";
pub const KEY_TYPE_RSA_HSM: &str = "RSA-HSM";
pub const KEY_TYPE_EC: &str = "EC";
pub const KEY_TYPE_EC_HSM: &str = "EC-HSM";

pub const CURVE_P256: &str = "P-256";
pub const CURVE_P384: &str = "P-384";
pub const CURVE_P521: &str = "P-521";

/// rsaEncryption (RFC 8017)
pub const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// id-ecPublicKey (RFC 5480)
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const OID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub const OID_SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

pub const SOFT_HYPHEN: char = '\u{00AD}';
