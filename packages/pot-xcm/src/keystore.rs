//! polkadot.js JSON keystores
//!
//! The `encoded` field is base64 of
//!
//! ```text
//! salt (32) | N (u32 LE) | p (u32 LE) | r (u32 LE) | nonce (24) | sealed box
//! ```
//!
//! The box key is `scrypt(password, salt, N, r, p)`, the box is
//! xsalsa20-poly1305, and it opens to a PKCS8 blob holding the sr25519 secret
//! (64 bytes, ed25519 form) and public key.

use crate::address::decode_ss58;
use crate::error::PotXcmError;
use base64::prelude::*;
use crypto_secretbox::aead::{Aead, KeyInit, Nonce};
use crypto_secretbox::XSalsa20Poly1305;
use schnorrkel::{PublicKey, SecretKey};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

const SALT_LEN: usize = 32;
const SCRYPT_HEADER_LEN: usize = SALT_LEN + 12;
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

const PKCS8_HEADER: [u8; 16] = [
    0x30, 0x53, 0x02, 0x01, 0x01, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];
const PKCS8_DIVIDER: [u8; 5] = [0xa1, 0x23, 0x03, 0x21, 0x00];
const SECRET_LEN: usize = 64;
const PUBLIC_LEN: usize = 32;
const PKCS8_LEN: usize = PKCS8_HEADER.len() + SECRET_LEN + PKCS8_DIVIDER.len() + PUBLIC_LEN;

/// Signing context of Substrate sr25519 signatures
const SIGNING_CTX: &[u8] = b"substrate";

#[derive(Debug, Deserialize)]
struct Encoding {
    content: Vec<String>,
    #[serde(rename = "type")]
    kind: Vec<String>,
    version: String,
}

impl Encoding {
    fn is_encrypted(&self) -> bool {
        self.kind.iter().any(|k| k == "xsalsa20-poly1305")
    }
}

/// An exported account, as written by polkadot.js apps and extensions
#[derive(Debug, Deserialize)]
pub struct JsonKeystore {
    pub address: Option<String>,
    encoded: String,
    encoding: Encoding,
}

impl JsonKeystore {
    pub fn from_json(json: &str) -> Result<Self, PotXcmError> {
        serde_json::from_str(json)
            .map_err(|e| PotXcmError::Keystore(format!("invalid keystore: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, PotXcmError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PotXcmError::Keystore(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Open the keystore; `password` is ignored for unencrypted exports
    pub fn decrypt(&self, password: &str) -> Result<KeystoreKeypair, PotXcmError> {
        if !self.encoding.content.iter().any(|c| c == "sr25519") {
            return Err(PotXcmError::Keystore(format!(
                "unsupported key type {:?}, only sr25519 keystores are supported",
                self.encoding.content
            )));
        }

        let encoded = BASE64_STANDARD
            .decode(self.encoded.trim())
            .map_err(|e| PotXcmError::Keystore(format!("invalid base64: {}", e)))?;

        let pkcs8 = if self.encoding.is_encrypted() {
            if self.encoding.version != "3" || !self.encoding.kind.iter().any(|k| k == "scrypt") {
                return Err(PotXcmError::Keystore(format!(
                    "unsupported keystore version {}, expected scrypt (version 3)",
                    self.encoding.version
                )));
            }
            open_sealed(&encoded, password)?
        } else {
            encoded
        };

        let keypair = KeystoreKeypair::from_pkcs8(&pkcs8)?;
        if let Some(address) = &self.address {
            let (public, _) = decode_ss58(address)?;
            if public != keypair.public_key() {
                return Err(PotXcmError::Keystore(format!(
                    "key does not belong to address {}",
                    address
                )));
            }
        }
        Ok(keypair)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn open_sealed(encoded: &[u8], password: &str) -> Result<Vec<u8>, PotXcmError> {
    if encoded.len() <= SCRYPT_HEADER_LEN + NONCE_LEN {
        return Err(PotXcmError::Keystore(format!(
            "encoded key of {} bytes is too short",
            encoded.len()
        )));
    }
    let (header, rest) = encoded.split_at(SCRYPT_HEADER_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let salt = &header[..SALT_LEN];
    let n = read_u32(header, SALT_LEN);
    let p = read_u32(header, SALT_LEN + 4);
    let r = read_u32(header, SALT_LEN + 8);
    if !n.is_power_of_two() {
        return Err(PotXcmError::Keystore(format!(
            "scrypt N = {} is not a power of two",
            n
        )));
    }
    debug!(n, p, r, "deriving keystore key");

    let params = scrypt::Params::new(n.trailing_zeros() as u8, r, p, KEY_LEN)
        .map_err(|e| PotXcmError::Keystore(format!("invalid scrypt parameters: {}", e)))?;
    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key)
        .map_err(|e| PotXcmError::Keystore(format!("scrypt failed: {}", e)))?;

    let cipher = XSalsa20Poly1305::new_from_slice(&key)
        .map_err(|e| PotXcmError::Keystore(format!("invalid box key: {}", e)))?;
    cipher
        .decrypt(Nonce::<XSalsa20Poly1305>::from_slice(nonce), sealed)
        .map_err(|_| {
            PotXcmError::Keystore("wrong password or corrupted keystore".to_string())
        })
}

/// sr25519 keypair recovered from a keystore
pub struct KeystoreKeypair(schnorrkel::Keypair);

impl KeystoreKeypair {
    fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, PotXcmError> {
        let divider_at = PKCS8_HEADER.len() + SECRET_LEN;
        let public_at = divider_at + PKCS8_DIVIDER.len();
        if pkcs8.len() != PKCS8_LEN
            || pkcs8[..PKCS8_HEADER.len()] != PKCS8_HEADER
            || pkcs8[divider_at..public_at] != PKCS8_DIVIDER
        {
            return Err(PotXcmError::Keystore(
                "decrypted key is not an sr25519 PKCS8 blob".to_string(),
            ));
        }

        let secret = SecretKey::from_ed25519_bytes(&pkcs8[PKCS8_HEADER.len()..divider_at])
            .map_err(|e| PotXcmError::Keystore(format!("invalid secret key: {}", e)))?;
        let public = PublicKey::from_bytes(&pkcs8[public_at..])
            .map_err(|e| PotXcmError::Keystore(format!("invalid public key: {}", e)))?;
        if secret.to_public() != public {
            return Err(PotXcmError::Keystore(
                "public key does not match the secret".to_string(),
            ));
        }
        Ok(Self(schnorrkel::Keypair { secret, public }))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.0.public.to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.0.sign_simple(SIGNING_CTX, message).to_bytes()
    }
}

impl fmt::Debug for KeystoreKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeystoreKeypair")
            .field(&hex::encode(self.public_key()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::Seed;
    use schnorrkel::{ExpansionMode, MiniSecretKey, Signature};

    /// Secret seed of `//Alice`
    const ALICE_SEED: &str = "e5be9a5092b81bca64be81d212e7f2f9eba183bb7a90954f7b76361f6edb5c0a";
    const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_ADDRESS: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const PASSWORD: &str = "correct horse";

    fn alice_pkcs8() -> Vec<u8> {
        let seed = hex::decode(ALICE_SEED).unwrap();
        let pair = MiniSecretKey::from_bytes(&seed)
            .unwrap()
            .expand_to_keypair(ExpansionMode::Ed25519);

        let mut pkcs8 = PKCS8_HEADER.to_vec();
        pkcs8.extend_from_slice(&pair.secret.to_ed25519_bytes());
        pkcs8.extend_from_slice(&PKCS8_DIVIDER);
        pkcs8.extend_from_slice(&pair.public.to_bytes());
        pkcs8
    }

    /// Seal the way polkadot.js exports; N is kept small for test speed
    fn seal(pkcs8: &[u8], password: &str) -> Vec<u8> {
        let salt = [7u8; SALT_LEN];
        let nonce = [9u8; NONCE_LEN];
        let (log_n, p, r) = (10u8, 1u32, 8u32);

        let mut key = [0u8; KEY_LEN];
        let params = scrypt::Params::new(log_n, r, p, KEY_LEN).unwrap();
        scrypt::scrypt(password.as_bytes(), &salt, &params, &mut key).unwrap();
        let sealed = XSalsa20Poly1305::new_from_slice(&key)
            .unwrap()
            .encrypt(Nonce::<XSalsa20Poly1305>::from_slice(&nonce), pkcs8)
            .unwrap();

        let mut out = salt.to_vec();
        out.extend_from_slice(&(1u32 << log_n).to_le_bytes());
        out.extend_from_slice(&p.to_le_bytes());
        out.extend_from_slice(&r.to_le_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        out
    }

    fn keystore_json(encoded: &[u8], kind: &str, address: &str) -> String {
        format!(
            r#"{{
                "address": "{}",
                "encoded": "{}",
                "encoding": {{ "content": ["pkcs8", "sr25519"], "type": {}, "version": "3" }},
                "meta": {{ "name": "alice", "whenCreated": 1700000000000 }}
            }}"#,
            address,
            BASE64_STANDARD.encode(encoded),
            kind
        )
    }

    fn alice_keystore() -> JsonKeystore {
        let encoded = seal(&alice_pkcs8(), PASSWORD);
        let json = keystore_json(&encoded, r#"["scrypt", "xsalsa20-poly1305"]"#, ALICE_ADDRESS);
        JsonKeystore::from_json(&json).unwrap()
    }

    #[test]
    fn test_decrypts_alice() {
        let keypair = alice_keystore().decrypt(PASSWORD).unwrap();
        assert_eq!(hex::encode(keypair.public_key()), ALICE_PUBLIC);

        let from_uri = Seed::parse("//Alice").unwrap().keypair().unwrap();
        assert_eq!(keypair.public_key(), from_uri.public_key().0);
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = alice_keystore().decrypt(PASSWORD).unwrap();
        let signature = Signature::from_bytes(&keypair.sign(b"payload")).unwrap();
        let public = PublicKey::from_bytes(&keypair.public_key()).unwrap();
        assert!(public
            .verify_simple(SIGNING_CTX, b"payload", &signature)
            .is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let err = alice_keystore().decrypt("wrong").unwrap_err();
        assert_eq!(err.kind(), "KeystoreError");
        assert!(err.to_string().contains("wrong password"));
    }

    #[test]
    fn test_unencrypted_export() {
        let json = keystore_json(&alice_pkcs8(), r#"["none"]"#, ALICE_ADDRESS);
        let keypair = JsonKeystore::from_json(&json).unwrap().decrypt("").unwrap();
        assert_eq!(hex::encode(keypair.public_key()), ALICE_PUBLIC);
    }

    #[test]
    fn test_address_mismatch() {
        let bob = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
        let encoded = seal(&alice_pkcs8(), PASSWORD);
        let json = keystore_json(&encoded, r#"["scrypt", "xsalsa20-poly1305"]"#, bob);
        let err = JsonKeystore::from_json(&json)
            .unwrap()
            .decrypt(PASSWORD)
            .unwrap_err();
        assert_eq!(err.kind(), "KeystoreError");
    }

    #[test]
    fn test_truncated_and_malformed() {
        let short = keystore_json(&[0u8; 40], r#"["scrypt", "xsalsa20-poly1305"]"#, ALICE_ADDRESS);
        let err = JsonKeystore::from_json(&short)
            .unwrap()
            .decrypt(PASSWORD)
            .unwrap_err();
        assert!(err.to_string().contains("too short"));

        let mut pkcs8 = alice_pkcs8();
        pkcs8[0] = 0;
        let json = keystore_json(&pkcs8, r#"["none"]"#, ALICE_ADDRESS);
        let err = JsonKeystore::from_json(&json).unwrap().decrypt("").unwrap_err();
        assert_eq!(err.kind(), "KeystoreError");

        let err = JsonKeystore::from_json("{}").unwrap_err();
        assert_eq!(err.kind(), "KeystoreError");
    }
}
