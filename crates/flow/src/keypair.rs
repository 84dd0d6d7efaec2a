use p256::ecdsa::signature::hazmat::PrehashSigner;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha2_256,
    Sha3_256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha2_256 => "SHA2_256",
            HashAlgorithm::Sha3_256 => "SHA3_256",
        }
    }

    fn digest(&self, message: &[u8]) -> [u8; 32] {
        match self {
            HashAlgorithm::Sha2_256 => Sha256::digest(message).into(),
            HashAlgorithm::Sha3_256 => Sha3_256::digest(message).into(),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SHA2_256" => Ok(HashAlgorithm::Sha2_256),
            "SHA3_256" => Ok(HashAlgorithm::Sha3_256),
            _ => Err(Error::InvalidConfiguration(format!(
                "Unknown hash algorithm: {}. Please use 'SHA2_256' or 'SHA3_256'.",
                s
            ))),
        }
    }
}

/// Curve the private key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    EcdsaP256,
    EcdsaSecp256k1,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256 => "ECDSA_P256",
            SignatureAlgorithm::EcdsaSecp256k1 => "ECDSA_secp256k1",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "ECDSA_P256" | "P256" => Ok(SignatureAlgorithm::EcdsaP256),
            "ECDSA_SECP256K1" | "SECP256K1" => Ok(SignatureAlgorithm::EcdsaSecp256k1),
            _ => Err(Error::InvalidConfiguration(format!(
                "Unknown signature algorithm: {}. Please use 'ECDSA_P256' or 'ECDSA_secp256k1'.",
                s
            ))),
        }
    }
}

/// Where the private key material lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Local,
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(KeyType::Local),
            _ => Err(Error::InvalidConfiguration(format!(
                "Unsupported private key type: {}. Only 'local' is supported.",
                s
            ))),
        }
    }
}

/// Stored credential material for an account, as supplied by configuration
#[derive(Clone)]
pub struct Credential {
    pub key_type: KeyType,
    pub private_key: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub hash_algorithm: HashAlgorithm,
}

impl Credential {
    /// A local ECDSA P-256 key
    pub fn local(private_key: impl Into<String>, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            key_type: KeyType::Local,
            private_key: private_key.into(),
            signature_algorithm: SignatureAlgorithm::EcdsaP256,
            hash_algorithm,
        }
    }

    pub fn with_signature_algorithm(mut self, signature_algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = signature_algorithm;
        self
    }

    /// Decode the credential into a signer
    pub fn signer(&self) -> Result<AccountSigner> {
        match self.key_type {
            KeyType::Local => AccountSigner::from_hex(
                &self.private_key,
                self.signature_algorithm,
                self.hash_algorithm,
            ),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key_type", &self.key_type)
            .field("private_key", &"<redacted>")
            .field("signature_algorithm", &self.signature_algorithm)
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}

enum SigningKey {
    P256(p256::ecdsa::SigningKey),
    Secp256k1 {
        secp: Secp256k1<All>,
        secret_key: SecretKey,
        public_key: PublicKey,
    },
}

/// ECDSA signer over arbitrary message bytes
pub struct AccountSigner {
    key: SigningKey,
    signature_algorithm: SignatureAlgorithm,
    hash_algorithm: HashAlgorithm,
}

impl AccountSigner {
    pub fn from_hex(
        private_key_hex: &str,
        signature_algorithm: SignatureAlgorithm,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let trimmed = private_key_hex.trim();
        let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::InvalidConfiguration(format!("Failed to decode private key: {}", e)))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidConfiguration(format!(
                "Private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        let key = match signature_algorithm {
            SignatureAlgorithm::EcdsaP256 => {
                let signing_key = p256::ecdsa::SigningKey::from_slice(&bytes).map_err(|e| {
                    Error::InvalidConfiguration(format!("Invalid P-256 private key: {}", e))
                })?;
                SigningKey::P256(signing_key)
            }
            SignatureAlgorithm::EcdsaSecp256k1 => {
                let secret_key = SecretKey::from_slice(&bytes).map_err(|e| {
                    Error::InvalidConfiguration(format!("Invalid secp256k1 private key: {}", e))
                })?;
                let secp = Secp256k1::new();
                let public_key = PublicKey::from_secret_key(&secp, &secret_key);
                SigningKey::Secp256k1 {
                    secp,
                    secret_key,
                    public_key,
                }
            }
        };

        Ok(Self {
            key,
            signature_algorithm,
            hash_algorithm,
        })
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Signature as `r || s`, 64 bytes
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = self.hash_algorithm.digest(message);
        match &self.key {
            SigningKey::P256(signing_key) => {
                let sig: p256::ecdsa::Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| Error::Signing(e.to_string()))?;
                Ok(sig.to_bytes().to_vec())
            }
            SigningKey::Secp256k1 {
                secp, secret_key, ..
            } => {
                let sig = secp.sign_ecdsa(&Message::from_digest(digest), secret_key);
                Ok(sig.serialize_compact().to_vec())
            }
        }
    }

    /// Uncompressed public key without the 0x04 prefix, 64 bytes
    pub fn public_key(&self) -> [u8; 64] {
        let mut pk = [0u8; 64];
        match &self.key {
            SigningKey::P256(signing_key) => {
                let point = signing_key.verifying_key().to_encoded_point(false);
                pk.copy_from_slice(&point.as_bytes()[1..]);
            }
            SigningKey::Secp256k1 { public_key, .. } => {
                pk.copy_from_slice(&public_key.serialize_uncompressed()[1..]);
            }
        }
        pk
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }
}

impl fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSigner")
            .field("public_key", &self.public_key_hex())
            .field("signature_algorithm", &self.signature_algorithm)
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}
