//! Sender authentication for submitted transfers.
//!
//! Keys and signatures travel as hex text: a public key is the two 32-byte P-256
//! affine coordinates `X‖Y`, a signature the two 32-byte scalars `R‖S`. The signed
//! message is the canonical JSON of the [`Transaction`], hashed with SHA-256.

use crate::constants::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::{LedgerError, Result};
use crate::Transaction;
use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_FIXED};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SEC1 tag of an uncompressed curve point.
const UNCOMPRESSED_TAG: u8 = 0x04;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SenderPublicKey([u8; PUBLIC_KEY_SIZE]);

impl SenderPublicKey {
    /// Parses `X‖Y` as 128 hex characters.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut raw = [0u8; PUBLIC_KEY_SIZE];
        hex::decode_to_slice(text, &mut raw)
            .map_err(|e| LedgerError::InvalidPublicKey(e.to_string()))?;
        Ok(Self(raw))
    }

    /// Accepts either the raw 64-byte `X‖Y` form or the 65-byte SEC1 uncompressed
    /// point produced by most key libraries.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = match bytes {
            [UNCOMPRESSED_TAG, rest @ ..] if rest.len() == PUBLIC_KEY_SIZE => rest,
            _ if bytes.len() == PUBLIC_KEY_SIZE => bytes,
            _ => {
                return Err(LedgerError::InvalidPublicKey(format!(
                    "expected {} or {} bytes, got {}",
                    PUBLIC_KEY_SIZE,
                    PUBLIC_KEY_SIZE + 1,
                    bytes.len()
                )))
            }
        };
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(raw);
        Ok(Self(out))
    }

    fn to_uncompressed(self) -> [u8; PUBLIC_KEY_SIZE + 1] {
        let mut out = [0u8; PUBLIC_KEY_SIZE + 1];
        out[0] = UNCOMPRESSED_TAG;
        out[1..].copy_from_slice(&self.0);
        out
    }
}

impl fmt::Display for SenderPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for SenderPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderPublicKey({self})")
    }
}

impl FromStr for SenderPublicKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature([u8; SIGNATURE_SIZE]);

impl TransactionSignature {
    /// Parses `R‖S` as 128 hex characters.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut raw = [0u8; SIGNATURE_SIZE];
        hex::decode_to_slice(text, &mut raw)
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;
        Ok(Self(raw))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; SIGNATURE_SIZE] = bytes.try_into().map_err(|_| {
            LedgerError::InvalidSignature(format!(
                "expected {SIGNATURE_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }
}

impl fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionSignature({self})")
    }
}

impl FromStr for TransactionSignature {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

pub fn verify_transaction_signature(
    public_key: &SenderPublicKey,
    signature: &TransactionSignature,
    transaction: &Transaction,
) -> bool {
    let key = UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key.to_uncompressed());
    key.verify(&transaction.canonical_bytes(), &signature.0).is_ok()
}

/// Wire body of `POST`/`PUT /transactions`. Every field is optional so a
/// malformed body still decodes and can be rejected with a reason.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub value: Option<i64>,
    pub signature: Option<String>,
}

/// A decoded request: the transfer plus the material needed to authenticate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub public_key: SenderPublicKey,
    pub signature: TransactionSignature,
}

impl TransactionRequest {
    pub fn validate(&self) -> Result<SignedTransaction> {
        let sender = self
            .sender_blockchain_address
            .as_ref()
            .ok_or(LedgerError::MissingField("sender_blockchain_address"))?;
        let recipient = self
            .recipient_blockchain_address
            .as_ref()
            .ok_or(LedgerError::MissingField("recipient_blockchain_address"))?;
        let public_key = self
            .sender_public_key
            .as_deref()
            .ok_or(LedgerError::MissingField("sender_public_key"))?;
        let value = self.value.ok_or(LedgerError::MissingField("value"))?;
        let signature = self
            .signature
            .as_deref()
            .ok_or(LedgerError::MissingField("signature"))?;

        Ok(SignedTransaction {
            transaction: Transaction::new(sender.as_str(), recipient.as_str(), value),
            public_key: public_key.parse()?,
            signature: signature.parse()?,
        })
    }
}

impl SignedTransaction {
    pub fn verify(&self) -> bool {
        verify_transaction_signature(&self.public_key, &self.signature, &self.transaction)
    }

    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some(self.transaction.sender().to_string()),
            recipient_blockchain_address: Some(self.transaction.recipient().to_string()),
            sender_public_key: Some(self.public_key.to_string()),
            value: Some(self.transaction.value()),
            signature: Some(self.signature.to_string()),
        }
    }
}
