pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod peers;
pub mod scheduler;
pub mod signature;

pub use chain::Blockchain;
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub type Hash = [u8; 32];

/// A value transfer between two blockchain addresses.
///
/// Fields are private: a transaction is never edited once built, only copied
/// into the pending pool and from there into a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "sender_blockchain_address")]
    sender: String,
    #[serde(rename = "recipient_blockchain_address")]
    recipient: String,
    value: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: i64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Canonical JSON bytes; the message covered by the sender's signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("transaction json encoding is infallible")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64,
    nonce: u64,
    #[serde(with = "hex_hash")]
    previous_hash: Hash,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn hash(&self) -> Hash {
        hash_block_fields(
            self.timestamp,
            self.nonce,
            &self.previous_hash,
            &self.transactions,
        )
    }
}

/// Borrowed view with the exact field order and encoding of a serialized `Block`.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    timestamp: i64,
    nonce: u64,
    #[serde(serialize_with = "hex_hash::serialize")]
    previous_hash: &'a Hash,
    transactions: &'a [Transaction],
}

/// SHA-256 of the canonical JSON encoding
/// `{"timestamp":..,"nonce":..,"previous_hash":"<64 hex>","transactions":[..]}`.
///
/// Takes the fields by reference so the nonce search never clones the candidate
/// transaction list.
pub fn hash_block_fields(
    timestamp: i64,
    nonce: u64,
    previous_hash: &Hash,
    transactions: &[Transaction],
) -> Hash {
    let candidate = CanonicalBlock {
        timestamp,
        nonce,
        previous_hash,
        transactions,
    };
    let bytes = serde_json::to_vec(&candidate).expect("block json encoding is infallible");
    sha256(&bytes)
}

pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Wall clock in nanoseconds since the unix epoch.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

/// Serde adapter writing a digest as 64 lowercase hex characters.
pub mod hex_hash {
    use super::Hash;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(hash: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Hash, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&text, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

pub mod pow {
    use super::{hash_block_fields, Hash, Transaction};

    /// Number of leading `'0'` characters in the hex rendering of `hash`.
    pub fn count_leading_zero_nibbles(hash: &Hash) -> usize {
        let mut total = 0;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
        count_leading_zero_nibbles(hash) >= difficulty
    }

    /// Checks the puzzle for a candidate block. The timestamp is pinned to 0 so a
    /// validator does not need to know when the block was actually mined.
    pub fn validate_proof(
        nonce: u64,
        previous_hash: &Hash,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> bool {
        let guess = hash_block_fields(0, nonce, previous_hash, transactions);
        meets_difficulty(&guess, difficulty)
    }
}
