#![allow(dead_code)]

use async_trait::async_trait;
use ledger_core::peers::PeerClient;
use ledger_core::signature::{SenderPublicKey, TransactionRequest, TransactionSignature};
use ledger_core::{LedgerError, Transaction};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use std::sync::Mutex;
use std::time::Duration;

/// A throwaway P-256 key pair standing in for a user's wallet.
pub struct TestWallet {
    pair: EcdsaKeyPair,
    pub address: String,
}

impl TestWallet {
    pub fn new(label: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("Failed to generate key pair");
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
            .expect("Failed to load key pair");
        Self {
            pair,
            address: label.to_string(),
        }
    }

    pub fn public_key(&self) -> SenderPublicKey {
        SenderPublicKey::from_bytes(self.pair.public_key().as_ref()).expect("P-256 public key")
    }

    pub fn sign(&self, tx: &Transaction) -> TransactionSignature {
        let sig = self
            .pair
            .sign(&SystemRandom::new(), &tx.canonical_bytes())
            .expect("Failed to sign");
        TransactionSignature::from_bytes(sig.as_ref()).expect("fixed-size signature")
    }

    /// A signed wire request for `value` from this wallet to `recipient`.
    pub fn transfer(&self, recipient: &str, value: i64) -> TransactionRequest {
        let tx = Transaction::new(self.address.as_str(), recipient, value);
        TransactionRequest {
            sender_blockchain_address: Some(self.address.clone()),
            recipient_blockchain_address: Some(recipient.to_string()),
            sender_public_key: Some(self.public_key().to_string()),
            value: Some(value),
            signature: Some(self.sign(&tx).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    Broadcast(String, TransactionRequest),
    Clear(String),
}

/// Records every outbound call; optionally fails or stalls them.
#[derive(Default)]
pub struct RecordingClient {
    pub calls: Mutex<Vec<PeerCall>>,
    pub fail: bool,
    pub stall: Option<Duration>,
}

impl RecordingClient {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stalling(delay: Duration) -> Self {
        Self {
            stall: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PeerCall> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|c| format!("{c:?}"));
        calls
    }

    async fn record(&self, call: PeerCall) -> ledger_core::Result<()> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        let peer = match &call {
            PeerCall::Broadcast(peer, _) | PeerCall::Clear(peer) => peer.clone(),
        };
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(LedgerError::peer(peer, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerClient for RecordingClient {
    async fn broadcast_transaction(
        &self,
        peer: &str,
        request: &TransactionRequest,
    ) -> ledger_core::Result<()> {
        self.record(PeerCall::Broadcast(peer.to_string(), request.clone()))
            .await
    }

    async fn clear_transactions(&self, peer: &str) -> ledger_core::Result<()> {
        self.record(PeerCall::Clear(peer.to_string())).await
    }
}
