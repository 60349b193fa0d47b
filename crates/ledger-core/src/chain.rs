use crate::config::LedgerConfig;
use crate::constants::MINING_SENDER;
use crate::error::{LedgerError, Result};
use crate::mine::mine_block;
use crate::peers::{NoopPeerClient, PeerClient, PeerRegistry};
use crate::pow::validate_proof;
use crate::signature::{
    verify_transaction_signature, SenderPublicKey, TransactionRequest, TransactionSignature,
};
use crate::{now_nanos, Block, Transaction};
use futures_util::future::join_all;
use rayon::prelude::*;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    transaction_pool: Vec<Transaction>,
}

impl LedgerState {
    fn last_block(&self) -> &Block {
        // The genesis block is pushed on construction and blocks are never removed.
        &self.chain[self.chain.len() - 1]
    }
}

/// The single-node ledger: the block sequence, the pending pool and the peers
/// that hear about new transactions.
///
/// `chain` and the pending pool sit behind one async mutex. Mining keeps it for
/// the whole nonce search, so admissions queue up behind a mining round and the
/// set of transactions being mined can't change underneath it.
pub struct Blockchain {
    state: Mutex<LedgerState>,
    blockchain_address: String,
    config: LedgerConfig,
    peers: PeerRegistry,
    client: Arc<dyn PeerClient>,
}

impl Blockchain {
    /// A standalone ledger paying mining rewards to `blockchain_address`.
    pub fn new(blockchain_address: impl Into<String>, config: LedgerConfig) -> Result<Self> {
        Self::with_peer_client(blockchain_address, config, Arc::new(NoopPeerClient))
    }

    pub fn with_peer_client(
        blockchain_address: impl Into<String>,
        config: LedgerConfig,
        client: Arc<dyn PeerClient>,
    ) -> Result<Self> {
        config.validate()?;
        let genesis = Block::new(now_nanos(), 0, Block::default().hash(), Vec::new());
        Ok(Self {
            state: Mutex::new(LedgerState {
                chain: vec![genesis],
                transaction_pool: Vec::new(),
            }),
            blockchain_address: blockchain_address.into(),
            config,
            peers: PeerRegistry::new(),
            client,
        })
    }

    pub fn blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub async fn snapshot_chain(&self) -> Vec<Block> {
        self.state.lock().await.chain.clone()
    }

    pub async fn last_block(&self) -> Block {
        self.state.lock().await.last_block().clone()
    }

    pub async fn transaction_pool(&self) -> Vec<Transaction> {
        self.state.lock().await.transaction_pool.clone()
    }

    pub async fn clear_transaction_pool(&self) {
        let mut state = self.state.lock().await;
        debug!(dropped = state.transaction_pool.len(), "transaction pool cleared");
        state.transaction_pool.clear();
    }

    /// Admits `transaction` into the pending pool after checking its signature.
    ///
    /// A transaction from the reward sender is admitted without a signature.
    /// Balances are not checked.
    pub async fn add_transaction(
        &self,
        transaction: Transaction,
        public_key: Option<&SenderPublicKey>,
        signature: Option<&TransactionSignature>,
    ) -> bool {
        if transaction.sender() != MINING_SENDER {
            let verified = match (public_key, signature) {
                (Some(key), Some(sig)) => verify_transaction_signature(key, sig, &transaction),
                _ => false,
            };
            if !verified {
                warn!(
                    sender = transaction.sender(),
                    recipient = transaction.recipient(),
                    "Error: Verify Transaction"
                );
                return false;
            }
        }

        let mut state = self.state.lock().await;
        debug!(?transaction, "transaction pooled");
        state.transaction_pool.push(transaction);
        true
    }

    /// Admits a transaction relayed by a peer. No rebroadcast.
    pub async fn add_transaction_request(&self, request: &TransactionRequest) -> Result<bool> {
        let signed = request.validate()?;
        if signed.transaction.sender() == MINING_SENDER {
            return Err(LedgerError::ReservedSender);
        }
        Ok(self
            .add_transaction(
                signed.transaction,
                Some(&signed.public_key),
                Some(&signed.signature),
            )
            .await)
    }

    /// Admits a transaction submitted by a wallet and relays it to every known
    /// peer. Relay failures are logged; the local admission stands.
    pub async fn create_transaction(&self, request: &TransactionRequest) -> Result<bool> {
        let admitted = self.add_transaction_request(request).await?;
        if admitted {
            let client = &self.client;
            self.for_each_peer("broadcast transaction", |peer| async move {
                client.broadcast_transaction(&peer, request).await
            })
            .await;
        }
        Ok(admitted)
    }

    /// One mining round. Returns `None` when the pool is empty; the reward is
    /// only paid when there is other work to include.
    ///
    /// The pool is only modified once a block has been appended. Dropping the
    /// returned future mid-search leaves the ledger untouched and stops the
    /// search.
    pub async fn mine_once(&self) -> Result<Option<Block>> {
        let mut state = self.state.lock().await;
        if state.transaction_pool.is_empty() {
            debug!("pending pool empty, nothing to mine");
            return Ok(None);
        }

        let mut snapshot = state.transaction_pool.clone();
        snapshot.push(Transaction::new(
            MINING_SENDER,
            self.blockchain_address.as_str(),
            self.config.reward,
        ));
        let previous_hash = state.last_block().hash();
        let difficulty = self.config.difficulty;

        let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
        let flag = cancel.0.clone();
        let search = tokio::task::spawn_blocking(move || {
            mine_block(previous_hash, snapshot, difficulty, &flag)
        });
        let Some((block, _hash)) = search.await? else {
            return Ok(None);
        };

        state.chain.push(block.clone());
        state.transaction_pool.clear();
        Ok(Some(block))
    }

    /// Runs a mining round and, on success, tells every peer to clear its pool.
    pub async fn mining(&self) -> bool {
        match self.mine_once().await {
            Ok(Some(_)) => {
                let client = &self.client;
                self.for_each_peer("clear transactions", |peer| async move {
                    client.clear_transactions(&peer).await
                })
                .await;
                info!("action=mining, status=success");
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("action=mining, status=failed: {e}");
                false
            }
        }
    }

    /// Net value received by `address` across every mined block. Pending
    /// transactions don't count. Totals beyond the `i64` range saturate.
    pub async fn balance_of(&self, address: &str) -> i64 {
        let state = self.state.lock().await;
        let mut total = 0i128;
        for block in &state.chain {
            for tx in block.transactions() {
                if tx.recipient() == address {
                    total += i128::from(tx.value());
                }
                if tx.sender() == address {
                    total -= i128::from(tx.value());
                }
            }
        }
        i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn valid_chain(&self, chain: &[Block]) -> bool {
        valid_chain(chain, self.config.difficulty)
    }

    /// Validates a snapshot of the ledger's own chain on the blocking pool.
    pub async fn is_valid(&self) -> bool {
        let chain = self.snapshot_chain().await;
        let difficulty = self.config.difficulty;
        match tokio::task::spawn_blocking(move || valid_chain(&chain, difficulty)).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("chain validation failed to run: {e}");
                false
            }
        }
    }

    /// Calls every known peer concurrently, each call bounded by the configured
    /// timeout. Failures are logged and otherwise ignored.
    async fn for_each_peer<'a, F, Fut>(&'a self, action: &'static str, call: F)
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<()>> + 'a,
    {
        let peers = self.peers.snapshot();
        if peers.is_empty() {
            return;
        }
        let timeout = self.config.peer_timeout;
        let calls = peers.into_iter().map(|peer| {
            let request = call(peer.clone());
            async move {
                let outcome = match tokio::time::timeout(timeout, request).await {
                    Ok(result) => result,
                    Err(_) => Err(LedgerError::peer(&peer, format!("timed out after {timeout:?}"))),
                };
                match outcome {
                    Ok(()) => debug!(peer, action, "peer call succeeded"),
                    Err(e) => warn!(action, "peer call failed: {e}"),
                }
            }
        });
        join_all(calls).await;
    }
}

/// Stops the nonce search it was created for when a mining round is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Checks linkage and proof-of-work of every block after genesis. The genesis
/// block itself is never puzzle-checked.
pub fn valid_chain(chain: &[Block], difficulty: usize) -> bool {
    if chain.is_empty() {
        return false;
    }
    chain.par_windows(2).all(|pair| {
        let (previous, block) = (&pair[0], &pair[1]);
        *block.previous_hash() == previous.hash()
            && validate_proof(
                block.nonce(),
                block.previous_hash(),
                block.transactions(),
                difficulty,
            )
    })
}
