use crate::{now_nanos, pow::validate_proof, Block, Hash, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Scans nonces upward from 0 until `validate_proof` holds.
///
/// Single threaded and unbounded: callers must keep `difficulty` within the
/// 64 hex characters of a digest (see `LedgerConfig::validate`).
pub fn find_nonce(previous_hash: &Hash, transactions: &[Transaction], difficulty: usize) -> u64 {
    let mut nonce = 0u64;
    while !validate_proof(nonce, previous_hash, transactions, difficulty) {
        nonce = nonce.wrapping_add(1);
    }
    nonce
}

/// Nonces tried between two looks at the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Same search as [`find_nonce`], giving up with `None` once `cancel` is set.
pub fn find_nonce_until(
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: usize,
    cancel: &AtomicBool,
) -> Option<u64> {
    let mut nonce = 0u64;
    while !validate_proof(nonce, previous_hash, transactions, difficulty) {
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
        nonce = nonce.wrapping_add(1);
    }
    Some(nonce)
}

/// Runs the nonce search over `transactions` and stamps the resulting block with
/// the current time. Returns the block and its hash, or `None` if `cancel` was
/// set before a nonce was found.
pub fn mine_block(
    previous_hash: Hash,
    transactions: Vec<Transaction>,
    difficulty: usize,
    cancel: &AtomicBool,
) -> Option<(Block, Hash)> {
    let started = Instant::now();
    let Some(nonce) = find_nonce_until(&previous_hash, &transactions, difficulty, cancel) else {
        debug!(elapsed = ?started.elapsed(), "nonce search cancelled");
        return None;
    };
    debug!(nonce, elapsed = ?started.elapsed(), "nonce search finished");

    let block = Block::new(now_nanos(), nonce, previous_hash, transactions);
    let hash = block.hash();
    info!(
        "Mined block with nonce {} and hash {} ({} txs)",
        nonce,
        hex::encode(hash),
        block.transactions().len()
    );
    Some((block, hash))
}
