use crate::constants::*;
use crate::error::{LedgerError, Result};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Tunables of a ledger node. `Default` reproduces the network-wide constants;
/// peers only agree on blocks when they share `difficulty`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    pub difficulty: usize,
    pub reward: i64,
    pub mining_interval: Duration,
    pub sync_interval: Duration,
    pub neighbor_ip_range: RangeInclusive<u8>,
    pub port_range: RangeInclusive<u16>,
    pub peer_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: MINING_DIFFICULTY,
            reward: MINING_REWARD,
            mining_interval: MINING_TIMER,
            sync_interval: NEIGHBOR_SYNC_TIMER,
            neighbor_ip_range: NEIGHBOR_IP_RANGE_START..=NEIGHBOR_IP_RANGE_END,
            port_range: BLOCKCHAIN_PORT_RANGE_START..=BLOCKCHAIN_PORT_RANGE_END,
            peer_timeout: PEER_CALL_TIMEOUT,
            probe_timeout: PEER_PROBE_TIMEOUT,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds the {HASH_HEX_SIZE} hex characters of a digest",
                self.difficulty
            )));
        }
        if self.reward < 0 {
            return Err(LedgerError::InvalidConfig(format!(
                "negative mining reward {}",
                self.reward
            )));
        }
        if self.mining_interval.is_zero() || self.sync_interval.is_zero() {
            return Err(LedgerError::InvalidConfig(
                "scheduler intervals must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
