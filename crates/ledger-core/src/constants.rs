use std::time::Duration;

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading `'0'` hex characters required of a mined block digest.
pub const MINING_DIFFICULTY: usize = 3;
/// Sender of the reward transaction. Never verified.
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";
pub const MINING_REWARD: i64 = 1;
pub const MINING_TIMER: Duration = Duration::from_secs(20);

pub const BLOCKCHAIN_PORT_RANGE_START: u16 = 5000;
pub const BLOCKCHAIN_PORT_RANGE_END: u16 = 5003;
pub const NEIGHBOR_IP_RANGE_START: u8 = 0;
pub const NEIGHBOR_IP_RANGE_END: u8 = 1;
pub const NEIGHBOR_SYNC_TIMER: Duration = Duration::from_secs(20);

pub const PEER_CALL_TIMEOUT: Duration = Duration::from_secs(3);
pub const PEER_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Raw P-256 coordinate pair / signature scalar pair sizes.
pub const PUBLIC_KEY_SIZE: usize = 64;
pub const SIGNATURE_SIZE: usize = 64;
