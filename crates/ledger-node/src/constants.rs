use ledger_core::constants::BLOCKCHAIN_PORT_RANGE_START;

pub(crate) const DEFAULT_PORT: u16 = BLOCKCHAIN_PORT_RANGE_START;
pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_BIND: &str = "0.0.0.0";
pub(crate) const TRANSACTIONS_PATH: &str = "/transactions";
