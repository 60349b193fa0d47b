use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("malformed transaction request: missing {0}")]
    MissingField(&'static str),

    #[error("invalid sender public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("the reward sender cannot be used by submitted transactions")]
    ReservedSender,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("peer {peer}: {message}")]
    Peer { peer: String, message: String },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl LedgerError {
    pub fn peer(peer: impl Into<String>, message: impl ToString) -> Self {
        Self::Peer {
            peer: peer.into(),
            message: message.to_string(),
        }
    }
}
