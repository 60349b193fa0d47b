use async_trait::async_trait;
use ledger_core::peers::{PeerClient, PeerProbe};
use ledger_core::signature::TransactionRequest;
use ledger_core::LedgerError;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use crate::constants::TRANSACTIONS_PATH;

/// Speaks the peer protocol over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    fn endpoint(peer: &str) -> String {
        format!("http://{peer}{TRANSACTIONS_PATH}")
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn broadcast_transaction(
        &self,
        peer: &str,
        request: &TransactionRequest,
    ) -> ledger_core::Result<()> {
        let res = self
            .http
            .put(Self::endpoint(peer))
            .json(request)
            .send()
            .await
            .map_err(|e| LedgerError::peer(peer, e))?;
        debug!(peer, status = %res.status(), "PUT /transactions");
        res.error_for_status().map_err(|e| LedgerError::peer(peer, e))?;
        Ok(())
    }

    async fn clear_transactions(&self, peer: &str) -> ledger_core::Result<()> {
        let res = self
            .http
            .delete(Self::endpoint(peer))
            .send()
            .await
            .map_err(|e| LedgerError::peer(peer, e))?;
        debug!(peer, status = %res.status(), "DELETE /transactions");
        res.error_for_status().map_err(|e| LedgerError::peer(peer, e))?;
        Ok(())
    }
}

/// A peer is alive when it accepts a TCP connection within `timeout`.
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PeerProbe for TcpProbe {
    async fn is_reachable(&self, peer: &str) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(peer)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn probe_sees_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TcpProbe::new(Duration::from_secs(1));
        assert!(probe.is_reachable(&addr.to_string()).await);
        drop(listener);
        assert!(!probe.is_reachable(&addr.to_string()).await);
    }

    #[tokio::test]
    async fn unreachable_peer_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let client = HttpPeerClient::new(Duration::from_millis(500)).unwrap();
        let err = client.clear_transactions(&addr).await.unwrap_err();
        assert!(matches!(err, LedgerError::Peer { peer, .. } if peer == addr));
    }
}
