use crate::config::LedgerConfig;
use crate::error::Result;
use crate::signature::TransactionRequest;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::ops::RangeInclusive;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Outbound half of the peer protocol.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// `PUT /transactions` on `peer`.
    async fn broadcast_transaction(&self, peer: &str, request: &TransactionRequest) -> Result<()>;

    /// `DELETE /transactions` on `peer`.
    async fn clear_transactions(&self, peer: &str) -> Result<()>;
}

/// Client for a ledger that never talks to anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPeerClient;

#[async_trait]
impl PeerClient for NoopPeerClient {
    async fn broadcast_transaction(&self, _peer: &str, _request: &TransactionRequest) -> Result<()> {
        Ok(())
    }

    async fn clear_transactions(&self, _peer: &str) -> Result<()> {
        Ok(())
    }
}

/// Liveness check used while refreshing the peer set.
#[async_trait]
pub trait PeerProbe: Send + Sync {
    async fn is_reachable(&self, peer: &str) -> bool;
}

/// Every `host:port` a neighbor could be listening on: the last octet of `host`
/// shifted by each suffix in `ip_range`, crossed with `port_range`. Our own
/// address and octets past 255 are skipped.
pub fn neighbor_candidates(
    host: Ipv4Addr,
    port: u16,
    ip_range: RangeInclusive<u8>,
    port_range: RangeInclusive<u16>,
) -> Vec<SocketAddrV4> {
    let own = SocketAddrV4::new(host, port);
    let [a, b, c, last] = host.octets();
    let mut out = Vec::new();
    for guess_port in port_range {
        for suffix in ip_range.clone() {
            let Some(octet) = last.checked_add(suffix) else {
                continue;
            };
            let candidate = SocketAddrV4::new(Ipv4Addr::new(a, b, c, octet), guess_port);
            if candidate != own {
                out.push(candidate);
            }
        }
    }
    out
}

/// Known peers as `host:port` strings. Guarded by its own lock, separate from
/// the ledger's, and never held across an await.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<BTreeSet<String>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peers<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        registry.replace(peers);
        registry
    }

    pub fn snapshot(&self) -> Vec<String> {
        let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
        peers.iter().cloned().collect()
    }

    pub fn replace<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: BTreeSet<String> = peers.into_iter().map(Into::into).collect();
        let mut guard = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    pub fn len(&self) -> usize {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probes every neighbor candidate concurrently and keeps the reachable ones.
    /// Returns the new peer count.
    pub async fn refresh(
        &self,
        host: Ipv4Addr,
        port: u16,
        config: &LedgerConfig,
        probe: &dyn PeerProbe,
    ) -> usize {
        let candidates = neighbor_candidates(
            host,
            port,
            config.neighbor_ip_range.clone(),
            config.port_range.clone(),
        );
        debug!(candidates = candidates.len(), "probing neighbor candidates");

        let probes = candidates.iter().map(|candidate| async move {
            let target = candidate.to_string();
            let alive = probe.is_reachable(&target).await;
            alive.then_some(target)
        });
        let reachable: Vec<String> = join_all(probes).await.into_iter().flatten().collect();

        info!(peers = ?reachable, "peer set refreshed");
        let count = reachable.len();
        self.replace(reachable);
        count
    }
}
