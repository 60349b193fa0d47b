use crate::chain::Blockchain;
use crate::error::Result;
use crate::peers::PeerProbe;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Owns the node's periodic tasks and the signal that stops them.
///
/// A round that is already running is allowed to finish; the stop signal is only
/// observed between rounds.
pub struct Scheduler {
    stop: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop,
            tasks: Vec::new(),
        }
    }

    /// Runs `round` now and then every `period` until shutdown.
    pub fn spawn_periodic<F, Fut>(&mut self, name: &'static str, period: Duration, mut round: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut stop = self.stop.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    _ = ticker.tick() => round().await,
                }
            }
            debug!(task = name, "periodic task stopped");
        });
        self.tasks.push((name, handle));
    }

    pub fn spawn_mining(&mut self, ledger: Arc<Blockchain>, period: Duration) {
        self.spawn_periodic("mining", period, move || {
            let ledger = ledger.clone();
            async move {
                ledger.mining().await;
            }
        });
    }

    pub fn spawn_peer_sync(
        &mut self,
        ledger: Arc<Blockchain>,
        host: Ipv4Addr,
        port: u16,
        probe: Arc<dyn PeerProbe>,
        period: Duration,
    ) {
        self.spawn_periodic("peer-sync", period, move || {
            let ledger = ledger.clone();
            let probe = probe.clone();
            async move {
                ledger
                    .peers()
                    .refresh(host, port, ledger.config(), probe.as_ref())
                    .await;
            }
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals every task to stop and waits for each to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.stop.send_replace(true);
        for (name, handle) in self.tasks {
            handle.await?;
            info!(task = name, "stopped");
        }
        Ok(())
    }
}
