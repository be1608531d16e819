use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use super::bgp_worker::{self, BgpWorkerHandle};
use super::db_worker::{self, DbWorkerHandle};
use super::ripe_worker::{self, RipeWorkerHandle};
use crate::bgp::BgpSnapshotSource;
use crate::config::Config;
use crate::nrtm::NrtmSender;
use crate::ripe::RipeSnapshotSource;

const NRTM_QUEUE_DEPTH: usize = 256;

/// Owns every worker handle the HTTP surface needs (§9's redesign note:
/// an explicit struct passed by reference, not ambient/global state).
pub struct WorkerRegistry {
    databases: HashMap<String, DbWorkerHandle>,
    bgp: BgpWorkerHandle,
    ripe: RipeWorkerHandle,
}

impl WorkerRegistry {
    /// Spawns one DB worker per configured database, plus the BGP and
    /// RIPE workers, and returns the registry together with the NRTM
    /// senders callers should feed (one per database, in config order).
    pub fn spawn(
        config: &Config,
        bgp_source: Arc<dyn BgpSnapshotSource>,
        ripe_source: Arc<dyn RipeSnapshotSource>,
        bgp_reload_interval: Duration,
        ripe_reload_interval: Duration,
    ) -> (Self, HashMap<String, NrtmSender>, Vec<oneshot::Receiver<()>>) {
        let mut databases = HashMap::new();
        let mut senders = HashMap::new();
        let mut ready_rxs = Vec::new();

        for (dbname, db_config) in config.database_configs() {
            let (nrtm_tx, nrtm_rx) = mpsc::channel(NRTM_QUEUE_DEPTH);
            let (ready_tx, ready_rx) = oneshot::channel();
            let handle = db_worker::spawn(
                dbname.clone(),
                db_config.family_filter,
                nrtm_rx,
                ready_tx,
            );
            databases.insert(dbname.clone(), handle);
            senders.insert(dbname, nrtm_tx);
            ready_rxs.push(ready_rx);
        }

        let (bgp_ready_tx, bgp_ready_rx) = oneshot::channel();
        let bgp = bgp_worker::spawn(bgp_source, bgp_reload_interval, bgp_ready_tx);
        ready_rxs.push(bgp_ready_rx);

        let (ripe_ready_tx, ripe_ready_rx) = oneshot::channel();
        let ripe = ripe_worker::spawn(ripe_source, ripe_reload_interval, ripe_ready_tx);
        ready_rxs.push(ripe_ready_rx);

        (
            WorkerRegistry {
                databases,
                bgp,
                ripe,
            },
            senders,
            ready_rxs,
        )
    }

    pub fn database(&self, name: &str) -> Option<&DbWorkerHandle> {
        self.databases.get(name)
    }

    pub fn databases(&self) -> impl Iterator<Item = &DbWorkerHandle> {
        self.databases.values()
    }

    pub fn database_names(&self) -> Vec<&str> {
        self.databases.keys().map(String::as_str).collect()
    }

    pub fn bgp(&self) -> &BgpWorkerHandle {
        &self.bgp
    }

    pub fn ripe(&self) -> &RipeWorkerHandle {
        &self.ripe
    }
}

/// Waits up to `per_worker_timeout` for each worker's first readiness
/// signal, logging (not aborting) on any that don't make it in time --
/// a slow or absent mirror feed shouldn't keep the whole service down.
pub async fn wait_ready(ready_rxs: Vec<oneshot::Receiver<()>>, per_worker_timeout: Duration) {
    for (idx, rx) in ready_rxs.into_iter().enumerate() {
        if timeout(per_worker_timeout, rx).await.is_err() {
            warn!("worker #{idx} did not signal ready within the startup timeout");
        }
    }
}
