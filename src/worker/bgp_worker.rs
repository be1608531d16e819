use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};

use super::command::{BgpCommand, BgpQuery, BgpResponse};
use crate::bgp::BgpSnapshotSource;
use crate::error::ExplorerResult;
use crate::radix::RadixTree;
use crate::types::{Origin, OriginSet, PrefixId};

const COMMAND_QUEUE_DEPTH: usize = 256;

/// The BGP worker (§4.C): same shape as a DB worker minus as-sets, fed by a
/// periodic RIB snapshot instead of an NRTM stream. A reload replaces the
/// whole tree at once rather than threading individual ADD/DEL events.
struct BgpWorkerState {
    tree: RadixTree<OriginSet>,
}

impl BgpWorkerState {
    fn new() -> Self {
        BgpWorkerState {
            tree: RadixTree::new(),
        }
    }

    fn reload(&mut self, rows: Vec<(String, Origin)>) {
        let mut tree = RadixTree::new();
        for (text, origin) in rows {
            match PrefixId::parse(&text) {
                Ok(prefix) => {
                    tree.add(prefix).insert(origin);
                }
                Err(_) => {
                    debug!("bgp: skipping unparseable RIB entry '{text}'");
                }
            }
        }
        self.tree = tree;
    }

    fn query(&self, query: BgpQuery) -> BgpResponse {
        match query {
            BgpQuery::SearchExact(p) => {
                BgpResponse::Exact(self.tree.search_exact(&p).map(|set| (p, set.clone())))
            }
            BgpQuery::SearchAggregate(p) => BgpResponse::Aggregate(
                self.tree
                    .search_worst(&p)
                    .map(|(pfx, set)| (pfx, set.clone())),
            ),
            BgpQuery::SearchSpecifics(p) => BgpResponse::Specifics(
                self.tree
                    .search_covered(&p)
                    .into_iter()
                    .map(|(pfx, set)| (pfx, set.clone()))
                    .collect(),
            ),
        }
    }
}

#[derive(Clone)]
pub struct BgpWorkerHandle {
    tx: mpsc::Sender<BgpCommand>,
}

impl BgpWorkerHandle {
    pub async fn query(&self, query: BgpQuery) -> ExplorerResult<BgpResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BgpCommand::Query(query, reply_tx))
            .await
            .map_err(|_| crate::error::ExplorerError::Internal("bgp worker is gone".to_string()))?;
        reply_rx.await.map_err(|_| {
            crate::error::ExplorerError::Internal(
                "bgp worker dropped the response channel".to_string(),
            )
        })
    }
}

/// Spawns the worker plus the interval task that reloads it from `source`
/// every `reload_interval`. The first reload happens immediately so the
/// readiness signal means something.
pub fn spawn(
    source: Arc<dyn BgpSnapshotSource>,
    reload_interval: Duration,
    ready_tx: oneshot::Sender<()>,
) -> BgpWorkerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

    let reload_tx = cmd_tx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reload_interval);
        loop {
            ticker.tick().await;
            let rows = source.snapshot();
            if reload_tx.send(BgpCommand::Reload(rows)).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut state = BgpWorkerState::new();
        let mut ready_tx = Some(ready_tx);
        while let Some(command) = cmd_rx.recv().await {
            match command {
                BgpCommand::Reload(rows) => {
                    state.reload(rows);
                    if let Some(tx) = ready_tx.take() {
                        let _ = tx.send(());
                        info!("bgp worker ready after first reload");
                    }
                }
                BgpCommand::Query(query, reply) => {
                    let _ = reply.send(state.query(query));
                }
            }
        }
    });

    BgpWorkerHandle { tx: cmd_tx }
}
