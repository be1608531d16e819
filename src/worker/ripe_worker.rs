use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};

use super::command::RipeCommand;
use crate::error::ExplorerResult;
use crate::radix::RadixTree;
use crate::ripe::RipeSnapshotSource;
use crate::types::PrefixId;

const COMMAND_QUEUE_DEPTH: usize = 256;

/// The RIPE-Auth worker (§4.D): tracks which ranges RIPE is authoritative
/// for and answers exactly one question, `is_covered`. No origins are
/// tracked here; presence in the tree is the only fact that matters.
struct RipeWorkerState {
    tree: RadixTree<()>,
}

impl RipeWorkerState {
    fn new() -> Self {
        RipeWorkerState {
            tree: RadixTree::new(),
        }
    }

    fn reload(&mut self, ranges: Vec<String>) {
        let mut tree = RadixTree::new();
        for text in ranges {
            match PrefixId::parse(&text) {
                Ok(prefix) => {
                    tree.add(prefix);
                }
                Err(_) => {
                    debug!("ripe: skipping unparseable range '{text}'");
                }
            }
        }
        self.tree = tree;
    }

    fn is_covered(&self, prefix: &PrefixId) -> bool {
        self.tree.search_worst(prefix).is_some()
    }
}

#[derive(Clone)]
pub struct RipeWorkerHandle {
    tx: mpsc::Sender<RipeCommand>,
}

impl RipeWorkerHandle {
    pub async fn is_covered(&self, prefix: PrefixId) -> ExplorerResult<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RipeCommand::IsCovered(prefix, reply_tx))
            .await
            .map_err(|_| {
                crate::error::ExplorerError::Internal("ripe worker is gone".to_string())
            })?;
        reply_rx.await.map_err(|_| {
            crate::error::ExplorerError::Internal(
                "ripe worker dropped the response channel".to_string(),
            )
        })
    }
}

pub fn spawn(
    source: Arc<dyn RipeSnapshotSource>,
    reload_interval: Duration,
    ready_tx: oneshot::Sender<()>,
) -> RipeWorkerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

    let reload_tx = cmd_tx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reload_interval);
        loop {
            ticker.tick().await;
            let ranges = source.snapshot();
            if reload_tx.send(RipeCommand::Reload(ranges)).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut state = RipeWorkerState::new();
        let mut ready_tx = Some(ready_tx);
        while let Some(command) = cmd_rx.recv().await {
            match command {
                RipeCommand::Reload(ranges) => {
                    state.reload(ranges);
                    if let Some(tx) = ready_tx.take() {
                        let _ = tx.send(());
                        info!("ripe worker ready after first reload");
                    }
                }
                RipeCommand::IsCovered(prefix, reply) => {
                    let _ = reply.send(state.is_covered(&prefix));
                }
            }
        }
    });

    RipeWorkerHandle { tx: cmd_tx }
}
