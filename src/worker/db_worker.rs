use std::collections::HashMap;

use log::{debug, trace, warn};
use tokio::sync::{mpsc, oneshot};

use super::command::{DbCommand, DbQuery, DbResponse};
use crate::config::FamilyFilter;
use crate::error::ExplorerResult;
use crate::nrtm::{NrtmCommand, NrtmEvent, NrtmReceiver};
use crate::radix::RadixTree;
use crate::types::{Family, ObjectKind, Origin, OriginSet, PrefixId, RpslObject};

const COMMAND_QUEUE_DEPTH: usize = 256;

/// One IRR mirror (§4.B): a radix index, an inverse ASN map, and an
/// as-set map, all owned exclusively by the task running `run`.
struct DbWorkerState {
    dbname: String,
    family_filter: FamilyFilter,
    tree: RadixTree<OriginSet>,
    inverse: HashMap<Origin, Vec<PrefixId>>,
    assets: HashMap<String, Vec<String>>,
}

impl DbWorkerState {
    fn new(dbname: String, family_filter: FamilyFilter) -> Self {
        DbWorkerState {
            dbname,
            family_filter,
            tree: RadixTree::new(),
            inverse: HashMap::new(),
            assets: HashMap::new(),
        }
    }

    fn family_allowed(&self, family: Family) -> bool {
        match (self.family_filter, family) {
            (FamilyFilter::Both, _) => true,
            (FamilyFilter::V4, Family::V4) => true,
            (FamilyFilter::V6, Family::V6) => true,
            _ => false,
        }
    }

    fn ingest(&mut self, event: NrtmEvent) {
        match event.command {
            NrtmCommand::Reset => {
                debug!("{}: serial overrun, flushing in-memory state", self.dbname);
                self.tree.clear();
                self.inverse.clear();
                self.assets.clear();
                return;
            }
            NrtmCommand::Add | NrtmCommand::Del => {}
        }

        let Some(obj) = event.object else {
            warn!("{}: ADD/DEL event without an object, ignoring", self.dbname);
            return;
        };

        // Invariant 2: objects not addressed to this worker's database are
        // dropped outright.
        if obj.source != self.dbname {
            trace!(
                "{}: dropping object for source '{}'",
                self.dbname, obj.source
            );
            return;
        }

        match obj.kind {
            ObjectKind::Route | ObjectKind::Route6 => {
                self.ingest_route(event.command, obj);
            }
            ObjectKind::AsSet => {
                self.ingest_as_set(event.command, obj);
            }
            ObjectKind::Other => {
                trace!("{}: ignoring unsupported object kind", self.dbname);
            }
        }
    }

    fn ingest_route(&mut self, command: NrtmCommand, obj: RpslObject) {
        let prefix = match PrefixId::parse(&obj.name) {
            Ok(p) => p,
            Err(_) => {
                warn!(
                    "{}: non-valid prefix in route object: {}",
                    self.dbname, obj.name
                );
                return;
            }
        };
        let expected_family = match obj.kind {
            ObjectKind::Route => Family::V4,
            ObjectKind::Route6 => Family::V6,
            _ => unreachable!("caller only routes Route/Route6 here"),
        };
        if prefix.family() != expected_family {
            warn!(
                "{}: {} object '{}' is not a {:?} prefix",
                self.dbname, obj.name, obj.name, expected_family
            );
            return;
        }
        if !self.family_allowed(prefix.family()) {
            trace!(
                "{}: dropping {} per family_filter",
                self.dbname, obj.name
            );
            return;
        }

        let Some(origin) = obj.origin else {
            warn!("{}: route object without an origin: {}", self.dbname, obj.name);
            return;
        };

        match command {
            NrtmCommand::Add => {
                self.tree.add(prefix).insert(origin);
                let list = self.inverse.entry(origin).or_default();
                if !list.contains(&prefix) {
                    list.push(prefix);
                }
            }
            NrtmCommand::Del => {
                if !self
                    .tree
                    .search_exact(&prefix)
                    .is_some_and(|set| set.contains(&origin))
                {
                    warn!(
                        "{}: DEL for unknown route {} origin {}",
                        self.dbname, obj.name, origin
                    );
                }
                self.remove_origin(prefix, origin);
            }
            NrtmCommand::Reset => unreachable!("handled by caller"),
        }
    }

    fn remove_origin(&mut self, prefix: PrefixId, origin: Origin) {
        // No direct "get mutable node" API beyond add(), so we emulate
        // "remove one origin" via exact match + rebuild, then prune the
        // node entirely once its origin set is empty.
        let became_empty = match self.tree.search_exact(&prefix) {
            Some(set) => {
                let mut set = set.clone();
                set.remove(origin);
                let empty = set.is_empty();
                *self.tree.add(prefix) = set;
                Some(empty)
            }
            None => None,
        };
        match became_empty {
            Some(true) => {
                self.tree.delete(&prefix);
            }
            Some(false) => {}
            None => warn!("{}: could not remove {} from the tree", self.dbname, prefix),
        }

        match self.inverse.get_mut(&origin) {
            Some(list) => {
                if let Some(pos) = list.iter().position(|p| *p == prefix) {
                    list.remove(pos);
                    if list.is_empty() {
                        self.inverse.remove(&origin);
                    }
                } else {
                    warn!(
                        "{}: could not remove {} from inverse map for {}",
                        self.dbname, prefix, origin
                    );
                }
            }
            None => {
                warn!(
                    "{}: could not remove {} from inverse map for {}",
                    self.dbname, prefix, origin
                );
            }
        }
    }

    fn ingest_as_set(&mut self, command: NrtmCommand, obj: RpslObject) {
        match command {
            NrtmCommand::Add => {
                let Some(members) = obj.members else {
                    warn!("{}: as-set {} without members", self.dbname, obj.name);
                    return;
                };
                self.assets.insert(obj.name, members);
            }
            NrtmCommand::Del => {
                if self.assets.remove(&obj.name).is_none() {
                    warn!("{}: DEL for unknown as-set {}", self.dbname, obj.name);
                }
            }
            NrtmCommand::Reset => unreachable!("handled by caller"),
        }
    }

    fn query(&self, query: DbQuery) -> DbResponse {
        match query {
            DbQuery::SearchExact(p) => {
                DbResponse::Exact(self.tree.search_exact(&p).map(|set| (p, set.clone())))
            }
            DbQuery::SearchAggregate(p) => DbResponse::Aggregate(
                self.tree
                    .search_worst(&p)
                    .map(|(pfx, set)| (pfx, set.clone())),
            ),
            DbQuery::SearchSpecifics(p) => DbResponse::Specifics(
                self.tree
                    .search_covered(&p)
                    .into_iter()
                    .map(|(pfx, set)| (pfx, set.clone()))
                    .collect(),
            ),
            DbQuery::InverseAsn(asn) => {
                DbResponse::Prefixes(self.inverse.get(&asn).cloned().unwrap_or_default())
            }
            DbQuery::AssetSearch(name) => {
                DbResponse::Members(self.assets.get(&name).cloned().unwrap_or_default())
            }
        }
    }
}

#[derive(Clone)]
pub struct DbWorkerHandle {
    pub dbname: String,
    tx: mpsc::Sender<DbCommand>,
}

impl DbWorkerHandle {
    pub async fn query(&self, query: DbQuery) -> ExplorerResult<DbResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DbCommand::Query(query, reply_tx))
            .await
            .map_err(|_| {
                crate::error::ExplorerError::Internal(format!(
                    "worker for '{}' is gone",
                    self.dbname
                ))
            })?;
        reply_rx.await.map_err(|_| {
            crate::error::ExplorerError::Internal(format!(
                "worker for '{}' dropped the response channel",
                self.dbname
            ))
        })
    }
}

/// Spawns the worker task and a small forwarder that turns NRTM events
/// into `DbCommand::Ingest` on the same queue lookups use, so ingest and
/// queries really do share one FIFO (§4.B, §9).
pub fn spawn(
    dbname: String,
    family_filter: FamilyFilter,
    nrtm_rx: NrtmReceiver,
    ready_tx: oneshot::Sender<()>,
) -> DbWorkerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

    // Forward the NRTM stream into the unified command queue.
    let forward_tx = cmd_tx.clone();
    let mut nrtm_rx = nrtm_rx;
    tokio::spawn(async move {
        while let Some(event) = nrtm_rx.recv().await {
            if forward_tx.send(DbCommand::Ingest(event)).await.is_err() {
                break;
            }
        }
    });

    let handle = DbWorkerHandle {
        dbname: dbname.clone(),
        tx: cmd_tx,
    };

    tokio::spawn(async move {
        let mut state = DbWorkerState::new(dbname, family_filter);
        let _ = ready_tx.send(());
        while let Some(command) = cmd_rx.recv().await {
            match command {
                DbCommand::Ingest(event) => state.ingest(event),
                DbCommand::Query(query, reply) => {
                    let _ = reply.send(state.query(query));
                }
            }
        }
    });

    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nrtm::NrtmEvent;
    use crate::types::{ObjectKind, RpslObject};

    fn route(source: &str, name: &str, origin: u32) -> RpslObject {
        RpslObject {
            source: source.to_string(),
            kind: ObjectKind::Route,
            name: name.to_string(),
            origin: Some(Origin(origin)),
            members: None,
        }
    }

    async fn spawn_test_worker() -> (DbWorkerHandle, mpsc::Sender<NrtmEvent>) {
        let (nrtm_tx, nrtm_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = spawn("radb".to_string(), FamilyFilter::Both, nrtm_rx, ready_tx);
        ready_rx.await.unwrap();
        (handle, nrtm_tx)
    }

    #[tokio::test]
    async fn source_mismatch_is_dropped() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        nrtm_tx
            .send(NrtmEvent::add(1, route("arin", "10.0.0.0/24", 1)))
            .await
            .unwrap();
        // Ping with a query so we know the ingest event was drained first.
        let resp = handle
            .query(DbQuery::SearchExact(PrefixId::parse("10.0.0.0/24").unwrap()))
            .await
            .unwrap();
        assert!(matches!(resp, DbResponse::Exact(None)));
    }

    #[tokio::test]
    async fn add_then_exact_lookup() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        nrtm_tx
            .send(NrtmEvent::add(1, route("radb", "10.0.0.0/24", 42)))
            .await
            .unwrap();
        let resp = handle
            .query(DbQuery::SearchExact(PrefixId::parse("10.0.0.0/24").unwrap()))
            .await
            .unwrap();
        match resp {
            DbResponse::Exact(Some((_, origins))) => {
                assert!(origins.contains(&Origin(42)));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_add_does_not_grow_the_inverse_map() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        nrtm_tx
            .send(NrtmEvent::add(1, route("radb", "10.0.0.0/24", 42)))
            .await
            .unwrap();
        nrtm_tx
            .send(NrtmEvent::add(2, route("radb", "10.0.0.0/24", 42)))
            .await
            .unwrap();
        let resp = handle
            .query(DbQuery::InverseAsn(Origin(42)))
            .await
            .unwrap();
        match resp {
            DbResponse::Prefixes(v) => assert_eq!(v.len(), 1),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_flushes_state() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        nrtm_tx
            .send(NrtmEvent::add(1, route("radb", "10.0.0.0/24", 42)))
            .await
            .unwrap();
        nrtm_tx.send(NrtmEvent::reset(2)).await.unwrap();
        let resp = handle
            .query(DbQuery::SearchExact(PrefixId::parse("10.0.0.0/24").unwrap()))
            .await
            .unwrap();
        assert!(matches!(resp, DbResponse::Exact(None)));
        let resp = handle
            .query(DbQuery::InverseAsn(Origin(42)))
            .await
            .unwrap();
        assert!(matches!(resp, DbResponse::Prefixes(v) if v.is_empty()));
    }

    #[tokio::test]
    async fn del_then_add_round_trips() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        let pfx = PrefixId::parse("10.0.0.0/24").unwrap();
        nrtm_tx.send(NrtmEvent::add(1, route("radb", "10.0.0.0/24", 1))).await.unwrap();
        nrtm_tx.send(NrtmEvent::add(2, route("radb", "10.0.0.0/24", 2))).await.unwrap();
        nrtm_tx.send(NrtmEvent::del(3, route("radb", "10.0.0.0/24", 1))).await.unwrap();

        let resp = handle.query(DbQuery::SearchExact(pfx)).await.unwrap();
        match resp {
            DbResponse::Exact(Some((_, origins))) => {
                assert!(!origins.contains(&Origin(1)));
                assert!(origins.contains(&Origin(2)));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn as_set_add_and_lookup() {
        let (handle, nrtm_tx) = spawn_test_worker().await;
        nrtm_tx
            .send(NrtmEvent::add(
                1,
                RpslObject {
                    source: "radb".to_string(),
                    kind: ObjectKind::AsSet,
                    name: "AS-EXAMPLE".to_string(),
                    origin: None,
                    members: Some(vec!["AS1".to_string(), "AS2".to_string()]),
                },
            ))
            .await
            .unwrap();
        let resp = handle
            .query(DbQuery::AssetSearch("AS-EXAMPLE".to_string()))
            .await
            .unwrap();
        assert!(matches!(resp, DbResponse::Members(v) if v == vec!["AS1", "AS2"]));
    }

    #[tokio::test]
    async fn family_filter_drops_the_excluded_family() {
        let (nrtm_tx, nrtm_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = spawn("radb".to_string(), FamilyFilter::V4, nrtm_rx, ready_tx);
        ready_rx.await.unwrap();
        nrtm_tx
            .send(NrtmEvent::add(
                1,
                RpslObject {
                    source: "radb".to_string(),
                    kind: ObjectKind::Route6,
                    name: "2001:db8::/32".to_string(),
                    origin: Some(Origin(1)),
                    members: None,
                },
            ))
            .await
            .unwrap();
        let resp = handle
            .query(DbQuery::SearchExact(PrefixId::parse("2001:db8::/32").unwrap()))
            .await
            .unwrap();
        assert!(matches!(resp, DbResponse::Exact(None)));
    }
}
