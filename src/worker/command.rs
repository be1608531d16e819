use tokio::sync::oneshot;

use crate::nrtm::NrtmEvent;
use crate::types::{Origin, OriginSet, PrefixId};

/// Requests a DB worker can answer (§4.B). Request/response correlation
/// uses the oneshot reply channel bundled with each `Query`, not queue
/// identity (§9's redesign note).
#[derive(Debug, Clone)]
pub enum DbQuery {
    SearchExact(PrefixId),
    /// Alias `search_aggregate` in §4.F: the least-specific covering node.
    SearchAggregate(PrefixId),
    /// Alias `search_specifics` in §4.F: every covered node.
    SearchSpecifics(PrefixId),
    InverseAsn(Origin),
    AssetSearch(String),
}

#[derive(Debug, Clone)]
pub enum DbResponse {
    Exact(Option<(PrefixId, OriginSet)>),
    Aggregate(Option<(PrefixId, OriginSet)>),
    Specifics(Vec<(PrefixId, OriginSet)>),
    Prefixes(Vec<PrefixId>),
    Members(Vec<String>),
}

/// The unified command queue a DB worker drains (§4.B, §9): ingest and
/// lookups are both variants of one sum type processed by one task, which
/// is what removes the need for any locking inside the index.
pub enum DbCommand {
    Ingest(NrtmEvent),
    Query(DbQuery, oneshot::Sender<DbResponse>),
}

/// The BGP worker's request set (§4.C): identical shape minus as-sets.
#[derive(Debug)]
pub enum BgpQuery {
    SearchExact(PrefixId),
    SearchAggregate(PrefixId),
    SearchSpecifics(PrefixId),
}

#[derive(Debug, Clone)]
pub enum BgpResponse {
    Exact(Option<(PrefixId, OriginSet)>),
    Aggregate(Option<(PrefixId, OriginSet)>),
    Specifics(Vec<(PrefixId, OriginSet)>),
}

pub enum BgpCommand {
    Reload(Vec<(String, Origin)>),
    Query(BgpQuery, oneshot::Sender<BgpResponse>),
}

/// The RIPE-Auth worker exposes exactly one query (§4.D).
pub enum RipeCommand {
    Reload(Vec<String>),
    IsCovered(PrefixId, oneshot::Sender<bool>),
}
