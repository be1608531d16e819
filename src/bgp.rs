use crate::types::Origin;

/// The BGP-table loader is an external collaborator (§1, §6): a RIB
/// snapshot source, reinvoked on a configurable interval, that hands back
/// `(prefix, origin)` pairs. Text prefixes are used at the boundary (same
/// shape as an NRTM object's `name`); the worker parses and skips anything
/// invalid, same as route-object ingest.
pub trait BgpSnapshotSource: Send + Sync {
    fn snapshot(&self) -> Vec<(String, Origin)>;
}

/// A source that never produces anything; useful as a default when no BGP
/// feed is configured for a deployment.
pub struct EmptyBgpSource;

impl BgpSnapshotSource for EmptyBgpSource {
    fn snapshot(&self) -> Vec<(String, Origin)> {
        Vec::new()
    }
}
