/// The RIPE inetnum/inet6num loader is an external collaborator (§1, §6):
/// an authoritative-coverage snapshot source, reinvoked on a configurable
/// interval, that hands back allocation/assignment ranges as text.
pub trait RipeSnapshotSource: Send + Sync {
    fn snapshot(&self) -> Vec<String>;
}

/// A source that never produces anything; nothing is RIPE-managed.
pub struct EmptyRipeSource;

impl RipeSnapshotSource for EmptyRipeSource {
    fn snapshot(&self) -> Vec<String> {
        Vec::new()
    }
}
