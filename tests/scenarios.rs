use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use irr_explorer::bgp::BgpSnapshotSource;
use irr_explorer::config::{Config, DatabaseConfig, DatabaseEntry, FamilyFilter};
use irr_explorer::error::ExplorerError;
use irr_explorer::nrtm::NrtmEvent;
use irr_explorer::report::prefix_report;
use irr_explorer::ripe::RipeSnapshotSource;
use irr_explorer::types::{ObjectKind, Origin, PrefixId, RpslObject};
use irr_explorer::worker::WorkerRegistry;

// Generous so the interval task's first (immediate) tick is the only one
// that matters for the lifetime of a test.
const RELOAD_INTERVAL: Duration = Duration::from_secs(3600);

struct FixedBgp(Vec<(String, Origin)>);

impl BgpSnapshotSource for FixedBgp {
    fn snapshot(&self) -> Vec<(String, Origin)> {
        self.0.clone()
    }
}

struct FixedRipe(Vec<String>);

impl RipeSnapshotSource for FixedRipe {
    fn snapshot(&self) -> Vec<String> {
        self.0.clone()
    }
}

fn config_with(names: &[&str]) -> Config {
    let databases = names
        .iter()
        .map(|name| {
            let mut map = HashMap::new();
            map.insert(
                name.to_string(),
                DatabaseConfig {
                    host: "localhost".to_string(),
                    port: 4444,
                    dbname: name.to_string(),
                    serial_file: None,
                    family_filter: FamilyFilter::Both,
                },
            );
            DatabaseEntry(map)
        })
        .collect();
    Config { databases }
}

fn route_object(source: &str, prefix: &str, origin: u32) -> RpslObject {
    RpslObject {
        source: source.to_string(),
        kind: ObjectKind::Route,
        name: prefix.to_string(),
        origin: Some(Origin(origin)),
        members: None,
    }
}

async fn spawn_registry(
    db_names: &[&str],
    bgp_rows: Vec<(String, Origin)>,
    ripe_ranges: Vec<String>,
) -> (Arc<WorkerRegistry>, HashMap<String, irr_explorer::nrtm::NrtmSender>) {
    let config = config_with(db_names);
    let (registry, senders, ready_rxs) = WorkerRegistry::spawn(
        &config,
        Arc::new(FixedBgp(bgp_rows)),
        Arc::new(FixedRipe(ripe_ranges)),
        RELOAD_INTERVAL,
        RELOAD_INTERVAL,
    );
    for rx in ready_rxs {
        rx.await.unwrap();
    }
    (Arc::new(registry), senders)
}

/// Sends one ADD and blocks on a direct query to the same worker so the
/// ingest is guaranteed to have landed before the test proceeds -- ingest
/// and queries share one FIFO per worker (§4.B, §9), so this is a correct
/// synchronization point, not a race.
async fn seed_and_sync(
    registry: &WorkerRegistry,
    senders: &HashMap<String, irr_explorer::nrtm::NrtmSender>,
    dbname: &str,
    object: RpslObject,
) {
    let prefix = PrefixId::parse(&object.name).unwrap();
    senders[dbname]
        .send(NrtmEvent::add(1, object))
        .await
        .unwrap();
    registry
        .database(dbname)
        .unwrap()
        .query(irr_explorer::worker::DbQuery::SearchExact(prefix))
        .await
        .unwrap();
}

#[tokio::test]
async fn s1_perfect() {
    let (registry, senders) = spawn_registry(
        &["ripe"],
        vec![("85.184.0.0/16".to_string(), Origin(8935))],
        vec!["85.184.0.0/15".to_string()],
    )
    .await;
    seed_and_sync(
        &registry,
        &senders,
        "ripe",
        route_object("ripe", "85.184.0.0/16", 8935),
    )
    .await;

    let (prefixes, _summary) = prefix_report(&registry, PrefixId::parse("85.184.0.0/16").unwrap(), true)
        .await
        .unwrap();

    assert_eq!(prefixes.len(), 1);
    let entry = &prefixes["85.184.0.0/16"];
    assert_eq!(entry["advice"], "Perfect");
    assert_eq!(entry["label"], "success");
    assert_eq!(entry["ripe"], serde_json::json!([8935]));
    assert_eq!(entry["bgp_origin"], serde_json::json!([8935]));
    assert_eq!(entry["ripe_managed"], true);
}

#[tokio::test]
async fn s2_wrong_origin_is_danger() {
    let (registry, senders) = spawn_registry(
        &["ripe"],
        vec![("85.184.0.0/16".to_string(), Origin(9999))],
        vec!["85.184.0.0/15".to_string()],
    )
    .await;
    seed_and_sync(
        &registry,
        &senders,
        "ripe",
        route_object("ripe", "85.184.0.0/16", 8935),
    )
    .await;

    let (prefixes, _) = prefix_report(&registry, PrefixId::parse("85.184.0.0/16").unwrap(), true)
        .await
        .unwrap();

    let entry = &prefixes["85.184.0.0/16"];
    assert_eq!(
        entry["advice"],
        "Prefix is in DFZ, but registered with wrong origin in RIPE!"
    );
    assert_eq!(entry["label"], "danger");
}

#[tokio::test]
async fn s3_unregistered_is_danger() {
    let (registry, _senders) = spawn_registry(
        &["ripe"],
        vec![("85.184.0.0/16".to_string(), Origin(9999))],
        vec!["85.184.0.0/15".to_string()],
    )
    .await;

    let (prefixes, _) = prefix_report(&registry, PrefixId::parse("85.184.0.0/16").unwrap(), true)
        .await
        .unwrap();

    let entry = &prefixes["85.184.0.0/16"];
    assert_eq!(
        entry["advice"],
        "Prefix is in DFZ, but NOT registered in RIPE!"
    );
    assert_eq!(entry["label"], "danger");
}

#[tokio::test]
async fn s4_foreign_only_is_warning() {
    let (registry, senders) = spawn_registry(&["ripe", "radb"], vec![], vec!["85.184.0.0/15".to_string()]).await;
    seed_and_sync(
        &registry,
        &senders,
        "radb",
        route_object("radb", "85.184.0.0/16", 9999),
    )
    .await;

    let (prefixes, _) = prefix_report(&registry, PrefixId::parse("85.184.0.0/16").unwrap(), true)
        .await
        .unwrap();

    let entry = &prefixes["85.184.0.0/16"];
    assert_eq!(
        entry["advice"],
        "Route objects in foreign registries exist, consider moving them to RIPE DB"
    );
    assert_eq!(entry["label"], "warning");
}

#[tokio::test]
async fn s5_aggregate_scope() {
    let (registry, senders) = spawn_registry(
        &["ripe"],
        vec![
            ("10.0.0.128/25".to_string(), Origin(1)),
            ("10.0.1.0/24".to_string(), Origin(1)),
        ],
        vec![],
    )
    .await;
    seed_and_sync(&registry, &senders, "ripe", route_object("ripe", "10.0.0.0/16", 1)).await;

    let (prefixes, _) = prefix_report(&registry, PrefixId::parse("10.0.0.200/32").unwrap(), false)
        .await
        .unwrap();

    assert_eq!(prefixes.len(), 3);
    assert!(prefixes.contains_key("10.0.0.0/16"));
    assert!(prefixes.contains_key("10.0.0.128/25"));
    assert!(prefixes.contains_key("10.0.1.0/24"));
    assert_eq!(prefixes["10.0.0.0/16"]["bgp_origin"], serde_json::json!(false));
    assert_eq!(prefixes["10.0.0.128/25"]["ripe"], serde_json::json!("-"));
    assert_eq!(prefixes["10.0.1.0/24"]["ripe"], serde_json::json!("-"));
}

#[tokio::test]
async fn s6_no_prefix_anywhere() {
    let (registry, _senders) = spawn_registry(&["ripe"], vec![], vec![]).await;

    let result = prefix_report(&registry, PrefixId::parse("203.0.113.0/24").unwrap(), false).await;
    assert!(matches!(result, Err(ExplorerError::NoPrefix(_))));
}

#[tokio::test]
async fn fan_out_returns_exactly_one_result_per_configured_database() {
    let (registry, _senders) = spawn_registry(&["ripe", "radb", "arin"], vec![], vec![]).await;
    let results = irr_explorer::fanout::irr_query(
        &registry,
        irr_explorer::worker::DbQuery::SearchExact(PrefixId::parse("10.0.0.0/24").unwrap()),
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 3);
    let mut names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["arin", "radb", "ripe"]);
}
