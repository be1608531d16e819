use futures::future::join_all;

use crate::error::{ExplorerError, ExplorerResult};
use crate::worker::{DbQuery, DbResponse, WorkerRegistry};

/// Broadcasts `query` to every configured IRR database worker and joins
/// all the answers (§4.E). Per §7, partial coverage must never be returned
/// silently -- a worker that errors out fails the whole fan-out rather
/// than being dropped from the result set, since a missing DB would
/// otherwise be indistinguishable from a DB with no data.
pub async fn irr_query(
    registry: &WorkerRegistry,
    query: DbQuery,
) -> ExplorerResult<Vec<(String, DbResponse)>> {
    let futures = registry.databases().map(|handle| {
        let query = query.clone();
        let dbname = handle.dbname.clone();
        async move {
            handle
                .query(query)
                .await
                .map(|response| (dbname.clone(), response))
                .map_err(|err| {
                    ExplorerError::Internal(format!("'{dbname}' did not answer: {err}"))
                })
        }
    });
    join_all(futures).await.into_iter().collect()
}

/// Targets exactly one named worker (§4.E), returning `WorkerUnready`-style
/// errors verbatim since there's only one answer to report on.
pub async fn other_query(
    registry: &WorkerRegistry,
    dbname: &str,
    query: DbQuery,
) -> ExplorerResult<DbResponse> {
    match registry.database(dbname) {
        Some(handle) => handle.query(query).await,
        None => Err(crate::error::ExplorerError::BadInput(format!(
            "no such database: '{dbname}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::bgp::EmptyBgpSource;
    use crate::config::{Config, DatabaseConfig, DatabaseEntry, FamilyFilter};
    use crate::ripe::EmptyRipeSource;
    use crate::types::{Origin, PrefixId};

    fn config_with(names: &[&str]) -> Config {
        let databases = names
            .iter()
            .map(|name| {
                let mut map = std::collections::HashMap::new();
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

    #[tokio::test]
    async fn irr_query_joins_every_worker() {
        let config = config_with(&["radb", "arin"]);
        let (registry, senders, ready_rxs) = WorkerRegistry::spawn(
            &config,
            Arc::new(EmptyBgpSource),
            Arc::new(EmptyRipeSource),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );
        for rx in ready_rxs {
            rx.await.unwrap();
        }

        let prefix = PrefixId::parse("10.0.0.0/24").unwrap();
        senders["radb"]
            .send(crate::nrtm::NrtmEvent::add(
                1,
                crate::types::RpslObject {
                    source: "radb".to_string(),
                    kind: crate::types::ObjectKind::Route,
                    name: "10.0.0.0/24".to_string(),
                    origin: Some(Origin(1)),
                    members: None,
                },
            ))
            .await
            .unwrap();

        // Drain via a direct query so we know the ingest landed first.
        registry
            .database("radb")
            .unwrap()
            .query(DbQuery::SearchExact(prefix))
            .await
            .unwrap();

        let results = irr_query(&registry, DbQuery::SearchExact(prefix)).await.unwrap();
        assert_eq!(results.len(), 2);
        let radb = results.iter().find(|(name, _)| name == "radb").unwrap();
        assert!(matches!(&radb.1, DbResponse::Exact(Some(_))));
        let arin = results.iter().find(|(name, _)| name == "arin").unwrap();
        assert!(matches!(&arin.1, DbResponse::Exact(None)));
    }

    #[tokio::test]
    async fn other_query_rejects_an_unknown_worker() {
        let config = config_with(&["radb"]);
        let (registry, _senders, ready_rxs) = WorkerRegistry::spawn(
            &config,
            Arc::new(EmptyBgpSource),
            Arc::new(EmptyRipeSource),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );
        for rx in ready_rxs {
            rx.await.unwrap();
        }

        let result = other_query(
            &registry,
            "nonexistent",
            DbQuery::SearchExact(PrefixId::parse("10.0.0.0/24").unwrap()),
        )
        .await;
        assert!(matches!(
            result,
            Err(crate::error::ExplorerError::BadInput(_))
        ));
    }
}
