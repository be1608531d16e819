use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;
use serde_json::{json, Map, Value};

use super::classify::{classify, Label};
use crate::error::{ExplorerError, ExplorerResult};
use crate::fanout::irr_query;
use crate::radix::RadixTree;
use crate::types::{Origin, OriginSet, PrefixId};
use crate::worker::{BgpQuery, BgpResponse, DbQuery, DbResponse, WorkerRegistry};

/// The `ripe` IRR database is also the RIPE-managed coverage authority's
/// own mirror; it needs special treatment when computing `anywhere_not_ripe`
/// (§4.F step 4).
const RIPE_DB: &str = "ripe";

fn bgp_response_to_rows(resp: BgpResponse) -> Vec<(PrefixId, OriginSet)> {
    match resp {
        BgpResponse::Exact(Some(row)) => vec![row],
        BgpResponse::Exact(None) => Vec::new(),
        BgpResponse::Aggregate(row) => row.into_iter().collect(),
        BgpResponse::Specifics(rows) => rows,
    }
}

fn db_response_to_rows(resp: DbResponse) -> Vec<(PrefixId, OriginSet)> {
    match resp {
        DbResponse::Exact(Some(row)) => vec![row],
        DbResponse::Exact(None) => Vec::new(),
        DbResponse::Aggregate(row) => row.into_iter().collect(),
        DbResponse::Specifics(rows) => rows,
        DbResponse::Prefixes(_) | DbResponse::Members(_) => Vec::new(),
    }
}

struct RowState {
    bgp: Option<OriginSet>,
    irr: HashMap<String, OriginSet>,
}

impl Default for RowState {
    fn default() -> Self {
        RowState {
            bgp: None,
            irr: HashMap::new(),
        }
    }
}

/// Resolves the scope to report on (§4.F step 1): either the exact prefix
/// queried, or the least-specific aggregate spanning both BGP and every
/// IRR worker's own idea of the covering prefix.
async fn resolve_specifics(
    registry: &WorkerRegistry,
    prefix: PrefixId,
    exact: bool,
) -> ExplorerResult<(Vec<(PrefixId, OriginSet)>, Vec<(String, Vec<(PrefixId, OriginSet)>)>)> {
    if exact {
        let bgp_rows = bgp_response_to_rows(registry.bgp().query(BgpQuery::SearchExact(prefix)).await?);
        let irr_rows = irr_query(registry, DbQuery::SearchExact(prefix))
            .await?
            .into_iter()
            .map(|(db, resp)| (db, db_response_to_rows(resp)))
            .collect();
        return Ok((bgp_rows, irr_rows));
    }

    let bgp_agg = match registry.bgp().query(BgpQuery::SearchAggregate(prefix)).await? {
        BgpResponse::Aggregate(row) => row,
        _ => None,
    };
    let irr_agg: Vec<(String, Option<(PrefixId, OriginSet)>)> =
        irr_query(registry, DbQuery::SearchAggregate(prefix))
            .await?
            .into_iter()
            .map(|(db, resp)| {
                let row = match resp {
                    DbResponse::Aggregate(row) => row,
                    _ => None,
                };
                (db, row)
            })
            .collect();

    let mut candidates: RadixTree<()> = RadixTree::new();
    if let Some((p, _)) = &bgp_agg {
        candidates.add(*p);
    }
    for (_, row) in &irr_agg {
        if let Some((p, _)) = row {
            candidates.add(*p);
        }
    }

    let aggregate = candidates
        .search_worst(&prefix)
        .map(|(p, _)| p)
        .ok_or_else(|| {
            ExplorerError::NoPrefix(format!(
                "could not find any matching prefix in IRR or BGP tables for {prefix}"
            ))
        })?;

    let bgp_rows = bgp_response_to_rows(registry.bgp().query(BgpQuery::SearchSpecifics(aggregate)).await?);
    let irr_rows = irr_query(registry, DbQuery::SearchSpecifics(aggregate))
        .await?
        .into_iter()
        .map(|(db, resp)| (db, db_response_to_rows(resp)))
        .collect();
    Ok((bgp_rows, irr_rows))
}

/// Produces the cross-registry report for `prefix` (§4.F). Returns the
/// per-prefix JSON object map plus a human-readable summary noting any IRR
/// databases dropped from the output for carrying no data at all.
pub async fn prefix_report(
    registry: &WorkerRegistry,
    prefix: PrefixId,
    exact: bool,
) -> ExplorerResult<(Map<String, Value>, String)> {
    let (bgp_rows, irr_rows) = resolve_specifics(registry, prefix, exact).await?;

    let mut rows: BTreeMap<PrefixId, RowState> = BTreeMap::new();
    for (p, set) in bgp_rows {
        rows.entry(p).or_default().bgp = Some(set);
    }
    for (db, db_rows) in &irr_rows {
        for (p, set) in db_rows {
            rows.entry(*p).or_default().irr.insert(db.clone(), set.clone());
        }
    }

    // Step 3: RIPE coverage, one fan-out per prefix in scope. Per §7 a
    // failing RIPE check fails the whole report rather than being treated
    // as "not managed" -- that would be indistinguishable from a real
    // answer.
    let prefixes: Vec<PrefixId> = rows.keys().copied().collect();
    let coverage: Vec<bool> = join_all(prefixes.iter().map(|p| registry.ripe().is_covered(*p)))
        .await
        .into_iter()
        .collect::<ExplorerResult<Vec<bool>>>()?;
    let ripe_managed: HashMap<PrefixId, bool> = prefixes.into_iter().zip(coverage).collect();

    let all_db_names: Vec<String> = registry
        .database_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    // Step 4: classification.
    struct Classified {
        prefix: PrefixId,
        bgp: OriginSet,
        irr: HashMap<String, OriginSet>,
        ripe_managed: bool,
        advice: &'static str,
        label: Label,
    }

    let mut classified = Vec::with_capacity(rows.len());
    for (prefix, state) in rows {
        let bgp = state.bgp.clone().unwrap_or_default();
        let r = state.irr.get(RIPE_DB).cloned().unwrap_or_default();
        let anywhere = state
            .irr
            .values()
            .fold(OriginSet::default(), |acc, set| acc.union(set));
        let anywhere_not_ripe = state
            .irr
            .iter()
            .filter(|(db, _)| db.as_str() != RIPE_DB)
            .fold(OriginSet::default(), |acc, (_, set)| acc.union(set));
        let managed = *ripe_managed.get(&prefix).unwrap_or(&false);
        let advice = classify(managed, &r, &bgp, &anywhere, &anywhere_not_ripe);
        classified.push(Classified {
            prefix,
            bgp,
            irr: state.irr,
            ripe_managed: managed,
            advice: advice.text,
            label: advice.label,
        });
    }

    // Step 5: post-process -- drop DBs with no data anywhere in scope, "-"
    // the rest.
    let db_has_data: HashMap<&str, bool> = all_db_names
        .iter()
        .map(|db| {
            let has_data = classified
                .iter()
                .any(|row| row.irr.get(db).is_some_and(|set| !set.is_empty()));
            (db.as_str(), has_data)
        })
        .collect();
    let db_truncate: Vec<&str> = all_db_names
        .iter()
        .map(String::as_str)
        .filter(|db| !db_has_data.get(db).copied().unwrap_or(false))
        .collect();
    let db_keep: Vec<&str> = all_db_names
        .iter()
        .map(String::as_str)
        .filter(|db| db_has_data.get(db).copied().unwrap_or(false))
        .collect();

    let mut out = Map::new();
    for row in classified {
        let mut obj = Map::new();
        obj.insert("bgp_origin".to_string(), origin_cell(&row.bgp));
        obj.insert("ripe_managed".to_string(), json!(row.ripe_managed));
        obj.insert("advice".to_string(), json!(row.advice));
        obj.insert("label".to_string(), json!(label_str(row.label)));
        for db in &db_keep {
            let value = row
                .irr
                .get(*db)
                .filter(|set| !set.is_empty())
                .map(origin_cell)
                .unwrap_or_else(|| json!("-"));
            obj.insert((*db).to_string(), value);
        }
        out.insert(row.prefix.to_string(), Value::Object(obj));
    }

    let summary = if db_truncate.is_empty() {
        String::new()
    } else {
        format!(
            "No relevant information databases: {}",
            db_truncate.join(" ")
        )
    };

    Ok((out, summary))
}

fn origin_cell(set: &OriginSet) -> Value {
    if set.is_empty() {
        json!(false)
    } else {
        json!(set.to_sorted_vec().iter().map(|o: &Origin| o.0).collect::<Vec<u32>>())
    }
}

fn label_str(label: Label) -> &'static str {
    match label {
        Label::Success => "success",
        Label::Warning => "warning",
        Label::Danger => "danger",
    }
}
