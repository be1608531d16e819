use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::ExplorerError;
use crate::fanout::irr_query;
use crate::report::prefix_report;
use crate::types::{Origin, PrefixId};
use crate::worker::{DbQuery, DbResponse, WorkerRegistry};

/// Builds the three-route JSON surface (§4.G, §6). Everything else the
/// original served -- HTML forms, template rendering -- is out of scope.
pub fn router(registry: Arc<WorkerRegistry>) -> Router {
    Router::new()
        .route("/autnum/:asn", get(autnum))
        .route("/prefix_json/*prefix", get(prefix_json))
        .route("/exact_prefix_json/*prefix", get(exact_prefix_json))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExplorerError::BadInput(_) | ExplorerError::NoPrefix(_) => StatusCode::BAD_REQUEST,
            ExplorerError::WorkerUnready => StatusCode::SERVICE_UNAVAILABLE,
            ExplorerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

async fn autnum(
    State(registry): State<Arc<WorkerRegistry>>,
    Path(asn): Path<String>,
) -> Result<Json<Value>, ExplorerError> {
    let origin = Origin::parse(&asn)?;
    let results = irr_query(&registry, DbQuery::InverseAsn(origin)).await?;
    let mut out = serde_json::Map::new();
    for (dbname, response) in results {
        if let DbResponse::Prefixes(prefixes) = response {
            let list: Vec<String> = prefixes.iter().map(PrefixId::to_string).collect();
            out.insert(dbname, json!(list));
        }
    }
    Ok(Json(Value::Object(out)))
}

async fn prefix_json(
    State(registry): State<Arc<WorkerRegistry>>,
    Path(prefix): Path<String>,
) -> Result<Json<Value>, ExplorerError> {
    render_report(&registry, &prefix, false).await
}

async fn exact_prefix_json(
    State(registry): State<Arc<WorkerRegistry>>,
    Path(prefix): Path<String>,
) -> Result<Json<Value>, ExplorerError> {
    render_report(&registry, &prefix, true).await
}

async fn render_report(
    registry: &WorkerRegistry,
    prefix: &str,
    exact: bool,
) -> Result<Json<Value>, ExplorerError> {
    let parsed = PrefixId::parse(prefix)?;
    let (prefixes, summary) = prefix_report(registry, parsed, exact).await?;
    let mut envelope = serde_json::Map::new();
    envelope.insert("prefixes".to_string(), Value::Object(prefixes));
    envelope.insert("summary".to_string(), json!(summary));
    Ok(Json(Value::Object(envelope)))
}
