//! Routes and request handlers of the KPI API

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::ApiError;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{
    CauseMap, EvidenceItem, EvidenceQuery, PeriodQuery, RankingItem, RankingQuery, Status,
};
use crate::validated_query::ValidatedQuery;

use axum::{
    body::BoxBody,
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// The API service, with trailing slashes removed from request paths.
pub type Service = NormalizePath<Router>;

/// Returns a [Router] serving the API over the given state.
pub fn router(state: SharedAppState) -> Router {
    fn v1() -> Router<SharedAppState> {
        Router::new()
            .route("/ranking/riesgo", get(ranking))
            .route("/productos/:asin/mapa-causas", get(cause_map))
            .route("/productos/:asin/evidencia", get(evidence))
    }

    Router::new()
        .route("/", get(status))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", v1())
        .layer(
            TraceLayer::new_for_http()
                .on_request(request_counter)
                .on_response(record_response_metrics::<BoxBody>),
        )
        .with_state(state)
}

/// Returns the API [Service] for the given arguments.
///
/// The storage backend is connected here, once for the life of the service.
pub async fn service(args: &CommandLineArgs) -> Service {
    let state = Arc::new(AppState::new(args).await);
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

async fn status() -> Json<Status> {
    Json(Status::default())
}

async fn ranking(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<RankingQuery>,
) -> Result<Json<Vec<RankingItem>>, ApiError> {
    let ranking = state.service.ranking(&query.periodo, query.top_n).await?;
    if ranking.is_empty() {
        return Err(ApiError::not_found(format!(
            "No se encontraron datos de ranking para el periodo: {}",
            query.periodo
        )));
    }
    Ok(Json(ranking))
}

async fn cause_map(
    State(state): State<SharedAppState>,
    Path(asin): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PeriodQuery>,
) -> Result<Json<CauseMap>, ApiError> {
    match state.service.cause_map(&query.periodo, &asin).await? {
        Some(cause_map) if !cause_map.mapa_causas.is_empty() => Ok(Json(cause_map)),
        _ => Err(ApiError::not_found(format!(
            "No se encontraron causas para ASIN: {}, Periodo: {}",
            asin, query.periodo
        ))),
    }
}

async fn evidence(
    State(state): State<SharedAppState>,
    Path(asin): Path<String>,
    ValidatedQuery(query): ValidatedQuery<EvidenceQuery>,
) -> Result<Json<Vec<EvidenceItem>>, ApiError> {
    if !state.service.cause_labels().contains(&query.causa) {
        return Err(ApiError::UnknownCause { cause: query.causa });
    }
    let evidence = state
        .service
        .evidence(&query.periodo, &asin, &query.causa)
        .await?;
    if evidence.is_empty() {
        return Err(ApiError::not_found(format!(
            "No se encontró evidencia para ASIN: {}, Causa: {}",
            asin, query.causa
        )));
    }
    Ok(Json(evidence))
}
