use actix_web::{web, HttpResponse, Responder};
use std::time::Duration;
use validator::Validate;

use crate::core::pipeline::{HistoricalBonus, PipelineError, RankingRequest};
use crate::models::{
    AccessibilityRequest, AccessibilityResponse, ErrorResponse, HealthResponse, RankListingsRequest,
    RankListingsResponse, TransportMode,
};
use crate::routes::AppState;
use crate::services::InMemoryCandidateSource;

/// Configure listing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/listings/rank", web::post().to(rank_listings))
        .route("/listings/accessibility", web::post().to(compare_accessibility));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank listings endpoint
///
/// POST /api/v1/listings/rank
///
/// Request body:
/// ```json
/// {
///   "query": "casa en Godoy Cruz con 2 habitaciones hasta 150000",
///   "userId": "string",
///   "limit": 10,
///   "constraints": { "budget": 150000, "minRooms": 2, "transportMode": "walk" },
///   "candidates": [{ "id": "p1", "price": 140000, "rooms": 2, "location": "Godoy Cruz" }]
/// }
/// ```
async fn rank_listings(
    state: web::Data<AppState>,
    req: web::Json<RankListingsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for rank request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();

    let constraints = match req.constraints.as_ref().map(|c| c.to_constraints()).transpose() {
        Ok(constraints) => constraints.unwrap_or_default(),
        Err(message) => {
            return HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "Invalid constraints".to_string(),
                message,
                status_code: 422,
            });
        }
    };

    let limit = req
        .limit
        .unwrap_or(state.pipeline.default_limit())
        .min(state.ranking.max_limit);

    tracing::info!(
        "Ranking {} candidates, limit: {}, user: {:?}",
        req.candidates.len(),
        limit,
        req.user_id
    );

    let snapshot = match &req.user_id {
        Some(user_id) => {
            let snapshot = state.history.snapshot(user_id).await;
            if snapshot.is_none() {
                tracing::debug!("No preference snapshot for {}, ranking without history bonus", user_id);
            }
            snapshot
        }
        None => None,
    };

    let source = InMemoryCandidateSource::new(req.candidates)
        .with_hard_filters(state.ranking.hard_filters)
        .with_fetch_limit(state.ranking.fetch_limit);

    let request = RankingRequest {
        text: req.query,
        constraints,
        limit: Some(limit),
    };

    let history = snapshot.as_deref().map(|s| s as &dyn HistoricalBonus);
    let run = state
        .pipeline
        .run(&request, state.classifier.as_ref(), &source, history);

    match tokio::time::timeout(Duration::from_millis(state.ranking.timeout_ms), run).await {
        Ok(Ok(outcome)) => {
            tracing::info!(
                "Returning {} listings (from {} candidates), intent: {:?}",
                outcome.results.len(),
                outcome.total_candidates,
                outcome.intent
            );
            HttpResponse::Ok().json(RankListingsResponse {
                intent: outcome.intent,
                profile: outcome.profile,
                results: outcome.results,
                total_candidates: outcome.total_candidates,
                stages: outcome.stages,
            })
        }
        Ok(Err(e)) => {
            tracing::error!("Ranking pipeline failed after {:?}: {}", e.failed_after(), e);
            let error = match e {
                PipelineError::Classification(_) => "Classification failed",
                PipelineError::Retrieval(_) => "Candidate retrieval failed",
            };
            HttpResponse::BadGateway().json(ErrorResponse {
                error: error.to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
        Err(_) => {
            tracing::error!("Ranking timed out after {} ms", state.ranking.timeout_ms);
            HttpResponse::GatewayTimeout().json(ErrorResponse {
                error: "Ranking timed out".to_string(),
                message: format!("No result within {} ms", state.ranking.timeout_ms),
                status_code: 504,
            })
        }
    }
}

/// Compare transport modes endpoint
///
/// POST /api/v1/listings/accessibility
///
/// Request body:
/// ```json
/// { "distanceM": 1200, "modes": ["walk", "bike", "bus", "car"] }
/// ```
async fn compare_accessibility(
    state: web::Data<AppState>,
    req: web::Json<AccessibilityRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let modes: &[TransportMode] = if req.modes.is_empty() {
        &TransportMode::ALL
    } else {
        &req.modes
    };

    let evaluations = state.pipeline.transport().compare_modes(req.distance_m, modes);

    HttpResponse::Ok().json(AccessibilityResponse {
        distance_m: req.distance_m,
        best_mode: evaluations.first().map(|e| e.mode),
        evaluations,
    })
}
