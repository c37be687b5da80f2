use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, RecordInteractionRequest, RecordInteractionResponse, SnapshotResponse};
use crate::routes::AppState;
use crate::services::Interaction;

/// Configure interaction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/interactions", web::post().to(record_interaction))
        .route("/interactions/snapshot", web::get().to(get_snapshot));
}

/// Record interaction endpoint
///
/// POST /api/v1/interactions
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "listingId": "string",
///   "location": "Godoy Cruz",
///   "price": 140000,
///   "score": 0.93
/// }
/// ```
async fn record_interaction(
    state: web::Data<AppState>,
    req: web::Json<RecordInteractionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let mut interaction = Interaction::new(req.user_id, req.listing_id, req.location, req.price);
    interaction.score = req.score;
    let interaction_id = interaction.id.clone();

    tracing::debug!("Recording interaction {} -> {}", interaction.user_id, interaction.listing_id);
    state.history.record(interaction).await;

    HttpResponse::Ok().json(RecordInteractionResponse {
        success: true,
        interaction_id,
    })
}

/// Get the learned preference snapshot for a user
///
/// GET /api/v1/interactions/snapshot?userId={userId}
async fn get_snapshot(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.history.snapshot(user_id).await {
        Some(snapshot) => HttpResponse::Ok().json(SnapshotResponse {
            user_id: user_id.clone(),
            snapshot: (*snapshot).clone(),
        }),
        None => HttpResponse::NotFound().json(ErrorResponse {
            error: "Snapshot not found".to_string(),
            message: format!("No learned preferences for {} yet", user_id),
            status_code: 404,
        }),
    }
}
