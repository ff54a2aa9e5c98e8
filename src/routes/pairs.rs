use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{MatchError, PairingEngine, SimilarityProvider};
use crate::models::{
    ErrorResponse, HealthResponse, MatchOutcome, PairUsersRequest, PairingResponse, PairingRun,
    PairingRunResponse, UserRecord,
};
use crate::services::PairStore;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn SimilarityProvider>,
    pub store: Arc<dyn PairStore>,
    pub engine: PairingEngine,
    pub slot_labels: Arc<Vec<String>>,
}

/// Configure all pairing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/pairs/preview", web::post().to(preview_pairs))
        .route("/pairs/run", web::post().to(run_pairs))
        .route("/pairs/latest", web::get().to(latest_pairs));
}

fn error_response(status: u16, error: &str, message: String) -> HttpResponse {
    let body = ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status,
    };

    match status {
        400 => HttpResponse::BadRequest().json(body),
        404 => HttpResponse::NotFound().json(body),
        502 => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn match_error_response(err: &MatchError) -> HttpResponse {
    match err {
        MatchError::DuplicateHandle(_) | MatchError::MaskWidth { .. } | MatchError::Mask(_) => {
            error_response(400, "Invalid user snapshot", err.to_string())
        }
        MatchError::Similarity(_) | MatchError::MatrixShape { .. } => {
            error_response(502, "Similarity scoring failed", err.to_string())
        }
    }
}

/// Validate the request and run the engine over it
async fn compute(
    state: &AppState,
    req: &PairUsersRequest,
) -> Result<MatchOutcome, HttpResponse> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for pairing request: {:?}", errors);
        return Err(error_response(400, "Validation failed", errors.to_string()));
    }

    tracing::info!("Pairing {} users", req.users.len());

    state
        .engine
        .run(&req.users, state.provider.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("Pairing run failed: {}", e);
            match_error_response(&e)
        })
}

fn build_response(state: &AppState, users: &[UserRecord], outcome: &MatchOutcome) -> PairingResponse {
    PairingResponse::build(users, outcome, &state.slot_labels)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.store.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Dry run: pair users without touching stored results
///
/// POST /api/v1/pairs/preview
///
/// Request body:
/// ```json
/// {
///   "users": [
///     {"handle": "string", "gender": "male|female", "about": "string", "availability": "101000"}
///   ]
/// }
/// ```
async fn preview_pairs(
    state: web::Data<AppState>,
    req: web::Json<PairUsersRequest>,
) -> impl Responder {
    match compute(&state, &req).await {
        Ok(outcome) => HttpResponse::Ok().json(build_response(&state, &req.users, &outcome)),
        Err(response) => response,
    }
}

/// Pair users and replace the stored results with the new run
///
/// POST /api/v1/pairs/run
async fn run_pairs(
    state: web::Data<AppState>,
    req: web::Json<PairUsersRequest>,
) -> impl Responder {
    let outcome = match compute(&state, &req).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    let run = PairingRun::from_outcome(&req.users, &outcome);

    if let Err(e) = state.store.replace_all(&run).await {
        tracing::error!("Failed to store pairing run {}: {}", run.run_id, e);
        return error_response(500, "Failed to store pairing results", e.to_string());
    }

    tracing::info!(
        "Run {} stored: {} pairs, {} full matches",
        run.run_id,
        outcome.pairs.len(),
        outcome.full_matches.len()
    );

    HttpResponse::Ok().json(PairingRunResponse {
        run_id: run.run_id,
        created_at: run.created_at,
        result: build_response(&state, &req.users, &outcome),
    })
}

/// Latest stored run
///
/// GET /api/v1/pairs/latest
async fn latest_pairs(state: web::Data<AppState>) -> impl Responder {
    match state.store.load_latest().await {
        Ok(Some(run)) => HttpResponse::Ok().json(run),
        Ok(None) => error_response(404, "Not found", "No pairing run has been stored yet".to_string()),
        Err(e) => {
            tracing::error!("Failed to load latest pairing run: {}", e);
            error_response(500, "Failed to load pairing results", e.to_string())
        }
    }
}
