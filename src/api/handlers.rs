//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::state::{AppState, TimerError, TimerId, TimerSnapshot};
use super::responses::{
    CreateTimerRequest, ElapsedResponse, ErrorResponse, HealthResponse, RenameTimerRequest,
    StatusResponse,
};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(action: &str, e: TimerError) -> ApiError {
    match e {
        TimerError::NotFound(id) => {
            warn!("{} requested for unknown timer {}", action, id);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("not_found", e.to_string())),
            )
        }
        TimerError::Store(_) => {
            error!("Failed to {} timer: {}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal", e.to_string())),
            )
        }
    }
}

/// Handle POST /api/players - Create a stopped timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateTimerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TimerSnapshot>), ApiError> {
    // A bodiless request creates a default player; a bad body is rejected
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateTimerRequest::default(),
        Err(rejection) => {
            warn!("Rejected create request: {}", rejection.body_text());
            return Err((
                rejection.status(),
                Json(ErrorResponse::new("bad_request", rejection.body_text())),
            ));
        }
    };
    state
        .create_timer(request.name)
        .map(|timer| (StatusCode::CREATED, Json(timer)))
        .map_err(|e| api_error("create", e))
}

/// Handle GET /api/players - List all timers
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TimerSnapshot>>, ApiError> {
    state
        .list_timers()
        .map(Json)
        .map_err(|e| api_error("list", e))
}

/// Handle GET /api/players/:id - Fetch one timer
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<TimerSnapshot>, ApiError> {
    state
        .get_timer(id)
        .map(Json)
        .map_err(|e| api_error("get", e))
}

/// Handle PATCH /api/players/:id - Rename a timer
pub async fn rename_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Json(request): Json<RenameTimerRequest>,
) -> Result<Json<TimerSnapshot>, ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("bad_request", "name must not be blank".to_string())),
        ));
    }

    state
        .rename_timer(id, name)
        .map(Json)
        .map_err(|e| api_error("rename", e))
}

/// Handle POST /api/players/:id/start - Start a timer
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<TimerSnapshot>, ApiError> {
    match state.start_timer(id) {
        Ok(timer) => {
            info!("Start endpoint called for timer {}", id);
            Ok(Json(timer))
        }
        Err(e) => Err(api_error("start", e)),
    }
}

/// Handle POST /api/players/:id/stop - Stop a timer
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<TimerSnapshot>, ApiError> {
    match state.stop_timer(id) {
        Ok(timer) => {
            info!("Stop endpoint called for timer {}", id);
            Ok(Json(timer))
        }
        Err(e) => Err(api_error("stop", e)),
    }
}

/// Handle GET /api/players/:id/elapsed - Live elapsed time
pub async fn elapsed_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ElapsedResponse>, ApiError> {
    state
        .current_elapsed(id)
        .map(|current_time| Json(ElapsedResponse { id, current_time }))
        .map_err(|e| api_error("read", e))
}

/// Handle DELETE /api/players/:id - Delete a timer
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<StatusCode, ApiError> {
    state
        .delete_timer(id)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| api_error("delete", e))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (timers, running) = state
        .timer_counts()
        .map_err(|e| api_error("count", e))?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timers,
        running,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
