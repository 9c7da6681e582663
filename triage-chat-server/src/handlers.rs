use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use triage_chat_agent::{TurnOutcome, GENERIC_ERROR};

use crate::state::{AppState, SymptomRequest};

pub async fn symptom_checker_handler(
    State(state): State<AppState>,
    payload: Result<Json<SymptomRequest>, JsonRejection>,
) -> (StatusCode, Json<TurnOutcome>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Rejected symptom-checker request body: {}", e);
            return generic_error();
        }
    };

    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(TurnOutcome::Error("Message is required".to_string())),
        );
    }

    let outcome = state
        .handler
        .handle_turn(&request.message, &request.history)
        .await;

    let status = if outcome.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}

pub async fn health_handler() -> &'static str {
    "ok"
}

fn generic_error() -> (StatusCode, Json<TurnOutcome>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(TurnOutcome::Error(GENERIC_ERROR.to_string())),
    )
}
