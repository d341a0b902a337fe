//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Error mapping: an empty corpus is 404, an unreachable corpus is 503,
//! rejected input is 400, anything else is 500.

use super::{
    AppState,
    types::{
        ExportResponse, ForgetRequest, ForgetResponse, HealthResponse, RecordRequest,
        RecordResponse, RespondRequest, RespondResponse, StatusResponse,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rand::SeedableRng;
use rand::rngs::StdRng;
use riposte_core::{RiposteError, Session, Statement, corpus_to_bytes, snapshot_checksum};
use std::path::Path;

/// HTTP status for a core error.
fn error_status(error: &RiposteError) -> StatusCode {
    match error {
        RiposteError::EmptyCorpus => StatusCode::NOT_FOUND,
        RiposteError::AccessorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RiposteError::InvalidStatement(_) | RiposteError::InvalidConfig(_) => {
            StatusCode::BAD_REQUEST
        }
        RiposteError::SerializationError(_)
        | RiposteError::DeserializationError(_)
        | RiposteError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Write the snapshot file when running on the file backend.
fn persist(snapshot: Option<&Path>, session: &Session) -> Result<(), RiposteError> {
    match snapshot {
        Some(path) => crate::cli::save_session(session, path),
        None => Ok(()),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get corpus status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.metrics() {
        Ok(metrics) => Ok(Json(StatusResponse::new(
            metrics,
            session.is_persistent(),
            state.learn,
        ))),
        Err(e) => {
            tracing::warn!(error = %e, "Status unavailable");
            Err((error_status(&e), e.to_string()))
        }
    }
}

// =============================================================================
// RESPOND HANDLER
// =============================================================================

/// Answer an input statement.
///
/// Selection is CPU-bound, so it runs on the blocking pool with an owned
/// write guard; async workers stay free for other requests.
pub async fn respond_handler(
    State(state): State<AppState>,
    Json(request): Json<RespondRequest>,
) -> impl IntoResponse {
    let learn = request.learn.unwrap_or(state.learn);
    let extra_data = request.extra_data.unwrap_or_default();

    let mut session = state.session.clone().write_owned().await;
    let chain = state.chain.clone();
    let snapshot = state.snapshot.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        let turn = session
            .respond(&chain, &request.text, extra_data, learn, &mut rng)
            .map_err(|e| (error_status(&e), format!("Respond failed: {}", e)))?;
        if turn.learned {
            persist(snapshot.as_deref(), &session)
                .map_err(|e| (error_status(&e), format!("Persist failed: {}", e)))?;
        }
        Ok::<_, (StatusCode, String)>(turn)
    })
    .await;

    match outcome {
        Ok(Ok(turn)) => (StatusCode::OK, Json(RespondResponse::success(turn))),
        Ok(Err((status, message))) => (status, Json(RespondResponse::error(message))),
        Err(e) => {
            tracing::error!(error = %e, "Respond task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RespondResponse::error(format!("Respond task failed: {}", e))),
            )
        }
    }
}

// =============================================================================
// RECORD HANDLER
// =============================================================================

/// Record a statement, optionally as a reply.
pub async fn record_handler(
    State(state): State<AppState>,
    Json(request): Json<RecordRequest>,
) -> impl IntoResponse {
    let statement =
        Statement::new(request.text).with_extra_data(request.extra_data.unwrap_or_default());

    let mut session = state.session.write().await;
    let result = session
        .record(&statement, request.in_response_to.as_deref())
        .and_then(|()| persist(state.snapshot.as_deref(), &session))
        .and_then(|()| session.statement_count());

    match result {
        Ok(count) => (StatusCode::OK, Json(RecordResponse::success(count))),
        Err(e) => (
            error_status(&e),
            Json(RecordResponse::error(format!("Record failed: {}", e))),
        ),
    }
}

// =============================================================================
// FORGET HANDLER
// =============================================================================

/// Remove a statement and every link to it.
pub async fn forget_handler(
    State(state): State<AppState>,
    Json(request): Json<ForgetRequest>,
) -> impl IntoResponse {
    let mut session = state.session.write().await;
    let result = session.forget(&request.text).and_then(|removed| {
        if removed {
            persist(state.snapshot.as_deref(), &session)?;
        }
        Ok(removed)
    });

    match result {
        Ok(removed) => (StatusCode::OK, Json(ForgetResponse::success(removed))),
        Err(e) => (
            error_status(&e),
            Json(ForgetResponse::error(format!("Forget failed: {}", e))),
        ),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the corpus as a base64 snapshot with its checksum.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    let records = match session.export_records() {
        Ok(records) => records,
        Err(e) => {
            return (
                error_status(&e),
                Json(ExportResponse::error(format!(
                    "Failed to read corpus: {}",
                    e
                ))),
            );
        }
    };

    match corpus_to_bytes(&records) {
        Ok(data) => (
            StatusCode::OK,
            Json(ExportResponse::success(
                &data,
                snapshot_checksum(&data),
                records.len(),
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
