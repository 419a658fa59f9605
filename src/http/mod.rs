//! HTTP Surface: the `axum` router the pipeline is driven through when
//! running as a service rather than via the one-shot CLI `run` command.
//!
//! Exactly five routes, per the external interfaces contract: submit a
//! job, poll it, cancel it, stream it over SSE, and fetch one chunk's
//! content. State is a handful of `Arc`-wrapped components shared with the
//! CLI's `serve` command.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::Job;
use crate::error::Error;
use crate::jobs::JobManager;
use crate::llm::Router as LlmRouter;
use crate::notes::NotesStore;
use crate::vector_index::VectorIndex;
use crate::web_search::WebSearch;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Job registry the pipeline reports into.
    pub jobs: Arc<JobManager>,
    /// Notes and chunks.
    pub store: Arc<NotesStore>,
    /// Dense vector index.
    pub index: Arc<VectorIndex>,
    /// LLM task router.
    pub llm: Arc<LlmRouter>,
    /// Web search client for the verifier.
    pub web_search: Arc<WebSearch>,
}

/// Builds the router with tracing and permissive CORS layered on, matching
/// the reference codebase's convention of logging every request.
#[must_use]
pub fn router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/generate-insights", post(generate_insights))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/cancel", post(cancel_job))
        .route("/jobs/{id}/events", get(job_events))
        .route("/chunks/{id}", post(get_chunk))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cancelled => StatusCode::CONFLICT,
            Self::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { code: self.code().to_string(), message: self.to_string() })).into_response()
    }
}

/// `{code, message}` error body shape.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GenerateInsightsRequest {
    source_note_id: Uuid,
}

#[derive(Debug, Serialize)]
struct GenerateInsightsResponse {
    job_id: Uuid,
    trace_id: Uuid,
}

async fn generate_insights(
    State(state): State<AppState>,
    Json(request): Json<GenerateInsightsRequest>,
) -> Result<(StatusCode, Json<GenerateInsightsResponse>), Error> {
    let (job, _cancelled) = state.jobs.create();
    let response = GenerateInsightsResponse { job_id: job.id, trace_id: job.trace_id };

    let jobs = Arc::clone(&state.jobs);
    let store = Arc::clone(&state.store);
    let index = Arc::clone(&state.index);
    let llm = Arc::clone(&state.llm);
    let web_search = Arc::clone(&state.web_search);
    let job_id = job.id;
    let source_note_id = request.source_note_id;

    tokio::spawn(async move {
        jobs.start(job_id);
        match crate::orchestrator::run_pipeline(job_id, &jobs, &llm, &store, &index, &web_search, source_note_id).await {
            Ok(result) => jobs.complete(job_id, result),
            Err(Error::Cancelled) => {
                // Cancellation already recorded the terminal CANCELLED
                // status; no failure body is attached.
            }
            Err(err) => jobs.fail(job_id, err.code(), err.to_string()),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Job>, Error> {
    state.jobs.get(id).map(Json).ok_or_else(|| Error::not_found("job", id))
}

async fn cancel_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Job>, Error> {
    state.jobs.cancel(id)?;
    state.jobs.get(id).map(Json).ok_or_else(|| Error::not_found("job", id))
}

async fn job_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.jobs.events(id).map(|job| {
        let event = Event::default().event("job").json_data(&job).unwrap_or_else(|_| Event::default());
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[derive(Debug, Serialize)]
struct ChunkView {
    chunk_id: i64,
    note_id: Uuid,
    note_title: String,
    content: String,
}

async fn get_chunk(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<ChunkView>, Error> {
    let note_id = state.store.note_id_for_chunk(id)?.ok_or_else(|| Error::not_found("chunk", id))?;
    let note = state.store.get_note(note_id)?.ok_or_else(|| Error::not_found("note", note_id))?;
    let chunk = state
        .store
        .get_chunks(note_id)?
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::not_found("chunk", id))?;

    Ok(Json(ChunkView { chunk_id: chunk.id, note_id: note.id, note_title: note.title, content: chunk.content }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn fake_state() -> AppState {
        let config = Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() };
        AppState {
            jobs: Arc::new(JobManager::new()),
            store: Arc::new(NotesStore::in_memory().unwrap()),
            index: Arc::new(VectorIndex::new(768)),
            llm: Arc::new(LlmRouter::new(config)),
            web_search: Arc::new(WebSearch::new(None)),
        }
    }

    #[tokio::test]
    async fn get_unknown_job_returns_404() {
        let app = router(fake_state());
        let response = app
            .oneshot(Request::builder().uri(format!("/jobs/{}", Uuid::new_v4())).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generate_insights_returns_202_with_job_id() {
        let state = fake_state();
        let source = crate::domain::Note::new("Source".to_string(), "Body.".to_string());
        state.store.upsert_note(&source).unwrap();
        let app = router(state);

        let body = serde_json::json!({ "source_note_id": source.id }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate-insights")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn cancel_unknown_job_returns_404() {
        let app = router(fake_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/jobs/{}/cancel", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_unknown_chunk_returns_404() {
        let app = router(fake_state());
        let response = app
            .oneshot(Request::builder().method("POST").uri("/chunks/999").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
