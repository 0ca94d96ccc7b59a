use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Json as ExtractJson, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use mindbridge_core::{HealthState, JobKind};
use serde_json::{json, Value};
use vector_store::{NewRepository, NewVectorDocument};

use crate::errors::ApiError;
use crate::models::{
    CreateRepositoryRequest, CreateRepositoryResponse, HealthResponse, IngestRequest,
    IngestResponse, ReadinessResponse, SearchHit, SearchRequest, SearchResponse,
};
use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "mindbridge",
        "version": VERSION,
        "description": "Hybrid vector retrieval service",
        "status": "running",
    }))
}

/// Liveness probe: answers healthy as long as the process serves requests.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthState::Healthy,
        timestamp: now_rfc3339(),
        version: VERSION.to_string(),
    })
}

/// Readiness probe: verifies the database and Redis are reachable and
/// returns 503 when either is not.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.record_request("/ready");

    let db_healthy = sqlx::query("SELECT 1")
        .execute(state.store.pool())
        .await
        .is_ok();
    let redis_healthy = state.cache.ping().await.unwrap_or(false);

    let mut checks = BTreeMap::new();
    checks.insert(
        "database".to_string(),
        if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );
    checks.insert(
        "redis".to_string(),
        if redis_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );

    let all_healthy = db_healthy && redis_healthy;
    let response = ReadinessResponse {
        status: if all_healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        },
        checks,
    };

    if all_healthy {
        (StatusCode::OK, Json(response))
    } else {
        tracing::warn!(checks = ?response.checks, "readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Full database report: connectivity, pgvector extension, pool usage.
pub async fn database_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.record_request("/health/database");

    let report = state.health_checker().comprehensive().await;
    let status = if report.state == HealthState::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Chunk, embed and store a document in the vector table.
pub async fn ingest_document(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    state.metrics.record_request("/documents");

    request.validate()?;

    let chunks = state.chunker.chunk_text(&request.content);
    if chunks.is_empty() {
        return Err(ApiError::Validation("content produced no chunks".to_string()));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = state
        .embedder
        .embed(texts)
        .await
        .map_err(|e| ApiError::Embedding(format!("{:#}", e)))?;

    if vectors.len() != chunks.len() {
        return Err(ApiError::Embedding(format!(
            "embedding count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }

    let mut ids = Vec::with_capacity(chunks.len());
    for (chunk, embedding) in chunks.iter().zip(vectors) {
        let doc = NewVectorDocument {
            content: chunk.content.clone(),
            title: request.title.clone(),
            source_url: request.source_url.clone(),
            embedding,
            document_type: request.document_type.clone(),
            repository_id: request.repository_id,
            document_id: None,
            file_path: request.file_path.clone(),
        };

        let stored = state
            .store
            .insert_document(doc)
            .await
            .map_err(ApiError::from_database)?;
        ids.push(stored.id);
    }

    tracing::info!(chunks = ids.len(), "document ingested");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            chunks: ids.len(),
            ids,
        }),
    ))
}

/// Embed the query and run cosine similarity search, optionally scoped to a
/// repository.
pub async fn search(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    state.metrics.record_request("/search");

    request.validate()?;

    let mut vectors = state
        .embedder
        .embed(vec![request.query.clone()])
        .await
        .map_err(|e| ApiError::Embedding(format!("{:#}", e)))?;
    let query_embedding = vectors
        .pop()
        .ok_or_else(|| ApiError::Embedding("provider returned no vector".to_string()))?;

    let limit = request.effective_limit();
    let results = match request.repository_id {
        Some(repository_id) => state
            .store
            .search_by_repository(repository_id, query_embedding, limit)
            .await
            .map_err(ApiError::from_database)?,
        None => state
            .store
            .search_similar(query_embedding, limit)
            .await
            .map_err(ApiError::from_database)?,
    };

    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|r| SearchHit {
            id: r.document.id,
            content: r.document.content,
            title: r.document.title,
            document_type: r.document.document_type,
            repository_id: r.document.repository_id,
            file_path: r.document.file_path,
            similarity: r.similarity,
        })
        .collect();

    Ok(Json(SearchResponse {
        count: hits.len(),
        results: hits,
    }))
}

/// Register a repository and queue its initial indexing job.
pub async fn create_repository(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<CreateRepositoryRequest>,
) -> Result<(StatusCode, Json<CreateRepositoryResponse>), ApiError> {
    state.metrics.record_request("/repositories");

    request.validate()?;

    let repository = state
        .store
        .create_repository(&NewRepository {
            name: request.name,
            url: request.url,
            branch: request.branch,
            description: request.description,
        })
        .await
        .map_err(ApiError::from_database)?;

    let job = state
        .store
        .create_job(
            repository.id,
            JobKind::Indexing,
            Some(json!({"repository_id": repository.id})),
        )
        .await
        .map_err(ApiError::from_database)?;

    // The job row is authoritative; a failed broker push is recoverable by
    // the periodic schedule, so it does not fail the request.
    if let Err(e) = state.queue.enqueue(
        JobKind::Indexing,
        json!({"job_id": job.id, "repository_id": repository.id}),
    ) {
        tracing::warn!(job_id = job.id, error = %e, "failed to enqueue indexing task");
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateRepositoryResponse {
            repository,
            job_id: job.id,
        }),
    ))
}

pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    state.metrics.record_request("/repositories");

    let repositories = state
        .store
        .list_repositories()
        .await
        .map_err(ApiError::from_database)?;

    Ok(Json(json!({
        "repositories": repositories,
        "count": repositories.len(),
    })))
}
