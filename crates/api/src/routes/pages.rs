use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use pageforge_core::document::{validate, PageDocument, PageRecord};
use pageforge_core::events::types::{
    DeletedEvent, DuplicatedEvent, PageEvent, PublishedEvent, SavedEvent,
};
use pageforge_core::export;
use pageforge_core::store::PageStore;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Page persistence routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/pages/{name}",
            put(save_page).get(get_page).delete(delete_page),
        )
        .route("/v1/pages/{name}/publish", post(publish_page))
        .route("/v1/pages/{name}/duplicate", post(duplicate_page))
        .route("/v1/pages/{name}/backup", post(backup_page))
        .route("/v1/pages/{name}/history", get(page_history))
        .route("/v1/pages/{name}/export", get(export_page))
        .route("/v1/search", get(search_pages))
}

#[derive(Debug, Deserialize)]
struct SaveQuery {
    #[serde(default)]
    published: bool,
}

/// Upsert a page document. The body is validated structurally before it
/// touches the store.
async fn save_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SaveQuery>,
    Json(body): Json<Value>,
) -> ApiResult<Json<PageRecord>> {
    let report = validate(&body);
    if !report.valid {
        return Err(ApiError::Validation(report));
    }
    let document: PageDocument = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed page document: {e}")))?;

    let record = state.store().save(&name, &document, query.published).await?;

    state.event_bus().publish(PageEvent::Saved(SavedEvent {
        page_name: record.page_name.clone(),
        version: record.version,
        is_published: record.is_published,
        timestamp: Utc::now(),
    }));
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct ReadQuery {
    state: Option<String>,
}

/// Read a page, optionally filtered by publish state
/// (`?state=published|draft|any`).
async fn get_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ReadQuery>,
) -> ApiResult<Json<PageRecord>> {
    let record = match query.state.as_deref() {
        Some("published") => state.store().get_published(&name).await?,
        Some("draft") => state.store().get_draft(&name).await?,
        None | Some("any") => state.store().load(&name).await?,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unknown state filter: {other}"
            )))
        }
    };
    record
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("page: {name}")))
}

async fn delete_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    state.store().delete(&name).await?;
    state.event_bus().publish(PageEvent::Deleted(DeletedEvent {
        page_name: name,
        timestamp: Utc::now(),
    }));
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

async fn publish_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<PageRecord>> {
    let record = state.store().publish(&name).await?;
    state
        .event_bus()
        .publish(PageEvent::Published(PublishedEvent {
            page_name: record.page_name.clone(),
            timestamp: Utc::now(),
        }));
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateRequest {
    new_name: String,
}

async fn duplicate_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<DuplicateRequest>,
) -> ApiResult<Json<PageRecord>> {
    let record = state.store().duplicate(&name, &request.new_name).await?;
    state
        .event_bus()
        .publish(PageEvent::Duplicated(DuplicatedEvent {
            source_name: name,
            new_name: record.page_name.clone(),
            timestamp: Utc::now(),
        }));
    Ok(Json(record))
}

async fn backup_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<PageRecord>> {
    let record = state.store().backup(&name).await?;
    state
        .event_bus()
        .publish(PageEvent::Duplicated(DuplicatedEvent {
            source_name: name,
            new_name: record.page_name.clone(),
            timestamp: Utc::now(),
        }));
    Ok(Json(record))
}

async fn page_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<PageRecord>>> {
    Ok(Json(state.store().history(&name).await?))
}

/// Download a page as a portable export payload.
async fn export_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .store()
        .load(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("page: {name}")))?;

    let payload = export::export(&record.page_name, &record.page_data, record.version);
    let disposition = format!("attachment; filename=\"{}\"", payload.file_name());
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(payload),
    ))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search_pages(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PageRecord>>> {
    Ok(Json(state.store().search(&query.q).await?))
}
