//! Tag catalog endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use forkful_common::AppResult;

use crate::{middleware::AppState, response::TagResponse};

/// List all tags.
async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TagResponse>>> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

/// One tag by id.
async fn show(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> AppResult<Json<TagResponse>> {
    let tag = state.tag_service.get(&tag_id).await?;
    Ok(Json(tag.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
