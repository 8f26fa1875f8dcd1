//! Ingredient catalog endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use forkful_common::AppResult;
use serde::Deserialize;

use crate::{middleware::AppState, response::IngredientResponse};

/// Ingredient search query parameters.
#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// List ingredients, optionally narrowed by name prefix.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<Vec<IngredientResponse>>> {
    let ingredients = state.ingredient_service.list(query.name.as_deref()).await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

/// One ingredient by id.
async fn show(
    State(state): State<AppState>,
    Path(ingredient_id): Path<String>,
) -> AppResult<Json<IngredientResponse>> {
    let ingredient = state.ingredient_service.get(&ingredient_id).await?;
    Ok(Json(ingredient.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
