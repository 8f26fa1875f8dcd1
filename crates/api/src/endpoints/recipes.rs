//! Recipe endpoints: CRUD, relation toggles, and the shopping list
//! download.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::Query;
use forkful_common::AppResult;
use forkful_core::{RecipeListQuery, RecipeWrite, RecipeWriteIngredient, RelationKind};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Page, RecipeResponse, RecipeSummary},
};

/// Recipe listing query parameters. `tags` may repeat.
#[derive(Debug, Deserialize)]
pub struct RecipeQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

/// One ingredient line of a write request.
#[derive(Debug, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: String,
    pub amount: i32,
}

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct RecipeWriteRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    pub tags: Vec<String>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<RecipeWriteRequest> for RecipeWrite {
    fn from(req: RecipeWriteRequest) -> Self {
        Self {
            name: req.name,
            image: req.image,
            text: req.text,
            cooking_time: req.cooking_time,
            ingredients: req
                .ingredients
                .into_iter()
                .map(|item| RecipeWriteIngredient {
                    id: item.id,
                    amount: item.amount,
                })
                .collect(),
            tags: req.tags,
        }
    }
}

const fn flag(value: Option<u8>) -> bool {
    matches!(value, Some(1))
}

/// List recipes with filters and caller flags.
async fn list(
    maybe_viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<Page<RecipeResponse>>> {
    let (page, limit) = state.resolve_page(query.page, query.limit);
    let list_query = RecipeListQuery {
        author: query.author,
        tags: query.tags,
        is_favorited: flag(query.is_favorited),
        is_in_shopping_cart: flag(query.is_in_shopping_cart),
        page,
        limit,
    };
    let (details, count) = state
        .recipe_service
        .list(maybe_viewer.viewer_id(), &list_query)
        .await?;
    let results = details.into_iter().map(Into::into).collect();
    Ok(Json(Page::new(count, page, limit, results)))
}

/// Publish a new recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RecipeWriteRequest>,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let details = state.recipe_service.create(&user, req.into()).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// One recipe as seen by the caller.
async fn show(
    maybe_viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<RecipeResponse>> {
    let details = state
        .recipe_service
        .get(maybe_viewer.viewer_id(), &recipe_id)
        .await?;
    Ok(Json(details.into()))
}

/// Replace a recipe's fields and components. Author-only.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(req): Json<RecipeWriteRequest>,
) -> AppResult<Json<RecipeResponse>> {
    let details = state
        .recipe_service
        .update(&user, &recipe_id, req.into())
        .await?;
    Ok(Json(details.into()))
}

/// Delete a recipe. Author-only.
async fn destroy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<StatusCode> {
    state.recipe_service.delete(&user, &recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to the caller's favorites.
async fn favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<(StatusCode, Json<RecipeSummary>)> {
    toggle_on(&state, RelationKind::Favorite, &user.id, &recipe_id).await
}

/// Remove a recipe from the caller's favorites.
async fn unfavorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .relation_service
        .remove(RelationKind::Favorite, &user.id, &recipe_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to the caller's shopping cart.
async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<(StatusCode, Json<RecipeSummary>)> {
    toggle_on(&state, RelationKind::Cart, &user.id, &recipe_id).await
}

/// Remove a recipe from the caller's shopping cart.
async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .relation_service
        .remove(RelationKind::Cart, &user.id, &recipe_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_on(
    state: &AppState,
    kind: RelationKind,
    user_id: &str,
    recipe_id: &str,
) -> AppResult<(StatusCode, Json<RecipeSummary>)> {
    state.relation_service.add(kind, user_id, recipe_id).await?;
    let details = state.recipe_service.get(Some(user_id), recipe_id).await?;
    Ok((StatusCode::CREATED, Json(details.recipe.into())))
}

/// Download the caller's aggregated shopping list as plain text.
async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let report = state.shopping_list_service.report(&user.id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        report,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route("/{id}", get(show).patch(update).delete(destroy))
        .route("/{id}/favorite", axum::routing::post(favorite).delete(unfavorite))
        .route(
            "/{id}/shopping_cart",
            axum::routing::post(add_to_cart).delete(remove_from_cart),
        )
}
