//! User, profile, and subscription endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use forkful_common::AppResult;
use forkful_core::{RegisterUser, RelationKind, UserProfile};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Page, SubscriptionResponse, UserResponse},
};

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Page selection query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Subscription listing query parameters.
#[derive(Debug, Deserialize)]
pub struct SubscriptionsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Cap on each author's recipe preview.
    pub recipes_limit: Option<u64>,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .register(RegisterUser {
            email: req.email,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        })
        .await?;
    let profile = UserProfile {
        user,
        is_subscribed: false,
    };
    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// List users with the caller's subscription flags.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<UserResponse>>> {
    let (page, limit) = state.resolve_page(query.page, query.limit);
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let (profiles, count) = state.user_service.list(viewer_id, page, limit).await?;
    let results = profiles.into_iter().map(Into::into).collect();
    Ok(Json(Page::new(count, page, limit, results)))
}

/// The caller's own profile.
async fn me(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<Json<UserResponse>> {
    let profile = state.user_service.profile(Some(&user.id), &user.id).await?;
    Ok(Json(profile.into()))
}

/// Change the caller's password.
async fn set_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .user_service
        .change_password(&user, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One user's profile as seen by the caller.
async fn profile(
    maybe_viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let profile = state
        .user_service
        .profile(maybe_viewer.viewer_id(), &user_id)
        .await?;
    Ok(Json(profile.into()))
}

/// Authors the caller subscribes to, with recipe previews.
async fn subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SubscriptionsQuery>,
) -> AppResult<Json<Page<SubscriptionResponse>>> {
    let (page, limit) = state.resolve_page(query.page, query.limit);
    let (authors, count) = state
        .user_service
        .subscriptions(&user.id, page, limit, query.recipes_limit)
        .await?;
    let results = authors.into_iter().map(Into::into).collect();
    Ok(Json(Page::new(count, page, limit, results)))
}

/// Subscribe to an author.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(author_id): Path<String>,
    Query(query): Query<SubscriptionsQuery>,
) -> AppResult<(StatusCode, Json<SubscriptionResponse>)> {
    state
        .relation_service
        .add(RelationKind::Subscription, &user.id, &author_id)
        .await?;
    let author = state
        .user_service
        .author_preview(&author_id, query.recipes_limit)
        .await?;
    Ok((StatusCode::CREATED, Json(author.into())))
}

/// Unsubscribe from an author.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(author_id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .relation_service
        .remove(RelationKind::Subscription, &user.id, &author_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register).get(list))
        .route("/me", get(me))
        .route("/set_password", post(set_password))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(profile))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}
