//! Token authentication endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use forkful_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

/// Exchange credentials for a token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let auth_token = state.user_service.login(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(LoginResponse { auth_token })))
}

/// Invalidate the caller's token.
async fn logout(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    state.user_service.logout(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token/login", post(login))
        .route("/token/logout", post(logout))
}
