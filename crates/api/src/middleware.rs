//! API middleware and shared application state.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use forkful_common::config::PaginationConfig;
use forkful_core::{
    IngredientService, RecipeService, RelationService, ShoppingListService, TagService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub recipe_service: RecipeService,
    pub relation_service: RelationService,
    pub shopping_list_service: ShoppingListService,
    pub ingredient_service: IngredientService,
    pub tag_service: TagService,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Resolve optional page/limit query parameters against the
    /// configured defaults and cap.
    #[must_use]
    pub fn resolve_page(&self, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(self.pagination.default_limit)
            .clamp(1, self.pagination.max_limit);
        (page, limit)
    }
}

/// Authentication middleware. Resolves a `Token <key>` or `Bearer <key>`
/// Authorization header to a user and stashes it in request extensions;
/// endpoints decide whether an anonymous caller is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str
            .strip_prefix("Token ")
            .or_else(|| auth_str.strip_prefix("Bearer "))
        && let Ok(user) = state.user_service.authenticate(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
