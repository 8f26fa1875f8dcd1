//! Forkful server entry point.

use std::sync::Arc;

use axum::{Router, middleware};
use forkful_api::{middleware::AppState, router as api_router};
use forkful_common::Config;
use forkful_core::{
    IngredientService, RecipeService, RelationService, ShoppingListService, TagService,
    UserService,
};
use forkful_db::repositories::{
    FavoriteRepository, IngredientRepository, RecipeRepository, ShoppingCartRepository,
    SubscriptionRepository, TagRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set variables directly.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forkful=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting forkful server...");

    let config = Config::load()?;

    let db = Arc::new(forkful_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    forkful_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let user_repo = UserRepository::new(db.clone());
    let recipe_repo = RecipeRepository::new(db.clone());
    let ingredient_repo = IngredientRepository::new(db.clone());
    let tag_repo = TagRepository::new(db.clone());
    let favorite_repo = FavoriteRepository::new(db.clone());
    let cart_repo = ShoppingCartRepository::new(db.clone());
    let subscription_repo = SubscriptionRepository::new(db.clone());

    // Services
    let user_service = UserService::new(
        user_repo.clone(),
        subscription_repo.clone(),
        recipe_repo.clone(),
    );
    let recipe_service = RecipeService::new(
        recipe_repo.clone(),
        favorite_repo.clone(),
        cart_repo.clone(),
        subscription_repo.clone(),
        ingredient_repo.clone(),
        tag_repo.clone(),
        user_repo.clone(),
    );
    let relation_service = RelationService::new(
        favorite_repo,
        cart_repo.clone(),
        subscription_repo,
        recipe_repo.clone(),
        user_repo,
    );
    let shopping_list_service = ShoppingListService::new(cart_repo, recipe_repo);
    let ingredient_service = IngredientService::new(ingredient_repo);
    let tag_service = TagService::new(tag_repo);

    let state = AppState {
        user_service,
        recipe_service,
        relation_service,
        shopping_list_service,
        ingredient_service,
        tag_service,
        pagination: config.pagination.clone(),
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            forkful_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
