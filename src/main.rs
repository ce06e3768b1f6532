//! ResQ-Link Backend
//!
//! A production-grade REST backend coordinating disaster-relief logistics:
//! SOS broadcasts, volunteer missions, donor pledges and global inventory.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod notify;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use notify::NotificationDispatcher;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub notifier: NotificationDispatcher,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ResQ-Link Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Start the notification delivery worker
    let notifier = NotificationDispatcher::spawn(repo.clone());

    // Create application state
    let state = AppState {
        repo,
        notifier,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone state for the auth layer closure
    let auth_state = state.clone();

    // Routes behind bearer authentication
    let protected_routes = Router::new()
        // Auth / users
        .route("/auth/profile", put(api::update_profile))
        .route("/auth/users", get(api::list_users))
        .route("/auth/users/{id}", put(api::set_user_role))
        .route("/auth/users/{id}", delete(api::delete_user))
        // SOS lifecycle
        .route("/sos", post(api::create_sos))
        .route("/sos", get(api::list_open_sos))
        .route("/sos/my", get(api::list_my_sos))
        .route("/sos/history", get(api::volunteer_history))
        .route("/sos/analytics", get(api::sos_analytics))
        .route("/sos/volunteers-list", get(api::list_volunteers))
        .route("/sos/assign", put(api::assign_task))
        .route("/sos/{id}/accept", put(api::accept_task))
        .route("/sos/{id}/status", put(api::update_sos_status))
        // Resource request lifecycle
        .route("/resources", post(api::create_resource))
        .route("/resources", get(api::list_pending_resources))
        .route("/resources/my", get(api::list_my_resources))
        .route("/resources/donations", get(api::list_my_donations))
        .route("/resources/logistics", get(api::list_logistics_tasks))
        .route(
            "/resources/distribution-history",
            get(api::distribution_history),
        )
        .route("/resources/{id}/fulfill", put(api::fulfill_resource))
        .route("/resources/{id}/status", put(api::update_resource_status))
        .route("/resources/{id}/approve", put(api::approve_resource))
        .route("/resources/{id}/reject", put(api::reject_resource))
        .route("/resources/{id}/absorb", put(api::absorb_donation))
        // Inventory ledger
        .route("/inventory", get(api::list_inventory))
        .route("/inventory", post(api::add_inventory_item))
        .route("/inventory/{id}", put(api::update_stock))
        .route("/inventory/{id}", delete(api::remove_inventory_item))
        // Contact administration
        .route("/contact", get(api::list_contact_messages))
        .route("/contact/{id}/status", put(api::update_contact_status))
        // Apply bearer auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::auth_layer(auth_state.clone(), req, next)
        }));

    // Routes reachable without a credential
    let public_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/admin-login", post(api::admin_login))
        .route("/auth/forgot-password", post(api::forgot_password))
        .route("/auth/reset-password", post(api::reset_password))
        .route("/contact", post(api::submit_contact));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", protected_routes.merge(public_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
