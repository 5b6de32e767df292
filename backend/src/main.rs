mod ai;
mod api;
mod auth;
mod config;
mod database;
mod error;
mod market;
mod models;
mod services;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::Arc;

use crate::{
    api::handlers,
    config::AppConfig,
    database::Database,
    services::AppServices,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Arc<Database>,
    pub services: Arc<AppServices>,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        // Profile
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        // Advisor features
        .route(
            "/income-generation",
            post(handlers::generate_income).get(handlers::list_income),
        )
        .route("/budget/analyze", post(handlers::analyze_budget))
        .route("/budget/latest", get(handlers::latest_budget))
        .route("/investment/advice", post(handlers::investment_advice))
        .route("/investment/latest", get(handlers::latest_investment))
        .route("/opportunities/scan", post(handlers::scan_opportunities))
        .route("/opportunities/latest", get(handlers::latest_scan))
        // Education
        .route("/education/lessons", get(handlers::get_lessons))
        .route("/education/complete/:lesson_id", post(handlers::complete_lesson))
        .route("/education/progress", get(handlers::get_progress))
        // Chat
        .route("/ai-chat", post(handlers::chat))
        .route("/ai-chat/history", get(handlers::chat_history))
        // Market data
        .route("/market/overview", get(handlers::market_overview))
        .route("/market/stock/:symbol", get(handlers::stock_quote))
        .route("/market/forex/:from/:to", get(handlers::forex_rate))
        // Dashboard
        .route("/dashboard/stats", get(handlers::dashboard_stats))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finpath_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::new()?);
    let database = Arc::new(Database::new(&config).await?);
    let services = Arc::new(AppServices::new(&config));

    let app_state = AppState {
        config: config.clone(),
        database,
        services,
    };

    let app = Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&app_state.config.server.cors_origins)),
        )
        .with_state(app_state);

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!(model = %config.llm.model, "Server starting on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
