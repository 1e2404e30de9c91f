// File: services/deenify_backend/src/main.rs
use axum::{routing::get, Json, Router};
use deenify_config::load_config;
use deenify_events::handlers::EventsState;
use deenify_firebase::handlers::FirebaseState;
use deenify_location::handlers::LocationState;
use deenify_prayer::handlers::PrayerState;
use deenify_quran::handlers::QuranState;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

mod app_state;
mod auth;
mod cron;
mod service_factory;

use app_state::AppState;
use auth::ApiKeyAuthState;

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Deenify API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_handler(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "status": if state.db_client.is_healthy().await { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[tokio::main]
async fn main() {
    deenify_common::logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));

    info!("Starting Deenify backend...");

    let state = Arc::new(
        AppState::new(config.clone())
            .await
            .expect("Failed to initialize application state"),
    );
    info!("Database connected and schemas initialized");

    // Warm the Quran mirror in the background so boot stays fast on an
    // empty database.
    if config.use_quran {
        let quran = state.quran.clone();
        tokio::spawn(async move {
            if let Err(e) = quran.initialize_cache().await {
                error!("Quran cache initialization failed: {}", e);
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    cron::spawn_periodic_tasks(state.clone(), shutdown_rx);

    // Assemble the /api router from the feature crates
    let firebase_state = Arc::new(FirebaseState {
        config: config.clone(),
        gateway: state.gateway.clone(),
        devices: state.devices.clone(),
        notifications: state.notifications.clone(),
        scheduler: state.scheduler.clone(),
    });
    let prayer_state = Arc::new(PrayerState {
        config: config.clone(),
        prayer_times: state.prayer_times.clone(),
    });
    let quran_state = Arc::new(QuranState {
        config: config.clone(),
        service: state.quran.clone(),
    });
    let events_state = Arc::new(EventsState {
        config: config.clone(),
        events: state.events.clone(),
    });

    let mut api_router = Router::new()
        .merge(deenify_firebase::routes(firebase_state))
        .merge(deenify_prayer::routes(prayer_state))
        .merge(deenify_quran::routes(quran_state))
        .merge(deenify_events::routes(events_state));

    if let Some(location) = &state.location {
        let location_state = Arc::new(LocationState {
            config: config.clone(),
            service: location.clone(),
        });
        api_router = api_router.merge(deenify_location::routes(location_state));
    }

    // Everything under /api requires the client API key; / and /health
    // stay open for probes.
    let auth_state = Arc::new(ApiKeyAuthState {
        config: config.clone(),
    });
    let api_router = api_router.layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth::api_key_middleware,
    ));

    #[allow(unused_mut)]
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler).with_state(state.clone()))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    // Conditionally add Swagger UI and the merged OpenAPI document
    #[cfg(feature = "openapi")]
    {
        use deenify_events::doc::EventsApiDoc;
        use deenify_firebase::openapi::FirebaseApiDoc;
        use deenify_location::doc::LocationApiDoc;
        use deenify_prayer::doc::PrayerApiDoc;
        use deenify_quran::doc::QuranApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Deenify API",
                version = "0.1.0",
                description = "Deenify backend API docs",
            ),
            servers((url = "/api", description = "Main API prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(FirebaseApiDoc::openapi());
        openapi_doc.merge(PrayerApiDoc::openapi());
        openapi_doc.merge(QuranApiDoc::openapi());
        openapi_doc.merge(LocationApiDoc::openapi());
        openapi_doc.merge(EventsApiDoc::openapi());

        info!("Adding Swagger UI at /api/docs");
        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc.clone());
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    info!("Server running at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("Server error");

    info!("Server stopped");
}

/// Resolves on ctrl-c and tells the periodic tasks to stop; an in-flight
/// sweep finishes its current batch before its loop exits.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down gracefully...");
    let _ = shutdown_tx.send(true);
}
