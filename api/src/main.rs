use api::auth::middleware::log_request;
use api::routes::routes;
use api::ws::ws_routes;
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use util::{config, state::AppState, ws::WebSocketManager};

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", config::log_file());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("api=info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(fmt::layer().with_target(false)).init();
    } else {
        registry.init();
    }

    guard
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _log_guard = init_logging();

    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    let app_state = AppState::new(db, WebSocketManager::new());

    let app = axum::Router::new()
        .nest("/api", routes(app_state.clone()))
        .nest("/ws", ws_routes(app_state))
        .layer(axum::middleware::from_fn(log_request))
        .layer(CorsLayer::very_permissive());

    let addr = format!("{}:{}", config::host(), config::port());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
