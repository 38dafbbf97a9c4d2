use api::app;
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use std::{net::SocketAddr, time::Duration};
use tracing_appender::rolling;
use util::config::AppConfig;
use util::jwt::JwtKeys;
use util::state::AppState;
use util::ws::{ConnectionRegistry, WsServerOptions};

#[tokio::main]
async fn main() {
    let config = AppConfig::global();

    // Load configuration and initialize logging
    let _log_guard = init_logging(&config);

    if config.jwt_secret.is_empty() {
        tracing::error!("JWT_SECRET is not set; refusing to start");
        std::process::exit(1);
    }

    let Some(session_ttl) = config.session_ttl() else {
        tracing::error!(
            minutes = config.session_ttl_minutes,
            "SESSION_TTL_MINUTES must be a positive number of minutes that fits in a timestamp"
        );
        std::process::exit(1);
    };
    let Some(jwt_duration) = config.jwt_duration() else {
        tracing::error!(
            minutes = config.jwt_duration_minutes,
            "JWT_DURATION_MINUTES must be a positive number of minutes that fits in a timestamp"
        );
        std::process::exit(1);
    };

    // Database and schema
    let db = db::connect().await.expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let registry = ConnectionRegistry::new();
    let ws_options = WsServerOptions {
        heartbeat: Duration::from_secs(config.ws_heartbeat_secs.max(1)),
        ..WsServerOptions::default()
    };
    let app_state = AppState::new(db, registry.clone(), JwtKeys::from_secret(&config.jwt_secret))
        .with_ws_options(ws_options)
        .with_session_ttl(session_ttl)
        .with_jwt_duration(jwt_duration);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!(
        "Starting {} ({}) on http://{}",
        config.project_name,
        config.env,
        addr
    );

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app(app_state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(registry, grace))
    .await
    .expect("Server crashed");

    tracing::info!("Server stopped");
}

/// Resolves once SIGINT or SIGTERM arrives, after closing every live session connection.
async fn shutdown_signal(registry: ConnectionRegistry, grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(live = registry.len(), "Shutdown signal received, closing session connections");
    let forced = registry.shutdown(grace).await;
    if forced > 0 {
        tracing::warn!(forced, "Terminated connections that did not close in time");
    }
}

fn init_logging(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("api=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config.log_to_stdout {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
