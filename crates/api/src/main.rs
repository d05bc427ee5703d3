use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use letterdesk_api::config::ServerConfig;
use letterdesk_api::router::build_app_router;
use letterdesk_api::state::{AppState, DisabledMailer};
use letterdesk_jobs::analyzer::ScriptRosterAnalyzer;
use letterdesk_jobs::ProgressTracker;
use letterdesk_mailer::{Mailer, MailerConfig, SmtpMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "letterdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    tokio::fs::create_dir_all(&config.data_root)
        .await
        .expect("Failed to create data root directory");
    tracing::info!(data_root = %config.data_root.display(), "Data root ready");

    // --- Email ---
    let (mailer, email_enabled): (Arc<dyn Mailer>, bool) = match MailerConfig::from_env() {
        Some(mail_config) => {
            tracing::info!(host = %mail_config.smtp_host, "SMTP delivery configured");
            (Arc::new(SmtpMailer::new(mail_config)), true)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; email delivery disabled");
            (Arc::new(DisabledMailer), false)
        }
    };

    // --- Roster analyzer ---
    let analyzer = Arc::new(ScriptRosterAnalyzer::new(
        config.analyzer_program.clone(),
        config.analyzer_script.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: ProgressTracker::new(),
        mailer,
        analyzer,
        email_enabled,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
