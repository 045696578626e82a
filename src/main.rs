use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use dotenvy::dotenv;
use http::HeaderValue;
use hso_store::app::create_router;
use hso_store::clients::notifications::EmailNotifier;
use hso_store::clients::sentoo::SentooClient;
use hso_store::clients::storage::SupabaseStorage;
use hso_store::config::security_config::JWTSecret;
use hso_store::logging::setup_logging;
use hso_store::models::models::AppState;
use hso_store::services::sweep::{sweep_stale_reservations, SweepPolicy};
use std::{env, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tokio::time::{interval, Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), eyre::Error> {
    // initialize tracing with environment-based log level (default: DEBUG)
    setup_logging();

    info!("Starting store backend");

    // load environment variables
    dotenv().ok();
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let cors_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .collect::<Vec<String>>();

    info!("cors origins: {:?}", cors_origins);

    // database connection pool
    let manager = ConnectionManager::<PgConnection>::new(db_url);

    let pool = Pool::builder().max_size(10).build(manager).map_err(|e| {
        error!("Failed to create database pool: {}", e);
        eyre::eyre!("Failed to create database pool: {}", e)
    })?;

    let gateway = SentooClient::new(
        env::var("SENTOO_API_URL").unwrap_or_else(|_| "https://api.sentoo.io".to_string()),
        require_env("SENTOO_MERCHANT_ID")?,
        require_env("SENTOO_SECRET")?,
    );

    let storage = SupabaseStorage::new(
        require_env("SUPABASE_URL")?,
        require_env("SUPABASE_SERVICE_KEY")?,
        env::var("STORAGE_BUCKET").unwrap_or_else(|_| "invoices".to_string()),
    );

    let notifier = EmailNotifier::new(
        env::var("RESEND_API_URL").unwrap_or_else(|_| "https://api.resend.com".to_string()),
        env::var("RESEND_API_KEY").unwrap_or_default(),
        env::var("EMAIL_FROM").unwrap_or_else(|_| "orders@example.com".to_string()),
    );

    let delivery_fee_cents: i64 = env::var("DELIVERY_FEE_CENTS")
        .unwrap_or_else(|_| "1000".to_string())
        .parse()
        .map_err(|e| eyre::eyre!("Invalid DELIVERY_FEE_CENTS: {}", e))?;

    //AppState
    let state = Arc::new(AppState {
        db: pool,
        gateway: Arc::new(gateway),
        storage: Arc::new(storage),
        notifier: Arc::new(notifier),
        jwt_secret: JWTSecret::new().jwt_secret,
        cron_secret: env::var("CRON_SECRET").unwrap_or_default(),
        site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        admin_email: require_env("ADMIN_EMAIL")?,
        admin_password_hash: require_env("ADMIN_PASSWORD_HASH")?,
        delivery_fee_cents,
    });

    // In-process sweep timer; 0 disables it (an external cron can hit
    // /cron/revert-reserved instead).
    let sweep_interval_minutes: u64 = env::var("SWEEP_INTERVAL_MINUTES")
        .unwrap_or_else(|_| "0".to_string())
        .parse()
        .map_err(|e| eyre::eyre!("Invalid SWEEP_INTERVAL_MINUTES: {}", e))?;
    if sweep_interval_minutes > 0 {
        tokio::spawn(background_sweep(state.clone(), sweep_interval_minutes));
    }

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(
            cors_origins
                .iter()
                .map(|s| s.parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()?,
        );

    let app = create_router(state).layer(cors);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);
    info!(
        "Swagger UI available at http://{}/swagger-ui/index.html#/",
        addr
    );

    // serve graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

fn require_env(name: &str) -> Result<String, eyre::Error> {
    env::var(name).map_err(|_| {
        error!("{} environment variable not set", name);
        eyre::eyre!("{} environment variable must be set", name)
    })
}

// handle Ctrl+C for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn background_sweep(state: Arc<AppState>, minutes: u64) {
    let mut interval = interval(Duration::from_secs(minutes * 60));
    loop {
        interval.tick().await;
        match sweep_stale_reservations(&state, SweepPolicy::Cron).await {
            Ok(report) => {
                if report.reverted > 0 || !report.details.is_empty() {
                    info!(
                        "Scheduled sweep: {} reverted, {} inspected",
                        report.reverted,
                        report.details.len()
                    );
                }
            }
            Err(e) => error!("Scheduled sweep failed: {}", e),
        }
    }
}
