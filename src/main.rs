use gatekeeper::{
    auth::password::PasswordHasher,
    config::AppConfig,
    db, denylist,
    handlers::health,
    middleware::AppState,
    repository::{PgRoleRepository, PgUserRepository, RoleStore, UserStore},
    routes,
    services::bootstrap,
    telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("gatekeeper {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gatekeeper starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(db_pool.clone()));
    let roles: Arc<dyn RoleStore> = Arc::new(PgRoleRepository::new(db_pool.clone()));

    if config.bootstrap.seed {
        let hasher = PasswordHasher::from_config(&config.security)?;
        bootstrap::seed(users.as_ref(), roles.as_ref(), &hasher, &config.bootstrap).await?;
    }

    let denylist_store = denylist::open_store(&config.denylist, &db_pool)?;
    let purge_handle = denylist::spawn_purge_task(
        denylist_store.clone(),
        Duration::from_secs(config.denylist.purge_interval_secs),
    );

    let app_state = Arc::new(AppState::build(
        config.clone(),
        db_pool.clone(),
        users,
        roles,
        denylist_store.clone(),
    )?);

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 关闭后台任务与外部资源
    purge_handle.abort();
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let cleanup = async {
        denylist_store.close().await;
        db_pool.close().await;
    };
    if tokio::time::timeout(timeout, cleanup).await.is_err() {
        tracing::warn!("Graceful shutdown timeout reached while releasing resources");
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

fn print_help() {
    println!("gatekeeper {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: gatekeeper [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --version     Print version and exit");
    println!("  --help        Print this help and exit");
    println!();
    println!("Environment:");
    println!("  All settings come from GATEKEEPER_* variables (nested keys use '__'),");
    println!("  e.g. GATEKEEPER_DATABASE__URL, GATEKEEPER_SECURITY__JWT_SECRET.");
    println!("  A .env file in the working directory is loaded if present.");
}
