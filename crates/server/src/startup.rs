use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::auth::{
    domain::CredentialErrorPolicy,
    password::Argon2Hasher,
    repo::seaorm::SeaOrmAuthRepository,
    repository::AuthRepository,
    token::TokenCodec,
    AuthConfig, AuthService,
};

/// Any origin, matching a public JSON API.
pub fn build_cors() -> CorsLayer {
    CorsLayer::permissive()
}

fn bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Wire the auth service from config around the given repository.
pub fn build_state(cfg: &configs::AuthConfig, repo: Arc<dyn AuthRepository>) -> Result<auth::ServerState, StartupError> {
    if cfg.uses_dev_secret() {
        warn!("auth.jwt_secret / JWT_SECRET not set; signing with the built-in development secret");
    }
    let codec = TokenCodec::new(cfg.secret()).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let policy = match cfg.credential_errors {
        configs::CredentialErrors::Detailed => CredentialErrorPolicy::Detailed,
        configs::CredentialErrors::Uniform => CredentialErrorPolicy::Uniform,
    };
    let svc_cfg = AuthConfig { credential_errors: policy, token_ttl_months: cfg.token_ttl_months };
    let svc = AuthService::new(repo, Arc::new(Argon2Hasher::default()), codec, svc_cfg);
    Ok(auth::ServerState::new(svc))
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
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
                warn!(error = %e, "cannot listen for SIGTERM");
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
    info!("shutdown signal received");
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve(listener: TcpListener, app: Router, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Connect the store, build the app and serve until `shutdown`; the pool is closed before returning.
pub async fn run_with_config(cfg: AppConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        models::db::migrate(&db).await?;
        info!("migrations applied");
    }

    let repo: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository { db: db.clone() });
    let state = build_state(&cfg.auth, repo)?;
    let app = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg.server)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let served = serve(listener, app, shutdown).await;
    db.close().await?;
    info!("database pool closed");
    served
}
