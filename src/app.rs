/*
 * Responsibility
 * - tracing + panic hook
 * - Config → pool/migrations → services → AppState
 * - Router assembly and middleware order (http → cors → security headers → routes)
 * - axum::serve with peer addresses (login throttle key) and graceful shutdown
 */
use std::{net::SocketAddr, panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    services::{
        auth::{AuthGate, CacheLoginThrottle, LoginThrottle, PgUserStore, TokenCodec},
        cache::{CacheClient, MemoryCache, ValkeyClient},
        id_codec::IdCodec,
    },
    state::AppState,
};

const THROTTLE_PREFIX: &str = "login_attempts";

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,smeta_api=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving other requests.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?;

    let codec = Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.jwt_ttl_seconds,
    ));
    let auth = Arc::new(AuthGate::new(codec, Arc::new(PgUserStore::new(db.clone()))));

    let throttle: Arc<dyn LoginThrottle> = match &config.valkey_url {
        Some(url) => login_throttle(ValkeyClient::new(url).await?, config),
        None => {
            tracing::warn!("VALKEY_URL not set; login throttle is per-process");
            login_throttle(MemoryCache::new(), config)
        }
    };

    Ok(AppState::new(db, id_codec, auth, throttle))
}

fn login_throttle<C: CacheClient>(cache: C, config: &Config) -> Arc<dyn LoginThrottle> {
    tracing::info!(backend = cache.backend_name(), "login throttle ready");
    Arc::new(CacheLoginThrottle::new(
        cache,
        THROTTLE_PREFIX,
        config.login_max_attempts,
        Duration::from_secs(config.login_window_seconds),
    ))
}

pub(crate) fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    // Last applied runs first: request id/trace/limits wrap everything
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
