use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use jobs::{cleanup::otp_retention, spawn_all_jobs};
use otp::{HttpNotifier, MongoOtpStore, OtpService, OtpSettings, OtpStore, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod app;
pub mod constants;
pub mod database;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod otp;
pub mod swagger;
pub mod utils;

pub async fn start_web_server() -> anyhow::Result<()> {
    // import .env file
    dotenv().ok();
    initialize_logging();
    // the store handle is created once and shared for the process lifetime
    let store: Arc<dyn OtpStore> = Arc::new(MongoOtpStore::connect().await?);
    let notifier = Arc::new(HttpNotifier::from_env()?);
    let settings = OtpSettings::from_env();
    let otp_service = OtpService::new(store.clone(), notifier, Arc::new(SystemClock), settings);
    spawn_all_jobs(store, otp_retention());
    start_server(Arc::new(otp_service)).await
}

fn initialize_logging() {
    // create default env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or("venue_booking_backend=debug,tower_http=debug".into());

    // initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

async fn start_server(otp_service: Arc<OtpService>) -> anyhow::Result<()> {
    // read the port number from env variable
    let port = utils::env_or("PORT", constants::DEFAULT_PORT);
    // build the socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    // create the app instance
    let app = app::build_app(otp_service);
    tracing::debug!("Starting the app in: {addr}");
    // start serving the app in the socket address
    axum::Server::bind(&addr).serve(app).await?;
    Ok(())
}
