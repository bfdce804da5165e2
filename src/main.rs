use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use actix_web_prom::PrometheusMetricsBuilder;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use wardrobe_wizard_backend::config::{Config, ImageStorage};
use wardrobe_wizard_backend::configure_routes;
use wardrobe_wizard_backend::db::{create_pool, PgStore};
use wardrobe_wizard_backend::services::background::RemoveBgClient;
use wardrobe_wizard_backend::services::mailer::SmtpMailer;
use wardrobe_wizard_backend::services::openai::OpenAiClient;
use wardrobe_wizard_backend::services::storage::{LocalImageStore, S3ImageStore};
use wardrobe_wizard_backend::services::weather::WeatherApiClient;
use wardrobe_wizard_backend::services::ImageStore;
use wardrobe_wizard_backend::state::{AppState, ExternalServices, Repositories, Settings};
use wardrobe_wizard_backend::utils::jwt::TokenKeys;
use wardrobe_wizard_backend::utils::s3::create_s3_client;

fn fatal(context: &str, err: impl Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| fatal("Invalid configuration", e))?;

    std::fs::create_dir_all(&config.scratch_dir)
        .map_err(|e| fatal("Cannot create scratch directory", e))?;

    // Initialize the database pool
    let pool = create_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| fatal("Failed to connect to the database", e))?;
    let store = Arc::new(PgStore::new(pool));

    let (image_store, upload_dir): (Arc<dyn ImageStore>, Option<PathBuf>) =
        match &config.image_storage {
            ImageStorage::S3 { bucket, region } => {
                let s3_client = create_s3_client(region.as_deref()).await;
                (Arc::new(S3ImageStore::new(s3_client, bucket)), None)
            }
            ImageStorage::Local { upload_dir } => {
                info!("Storing images on local disk under {}", upload_dir.display());
                (
                    Arc::new(LocalImageStore::new(upload_dir.clone(), &config.public_base_url)),
                    Some(upload_dir.clone()),
                )
            }
        };

    let openai = Arc::new(
        OpenAiClient::new(&config.openai_api_key, &config.openai_model)
            .map_err(|e| fatal("Failed to build OpenAI client", e))?,
    );
    let services = ExternalServices {
        background_remover: Arc::new(
            RemoveBgClient::new(&config.remove_bg_api_key)
                .map_err(|e| fatal("Failed to build remove.bg client", e))?,
        ),
        image_store,
        classifier: openai.clone(),
        stylist: openai,
        mailer: Arc::new(
            SmtpMailer::new(&config.smtp_host, &config.email_user, &config.email_pass)
                .map_err(|e| fatal("Failed to build SMTP mailer", e))?,
        ),
        weather: Arc::new(
            WeatherApiClient::new(&config.weather_api_key)
                .map_err(|e| fatal("Failed to build weather client", e))?,
        ),
    };

    let state = web::Data::new(AppState::new(
        Repositories::shared(store),
        services,
        TokenKeys::new(&config.jwt_secret, config.jwt_expires_in),
        Settings {
            public_base_url: config.public_base_url.clone(),
            frontend_url: config.frontend_url.clone(),
            scratch_dir: config.scratch_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
            upload_dir,
        },
    ));

    // Set up Prometheus metrics
    let mut labels = HashMap::new();
    labels.insert("app".to_string(), "wardrobe_wizard".to_string());
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .const_labels(labels)
        .build()
        .map_err(|e| fatal("Failed to create Prometheus metrics", e))?;

    info!("Starting server at {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .workers(num_cpus::get())
    .bind(&config.bind_address)?
    .run()
    .await
}
