use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use pantry_match::config::{Settings, SourceKind};
use pantry_match::core::{Catalog, Matcher, Recommender, StoreLocator};
use pantry_match::routes::{self, AppState};
use pantry_match::services::{
    CacheManager, CachedGeocoder, FileCatalog, FileStoreSource, Geocoder, HttpGeocoder,
    HttpStoreSource, IngredientDatabase, PostgresCatalog, StoreDirectory, StoreSource,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

async fn load_catalog(settings: &Settings) -> io::Result<Catalog> {
    let database: Box<dyn IngredientDatabase> = match settings.catalog.source {
        SourceKind::Postgres => {
            let url = settings
                .database
                .url
                .as_deref()
                .ok_or_else(|| startup_error("Catalog source is postgres", "database.url is not set"))?;
            let db_max_conn = settings.database.max_connections.unwrap_or(10);
            let db_min_conn = settings.database.min_connections.unwrap_or(1);

            let postgres = PostgresCatalog::new(
                url,
                db_max_conn,
                db_min_conn,
                settings.database.acquire_timeout_secs.unwrap_or(30),
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!("PostgreSQL catalog connected (max: {} connections)", db_max_conn);
            Box::new(postgres)
        }
        SourceKind::File => {
            let path = settings.catalog.path.as_deref().unwrap_or("data/catalog.toml");
            Box::new(FileCatalog::new(path))
        }
        SourceKind::Http => {
            return Err(startup_error("Unsupported catalog source", "catalog.source = http"));
        }
    };

    database
        .load_catalog()
        .await
        .map_err(|e| startup_error("Failed to load recipe catalog", e))
}

fn store_source(settings: &Settings) -> io::Result<Arc<dyn StoreSource>> {
    let directory = &settings.store_directory;
    match directory.source {
        SourceKind::Http => {
            let endpoint = directory
                .endpoint
                .clone()
                .ok_or_else(|| startup_error("Store directory source is http", "store_directory.endpoint is not set"))?;
            let source = HttpStoreSource::new(
                endpoint,
                directory.api_key.clone(),
                Duration::from_secs(directory.timeout_secs),
            )
            .map_err(|e| startup_error("Failed to build store directory client", e))?;
            Ok(Arc::new(source))
        }
        SourceKind::File => {
            let path = directory.path.as_deref().unwrap_or("data/stores.toml");
            Ok(Arc::new(FileStoreSource::new(path)))
        }
        SourceKind::Postgres => Err(startup_error(
            "Unsupported store directory source",
            "store_directory.source = postgres",
        )),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting Pantry Match recommendation service...");

    let catalog = Arc::new(load_catalog(&settings).await?);
    info!(
        "Recipe catalog loaded: {} recipes, {} ingredients",
        catalog.recipes().len(),
        catalog.ingredients().len()
    );

    // Initialize cache manager (Redis is optional)
    let cache_ttl = settings.cache.ttl_secs;
    let l1_cache_size = settings.cache.l1_cache_size;

    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => CacheManager::new(url, l1_cache_size, cache_ttl)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to connect to Redis ({}), caching geocodes in memory only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }),
        None => CacheManager::in_memory(l1_cache_size, cache_ttl),
    };
    info!(
        "Cache manager initialized (L1: {} entries, TTL: {}s, Redis L2: {})",
        l1_cache_size,
        cache_ttl,
        cache.has_l2()
    );

    let http_geocoder = HttpGeocoder::new(
        settings.geocoder.endpoint.clone(),
        settings.geocoder.user_agent.clone(),
        Duration::from_secs(settings.geocoder.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build geocoder client", e))?;
    let geocoder: Arc<dyn Geocoder> = Arc::new(CachedGeocoder::new(Arc::new(http_geocoder), Arc::new(cache)));

    info!("Geocoder initialized ({})", settings.geocoder.endpoint);

    // Store directory: first load before serving, then refresh in the background
    let locator_settings = settings.locator.to_settings();
    let directory = Arc::new(StoreDirectory::new(store_source(&settings)?, locator_settings.retry_backoff));

    if let Err(e) = directory.refresh().await {
        warn!("Initial store directory load failed, starting with no stores: {}", e);
    }
    directory.clone().start_background_refresh(settings.store_directory.refresh_interval_secs);

    let locator = StoreLocator::new(directory, geocoder, locator_settings);
    let matcher = Matcher::new(settings.matching.min_score);

    let recommender = Recommender::new(
        catalog,
        settings.normalizer.mode,
        matcher,
        locator,
        settings.aggregation.to_limits(),
    );

    // Build application state
    let app_state = AppState {
        recommender: Arc::new(recommender),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
