use clap::Parser;
use pixmatch_api::RestApi;
use pixmatch_core::Catalog;
use pixmatch_embed::{EmbedConfig, EmbeddingService, ModelLoader, NoModel};
use pixmatch_search::{SearchConfig, SearchEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Visual product similarity search server
#[derive(Parser, Debug)]
#[command(name = "pixmatch")]
#[command(about = "Find catalog products that look like a photo", long_about = None)]
struct Args {
    /// Product catalog (JSON array of products)
    #[arg(short, long, default_value = "./data/products.json")]
    catalog: PathBuf,

    /// HTTP bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// ONNX vision model (requires the `clip` feature)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Maximum results per search
    #[arg(long, default_value_t = 24)]
    max_results: usize,

    /// Products embedded concurrently per batch
    #[arg(long, default_value_t = 8)]
    batch_size: usize,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 10)]
    batch_pause_ms: u64,

    /// Featured products served on cold start and fallback
    #[arg(long, default_value_t = 12)]
    featured_count: usize,

    /// Whole-search timeout in milliseconds
    #[arg(long)]
    search_timeout_ms: Option<u64>,

    /// Image fetch timeout in seconds
    #[arg(long, default_value_t = 10)]
    fetch_timeout_secs: u64,

    /// Fail searches instead of using pixel signatures when the model is missing
    #[arg(long)]
    no_fallback: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PixMatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.catalog);

    let catalog = Arc::new(Catalog::from_json_file(&args.catalog)?);
    info!("Loaded {} products in {} categories", catalog.len(), catalog.categories().len());

    let embed_config = EmbedConfig {
        fallback_enabled: !args.no_fallback,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        ..EmbedConfig::default()
    };
    let embedder = Arc::new(EmbeddingService::new(model_loader(args.model.as_ref()), embed_config)?);

    let search_config = SearchConfig {
        max_results: args.max_results,
        batch_size: args.batch_size,
        batch_pause: Duration::from_millis(args.batch_pause_ms),
        featured_count: args.featured_count,
        timeout: args.search_timeout_ms.map(Duration::from_millis),
    };
    let engine = Arc::new(SearchEngine::new(catalog, embedder, search_config)?);

    match engine.embedder().ensure_initialized().await {
        Ok(kind) => info!("Embedding backend: {}", kind),
        Err(e) => warn!("Embedding backend unavailable, searches will serve featured products: {}", e),
    }

    let engine_http = engine.clone();
    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(engine_http, host, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("PixMatch started successfully");
    info!("HTTP API: http://{}:{}/", args.host, args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[cfg(feature = "clip")]
fn model_loader(model: Option<&PathBuf>) -> Arc<dyn ModelLoader> {
    use pixmatch_embed::{ClipConfig, ClipOnnxLoader};

    match model {
        Some(path) => {
            info!("Vision model: {:?}", path);
            Arc::new(ClipOnnxLoader::new(ClipConfig::vit_b32(path.clone())))
        }
        None => Arc::new(NoModel),
    }
}

#[cfg(not(feature = "clip"))]
fn model_loader(model: Option<&PathBuf>) -> Arc<dyn ModelLoader> {
    if let Some(path) = model {
        warn!("Ignoring model {:?}: built without the `clip` feature", path);
    }
    Arc::new(NoModel)
}
