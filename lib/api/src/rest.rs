use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::guard::{self, GuardContext};
use actix_web::http::header;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use futures_util::TryStreamExt;
use pixmatch_core::{filter, FilterCriteria, RankedResult};
use pixmatch_embed::{BackendKind, ImageSource};
use pixmatch_search::{SearchEngine, SearchOutcome, SearchQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parts accepted in one upload
const MAX_UPLOAD_PARTS: usize = 8;

/// Bytes allowed for the non-image parts of an upload, all together
const TEXT_PARTS_BUDGET: usize = 64 * 1024;

/// JSON search body: an image URL plus optional hints
#[derive(Deserialize)]
struct UrlSearchRequest {
    url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultItem {
    product_id: String,
    similarity: f32,
    confidence: f32,
    #[serde(default)]
    is_featured: bool,
}

impl From<&RankedResult> for ResultItem {
    fn from(result: &RankedResult) -> Self {
        Self {
            product_id: result.product_id().to_string(),
            similarity: result.similarity,
            confidence: result.confidence,
            is_featured: result.featured,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<ResultItem>,
    degraded: bool,
}

impl From<&SearchOutcome> for SearchResponse {
    fn from(outcome: &SearchOutcome) -> Self {
        Self {
            results: outcome.results.iter().map(ResultItem::from).collect(),
            degraded: outcome.degraded(),
        }
    }
}

#[derive(Deserialize)]
struct FilterRequest {
    results: Vec<ResultItem>,
    #[serde(default)]
    criteria: FilterCriteria,
}

#[derive(Deserialize)]
struct FeaturedParams {
    count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    backend: Option<BackendKind>,
    products: usize,
    cached_embeddings: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<SearchEngine>, host: String, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(Self::configure)
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }

    /// Route table, shared by the server and tests
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().limit(4 * 1024 * 1024))
            .route(
                "/search",
                web::post().guard(guard::fn_guard(is_multipart)).to(search_upload),
            )
            .route("/search", web::post().to(search_url))
            .route("/search/filter", web::post().to(filter_results))
            .route("/featured", web::get().to(featured))
            .route("/categories", web::get().to(categories))
            .route("/health", web::get().to(health));
    }
}

fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn search_upload(
    engine: web::Data<Arc<SearchEngine>>,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let mut image: Option<Vec<u8>> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut display_name: Option<String> = None;
    let limit = engine.embedder().config().max_image_bytes;
    let total_limit = limit + TEXT_PARTS_BUDGET;
    let mut parts = 0usize;
    let mut received = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        parts += 1;
        if parts > MAX_UPLOAD_PARTS {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("At most {} form parts are accepted", MAX_UPLOAD_PARTS)
            })));
        }
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            received += chunk.len();
            if data.len() + chunk.len() > limit || received > total_limit {
                return Ok(HttpResponse::PayloadTooLarge().json(serde_json::json!({
                    "error": format!("Upload exceeds {} bytes", limit)
                })));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" => {
                if display_name.is_none() {
                    display_name = file_name;
                }
                image = Some(data);
            }
            "tags" => tags.extend(split_tags(&String::from_utf8_lossy(&data))),
            "name" => display_name = Some(String::from_utf8_lossy(&data).into_owned()),
            other => tracing::debug!(field = other, "Ignoring multipart field"),
        }
    }

    let mut query = SearchQuery {
        image: image.map(ImageSource::from_bytes),
        tags,
    };
    if let Some(name) = display_name {
        query = query.with_display_name(&name);
    }

    let outcome = engine.search(&query).await;
    Ok(HttpResponse::Ok().json(SearchResponse::from(&outcome)))
}

async fn search_url(
    engine: web::Data<Arc<SearchEngine>>,
    req: web::Json<UrlSearchRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let query = SearchQuery {
        image: req
            .url
            .filter(|u| !u.trim().is_empty())
            .map(ImageSource::from_url),
        tags: req.tags,
    };

    let outcome = engine.search(&query).await;
    Ok(HttpResponse::Ok().json(SearchResponse::from(&outcome)))
}

async fn filter_results(
    engine: web::Data<Arc<SearchEngine>>,
    req: web::Json<FilterRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let catalog = engine.catalog();

    let results: Vec<RankedResult> = req
        .results
        .into_iter()
        .filter_map(|item| match catalog.get(&item.product_id) {
            Some(product) => Some(RankedResult {
                product: product.clone(),
                similarity: item.similarity,
                confidence: item.confidence,
                featured: item.is_featured,
            }),
            None => {
                tracing::debug!(product_id = %item.product_id, "Dropping unknown product");
                None
            }
        })
        .collect();

    let filtered = filter::apply(&results, &req.criteria);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "results": filtered.iter().map(ResultItem::from).collect::<Vec<_>>()
    })))
}

async fn featured(
    engine: web::Data<Arc<SearchEngine>>,
    params: web::Query<FeaturedParams>,
) -> ActixResult<HttpResponse> {
    let count = params.count.unwrap_or(engine.config().featured_count);
    let results = engine.featured(count);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "results": results.iter().map(ResultItem::from).collect::<Vec<_>>()
    })))
}

async fn categories(engine: web::Data<Arc<SearchEngine>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(engine.catalog().categories()))
}

async fn health(engine: web::Data<Arc<SearchEngine>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        backend: engine.embedder().backend_kind(),
        products: engine.catalog().len(),
        cached_embeddings: engine.cache().len(),
    }))
}

fn split_tags(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
