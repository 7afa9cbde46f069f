//! Dashboard web server.
//!
//! Serves the query form and answers form posts with HTML fragments for the
//! table, bubble chart, map, news, weather and loan views.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use lvrmap::dataset::{download_client, refresh_dataset};
use lvrmap::geocode::open_cache;
use lvrmap::news::NewsClient;
use lvrmap::render::escape_html;
use lvrmap::weather::WeatherClient;
use lvrmap::{loan, Config, Dashboard};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Real-estate transaction dashboard")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration
    #[arg(short, long)]
    listen: Option<String>,

    /// Data directory, overrides the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    config: Config,
    dashboard: Dashboard,
    news: NewsClient,
    weather: WeatherClient,
    downloader: reqwest::Client,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }

    info!("Real-estate dashboard");
    info!("Data directory: {}", config.data.dir.display());
    std::fs::create_dir_all(&config.data.dir)?;

    let cache = open_cache(&config)?;
    let dashboard = Dashboard::new(config.data.dir.clone(), cache);
    let news = NewsClient::new(&config.news)?;
    let weather = WeatherClient::new(&config.weather)?;
    let downloader = download_client(std::time::Duration::from_secs(
        config.data.download_timeout_secs,
    ))?;

    let listen = config.server.listen.clone();
    let state = Arc::new(AppState {
        config,
        dashboard,
        news,
        weather,
        downloader,
    });

    // Build router
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cities: usize,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cities: state.dashboard.registry().len(),
    })
}

/// Fields of the query form; absent, malformed or non-finite numbers read as zero
#[derive(Debug, Deserialize)]
struct QueryForm {
    option: Option<String>,
    location: Option<String>,
    min_price_slider: Option<String>,
    max_price_slider: Option<String>,
    loan_amount: Option<String>,
    annual_interest_rate: Option<String>,
    loan_term_years: Option<String>,
}

fn number<T: std::str::FromStr + Default>(field: &Option<String>) -> T {
    field
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

/// `number` for amounts; "NaN" and "inf" parse as f64 but are not amounts
fn amount(field: &Option<String>) -> f64 {
    Some(number::<f64>(field))
        .filter(|v| v.is_finite())
        .unwrap_or_default()
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Response {
    let option = form.option.as_deref().unwrap_or("");
    let location = form.location.as_deref().unwrap_or("");
    let min_price = amount(&form.min_price_slider);
    let max_price = amount(&form.max_price_slider);
    info!("Query option={} location={}", option, location);

    let body = match option {
        "real_estate" => state.dashboard.query_table(location, min_price, max_price),
        "real_estate_map" => {
            state
                .dashboard
                .query_map(location, min_price, max_price)
                .await
        }
        "bubbles" => state
            .dashboard
            .query_bubble_chart(location, min_price, max_price),
        "news" => state.news.query(state.dashboard.registry(), location).await,
        "weather" => state.weather.query(state.dashboard.registry()).await,
        "loancalc" => loan::calculate(
            amount(&form.loan_amount),
            amount(&form.annual_interest_rate),
            number(&form.loan_term_years),
        ),
        "download_real_estate" => {
            let result = refresh_dataset(
                &state.downloader,
                &state.config.data.archive_url,
                state.dashboard.data_dir(),
                |_, _| {},
            )
            .await;
            match result {
                Ok(summary) => {
                    info!(
                        "Refreshed dataset: {} bytes, {} entries",
                        summary.bytes, summary.entries
                    );
                    "實價登錄資訊下載完成".to_string()
                }
                Err(e) => {
                    error!("Dataset refresh failed: {}", e);
                    return (
                        StatusCode::BAD_GATEWAY,
                        Html(format!("實價登錄資訊下載失敗：{}", escape_html(&e.to_string()))),
                    )
                        .into_response();
                }
            }
        }
        _ => "無效的選項".to_string(),
    };

    Html(body).into_response()
}
