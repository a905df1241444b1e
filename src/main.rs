//! Option Analytics Backend Server
//!
//! REST API server that derives option analytics from a historical market
//! data gateway.

use option_analytics_backend::api::create_router;
use option_analytics_backend::config::Config;
use option_analytics_backend::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use option_analytics_backend::models::{
    BarIvResponse, ChartDataResponse, ChartRequest, ContractSeries, ExpirationStatusResponse,
    HealthResponse, HfGlobalData, HfQuoteResponse, IvPoint, MultiIvRequest, MultiIvResponse,
    OptChartSettings, OptionDefinitionItem, QuoteChartRequest, SolverRequest, SolverResponse,
    TickPoint, TradeIvPoint,
};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        option_analytics_backend::api::handlers::health_check,
        option_analytics_backend::api::handlers::equity_chart,
        option_analytics_backend::api::handlers::option_bar_iv,
        option_analytics_backend::api::handlers::quote_chart,
        option_analytics_backend::api::handlers::multi_iv,
        option_analytics_backend::api::handlers::solve_option,
        option_analytics_backend::api::handlers::option_definitions,
        option_analytics_backend::api::handlers::underlying_expiration,
    ),
    components(
        schemas(
            HealthResponse,
            ChartRequest,
            ChartDataResponse,
            BarIvResponse,
            QuoteChartRequest,
            HfQuoteResponse,
            HfGlobalData,
            OptChartSettings,
            TickPoint,
            TradeIvPoint,
            IvPoint,
            MultiIvRequest,
            MultiIvResponse,
            ContractSeries,
            SolverRequest,
            SolverResponse,
            OptionDefinitionItem,
            ExpirationStatusResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Charts", description = "OHLCV and implied volatility bar charts"),
        (name = "Quotes", description = "High-frequency quote and trade analytics"),
        (name = "Solver", description = "Black-Scholes quantity solver"),
        (name = "Reference", description = "Contract definitions and expiration status"),
    ),
    info(
        title = "Option Analytics API",
        version = "0.2.0",
        description = "REST API deriving option analytics from historical market data",
        license(name = "MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, file first, environment overrides second
    let mut config = match std::env::var("CONFIG_FILE") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    if let Ok(host) = std::env::var("HOST") {
        config.server.host = host;
    }
    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port.parse().expect("PORT must be a valid number");
    }
    if let Ok(key) = std::env::var("GATEWAY_API_KEY") {
        config.provider.api_key = key;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting Option Analytics Backend on {}", addr);
    info!(
        "Swagger UI available at http://{}/swagger-ui/",
        addr.replace("0.0.0.0", "localhost")
    );
    info!("Market data gateway at {}", config.provider.base_url);

    // Create application state
    let state = Arc::new(AppState::from_config(config));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Start the server
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
