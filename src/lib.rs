//! # Option Analytics Backend - REST API Server
//!
//! A REST API backend that turns raw market data from a historical data
//! gateway into chart-ready option analytics. Built with
//! [Axum](https://crates.io/crates/axum) for async HTTP handling and
//! provides OpenAPI/Swagger documentation via
//! [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **OHLCV Charts**: Bar series for equities and single option contracts,
//!   with venue routing and duplicate-bar aggregation.
//!
//! - **High-Frequency Quotes**: Tick-level NBBO, trade prints, and
//!   per-trade implied volatility for an option and its underlying.
//!
//! - **Implied Volatility**: Black-Scholes inversion via Brent's method,
//!   applied per trade and per bar.
//!
//! - **Option Solver**: Solve any single Black-Scholes quantity (price,
//!   volatility, time, strike, rate, or underlying) from the other five.
//!
//! - **OpenAPI Documentation**: Auto-generated Swagger UI for API
//!   exploration and testing at `/swagger-ui/`.
//!
//! - **CORS Support**: Cross-origin resource sharing enabled for frontend
//!   integration.
//!
//! ## Architecture
//!
//! Every request flows through the same stages:
//!
//! ```text
//! handler → pipeline → provider (HTTP gateway)
//!              │
//!              ├── align      as-of alignment, bar aggregation
//!              ├── pricing    Black-Scholes price and implied volatility
//!              ├── solver     Brent root-finding, bounded minimization
//!              └── chart      axis-bound solving for quote charts
//! ```
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Route handlers and router configuration |
//! | [`pipeline`] | Request orchestration: fetch, align, derive, format |
//! | [`provider`] | Market data gateway trait and HTTP implementation |
//! | [`align`] | As-of series alignment and duplicate-bar aggregation |
//! | [`pricing`] | Black-Scholes pricing and implied volatility |
//! | [`solver`] | Brent's method and bounded scalar minimization |
//! | [`chart`] | Quote-chart axis bound solving |
//! | [`ticker`] | Fixed-width option ticker decoding |
//! | [`timerange`] | Request date parsing and span validation |
//! | [`models`] | Request/response DTOs with OpenAPI schemas |
//! | [`error`] | API error types with `IntoResponse` implementation |
//! | [`config`] | Server, gateway, and analytics configuration |
//! | [`state`] | Application state management |
//!
//! ## API Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/equity-chart` | OHLCV chart for an equity or option symbol |
//! | POST | `/opt-ohlcv-lf` | Per-bar implied volatility for a contract |
//! | POST | `/opt-nbbo-hf` | Tick-level NBBO, trades, and IV (30 min cap) |
//! | POST | `/multi-iv` | Trade-level IV for several contracts (5 day cap) |
//! | POST | `/option-solver` | Solve one Black-Scholes quantity |
//! | GET | `/option-definitions` | Contracts defined for an underlying |
//! | GET | `/underlying-expiration` | Days until a contract expires |
//!
//! ## Example Usage
//!
//! ### Starting the Server
//!
//! ```bash
//! # Development mode
//! cargo run
//!
//! # With custom host/port
//! HOST=127.0.0.1 PORT=3000 cargo run
//!
//! # Release build
//! cargo build --release
//! ./target/release/option-analytics-backend
//! ```
//!
//! ### API Requests
//!
//! ```bash
//! # Minute bars for an equity
//! curl -X POST http://localhost:8080/equity-chart \
//!   -H "Content-Type: application/json" \
//!   -d '{"ticker": "AAPL", "startDate": "2025-01-10 09:30", "endDate": "2025-01-10 16:00", "interval": "m"}'
//!
//! # Tick-level NBBO and IV for one contract
//! curl -X POST http://localhost:8080/opt-nbbo-hf \
//!   -H "Content-Type: application/json" \
//!   -d '{"ticker": "AAPL  250117C00150000", "startDate": "2025-01-10 09:30", "endDate": "2025-01-10 09:45"}'
//!
//! # Solve the implied volatility from a price
//! curl -X POST http://localhost:8080/option-solver \
//!   -H "Content-Type: application/json" \
//!   -d '{"r": 0.04, "vol": 0, "s": 150, "t": 30, "type": "call", "u": 148, "price": 3.1, "solveFor": "vol", "timeUnits": "d"}'
//!
//! # Contracts defined for an underlying on a given day
//! curl "http://localhost:8080/option-definitions?start_date=2025-01-10&ticker=AAPL"
//! ```
//!
//! ## Swagger UI
//!
//! Once the server is running, access the interactive API documentation at:
//!
//! ```text
//! http://localhost:8080/swagger-ui/
//! ```
//!
//! ## Dependencies
//!
//! - **axum** (0.8): Async web framework
//! - **tower-http** (0.6): HTTP middleware (CORS, tracing, compression)
//! - **reqwest** (0.13): HTTP client for the data gateway
//! - **utoipa** (5.4): OpenAPI documentation generation
//! - **utoipa-swagger-ui** (9.0): Swagger UI integration
//! - **tokio** (1.49): Async runtime
//! - **serde** (1.0): Serialization/deserialization
//! - **chrono** / **chrono-tz**: Exchange-time handling
//! - **rust_decimal**: Exact strike arithmetic
//! - **tracing** (0.1): Structured logging

pub mod align;
pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod pricing;
pub mod provider;
pub mod solver;
pub mod state;
pub mod ticker;
pub mod timerange;
