//! HTTP client library for the Option Analytics API.
//!
//! This crate provides a typed HTTP client for the option analytics backend.
//! It covers every REST endpoint: bar charts, high-frequency quotes,
//! multi-contract IV, the option solver, and reference data.
//!
//! # Example
//!
//! ```no_run
//! use analytics_client::{AnalyticsClient, ClientConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), analytics_client::Error> {
//!     let client = AnalyticsClient::new(ClientConfig {
//!         base_url: "http://localhost:8080".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     // Check health
//!     let health = client.health_check().await?;
//!     println!("Status: {}", health.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{AnalyticsClient, ClientConfig};
pub use error::Error;
pub use types::*;
