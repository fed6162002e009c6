//! StarWind VSA Prometheus Exporter
//!
//! Polls the StarWind Virtual SAN (VSA) management REST API on a fixed interval and
//! republishes disks, pools, volumes and virtual disks as Prometheus metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      HTTPS/JSON      ┌──────────────────┐
//! │  StarWind   │ ◄─────────────────►  │     Exporter     │
//! │    VSA      │   GET api/v1/...     │                  │
//! └─────────────┘                      │  ┌────────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Scheduler  │  │ ◄────────────► │ Prometheus │
//!                                      │  │ Collectors │  │   /metrics     └────────────┘
//!                                      │  └────────────┘  │
//!                                      │  ┌────────────┐  │
//!                                      │  │  Metrics   │  │
//!                                      │  └────────────┘  │
//!                                      └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`vsa`] - REST client, the [`vsa::DataSource`] seam and API row types
//! - [`collectors`] - One collector per entity kind and the label model
//! - [`metrics`] - Gauge, enum and info metric families
//! - [`scheduler`] - Collector registry and poll loop
//! - [`server`] - HTTP server and startup wiring
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use vsa_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod vsa;
