//! # mtbs-fetch
//!
//! Collects fire-level bundles from the MTBS (Monitoring Trends in Burn
//! Severity) archive into a single GeoJSON feature collection.
//!
//! A run lists the fires of one year and state from the MTBS WFS catalog,
//! downloads each fire's ZIP bundle under a concurrency bound, decodes the
//! descriptive and representative dBASE tables inside it, and assembles one
//! record per fire. Once every fire succeeded, acreage is normalized across
//! the batch and the records are ordered by ignition date. One failed fire
//! fails the run.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mtbs_fetch::{Config, FsWriter, HttpFetcher, JsonSink, Orchestrator, WfsCatalog};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let fetcher = HttpFetcher::new(Duration::from_secs(60), 3)?;
//!     let catalog = WfsCatalog::new(fetcher.client().clone(), config.catalog_url.clone());
//!     let sink = JsonSink::new(FsWriter, Some("fires.json".into()));
//!
//!     let orchestrator = Orchestrator::new(
//!         config,
//!         Arc::new(catalog),
//!         Arc::new(fetcher),
//!         Arc::new(FsWriter),
//!         Arc::new(sink),
//!     )?;
//!     let collection = orchestrator.run().await?;
//!     println!("{} fires", collection.len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod collection;
pub mod config;
pub mod dbf;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod pipeline;
pub mod record;
pub mod scheduler;
pub mod sink;
pub mod zip;

#[cfg(test)]
mod testutil;

pub use catalog::{CatalogQuery, CatalogSource, ItemIdentifier, WfsCatalog};
pub use cli::Cli;
pub use collection::{FeatureCollection, aggregate};
pub use config::Config;
pub use error::{Error, Result, ShapeProblem};
pub use io::{BlobFetcher, BlobWriter, FsWriter, HttpFetcher, ReadAt};
pub use orchestrator::Orchestrator;
pub use pipeline::{ItemPipeline, PipelineSettings};
pub use record::{FireRecord, assemble};
pub use scheduler::run_bounded;
pub use sink::{CollectionSink, JsonSink};
