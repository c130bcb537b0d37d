//! One complete run: list fires, process them under the concurrency bound,
//! aggregate, and emit.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::catalog::{CatalogQuery, CatalogSource};
use crate::collection::{FeatureCollection, aggregate};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::io::{BlobFetcher, BlobWriter};
use crate::pipeline::{ItemPipeline, PipelineSettings};
use crate::scheduler::run_bounded;
use crate::sink::CollectionSink;

pub struct Orchestrator {
    config: Config,
    catalog: Arc<dyn CatalogSource>,
    pipeline: ItemPipeline,
    sink: Arc<dyn CollectionSink>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogSource>,
        fetcher: Arc<dyn BlobFetcher>,
        writer: Arc<dyn BlobWriter>,
        sink: Arc<dyn CollectionSink>,
    ) -> Result<Self> {
        config.validate()?;

        let settings = PipelineSettings {
            download_url: config.download_url.clone(),
            dest_dir: config.dest_dir.clone(),
            auxiliary_extension: config
                .export_auxiliary
                .then(|| config.auxiliary_extension()),
        };

        Ok(Self {
            pipeline: ItemPipeline::new(fetcher, writer, settings),
            config,
            catalog,
            sink,
        })
    }

    /// Run to completion. Nothing reaches the sink unless every item succeeded.
    #[instrument(skip(self), fields(year = self.config.year, state = %self.config.state))]
    pub async fn run(&self) -> Result<FeatureCollection> {
        let start = Instant::now();
        info!(
            "Getting MTBS data for {} as of {}",
            self.config.state, self.config.year
        );

        let query = CatalogQuery::new(self.config.year, &self.config.state);
        let mut items = self
            .catalog
            .list_items(&query)
            .await
            .map_err(|source| Error::Catalog {
                query: query.to_string(),
                source,
            })?;

        let listed = items.len();
        if let Some(limit) = self.config.limit {
            items.truncate(limit);
        }
        info!(
            listed,
            processing = items.len(),
            concurrency = self.config.concurrency,
            "Catalog listed"
        );

        let records = run_bounded(&items, self.config.concurrency, |item| {
            self.pipeline.process(item)
        })
        .await?;

        let collection = aggregate(records);
        self.sink
            .emit(&collection)
            .await
            .map_err(|source| Error::Sink { source })?;

        info!(
            features = collection.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Run complete"
        );
        Ok(collection)
    }
}
