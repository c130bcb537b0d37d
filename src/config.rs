use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_CATALOG_URL: &str = "https://edcintl.cr.usgs.gov/geoserver/mtbs/ows";
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://edcintl.cr.usgs.gov/downloads/sciweb1/shared/MTBS_Fire/data";

/// Everything a run needs, passed explicitly to the orchestrator
#[derive(Debug, Clone)]
pub struct Config {
    /// Fire year to list
    pub year: u16,
    /// Two-letter state prefix of the fire ids to list
    pub state: String,
    /// Root directory for exported auxiliary members
    pub dest_dir: PathBuf,
    /// Maximum number of bundles processed at once
    pub concurrency: usize,
    /// Process only the first `limit` catalog entries
    pub limit: Option<usize>,
    /// WFS endpoint of the fire catalog
    pub catalog_url: String,
    /// Root URL of the fire-level bundle downloads
    pub download_url: String,
    /// Whether the auxiliary member is exported to `dest_dir`
    pub export_auxiliary: bool,
    /// Extension that identifies the auxiliary member
    pub auxiliary_extension: String,
    /// Output document path; stdout when unset
    pub output: Option<PathBuf>,
    pub request_timeout: Duration,
    pub max_retry: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            year: 2017,
            state: "OR".to_string(),
            dest_dir: PathBuf::from("MTBS"),
            concurrency: 5,
            limit: None,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            export_auxiliary: true,
            auxiliary_extension: "kmz".to_string(),
            output: None,
            request_timeout: Duration::from_secs(120),
            max_retry: 10,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.state.is_empty() || !self.state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(format!(
                "state must be an alphabetic prefix, got {:?}",
                self.state
            )));
        }
        if self.export_auxiliary && self.auxiliary_extension.trim_start_matches('.').is_empty() {
            return Err(Error::Config(
                "auxiliary extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Auxiliary extension without a leading dot, lower-cased
    pub fn auxiliary_extension(&self) -> String {
        self.auxiliary_extension
            .trim_start_matches('.')
            .to_ascii_lowercase()
    }
}
