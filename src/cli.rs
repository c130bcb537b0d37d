use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CATALOG_URL, DEFAULT_DOWNLOAD_URL};

#[derive(Parser, Debug)]
#[command(name = "mtbs-fetch")]
#[command(version)]
#[command(about = "Collect MTBS fire bundles into a GeoJSON feature collection", long_about = None)]
#[command(after_help = "Examples:\n  \
  mtbs-fetch -s OR -y 2017 -o or-2017.json     all Oregon fires of 2017\n  \
  mtbs-fetch -s CA -n 10 --no-export           first ten California fires, no kmz files\n  \
  RUST_LOG=mtbs_fetch=debug mtbs-fetch -s WA   debug logging for this crate only")]
pub struct Cli {
    /// State prefix of the fire ids
    #[arg(short = 's', long, default_value = "OR")]
    pub state: String,

    /// Fire year
    #[arg(short = 'y', long, default_value_t = 2017)]
    pub year: u16,

    /// Directory for exported auxiliary members
    #[arg(short = 'd', long = "dest", value_name = "DIR", default_value = "MTBS")]
    pub dest_dir: PathBuf,

    /// Bundles processed at once
    #[arg(short = 'c', long, default_value_t = 5)]
    pub concurrency: usize,

    /// Process only the first N catalog entries
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Write the collection here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not export auxiliary members
    #[arg(long)]
    pub no_export: bool,

    #[arg(long, value_name = "URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    #[arg(long, value_name = "URL", default_value = DEFAULT_DOWNLOAD_URL)]
    pub download_url: String,

    /// More logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn to_config(&self) -> Config {
        Config {
            year: self.year,
            state: self.state.clone(),
            dest_dir: self.dest_dir.clone(),
            concurrency: self.concurrency,
            limit: self.limit,
            catalog_url: self.catalog_url.clone(),
            download_url: self.download_url.clone(),
            export_auxiliary: !self.no_export,
            output: self.output.clone(),
            ..Config::default()
        }
    }

    /// Default filter directive when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
