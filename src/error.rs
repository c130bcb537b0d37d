//! Failure taxonomy for a run.
//!
//! Every per-item failure aborts the whole batch, so each variant carries
//! enough context (item, URL, member, path) to identify where the run died.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::dbf::DbfError;

/// Result type alias for mtbs-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Listing the items to process failed
    #[error("catalog query {query} failed")]
    Catalog {
        query: String,
        #[source]
        source: anyhow::Error,
    },

    /// Downloading one item's bundle failed
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The downloaded bytes are not a readable archive, or a member could not be extracted
    #[error("{item}: unreadable archive")]
    Archive {
        item: String,
        #[source]
        source: anyhow::Error,
    },

    /// A table member could not be decoded
    #[error("{item}: failed to decode {member}")]
    Decode {
        item: String,
        member: String,
        #[source]
        source: DbfError,
    },

    /// The bundle's tables are not exactly one `desc` and one `rep`
    #[error("{item}: incomplete record, {problem} `{class}` table in bundle")]
    IncompleteRecord {
        item: String,
        class: String,
        problem: ShapeProblem,
    },

    /// The record classes are present but their contents are unusable
    #[error("{item}: malformed record: {reason}")]
    MalformedRecord { item: String, reason: String },

    /// Persisting an exported member failed
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Handing the finished collection to its destination failed
    #[error("failed to emit output collection")]
    Sink {
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// How a bundle's table set deviates from one `desc` plus one `rep`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeProblem {
    Missing,
    Unexpected,
    Duplicate,
}

impl fmt::Display for ShapeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeProblem::Missing => "no",
            ShapeProblem::Unexpected => "unexpected",
            ShapeProblem::Duplicate => "second",
        })
    }
}

impl Error {
    /// Stable short name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Catalog { .. } => "catalog",
            Error::Fetch { .. } => "fetch",
            Error::Archive { .. } => "archive",
            Error::Decode { .. } => "decode",
            Error::IncompleteRecord { .. } => "incomplete_record",
            Error::MalformedRecord { .. } => "malformed_record",
            Error::Write { .. } => "write",
            Error::Sink { .. } => "sink",
            Error::Config(_) => "config",
        }
    }

    pub(crate) fn incomplete(
        item: impl ToString,
        class: impl Into<String>,
        problem: ShapeProblem,
    ) -> Self {
        Error::IncompleteRecord {
            item: item.to_string(),
            class: class.into(),
            problem,
        }
    }

    pub(crate) fn malformed(item: impl ToString, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            item: item.to_string(),
            reason: reason.into(),
        }
    }
}
