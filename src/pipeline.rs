//! Per-fire processing: download the bundle, pull the attribute tables out
//! of it, assemble the record, and export the auxiliary member.
//!
//! Every await point in [`ItemPipeline::process`] keeps the caller's
//! scheduler slot occupied. Nothing here is shared between items except the
//! read-only collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::catalog::ItemIdentifier;
use crate::dbf::DbfReader;
use crate::error::{Error, Result, ShapeProblem};
use crate::io::{BlobFetcher, BlobWriter, MemoryReader};
use crate::record::{self, DESCRIPTIVE_CLASS, FireRecord, REPRESENTATIVE_CLASS, RowSet};
use crate::zip::{ZipArchive, ZipFileEntry};

/// Settings the pipeline needs from the run configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub download_url: String,
    pub dest_dir: PathBuf,
    /// Lower-cased extension of the member to export; `None` disables export
    pub auxiliary_extension: Option<String>,
}

pub struct ItemPipeline {
    fetcher: Arc<dyn BlobFetcher>,
    writer: Arc<dyn BlobWriter>,
    settings: PipelineSettings,
}

/// Download location of a fire's bundle
pub fn source_url(download_url: &str, item: &ItemIdentifier) -> String {
    format!(
        "{}/{}/fire_level_tar_files/{}.zip",
        download_url.trim_end_matches('/'),
        item.year(),
        item.fire_id().to_lowercase()
    )
}

/// Record class of a member, if it is one of the decoded tables.
///
/// The class is the member's tag between the last `_` and `.dbf`,
/// compared case-insensitively.
pub fn record_class(entry: &ZipFileEntry) -> Option<String> {
    if entry.is_directory
        || entry.extension().as_deref() != Some("dbf")
        || !entry.base_name().contains('_')
    {
        return None;
    }
    let class = entry.class_tag().to_ascii_lowercase();
    [DESCRIPTIVE_CLASS, REPRESENTATIVE_CLASS]
        .contains(&class.as_str())
        .then_some(class)
}

impl ItemPipeline {
    pub fn new(
        fetcher: Arc<dyn BlobFetcher>,
        writer: Arc<dyn BlobWriter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            writer,
            settings,
        }
    }

    /// Produce the record for one fire
    #[instrument(skip(self, item), fields(item = %item))]
    pub async fn process(&self, item: &ItemIdentifier) -> Result<FireRecord> {
        let start = Instant::now();

        let url = source_url(&self.settings.download_url, item);
        let bytes = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| Error::Fetch {
                url: url.clone(),
                source,
            })?;
        info!(bytes = bytes.len(), "Processing {}", item.fire_id());

        let archive = ZipArchive::open(Arc::new(MemoryReader::new(bytes)))
            .await
            .map_err(|source| archive_error(item, source))?;

        let rows = self.decode_tables(item, &archive).await?;
        let mut record = record::assemble(item, rows)?;

        if let Some(extension) = &self.settings.auxiliary_extension {
            record.auxiliary_ref = self.export_auxiliary(item, &archive, extension).await?;
        }

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Item complete"
        );
        Ok(record)
    }

    /// Decode every `desc`/`rep` member into the row set
    async fn decode_tables(
        &self,
        item: &ItemIdentifier,
        archive: &ZipArchive<MemoryReader>,
    ) -> Result<RowSet> {
        let mut rows = RowSet::new();

        for entry in archive.members() {
            let Some(class) = record_class(entry) else {
                continue;
            };
            if rows.contains_key(&class) {
                return Err(Error::incomplete(item, class, ShapeProblem::Duplicate));
            }

            let data = archive
                .member_bytes(entry)
                .await
                .map_err(|source| archive_error(item, source))?;
            let decode_error = |source| Error::Decode {
                item: item.to_string(),
                member: entry.file_name.clone(),
                source,
            };

            let mut decoded = Vec::new();
            for row in DbfReader::new(data).map_err(decode_error)? {
                decoded.push(row.map_err(decode_error)?);
            }
            debug!(member = %entry.file_name, %class, rows = decoded.len(), "Decoded table");
            rows.insert(class, decoded);
        }

        Ok(rows)
    }

    /// Write the first member with the auxiliary extension under
    /// `dest_dir/<fire id>/` and return its relative path
    async fn export_auxiliary(
        &self,
        item: &ItemIdentifier,
        archive: &ZipArchive<MemoryReader>,
        extension: &str,
    ) -> Result<Option<String>> {
        let Some(entry) = archive
            .members()
            .iter()
            .find(|e| !e.is_directory && e.extension().as_deref() == Some(extension))
        else {
            debug!(extension, "No auxiliary member in bundle");
            return Ok(None);
        };

        let relative = entry.relative_path().ok_or_else(|| {
            archive_error(
                item,
                anyhow::anyhow!("member path {:?} escapes the bundle", entry.file_name),
            )
        })?;
        let data = archive
            .member_bytes(entry)
            .await
            .map_err(|source| archive_error(item, source))?;

        let destination = export_path(&self.settings.dest_dir, item, &relative);
        self.writer
            .write(&destination, &data)
            .await
            .map_err(|source| Error::Write {
                path: destination.clone(),
                source,
            })?;
        info!(path = %destination.display(), "Exported {}", entry.file_name);

        Ok(Some(entry.file_name.clone()))
    }
}

fn export_path(dest_dir: &Path, item: &ItemIdentifier, relative: &Path) -> PathBuf {
    dest_dir.join(item.fire_id().to_lowercase()).join(relative)
}

fn archive_error(item: &ItemIdentifier, source: anyhow::Error) -> Error {
    Error::Archive {
        item: item.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FsWriter;
    use crate::testutil::{ArchiveMember, desc_table, rep_table, zip_bytes};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by URL
    #[derive(Default)]
    struct CannedFetcher {
        bodies: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl BlobFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
        }
    }

    /// Records writes in memory
    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    }

    #[async_trait]
    impl BlobWriter for RecordingWriter {
        async fn write(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((path.to_path_buf(), data.to_vec()));
            Ok(())
        }
    }

    struct FailingWriter;

    #[async_trait]
    impl BlobWriter for FailingWriter {
        async fn write(&self, _path: &Path, _data: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("read-only filesystem")
        }
    }

    const BASE: &str = "https://mtbs.test/data";

    fn item() -> ItemIdentifier {
        ItemIdentifier::new("2017", "OR4217012345620170715")
    }

    fn settings(export: bool) -> PipelineSettings {
        PipelineSettings {
            download_url: BASE.to_string(),
            dest_dir: PathBuf::from("MTBS"),
            auxiliary_extension: export.then(|| "kmz".to_string()),
        }
    }

    fn fetcher_with(bundle: Vec<u8>) -> Arc<CannedFetcher> {
        let mut fetcher = CannedFetcher::default();
        fetcher.bodies.insert(source_url(BASE, &item()), bundle);
        Arc::new(fetcher)
    }

    fn full_bundle() -> Vec<u8> {
        let desc = desc_table(
            "OR4217012345620170715",
            "CHETCO BAR",
            "191125.00",
            ("2017", "7", "12"),
        );
        let rep = rep_table(&[("Forest", "10.00"), ("Forest", "5.25"), ("Water", "3.00")]);
        zip_bytes(&[
            ArchiveMember::deflated("or4217012345620170715_desc.dbf", &desc),
            ArchiveMember::deflated("or4217012345620170715_rep.dbf", &rep),
            ArchiveMember::stored("or4217012345620170715_metadata.pdf", b"%PDF"),
            ArchiveMember::stored("kml/or4217012345620170715_burn_bndy.kmz", b"KMZDATA"),
        ])
    }

    #[test]
    fn source_url_uses_year_and_lower_case_id() {
        assert_eq!(
            source_url("https://host/data/", &item()),
            "https://host/data/2017/fire_level_tar_files/or4217012345620170715.zip"
        );
    }

    #[test]
    fn record_class_matches_table_suffixes() {
        let entry = |name: &str| ZipFileEntry {
            file_name: name.to_string(),
            compression_method: crate::zip::CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            is_directory: name.ends_with('/'),
        };
        assert_eq!(record_class(&entry("x/or1_desc.dbf")), Some("desc".to_string()));
        assert_eq!(record_class(&entry("OR1_REP.DBF")), Some("rep".to_string()));
        assert_eq!(record_class(&entry("or1_desc.shp")), None);
        assert_eq!(record_class(&entry("or1_burn_bndy.dbf")), None);
        assert_eq!(record_class(&entry("or1_desc.dbf/")), None);
        assert_eq!(record_class(&entry("desc.dbf")), None);
    }

    #[tokio::test]
    async fn processes_bundle_and_exports_auxiliary_member() {
        let writer = Arc::new(RecordingWriter::default());
        let pipeline = ItemPipeline::new(fetcher_with(full_bundle()), writer.clone(), settings(true));

        let record = pipeline.process(&item()).await.unwrap();

        assert_eq!(record.id, "OR4217012345620170715");
        assert_eq!(record.name, "CHETCO BAR");
        assert_eq!(record.acres, 191125.0);
        assert_eq!(record.forest_acres, 15.25);
        assert_eq!(record.ignition_date.to_string(), "2017-07-12");
        assert_eq!(
            record.auxiliary_ref.as_deref(),
            Some("kml/or4217012345620170715_burn_bndy.kmz")
        );

        let writes = writer.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].0,
            Path::new("MTBS/or4217012345620170715/kml/or4217012345620170715_burn_bndy.kmz")
        );
        assert_eq!(writes[0].1, b"KMZDATA");
    }

    #[tokio::test]
    async fn export_disabled_leaves_reference_empty() {
        let writer = Arc::new(RecordingWriter::default());
        let pipeline =
            ItemPipeline::new(fetcher_with(full_bundle()), writer.clone(), settings(false));

        let record = pipeline.process(&item()).await.unwrap();

        assert!(record.auxiliary_ref.is_none());
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_to_disk_through_fs_writer() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ItemPipeline::new(
            fetcher_with(full_bundle()),
            Arc::new(FsWriter),
            PipelineSettings {
                dest_dir: dir.path().to_path_buf(),
                ..settings(true)
            },
        );

        pipeline.process(&item()).await.unwrap();

        let exported = dir
            .path()
            .join("or4217012345620170715/kml/or4217012345620170715_burn_bndy.kmz");
        assert_eq!(std::fs::read(exported).unwrap(), b"KMZDATA");
    }

    #[tokio::test]
    async fn missing_rep_table_is_incomplete() {
        let desc = desc_table("OR1", "NO REP", "5.00", ("2017", "8", "1"));
        let bundle = zip_bytes(&[ArchiveMember::stored("or1_desc.dbf", &desc)]);
        let pipeline = ItemPipeline::new(
            fetcher_with(bundle),
            Arc::new(RecordingWriter::default()),
            settings(true),
        );

        match pipeline.process(&item()).await {
            Err(Error::IncompleteRecord {
                class,
                problem: ShapeProblem::Missing,
                ..
            }) => assert_eq!(class, "rep"),
            other => panic!("expected incomplete record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_table_is_incomplete() {
        let desc = desc_table("OR1", "TWICE", "5.00", ("2017", "8", "1"));
        let bundle = zip_bytes(&[
            ArchiveMember::stored("a/or1_desc.dbf", &desc),
            ArchiveMember::stored("b/or1_desc.dbf", &desc),
        ]);
        let pipeline = ItemPipeline::new(
            fetcher_with(bundle),
            Arc::new(RecordingWriter::default()),
            settings(false),
        );

        match pipeline.process(&item()).await {
            Err(Error::IncompleteRecord {
                class,
                problem: ShapeProblem::Duplicate,
                ..
            }) => assert_eq!(class, "desc"),
            other => panic!("expected incomplete record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_failure_names_the_url() {
        let pipeline = ItemPipeline::new(
            Arc::new(CannedFetcher::default()),
            Arc::new(RecordingWriter::default()),
            settings(true),
        );

        match pipeline.process(&item()).await {
            Err(Error::Fetch { url, .. }) => assert_eq!(url, source_url(BASE, &item())),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_archive_body_is_archive_error() {
        let pipeline = ItemPipeline::new(
            fetcher_with(b"<html>maintenance</html>".to_vec()),
            Arc::new(RecordingWriter::default()),
            settings(true),
        );

        assert!(matches!(
            pipeline.process(&item()).await,
            Err(Error::Archive { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_table_is_decode_error() {
        let rep = rep_table(&[("Forest", "1.00")]);
        let bundle = zip_bytes(&[
            ArchiveMember::stored("or1_desc.dbf", b"not a table"),
            ArchiveMember::stored("or1_rep.dbf", &rep),
        ]);
        let pipeline = ItemPipeline::new(
            fetcher_with(bundle),
            Arc::new(RecordingWriter::default()),
            settings(false),
        );

        match pipeline.process(&item()).await {
            Err(Error::Decode { member, .. }) => assert_eq!(member, "or1_desc.dbf"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_failure_is_fatal() {
        let pipeline = ItemPipeline::new(
            fetcher_with(full_bundle()),
            Arc::new(FailingWriter),
            settings(true),
        );

        match pipeline.process(&item()).await {
            Err(Error::Write { path, .. }) => assert!(path.ends_with("or4217012345620170715_burn_bndy.kmz")),
            other => panic!("expected write error, got {other:?}"),
        }
    }
}
