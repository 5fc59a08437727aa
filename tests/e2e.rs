//! End-to-end integration tests for docmigrate.
//!
//! These run fully in-process: an in-memory document source stands in for
//! the REST inventory and a `LocalDirTarget` over a `TempDir` stands in for
//! the remote storage target, so the whole pipeline — extraction, custody
//! packaging, lossless merge, metadata, transactional delivery — is
//! exercised without any network or external fixtures.

use async_trait::async_trait;
use docmigrate::{
    migrate_document, migrate_documents, DocumentId, DocumentSource, LocalDirTarget,
    MigrateError, MigrationConfig, RemoteTarget, Stage, CHAIN_OBJECT, DOCUMENT_OBJECT,
    META_OBJECT,
};
use image::{DynamicImage, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// PNG bytes of a solid-colour page with the given dimensions.
fn png_bytes(w: u32, h: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(w, h, Rgb([shade, shade / 2, 255 - shade]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Build a source archive ZIP from (entry name, content) pairs, in order.
fn build_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options: FileOptions<()> = FileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// A three-page archive with distinct page geometries.
fn three_page_archive() -> Vec<u8> {
    build_archive(&[
        ("scan-001.png", png_bytes(40, 60, 10)),
        ("scan-002.png", png_bytes(80, 20, 120)),
        ("scan-003.png", png_bytes(30, 30, 240)),
    ])
}

/// In-memory stand-in for the REST inventory and payload service.
struct StaticSource {
    archives: HashMap<String, Vec<u8>>,
}

impl StaticSource {
    fn single(id: &str, archive: Vec<u8>) -> Arc<Self> {
        let mut archives = HashMap::new();
        archives.insert(id.to_string(), archive);
        Arc::new(Self { archives })
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn list_pending_documents(&self) -> Result<Vec<DocumentId>, MigrateError> {
        let mut ids: Vec<_> = self.archives.keys().cloned().collect();
        ids.sort();
        Ok(ids.into_iter().map(DocumentId::from).collect())
    }

    async fn fetch_archive(&self, id: &DocumentId) -> Result<Vec<u8>, MigrateError> {
        self.archives
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MigrateError::Fetch {
                doc_id: id.to_string(),
                reason: "HTTP 404".into(),
            })
    }
}

/// Remote target that refuses to write a specific object name, for
/// partial-upload scenarios.
struct FailingTarget {
    inner: LocalDirTarget,
    refuse_suffix: String,
}

#[async_trait]
impl RemoteTarget for FailingTarget {
    async fn ensure_directory(&self, path: &str) -> Result<(), MigrateError> {
        self.inner.ensure_directory(path).await
    }

    async fn write_object(&self, path: &str, bytes: &[u8]) -> Result<(), MigrateError> {
        if path.ends_with(&self.refuse_suffix) {
            return Err(MigrateError::Upload {
                object: path.to_string(),
                reason: "connection reset by peer".into(),
            });
        }
        self.inner.write_object(path, bytes).await
    }
}

fn read_remote(root: &TempDir, rel: &str) -> Vec<u8> {
    std::fs::read(root.path().join(rel.trim_start_matches('/'))).unwrap()
}

fn remote_exists(root: &TempDir, rel: &str) -> bool {
    root.path().join(rel.trim_start_matches('/')).exists()
}

/// Config whose scratch directories land under `scratch`, so cleanup is
/// observable from the outside.
fn config_with_scratch(scratch: &TempDir) -> MigrationConfig {
    MigrationConfig::builder()
        .workdir_root(scratch.path())
        .build()
        .unwrap()
}

fn assert_scratch_empty(scratch: &TempDir) {
    let leftovers: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "scratch not cleaned: {leftovers:?}");
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_page_archive_delivers_three_objects() {
    let source = StaticSource::single("doc-001", three_page_archive());
    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::default();

    let result = migrate_document("doc-001".into(), source, target, &config).await;
    let receipt = result.outcome.expect("migration should succeed");

    assert_eq!(receipt.page_count, 3);
    assert_eq!(receipt.remote_dir, "/incoming/doc-001");
    assert_eq!(receipt.objects.len(), 3);

    // chain.zip: 3 pages + manifest = 4 entries.
    let chain = read_remote(&remote, "/incoming/doc-001/chain.zip");
    let zip = zip::ZipArchive::new(Cursor::new(&chain[..])).unwrap();
    assert_eq!(zip.len(), 4);

    // document.pdf: 3 pages, geometry matching the source images in order.
    let pdf = read_remote(&remote, "/incoming/doc-001/document.pdf");
    let doc = lopdf::Document::load_mem(&pdf).expect("delivered PDF must parse");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    let first = doc.get_object(pages[&1]).unwrap().as_dict().unwrap();
    let media_box = first.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_i64().unwrap(), 40);
    assert_eq!(media_box[3].as_i64().unwrap(), 60);

    // meta.xml: page count and a 64-hex digest matching the delivered chain.
    let meta = String::from_utf8(read_remote(&remote, "/incoming/doc-001/meta.xml")).unwrap();
    assert!(meta.contains("<id>doc-001</id>"), "meta: {meta}");
    assert!(meta.contains("<pages>3</pages>"), "meta: {meta}");
    let expected_digest = format!("{:x}", Sha256::digest(&chain));
    assert_eq!(expected_digest.len(), 64);
    assert!(
        meta.contains(&format!("<chainHash>{expected_digest}</chainHash>")),
        "digest in meta.xml must cover the delivered chain.zip bytes"
    );
}

// ── Extraction failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn archive_without_pages_fails_at_extracting() {
    let archive = build_archive(&[
        ("readme.txt", b"no pages here".to_vec()),
        ("index.xml", b"<x/>".to_vec()),
    ]);
    let source = StaticSource::single("doc-002", archive);
    let remote = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = config_with_scratch(&scratch);

    let result = migrate_document("doc-002".into(), source, target, &config).await;
    let failure = result.outcome.unwrap_err();

    assert_eq!(failure.stage, Stage::Extracting);
    assert!(matches!(failure.cause, MigrateError::NoPagesFound { .. }));

    // No remote objects were written and no temp artifacts remain.
    assert!(!remote_exists(&remote, "/incoming/doc-002"));
    assert_scratch_empty(&scratch);
}

#[tokio::test]
async fn unparsable_archive_fails_at_extracting_with_invalid_archive() {
    let source = StaticSource::single("doc-003", b"this is not a zip".to_vec());
    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::default();

    let result = migrate_document("doc-003".into(), source, target, &config).await;
    let failure = result.outcome.unwrap_err();

    assert_eq!(failure.stage, Stage::Extracting);
    assert!(matches!(failure.cause, MigrateError::InvalidArchive { .. }));
}

#[tokio::test]
async fn undecodable_page_fails_at_merging() {
    let archive = build_archive(&[("scan-001.tif", b"not really a tiff".to_vec())]);
    let source = StaticSource::single("doc-004", archive);
    let remote = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = config_with_scratch(&scratch);

    let result = migrate_document("doc-004".into(), source, target, &config).await;
    let failure = result.outcome.unwrap_err();

    assert_eq!(failure.stage, Stage::Merging);
    assert!(matches!(
        failure.cause,
        MigrateError::UnsupportedImageFormat { page: 1, .. }
    ));
    assert!(!remote_exists(&remote, "/incoming/doc-004"));

    // The scratch directory existed for this run (the failure happened
    // mid-pipeline) and must be gone afterwards.
    assert_scratch_empty(&scratch);
}

// ── Partial upload: committed objects stay, run reports failure ──────────────

#[tokio::test]
async fn failed_document_write_leaves_chain_in_place() {
    let source = StaticSource::single("doc-005", three_page_archive());
    let remote = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let target = Arc::new(FailingTarget {
        inner: LocalDirTarget::new(remote.path()),
        refuse_suffix: DOCUMENT_OBJECT.to_string(),
    });
    let config = config_with_scratch(&scratch);

    let result = migrate_document("doc-005".into(), source, target, &config).await;
    let failure = result.outcome.unwrap_err();

    assert_eq!(failure.stage, Stage::Uploading);
    match &failure.cause {
        MigrateError::Upload { object, .. } => {
            assert!(object.ends_with(DOCUMENT_OBJECT), "object: {object}")
        }
        other => panic!("expected Upload, got: {other}"),
    }

    // chain.zip committed before the failure is left for reconciliation;
    // document.pdf and meta.xml were never written. The staged artifacts
    // themselves are cleaned even though the upload failed.
    assert!(remote_exists(&remote, "/incoming/doc-005/chain.zip"));
    assert!(!remote_exists(&remote, "/incoming/doc-005/document.pdf"));
    assert!(!remote_exists(&remote, "/incoming/doc-005/meta.xml"));
    assert_scratch_empty(&scratch);
}

// ── Idempotence: re-running produces identical artifacts ─────────────────────

#[tokio::test]
async fn rerun_produces_identical_custody_bytes_and_digest() {
    let config = MigrationConfig::default();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let source = StaticSource::single("doc-006", three_page_archive());
        let remote = TempDir::new().unwrap();
        let target = Arc::new(LocalDirTarget::new(remote.path()));
        let result = migrate_document("doc-006".into(), source, target, &config).await;
        let receipt = result.outcome.expect("migration should succeed");
        let chain = read_remote(&remote, "/incoming/doc-006/chain.zip");
        let meta = read_remote(&remote, "/incoming/doc-006/meta.xml");
        runs.push((receipt.custody_digest, chain, meta));
    }

    assert_eq!(runs[0].0, runs[1].0, "custody digest must be stable");
    assert_eq!(runs[0].1, runs[1].1, "chain.zip bytes must be identical");
    assert_eq!(runs[0].2, runs[1].2, "meta.xml must be identical");
}

// ── Concurrency: bounded in-flight pipelines, all reach terminal state ───────

/// Source that records the maximum number of concurrently active fetches.
struct GaugeSource {
    archive: Vec<u8>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

#[async_trait]
impl DocumentSource for GaugeSource {
    async fn list_pending_documents(&self) -> Result<Vec<DocumentId>, MigrateError> {
        Ok(vec![])
    }

    async fn fetch_archive(&self, _id: &DocumentId) -> Result<Vec<u8>, MigrateError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        // Hold the slot long enough for the scheduler to saturate the pool.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.archive.clone())
    }
}

#[tokio::test]
async fn fifty_documents_with_limit_five_stay_bounded() {
    let source = Arc::new(GaugeSource {
        archive: build_archive(&[("p.png", png_bytes(6, 6, 60))]),
        active: AtomicUsize::new(0),
        max_active: AtomicUsize::new(0),
    });
    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::builder().concurrency(5).build().unwrap();

    let ids: Vec<DocumentId> = (0..50).map(|i| DocumentId::new(format!("doc-{i:03}"))).collect();
    let run = migrate_documents(ids, Arc::clone(&source) as _, target, &config).await;

    assert_eq!(run.results.len(), 50, "every document reaches a terminal result");
    assert_eq!(run.stats.succeeded, 50);
    assert_eq!(run.stats.failed, 0);
    assert_eq!(run.stats.total_pages, 50);

    let max = source.max_active.load(Ordering::SeqCst);
    assert!(max <= 5, "at most 5 pipelines in flight, saw {max}");
    assert!(max >= 2, "pool should actually run concurrently, saw {max}");
}

// ── Failure isolation: one bad document doesn't abort siblings ───────────────

#[tokio::test]
async fn failures_are_isolated_per_document() {
    let mut archives = HashMap::new();
    archives.insert("good-1".to_string(), three_page_archive());
    archives.insert("bad".to_string(), b"garbage".to_vec());
    archives.insert("good-2".to_string(), three_page_archive());
    let source = Arc::new(StaticSource { archives });

    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::builder().concurrency(3).build().unwrap();

    let ids = vec!["good-1".into(), "bad".into(), "good-2".into()];
    let run = migrate_documents(ids, source, target, &config).await;

    assert_eq!(run.stats.total, 3);
    assert_eq!(run.stats.succeeded, 2);
    assert_eq!(run.stats.failed, 1);

    let failures: Vec<_> = run.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.as_str(), "bad");
    assert_eq!(failures[0].1.stage, Stage::Extracting);

    assert!(remote_exists(&remote, "/incoming/good-1/meta.xml"));
    assert!(remote_exists(&remote, "/incoming/good-2/meta.xml"));
    assert!(!remote_exists(&remote, "/incoming/bad"));
}

// ── Streaming API ────────────────────────────────────────────────────────────

#[tokio::test]
async fn migrate_stream_emits_one_result_per_document() {
    use futures::StreamExt;

    let mut archives = HashMap::new();
    for i in 0..4 {
        archives.insert(format!("doc-{i}"), three_page_archive());
    }
    let source = Arc::new(StaticSource { archives });
    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::builder().concurrency(2).build().unwrap();

    let ids: Vec<DocumentId> = (0..4).map(|i| DocumentId::new(format!("doc-{i}"))).collect();
    let mut stream = docmigrate::migrate_stream(ids, source, target, &config);

    let mut seen = Vec::new();
    while let Some(result) = stream.next().await {
        assert!(result.is_success(), "{:?}", result.outcome);
        seen.push(result.doc_id);
    }
    seen.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].as_str(), "doc-0");
    assert_eq!(seen[3].as_str(), "doc-3");
}

// ── Full run via inventory enumeration ───────────────────────────────────────

#[tokio::test]
async fn run_migration_enumerates_the_inventory() {
    let mut archives = HashMap::new();
    archives.insert("inv-a".to_string(), three_page_archive());
    archives.insert("inv-b".to_string(), three_page_archive());
    let source = Arc::new(StaticSource { archives });
    let remote = TempDir::new().unwrap();
    let target = Arc::new(LocalDirTarget::new(remote.path()));
    let config = MigrationConfig::default();

    let run = docmigrate::run_migration(source, target, &config).await.unwrap();
    assert_eq!(run.stats.total, 2);
    assert_eq!(run.stats.succeeded, 2);
    for name in [CHAIN_OBJECT, DOCUMENT_OBJECT, META_OBJECT] {
        assert!(remote_exists(&remote, &format!("/incoming/inv-a/{name}")));
        assert!(remote_exists(&remote, &format!("/incoming/inv-b/{name}")));
    }
}
