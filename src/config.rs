//! Configuration for a migration run.
//!
//! All behaviour is controlled through [`MigrationConfig`], built via its
//! [`MigrationConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across in-flight documents, log it, and diff
//! two runs to understand why their outcomes differ.
//!
//! Endpoints and credentials are deliberately *not* here: they belong to the
//! source and remote collaborators ([`crate::source`], [`crate::remote`]),
//! which are constructed by the host application.

use crate::error::MigrateError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default recognized raster-page suffixes.
///
/// The source system delivers scanned pages as TIFF; PNG and JPEG cover
/// archives re-exported by intermediate tooling. Matching is
/// case-insensitive on the entry name's suffix.
pub const DEFAULT_PAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg"];

/// Configuration for a migration run.
///
/// Built via [`MigrationConfig::builder()`] or [`MigrationConfig::default()`].
///
/// # Example
/// ```rust
/// use docmigrate::MigrationConfig;
///
/// let config = MigrationConfig::builder()
///     .concurrency(8)
///     .remote_root("/incoming")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct MigrationConfig {
    /// Number of documents migrated concurrently. Default: 4.
    ///
    /// Each in-flight document holds its pages in memory and one fetch plus
    /// up to three remote writes on the wire. The limit protects both the
    /// source service and the remote target from overload; raise it when the
    /// remote session pool is sized accordingly.
    pub concurrency: usize,

    /// Remote directory under which per-document directories are created.
    /// Default: `/incoming`.
    ///
    /// Each document lands in `{remote_root}/{doc_id}/`.
    pub remote_root: String,

    /// Timeout for fetching one source archive, in seconds. Default: 120.
    pub fetch_timeout_secs: u64,

    /// Recognized raster-page suffixes, lowercase, without the dot.
    /// Default: [`DEFAULT_PAGE_EXTENSIONS`].
    ///
    /// Archive entries whose name does not end in one of these (compared
    /// case-insensitively) are skipped during extraction.
    pub page_extensions: Vec<String>,

    /// Directory under which each document's scratch directory is created.
    /// Default: the system temp directory.
    ///
    /// Scratch directories are removed when the run ends, on every exit
    /// path; pointing this at a dedicated volume keeps staged artifacts off
    /// the root filesystem and makes cleanup observable.
    pub workdir_root: Option<PathBuf>,

    /// Optional per-document progress events for the orchestrator run.
    /// Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("concurrency", &self.concurrency)
            .field("remote_root", &self.remote_root)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("page_extensions", &self.page_extensions)
            .field("workdir_root", &self.workdir_root)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            remote_root: "/incoming".to_string(),
            fetch_timeout_secs: 120,
            page_extensions: DEFAULT_PAGE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            workdir_root: None,
            progress_callback: None,
        }
    }
}

impl MigrationConfig {
    /// Create a new builder for `MigrationConfig`.
    pub fn builder() -> MigrationConfigBuilder {
        MigrationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MigrationConfig`].
#[derive(Debug)]
pub struct MigrationConfigBuilder {
    config: MigrationConfig,
}

impl MigrationConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn remote_root(mut self, root: impl Into<String>) -> Self {
        self.config.remote_root = root.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn page_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.page_extensions = exts.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    pub fn workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.workdir_root = Some(root.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn crate::progress::MigrationProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MigrationConfig, MigrateError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(MigrateError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.remote_root.is_empty() {
            return Err(MigrateError::InvalidConfig(
                "Remote root must not be empty".into(),
            ));
        }
        if c.page_extensions.is_empty() {
            return Err(MigrateError::InvalidConfig(
                "At least one page extension is required".into(),
            ));
        }
        Ok(self.config)
    }
}
