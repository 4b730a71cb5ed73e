//! Staging area and namespace handles.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::StagingConfig;
use super::error::StagingError;
use crate::metrics;

/// Fallback used when an uploaded name has no usable final component.
const FALLBACK_FILE_NAME: &str = "upload";

/// Longest staged file name, kept well under the common 255-byte limit so
/// derived names (`{stem}{index}.jpg`, `{stem}.tiff`) still fit.
const MAX_FILE_NAME_BYTES: usize = 200;

/// Extensions longer than this are treated as part of the stem.
const MAX_EXTENSION_BYTES: usize = 16;

/// Allocates isolated per-request namespaces under a base directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    config: StagingConfig,
}

impl StagingArea {
    /// Creates a staging area with the given configuration.
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    /// Creates a staging area with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StagingConfig::default())
    }

    /// Returns the base directory namespaces are created in.
    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    /// Allocates a fresh namespace.
    ///
    /// The namespace directory is created with `create_dir`, so an existing
    /// directory of the same name is an error rather than a shared root.
    pub async fn create(&self) -> Result<StagingNamespace, StagingError> {
        fs::create_dir_all(&self.config.base_dir)
            .await
            .map_err(|source| StagingError::BaseDirFailed {
                path: self.config.base_dir.clone(),
                source,
            })?;

        let id = Uuid::new_v4();
        let root = self.config.base_dir.join(id.to_string());

        fs::create_dir(&root)
            .await
            .map_err(|source| StagingError::CreateFailed {
                path: root.clone(),
                source,
            })?;

        debug!(namespace = %id, root = %root.display(), "Created staging namespace");

        Ok(StagingNamespace {
            id,
            root,
            destroyed: false,
        })
    }
}

/// One request's private directory tree.
///
/// The tree is removed by [`StagingNamespace::destroy`]. If the handle is
/// dropped without that call (early return, cancelled future, panic) the
/// tree is removed synchronously in `Drop`.
#[derive(Debug)]
pub struct StagingNamespace {
    id: Uuid,
    root: PathBuf,
    destroyed: bool,
}

impl StagingNamespace {
    /// Unique identifier of this namespace.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Root directory of this namespace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds a path under the namespace root, creating the intermediate
    /// directories.
    ///
    /// Every segment must be a single normal path component.
    pub async fn path(&self, segments: &[&str]) -> Result<PathBuf, StagingError> {
        let path = self.join(segments)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StagingError::PrepareFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        Ok(path)
    }

    /// Builds a directory under the namespace root and creates it.
    pub async fn dir(&self, segments: &[&str]) -> Result<PathBuf, StagingError> {
        let path = self.join(segments)?;
        fs::create_dir_all(&path)
            .await
            .map_err(|source| StagingError::PrepareFailed {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn join(&self, segments: &[&str]) -> Result<PathBuf, StagingError> {
        let mut path = self.root.clone();
        for segment in segments {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(segment),
                _ => {
                    return Err(StagingError::InvalidSegment {
                        segment: segment.to_string(),
                    })
                }
            }
        }
        Ok(path)
    }

    /// Whether the tree has already been removed through this handle.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Recursively removes the namespace.
    ///
    /// Idempotent: removing an already-removed tree succeeds.
    pub async fn destroy(&mut self) -> Result<(), StagingError> {
        if self.destroyed {
            return Ok(());
        }

        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(namespace = %self.id, "Removed staging namespace");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(namespace = %self.id, "Staging namespace already removed");
            }
            Err(source) => {
                metrics::STAGING_CLEANUP_FAILURES.inc();
                return Err(StagingError::RemoveFailed {
                    path: self.root.clone(),
                    source,
                });
            }
        }

        self.destroyed = true;
        Ok(())
    }
}

impl Drop for StagingNamespace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {
                debug!(namespace = %self.id, "Removed staging namespace on drop");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                metrics::STAGING_CLEANUP_FAILURES.inc();
                warn!(
                    namespace = %self.id,
                    root = %self.root.display(),
                    error = %e,
                    "Failed to remove staging namespace on drop"
                );
            }
        }
    }
}

/// Reduces an uploaded file name to something safe to place in a namespace.
///
/// Directory parts are stripped (both `/` and `\` separators, since uploads
/// may come from any client OS), control characters such as NUL are removed
/// and over-long names are shortened, keeping the extension. Names with
/// nothing usable left become `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let last: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let last = last.trim();

    if last.is_empty() || last == "." || last == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        truncate_file_name(last)
    }
}

fn truncate_file_name(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_BYTES {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };
    let mut end = MAX_FILE_NAME_BYTES - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn area_in(dir: &TempDir) -> StagingArea {
        StagingArea::new(StagingConfig::default().with_base_dir(dir.path().join("staging")))
    }

    #[tokio::test]
    async fn test_create_makes_unique_directories() {
        let temp = TempDir::new().unwrap();
        let area = area_in(&temp);

        let a = area.create().await.unwrap();
        let b = area.create().await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.root(), b.root());
        assert!(a.root().is_dir());
        assert!(b.root().is_dir());
        assert!(a.root().starts_with(area.base_dir()));
    }

    #[tokio::test]
    async fn test_path_creates_intermediate_dirs() {
        let temp = TempDir::new().unwrap();
        let area = area_in(&temp);
        let namespace = area.create().await.unwrap();

        let path = namespace.path(&["input", "scan.pdf"]).await.unwrap();
        assert_eq!(path, namespace.root().join("input").join("scan.pdf"));
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dir_creates_directory() {
        let temp = TempDir::new().unwrap();
        let namespace = area_in(&temp).create().await.unwrap();

        let dir = namespace.dir(&["frames"]).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_path_rejects_escaping_segments() {
        let temp = TempDir::new().unwrap();
        let namespace = area_in(&temp).create().await.unwrap();

        for bad in ["..", "a/b", "/etc", "", "."] {
            let result = namespace.path(&["input", bad]).await;
            assert!(
                matches!(result, Err(StagingError::InvalidSegment { .. })),
                "segment {:?} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_destroy_removes_tree_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut namespace = area_in(&temp).create().await.unwrap();
        let file = namespace.path(&["output", "out.tiff"]).await.unwrap();
        tokio::fs::write(&file, b"data").await.unwrap();

        let root = namespace.root().to_path_buf();
        namespace.destroy().await.unwrap();
        assert!(!root.exists());
        assert!(namespace.is_destroyed());

        namespace.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn test_destroy_tolerates_external_removal() {
        let temp = TempDir::new().unwrap();
        let mut namespace = area_in(&temp).create().await.unwrap();
        std::fs::remove_dir_all(namespace.root()).unwrap();

        namespace.destroy().await.unwrap();
        assert!(namespace.is_destroyed());
    }

    #[tokio::test]
    async fn test_drop_removes_tree() {
        let temp = TempDir::new().unwrap();
        let namespace = area_in(&temp).create().await.unwrap();
        let file = namespace.path(&["input", "a.pdf"]).await.unwrap();
        std::fs::write(&file, b"%PDF-").unwrap();

        let root = namespace.root().to_path_buf();
        drop(namespace);
        assert!(!root.exists());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("scan.pdf"), "scan.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\Users\me\doc.tiff"), "doc.tiff");
        assert_eq!(sanitize_file_name("dir/"), "upload");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_file_name("a\0b.pdf"), "ab.pdf");
        assert_eq!(sanitize_file_name("line\r\nbreak.tiff"), "linebreak.tiff");
        assert_eq!(sanitize_file_name("\0\0"), "upload");
    }

    #[test]
    fn test_sanitize_shortens_long_names_keeping_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let name = sanitize_file_name(&long);
        assert_eq!(name.len(), MAX_FILE_NAME_BYTES);
        assert!(name.ends_with(".pdf"));

        // Multi-byte characters are never split.
        let wide = format!("{}.tiff", "é".repeat(150));
        let name = sanitize_file_name(&wide);
        assert!(name.len() <= MAX_FILE_NAME_BYTES);
        assert!(name.ends_with(".tiff"));
        assert!(name.trim_end_matches(".tiff").chars().all(|c| c == 'é'));

        let no_extension = "b".repeat(400);
        assert_eq!(sanitize_file_name(&no_extension).len(), MAX_FILE_NAME_BYTES);
    }

    #[tokio::test]
    async fn test_sanitized_long_name_can_be_staged() {
        let temp = TempDir::new().unwrap();
        let namespace = area_in(&temp).create().await.unwrap();
        let name = sanitize_file_name(&format!("{}.pdf", "x".repeat(300)));

        let path = namespace.path(&["input", &name]).await.unwrap();
        tokio::fs::write(&path, b"%PDF-").await.unwrap();
        assert!(path.exists());
    }
}
