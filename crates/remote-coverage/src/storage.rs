//! Persisting coverage snapshots to disk.
//!
//! Each flush lands in `{target_directory}/{base_name}.{ext}`. When the file
//! already exists the stored data is decoded and the new snapshot merged into
//! it, so repeated flushes under one name accumulate instead of clobbering.
//! Writes go through a temporary file in the target directory and an atomic
//! rename; a killed process never leaves a half-written file behind.

use crate::result::{CoverageError, CoverageResult};
use crate::snapshot::CoverageData;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where and how a snapshot was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCoverage {
    /// Final file path
    pub path: PathBuf,
    /// Whether the snapshot was merged into an existing file
    pub merged: bool,
}

/// Writes coverage files under one target directory
#[derive(Debug, Clone)]
pub struct CoverageStore {
    target_directory: PathBuf,
}

impl CoverageStore {
    /// Create a store rooted at `target_directory`. The directory is created
    /// lazily on the first write.
    #[must_use]
    pub fn new(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
        }
    }

    /// Directory files are written to
    #[must_use]
    pub fn target_directory(&self) -> &Path {
        &self.target_directory
    }

    /// Path a snapshot named `base_name` is stored at
    #[must_use]
    pub fn path_for<C: CoverageData>(&self, base_name: &str) -> PathBuf {
        self.target_directory
            .join(format!("{base_name}.{}", C::EXTENSION))
    }

    /// Merge `snapshot` into the file named `base_name`, creating it if needed
    pub fn store<C: CoverageData>(
        &self,
        snapshot: C,
        base_name: &str,
    ) -> CoverageResult<StoredCoverage> {
        fs::create_dir_all(&self.target_directory)?;
        let path = self.path_for::<C>(base_name);

        let (data, merged) = if path.exists() {
            let mut existing: C = load(&path)?;
            existing.merge(snapshot);
            (existing, true)
        } else {
            (snapshot, false)
        };

        write_atomic(&path, &data.encode()?)?;
        tracing::debug!(path = %path.display(), merged, "stored coverage");
        Ok(StoredCoverage { path, merged })
    }
}

/// Decode a stored coverage file
pub fn load<C: CoverageData>(path: &Path) -> CoverageResult<C> {
    let bytes = fs::read(path)?;
    C::decode(&bytes).map_err(|e| CoverageError::CorruptStore {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge several stored files into one snapshot, in order.
///
/// `on_file` runs after each file has been merged. The first unreadable or
/// corrupt file stops the merge.
pub fn merge_files<C: CoverageData + Default>(
    paths: &[PathBuf],
    mut on_file: impl FnMut(&Path),
) -> CoverageResult<C> {
    let mut merged = C::default();
    for path in paths {
        merged.merge(load(path)?);
        on_file(path);
    }
    Ok(merged)
}

/// Write `contents` to `path` via a sibling temp file and rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> CoverageResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents)?;
    temp_file.as_file().sync_all()?;
    let _ = temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
