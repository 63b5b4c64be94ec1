//! Directory walker: converts every eligible file in a directory.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::types::BatchResult;
use crate::converter::{
    default_output_dir, is_supported_input, ConverterConfig, ConverterError, SegmentConverter,
    OUTPUT_DIR_SUFFIX,
};

/// Applies a [`SegmentConverter`] to each `.m4a` file in a directory.
///
/// One file failing never stops the rest of the batch.
#[derive(Clone)]
pub struct DirectoryWalker {
    converter: SegmentConverter,
    recursive: bool,
    max_parallel: usize,
}

impl DirectoryWalker {
    /// Sequential, top-level-only walker.
    pub fn new(converter: SegmentConverter) -> Self {
        Self {
            converter,
            recursive: false,
            max_parallel: 1,
        }
    }

    /// Creates an ffmpeg-backed walker from configuration.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(SegmentConverter::from_config(config))
            .with_max_parallel(config.max_parallel_conversions)
    }

    /// Descend into subdirectories. Keys become paths relative to the root.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Convert up to `max` files at once. Values below 1 mean sequential.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max.max(1);
        self
    }

    pub fn converter(&self) -> &SegmentConverter {
        &self.converter
    }

    /// Converts all eligible files with the converter's default segment length.
    pub async fn convert_directory(&self, dir: &Path) -> Result<BatchResult, ConverterError> {
        self.convert_directory_with(dir, self.converter.segment_seconds())
            .await
    }

    /// Converts all eligible files, splitting every `segment_seconds`.
    pub async fn convert_directory_with(
        &self,
        dir: &Path,
        segment_seconds: u32,
    ) -> Result<BatchResult, ConverterError> {
        let files = self.eligible_files(dir).await?;
        info!(
            directory = %dir.display(),
            eligible = files.len(),
            recursive = self.recursive,
            max_parallel = self.max_parallel,
            "Converting directory"
        );

        let converter = &self.converter;
        let results: Vec<_> = stream::iter(assign_output_dirs(files))
            .map(|(name, path, output_dir)| async move {
                let result = match output_dir {
                    Some(output_dir) => {
                        converter
                            .convert_into(&path, &output_dir, segment_seconds)
                            .await
                    }
                    None => converter.convert_file_with(&path, segment_seconds).await,
                };
                (name, result)
            })
            .buffered(self.max_parallel)
            .collect()
            .await;

        let batch: BatchResult = results.into_iter().collect();
        info!(
            directory = %dir.display(),
            succeeded = batch.success_count(),
            failed = batch.failure_count(),
            "Directory converted"
        );
        Ok(batch)
    }

    /// Eligible files as `(key, path)` pairs sorted by key.
    pub async fn eligible_files(
        &self,
        dir: &Path,
    ) -> Result<Vec<(String, PathBuf)>, ConverterError> {
        let is_dir = tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ConverterError::InputNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    if self.recursive && !is_output_dir(&path) {
                        pending.push(path);
                    }
                    continue;
                }

                // Follow symlinks to files, never to directories
                let is_file = file_type.is_file()
                    || (file_type.is_symlink()
                        && tokio::fs::metadata(&path)
                            .await
                            .map(|m| m.is_file())
                            .unwrap_or(false));

                if !is_file || !is_supported_input(&path) {
                    debug!(path = %path.display(), "Skipping ineligible entry");
                    continue;
                }

                let key = path
                    .strip_prefix(dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                files.push((key, path));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

/// Gives every file its own output directory.
///
/// Files are visited in key order; the first one keeps `<stem>_segments`.
/// Later files with the same stem (e.g. `book.m4a` next to `book.M4A`)
/// get `<stem>_<ext>_segments`, then a numeric suffix if that is taken too.
fn assign_output_dirs(files: Vec<(String, PathBuf)>) -> Vec<(String, PathBuf, Option<PathBuf>)> {
    let mut taken = HashSet::new();
    files
        .into_iter()
        .map(|(name, path)| {
            let output_dir = default_output_dir(&path).map(|default| {
                if taken.insert(default.clone()) {
                    return default;
                }
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                let ext = path.extension().unwrap_or_default().to_string_lossy();
                let parent = default.parent().map(Path::to_path_buf).unwrap_or_default();
                let mut candidate =
                    parent.join(format!("{}_{}{}", stem, ext, OUTPUT_DIR_SUFFIX));
                let mut n = 2;
                while !taken.insert(candidate.clone()) {
                    candidate = parent.join(format!("{}_{}_{}{}", stem, ext, n, OUTPUT_DIR_SUFFIX));
                    n += 1;
                }
                warn!(
                    input = %path.display(),
                    output_dir = %candidate.display(),
                    "Output directory name already used by another input"
                );
                candidate
            });
            (name, path, output_dir)
        })
        .collect()
}

fn is_output_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(OUTPUT_DIR_SUFFIX))
        .unwrap_or(false)
}
