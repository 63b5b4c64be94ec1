//! Zip packaging of converted segments.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to read segment: {0}")]
    Io(#[from] io::Error),
}

/// A file on disk and the name it gets inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Download name for an archive created at `now`.
pub fn archive_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("audiobook_mp3s_{}.zip", now.format("%Y%m%d-%H%M%S"))
}

/// Places segments in the archive.
///
/// A single upload keeps its segments at the root; several uploads get one
/// folder each. Folder names must already be unique.
pub fn layout(uploads: &[(String, Vec<PathBuf>)]) -> Vec<ArchiveEntry> {
    let flat = uploads.len() == 1;
    uploads
        .iter()
        .flat_map(|(folder, segments)| {
            segments.iter().filter_map(move |path| {
                let file_name = path.file_name()?.to_string_lossy();
                let name = if flat {
                    file_name.into_owned()
                } else {
                    format!("{}/{}", folder, file_name)
                };
                Some(ArchiveEntry {
                    name,
                    path: path.clone(),
                })
            })
        })
        .collect()
}

/// Writes the archive to `dest` and returns its size in bytes.
/// MP3 data is stored without recompression.
pub fn write_zip(entries: &[ArchiveEntry], dest: &Path) -> Result<u64, ArchiveError> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .large_file(true);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        let mut file = File::open(&entry.path)?;
        io::copy(&mut file, &mut writer)?;
    }

    let file = writer
        .finish()?
        .into_inner()
        .map_err(|e| ArchiveError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}
