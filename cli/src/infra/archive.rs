//! Archive infrastructure — implements `DiskArchiver` with flate2 and zip.
//!
//! Disk images are several GiB, so everything streams through a fixed-size
//! buffer and runs on the blocking thread pool.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::application::ports::DiskArchiver;

/// Deflate level used for zip entries (maximum).
const ZIP_DEFLATE_LEVEL: i64 = 9;

/// Production `DiskArchiver` writing to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalArchiver;

impl DiskArchiver for LocalArchiver {
    async fn gzip(&self, source: &Path, dest: &Path) -> Result<()> {
        let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
        tokio::task::spawn_blocking(move || write_or_discard(&dest, |out| gzip_file(&source, out)))
            .await
            .context("spawn_blocking for gzip")?
    }

    async fn zip_single(&self, source: &Path, dest: &Path, entry_name: &str) -> Result<()> {
        let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
        let entry_name = entry_name.to_string();
        tokio::task::spawn_blocking(move || {
            write_or_discard(&dest, |out| zip_file(&source, out, &entry_name))
        })
        .await
        .context("spawn_blocking for zip")?
    }
}

/// Create `dest`, hand it to `write`, and delete it again if writing fails.
fn write_or_discard(dest: &Path, write: impl FnOnce(File) -> Result<()>) -> Result<()> {
    let out = File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    let result = write(out);
    if result.is_err() {
        discard(dest);
    }
    result
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "cannot remove partial archive");
    }
}

fn open_source(source: &Path) -> Result<BufReader<File>> {
    File::open(source)
        .map(BufReader::new)
        .with_context(|| format!("opening {}", source.display()))
}

/// Stream `source` through gzip at best compression into `out`.
///
/// # Errors
///
/// Returns an error if reading the source or writing the archive fails.
pub fn gzip_file(source: &Path, out: File) -> Result<()> {
    let mut input = open_source(source)?;
    let mut encoder = GzEncoder::new(BufWriter::new(out), Compression::best());
    let copied = io::copy(&mut input, &mut encoder)
        .with_context(|| format!("compressing {}", source.display()))?;
    let mut writer = encoder.finish().context("finishing gzip stream")?;
    writer.flush().context("flushing gzip archive")?;
    tracing::debug!(source = %source.display(), bytes = copied, "gzip written");
    Ok(())
}

/// Write a zip into `out` holding `source` as its only entry.
///
/// # Errors
///
/// Returns an error if reading the source or writing the archive fails.
pub fn zip_file(source: &Path, out: File, entry_name: &str) -> Result<()> {
    let mut input = open_source(source)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(ZIP_DEFLATE_LEVEL))
        .large_file(true);

    let mut zip = ZipWriter::new(BufWriter::new(out));
    zip.start_file(entry_name, options)
        .with_context(|| format!("starting zip entry {entry_name}"))?;
    let copied = io::copy(&mut input, &mut zip)
        .with_context(|| format!("compressing {}", source.display()))?;
    let mut writer = zip.finish().context("finishing zip archive")?;
    writer.flush().context("flushing zip archive")?;
    tracing::debug!(source = %source.display(), entry = entry_name, bytes = copied, "zip written");
    Ok(())
}
