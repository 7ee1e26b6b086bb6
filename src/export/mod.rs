//! Export module - Copy selected ROM archives to a destination
//!
//! Copies `<source>/<name>.zip` to `<dest>/<name>.zip` for every candidate,
//! skipping archives that do not exist, with optional blake3 verification.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::core::Progress;

/// Extension of ROM archives
pub const ROM_EXTENSION: &str = "zip";

/// Copy configuration options
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Directory holding `<name>.zip` archives
    pub source: PathBuf,
    /// Destination directory
    pub dest: PathBuf,
    /// Report what would be copied without writing anything
    pub dry_run: bool,
    /// Verify file integrity with blake3 hash
    pub verify_hash: bool,
    /// Record failed copies and keep going instead of aborting
    pub continue_on_error: bool,
}

/// Result of a copy batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyReport {
    /// Machines whose archive was copied (or would be, in a dry run)
    pub copied: Vec<String>,
    /// Machines without a source archive
    pub skipped: Vec<String>,
    /// Machines whose copy failed
    pub failed: Vec<CopyFailure>,
    /// Total bytes copied
    pub total_bytes: u64,
}

impl CopyReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFailure {
    pub name: String,
    pub error: String,
}

/// Failure copying a single archive
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hash mismatch for {}: source={source_hash}, dest={dest_hash}", path.display())]
    HashMismatch {
        path: PathBuf,
        source_hash: String,
        dest_hash: String,
    },

    #[error("Failed to create destination {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The batch stopped at `name`; `report` holds everything handled so far
    #[error("Copy stopped at {name}: {source}")]
    Aborted {
        name: String,
        report: CopyReport,
        #[source]
        source: Box<CopyError>,
    },
}

impl CopyError {
    /// Work done before the batch stopped, if it got that far
    pub fn partial_report(&self) -> Option<&CopyReport> {
        match self {
            CopyError::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Path of the archive for `name` inside `dir`
pub fn archive_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, ROM_EXTENSION))
}

/// ROM archive copier
pub struct Copier {
    options: CopyOptions,
}

impl Copier {
    /// Create a new copier with options
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Copy a batch of machines, reporting progress after each one.
    ///
    /// Without `continue_on_error` the first failure stops the batch with
    /// [`CopyError::Aborted`], after progress for the failing machine.
    pub async fn copy_batch<I, S, F>(
        &self,
        candidates: I,
        mut on_progress: F,
    ) -> Result<CopyReport, CopyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&Progress),
    {
        let names: Vec<S> = candidates.into_iter().collect();
        let mut report = CopyReport::default();
        let mut progress = Progress::new(names.len());

        // Ensure destination exists
        if !self.options.dry_run {
            fs::create_dir_all(&self.options.dest)
                .await
                .map_err(|source| CopyError::Destination {
                    path: self.options.dest.clone(),
                    source,
                })?;
        }

        for name in &names {
            let name: &str = name.as_ref();

            let failure = match self.copy_one(name).await {
                Ok(Some(bytes)) => {
                    tracing::debug!("Copied {} ({} bytes)", name, bytes);
                    report.total_bytes += bytes;
                    report.copied.push(name.to_string());
                    None
                }
                Ok(None) => {
                    report.skipped.push(name.to_string());
                    None
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed.push(CopyFailure {
                        name: name.to_string(),
                        error: e.to_string(),
                    });
                    Some(e)
                }
            };

            progress.completed += 1;
            progress.current = name.to_string();
            on_progress(&progress);

            if let Some(source) = failure {
                if !self.options.continue_on_error {
                    return Err(CopyError::Aborted {
                        name: name.to_string(),
                        report,
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(
            "Copied {} of {} archives ({} skipped, {} failed)",
            report.copied.len(),
            names.len(),
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Copy a single archive, returning the bytes written or `None` when the
    /// source archive does not exist
    async fn copy_one(&self, name: &str) -> Result<Option<u64>, CopyError> {
        let source = archive_path(&self.options.source, name);
        let dest = archive_path(&self.options.dest, name);

        let io_error = |source_err| CopyError::Io {
            from: source.clone(),
            to: dest.clone(),
            source: source_err,
        };

        if !fs::try_exists(&source).await.map_err(io_error)? {
            tracing::warn!("Skipping {}: {} not found", name, source.display());
            return Ok(None);
        }

        if self.options.dry_run {
            tracing::info!("Would copy: {} -> {}", source.display(), dest.display());
            return Ok(Some(0));
        }

        if !self.options.verify_hash {
            return fs::copy(&source, &dest).await.map(Some).map_err(io_error);
        }

        let (bytes, hash) = copy_with_hash(&source, &dest).await.map_err(io_error)?;
        let dest_hash = compute_file_hash(&dest).await.map_err(io_error)?;
        if hash != dest_hash {
            fs::remove_file(&dest).await.ok();
            return Err(CopyError::HashMismatch {
                path: dest,
                source_hash: hash,
                dest_hash,
            });
        }

        Ok(Some(bytes))
    }
}

/// Copy the archives of `candidates` from `options.source` to `options.dest`
pub async fn copy_roms<I, S, F>(
    candidates: I,
    options: &CopyOptions,
    on_progress: F,
) -> Result<CopyReport, CopyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&Progress),
{
    Copier::new(options.clone())
        .copy_batch(candidates, on_progress)
        .await
}

/// Feed `reader` through blake3, writing every chunk to `sink` as well
async fn hash_stream<R, W>(mut reader: R, mut sink: Option<W>) -> std::io::Result<(u64, String)>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if let Some(sink) = sink.as_mut() {
            sink.write_all(&buffer[..n]).await?;
        }
        total += n as u64;
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush().await?;
    }

    Ok((total, hex::encode(hasher.finalize().as_bytes())))
}

/// Copy `source` to `dest`, hashing the bytes on the way
async fn copy_with_hash(source: &Path, dest: &Path) -> std::io::Result<(u64, String)> {
    let reader = BufReader::new(fs::File::open(source).await?);
    let writer = BufWriter::new(fs::File::create(dest).await?);
    hash_stream(reader, Some(writer)).await
}

async fn compute_file_hash(path: &Path) -> std::io::Result<String> {
    let reader = BufReader::new(fs::File::open(path).await?);
    let (_, hash) = hash_stream(reader, None::<fs::File>).await?;
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(source: &Path, dest: &Path) -> CopyOptions {
        CopyOptions {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_archives_are_skipped() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        fs::write(source_dir.path().join("pacman.zip"), b"PK\x03\x04pacman")
            .await
            .unwrap();

        let mut calls = Vec::new();
        let report = copy_roms(
            ["missing1", "pacman"],
            &options(source_dir.path(), dest_dir.path()),
            |p| calls.push((p.completed, p.total, p.current.clone())),
        )
        .await
        .unwrap();

        assert_eq!(report.copied, ["pacman"]);
        assert_eq!(report.skipped, ["missing1"]);
        assert_eq!(
            calls,
            [
                (1, 2, "missing1".to_string()),
                (2, 2, "pacman".to_string())
            ]
        );

        let copied = fs::read(dest_dir.path().join("pacman.zip")).await.unwrap();
        assert_eq!(copied, b"PK\x03\x04pacman");
        assert!(!dest_dir.path().join("missing1.zip").exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_overwritten() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        fs::write(source_dir.path().join("sf2.zip"), b"new").await.unwrap();
        fs::write(dest_dir.path().join("sf2.zip"), b"old contents").await.unwrap();

        let report = copy_roms(["sf2"], &options(source_dir.path(), dest_dir.path()), |_| {})
            .await
            .unwrap();

        assert_eq!(report.total_bytes, 3);
        let content = fs::read(dest_dir.path().join("sf2.zip")).await.unwrap();
        assert_eq!(content, b"new");
    }

    #[tokio::test]
    async fn test_verified_copy() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        fs::write(source_dir.path().join("dkong.zip"), "Hello, ROM Filter!")
            .await
            .unwrap();

        let opts = CopyOptions {
            verify_hash: true,
            ..options(source_dir.path(), dest_dir.path().join("nested").as_path())
        };
        let report = copy_roms(["dkong"], &opts, |_| {}).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.total_bytes, 18);
        let hash = compute_file_hash(&dest_dir.path().join("nested/dkong.zip"))
            .await
            .unwrap();
        assert_eq!(hash, hex::encode(blake3::hash(b"Hello, ROM Filter!").as_bytes()));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        let dest = dest_dir.path().join("out");
        fs::write(source_dir.path().join("galaga.zip"), b"zip").await.unwrap();

        let opts = CopyOptions {
            dry_run: true,
            ..options(source_dir.path(), &dest)
        };
        let report = copy_roms(["galaga", "gone"], &opts, |_| {}).await.unwrap();

        assert_eq!(report.copied, ["galaga"]);
        assert_eq!(report.skipped, ["gone"]);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_copy_failure_policy() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        // A directory named like an archive exists but cannot be copied
        fs::create_dir(source_dir.path().join("broken.zip")).await.unwrap();
        fs::write(source_dir.path().join("good.zip"), b"ok").await.unwrap();

        let lenient = CopyOptions {
            continue_on_error: true,
            ..options(source_dir.path(), dest_dir.path())
        };
        let report = copy_roms(["broken", "good"], &lenient, |_| {}).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "broken");
        assert_eq!(report.copied, ["good"]);
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_report() {
        let source_dir = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        fs::create_dir(source_dir.path().join("broken.zip")).await.unwrap();
        fs::write(source_dir.path().join("after.zip"), b"late").await.unwrap();

        let mut calls = Vec::new();
        let err = copy_roms(
            ["missing1", "broken", "after"],
            &options(source_dir.path(), dest_dir.path()),
            |p| calls.push(p.current.clone()),
        )
        .await
        .unwrap_err();

        assert!(matches!(&err, CopyError::Aborted { name, .. } if name == "broken"));
        let report = err.partial_report().unwrap();
        assert_eq!(report.skipped, ["missing1"]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.copied.is_empty());
        assert_eq!(calls, ["missing1", "broken"]);
        assert!(!dest_dir.path().join("after.zip").exists());
    }
}
