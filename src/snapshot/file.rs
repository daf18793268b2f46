//! JSON snapshot files.
//!
//! A host that cannot link against the engine directly can dump its registry
//! to a JSON file; `FileRegistry` re-reads the whole file on every request so
//! each computation still sees a single consistent copy.

use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::schema::RegistrySnapshot;
use super::source::EntityRegistry;
use crate::utils::error::SourceError;

/// Registry backed by a snapshot file on disk
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntityRegistry for FileRegistry {
    fn snapshot(&self) -> Result<RegistrySnapshot, SourceError> {
        read_snapshot(&self.path)
    }
}

/// Read a registry snapshot from a JSON file
///
/// **Public** - used by `FileRegistry` and the CLI
///
/// # Errors
/// * `SourceError::Io` - File cannot be opened
/// * `SourceError::Json` - File is not a valid snapshot
pub fn read_snapshot(input_path: impl AsRef<Path>) -> Result<RegistrySnapshot, SourceError> {
    let input_path = input_path.as_ref();

    debug!("Reading snapshot from: {}", input_path.display());

    let file = File::open(input_path)?;
    let snapshot: RegistrySnapshot = serde_json::from_reader(file)?;

    debug!(
        "Snapshot loaded: {} entities captured at {:.3}s",
        snapshot.entities.len(),
        snapshot.captured_at
    );

    Ok(snapshot)
}

/// Write a registry snapshot as pretty JSON, creating parent directories
///
/// **Public** - lets hosts and tests produce snapshot files
pub fn write_snapshot(
    snapshot: &RegistrySnapshot,
    output_path: impl AsRef<Path>,
) -> Result<(), SourceError> {
    let output_path = output_path.as_ref();

    if output_path.as_os_str().is_empty() {
        return Err(SourceError::Unavailable("snapshot path is empty".to_string()));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    let writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}
