use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use zip::ZipArchive;

use crate::console::{ProgressSink, Throttle};
use crate::error::SetupError;

const REDRAW_INTERVAL: Duration = Duration::from_millis(50);
const COPY_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct UnpackReport {
    pub entries_total: usize,
    pub entries_processed: usize,
}

pub struct Unpacker {
    archive_path: PathBuf,
    destination: PathBuf,
}

impl Unpacker {
    pub fn new(archive_path: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            destination: destination.into(),
        }
    }

    /// Opens the archive and snapshots its entry list. The snapshot is the
    /// progress denominator and does not change during extraction.
    pub fn open(&self) -> Result<OpenedArchive, SetupError> {
        if !self.archive_path.exists() {
            return Err(SetupError::ArchiveMissing(self.archive_path.clone()));
        }
        let file = fs::File::open(&self.archive_path).map_err(|err| {
            SetupError::Filesystem(format!("open {}: {err}", self.archive_path.display()))
        })?;
        let archive = ZipArchive::new(file).map_err(|err| SetupError::Archive(err.to_string()))?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        Ok(OpenedArchive {
            archive,
            names,
            destination: self.destination.clone(),
        })
    }
}

#[derive(Debug)]
pub struct OpenedArchive {
    archive: ZipArchive<fs::File>,
    names: Vec<String>,
    destination: PathBuf,
}

impl OpenedArchive {
    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    pub fn entry_names(&self) -> &[String] {
        &self.names
    }

    /// Extracts every entry, reporting per-entry progress through the sink.
    /// Redraws are throttled while bytes decompress; one final redraw is
    /// always emitted so the bar visibly reaches 100%.
    pub fn extract(mut self, sink: &dyn ProgressSink) -> Result<UnpackReport, SetupError> {
        let total = self.names.len();
        let mut processed = 0usize;
        let mut throttle = Throttle::new(REDRAW_INTERVAL);

        for index in 0..total {
            let mut entry = self
                .archive
                .by_index(index)
                .map_err(|err| SetupError::Archive(err.to_string()))?;
            let entry_path = match entry.enclosed_name() {
                Some(path) => self.destination.join(path),
                None => {
                    return Err(SetupError::Archive(format!(
                        "entry escapes destination: {}",
                        entry.name()
                    )));
                }
            };
            processed += 1;

            if entry.is_dir() {
                fs::create_dir_all(&entry_path)
                    .map_err(|err| SetupError::Filesystem(err.to_string()))?;
                continue;
            }
            if let Some(parent) = entry_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| SetupError::Filesystem(err.to_string()))?;
            }
            let mut outfile = fs::File::create(&entry_path)
                .map_err(|err| SetupError::Filesystem(err.to_string()))?;

            let mut buf = [0u8; COPY_CHUNK];
            loop {
                let read = entry
                    .read(&mut buf)
                    .map_err(|err| SetupError::Archive(err.to_string()))?;
                if read == 0 {
                    break;
                }
                outfile
                    .write_all(&buf[..read])
                    .map_err(|err| SetupError::Filesystem(err.to_string()))?;
                if throttle.ready() {
                    sink.on_progress(
                        processed as u64,
                        total as u64,
                        &format!("Extracting ({processed}/{total})"),
                    );
                }
            }
        }

        sink.on_progress(total as u64, total as u64, "Extracting");
        Ok(UnpackReport {
            entries_total: total,
            entries_processed: processed,
        })
    }
}
