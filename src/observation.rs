//! Observation log export
//!
//! Accuracy experiments record `(observed, actual)` measurement pairs. The
//! log is a plain append-or-create text file with one record per line,
//! `"%f,%f,"` — both values at six decimal places, each line ending with a
//! trailing comma. The format is consumed by external analysis tooling and
//! must stay stable.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Append-only log of `(observed, actual)` pairs
#[derive(Debug)]
pub struct ObservationLog {
    path: PathBuf,
    file: File,
}

impl ObservationLog {
    /// Open the log at `path`, creating it if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self { path, file })
    }

    /// Where the log lives
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `(observed, actual)` record
    pub fn append(&mut self, observed: f64, actual: f64) -> Result<()> {
        writeln!(self.file, "{:.6},{:.6},", observed, actual)?;
        Ok(())
    }

    /// Append a batch of records, then flush
    pub fn append_all(&mut self, pairs: &[(f64, f64)]) -> Result<()> {
        for (observed, actual) in pairs {
            writeln!(self.file, "{:.6},{:.6},", observed, actual)?;
        }
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv");

        let mut log = ObservationLog::open(&path).unwrap();
        log.append(1.5, 2.0).unwrap();
        log.append_all(&[(0.0, -1.25)]).unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "1.500000,2.000000,\n0.000000,-1.250000,\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv");

        ObservationLog::open(&path).unwrap().append(1.0, 1.0).unwrap();
        ObservationLog::open(&path).unwrap().append(2.0, 2.0).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
