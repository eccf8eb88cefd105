//! Scoped training session.
use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const LOCK_FILE: &str = "session.lock";

/// A handle representing exclusive use of a training directory.
///
/// [`Session::open`] creates the directory if needed and writes a lock file
/// holding the start time. The lock is removed when the handle is dropped,
/// which happens on every exit path of the scope owning it, including early
/// returns with `?`.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    started: DateTime<Local>,
}

impl Session {
    /// Acquires the session for `dir`.
    ///
    /// Fails if another session holds the lock of the directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let lock = dir.join(LOCK_FILE);
        let started = Local::now();

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&lock) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&lock).unwrap_or_default();
                bail!(
                    "Training session in {:?} is already open (started at {})",
                    dir,
                    holder.trim()
                );
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(started.to_rfc3339().as_bytes())?;

        info!("Opened training session in {:?}", dir);
        Ok(Self { dir, started })
    }

    /// Returns the directory of the session.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the time the session was opened.
    pub fn started(&self) -> DateTime<Local> {
        self.started
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let elapsed = Local::now() - self.started;
        match fs::remove_file(self.dir.join(LOCK_FILE)) {
            Ok(()) => info!(
                "Closed training session in {:?} after {}s",
                self.dir,
                elapsed.num_seconds()
            ),
            Err(e) => warn!("Failed to release session lock in {:?}: {}", self.dir, e),
        }
    }
}
