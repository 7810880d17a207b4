//! Single-instance guard backed by an exclusively locked PID file.
//!
//! The lock is advisory and held for the life of the process, so a file
//! left behind by a crashed instance is simply relocked and rewritten.

use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while taking the PID lock.
#[derive(Debug, Error)]
pub(crate) enum PidLockError {
    /// Another live process holds the lock.
    #[error("another instance is already running ({path}, pid {pid})")]
    Held {
        /// PID file.
        path: PathBuf,
        /// PID recorded by the holder, or `unknown`.
        pid: String,
    },
    /// The file could not be opened, locked or written.
    #[error("failed to lock pid file {path}: {source}")]
    Io {
        /// PID file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Exclusive lock on a PID file; removes the file on drop.
pub(crate) struct PidLock {
    dir: Dir,
    name: PathBuf,
    path: PathBuf,
    file: std::fs::File,
}

impl PidLock {
    /// Lock `path` and record this process id in it.
    pub(crate) fn acquire(path: &Path) -> Result<Self, PidLockError> {
        let io_error = |source| PidLockError::Io {
            path: path.to_path_buf(),
            source,
        };
        let (parent, name) = split(path).map_err(io_error)?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_error)?;
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        let mut file = dir.open_with(&name, &options).map_err(io_error)?.into_std();

        if let Err(error) = FileExt::try_lock_exclusive(&file) {
            if error.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(PidLockError::Held {
                    path: path.to_path_buf(),
                    pid: recorded_pid(&mut file),
                });
            }
            return Err(io_error(error));
        }

        let pid = std::process::id();
        file.set_len(0)
            .and_then(|()| file.write_all(pid.to_string().as_bytes()))
            .and_then(|()| file.sync_all())
            .map_err(io_error)?;
        info!(path = %path.display(), pid, "pid file locked");
        Ok(Self {
            dir,
            name,
            path: path.to_path_buf(),
            file,
        })
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if let Err(error) = self.dir.remove_file(&self.name) {
            warn!(path = %self.path.display(), error = %error, "failed to remove pid file");
        }
        if let Err(error) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %error, "failed to release pid lock");
        }
    }
}

fn split(path: &Path) -> io::Result<(&Path, PathBuf)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "pid file path has no file name")
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((parent, PathBuf::from(name)))
}

fn recorded_pid(file: &mut std::fs::File) -> String {
    let mut recorded = String::new();
    match file
        .rewind()
        .and_then(|()| file.read_to_string(&mut recorded))
    {
        Ok(_) if !recorded.trim().is_empty() => recorded.trim().to_owned(),
        _ => "unknown".to_owned(),
    }
}
