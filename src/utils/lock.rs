//! Single-instance guard so two runs never touch the same FTP tree at once.

use std::fs::{File, OpenOptions};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::debug;

use crate::utils::{OptimizerError, OptimizerResult};

pub const LOCK_FILE_NAME: &str = "ftp-image-optimizer.lock";

/// Advisory `flock` on a lock file holding the owner's process id.
///
/// The kernel drops the lock when the process exits, however it exits, so a
/// file left behind by a crashed run is simply taken over. The lock is
/// released when the guard is dropped; the file itself stays.
pub struct InstanceLock {
    path: PathBuf,
    _file: Flock<File>,
}

impl InstanceLock {
    /// Acquires the lock in the system temp directory.
    pub fn acquire() -> OptimizerResult<Self> {
        Self::acquire_at(std::env::temp_dir().join(LOCK_FILE_NAME))
    }

    pub fn acquire_at(path: impl Into<PathBuf>) -> OptimizerResult<Self> {
        let path = path.into();
        // no truncate on open: the pid of a live holder must survive
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| OptimizerError::io(format!("Failed to open lock {}: {e}", path.display())))?;

        let mut file = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, Errno::EWOULDBLOCK)) => {
                return Err(OptimizerError::processing(format!(
                    "Another run holds the lock {}",
                    path.display()
                )));
            }
            Err((_, e)) => {
                return Err(OptimizerError::io(format!("Failed to lock {}: {e}", path.display())));
            }
        };

        file.set_len(0)?;
        file.rewind()?;
        writeln!(file, "{}", std::process::id())?;
        debug!("Acquired lock {}", path.display());

        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
