//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Tuning for lock acquisition in [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying a contended lock before giving up.
    pub max_lock_wait: Duration,
    /// First retry delay; later delays grow exponentially.
    pub initial_retry_delay: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            max_lock_wait: Duration::from_secs(5),
            initial_retry_delay: Duration::from_millis(10),
        }
    }
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock on the temp file, retrying with exponential
/// backoff while it is contended.
pub fn write_atomic(
    path: &NormalizedPath,
    content: &[u8],
    robustness: RobustnessConfig,
) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    lock_with_backoff(&temp_file, &native_path, robustness)?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&native_path, e)
    })?;

    Ok(())
}

fn lock_with_backoff(file: &fs::File, target: &Path, robustness: RobustnessConfig) -> Result<()> {
    let mut backoff = ExponentialBackoff {
        initial_interval: robustness.initial_retry_delay,
        max_elapsed_time: Some(robustness.max_lock_wait),
        ..ExponentialBackoff::default()
    };

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(_) => match backoff.next_backoff() {
                Some(delay) => {
                    tracing::debug!(path = %target.display(), ?delay, "Lock contended, retrying");
                    std::thread::sleep(delay);
                }
                None => {
                    return Err(Error::LockFailed {
                        path: target.to_path_buf(),
                    });
                }
            },
        }
    }
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Create an empty file, failing if anything already exists at `path`.
pub fn create_new_empty(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
        .map_err(|e| Error::io(path, e))
}

/// Canonicalize an existing path without Windows verbatim prefixes.
pub fn canonicalize(path: &Path) -> Result<std::path::PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Resolve `path` to an absolute, normalized path without touching the
/// filesystem beyond reading the current directory.
pub fn absolutize(path: &Path) -> Result<NormalizedPath> {
    if path.as_os_str().is_empty() {
        return Err(Error::UnresolvablePath {
            path: path.to_path_buf(),
            reason: "path is empty".into(),
        });
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::UnresolvablePath {
                path: path.to_path_buf(),
                reason: format!("current directory unavailable: {e}"),
            })?
            .join(path)
    };
    Ok(NormalizedPath::new(absolute))
}
