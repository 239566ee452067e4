//! Age-based removal shared by staging, temp and trash maintenance

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use super::CleanupReport;
use crate::{Error, Result};

/// `now - age`, clamped to the earliest representable time.
pub(super) fn cutoff(age: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(super) fn modified_at(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Delete direct children of `dir` whose mtime is strictly before `cutoff`.
///
/// A missing directory is a no-op. Entries that cannot be inspected or
/// removed are logged and skipped.
pub(super) fn remove_older_than(dir: &Path, cutoff: DateTime<Utc>) -> Result<CleanupReport> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CleanupReport::default()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut report = CleanupReport::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if modified_at(modified) >= cutoff {
            continue;
        }

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match removed {
            Ok(()) => {
                report.removed += 1;
                if meta.is_file() {
                    report.bytes += meta.len();
                }
                tracing::debug!(path = %path.display(), "Removed expired entry");
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove expired entry"
                );
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_saturates_for_huge_ages() {
        assert_eq!(cutoff(Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn zero_age_cutoff_is_now() {
        let before = Utc::now();
        let cut = cutoff(Duration::ZERO);
        assert!(cut >= before);
        assert!(cut <= Utc::now());
    }
}
