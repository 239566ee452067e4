//! Repository configuration stored in `.lumiliorepo`
//!
//! A config has two phases. [`RepositoryConfig::template`] carries every
//! default but no identity and never validates. [`RepositoryConfig::new`]
//! and [`RepositoryConfig::builder`] stamp a fresh id, the name and the
//! creation time, producing a config that can be saved and registered.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lumilio_fs::{ConfigFormat, ConfigStore, RepoPath, RepositoryLayout};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ignore::DEFAULT_IGNORE_PATTERNS;

/// Current config document version.
pub const CONFIG_VERSION: &str = "1.0";

/// How committed files are arranged inside the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStrategy {
    /// `inbox/YYYY/MM/<name>`, by commit time.
    #[default]
    Date,
    /// `inbox/aa/bb/cc/<hash><ext>`, content addressed.
    Cas,
    /// `inbox/<name>`.
    Flat,
}

impl StorageStrategy {
    /// Human-readable summary for diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Date => "Date-based organization (YYYY/MM) - Easy to browse chronologically",
            Self::Cas => "Content-addressable storage - Automatic deduplication, hash-based paths",
            Self::Flat => "Flat structure - All files in one directory",
        }
    }

    /// Illustrative inbox-relative path.
    pub fn example_path(&self) -> &'static str {
        match self {
            Self::Date => "2024/01/photo.jpg",
            Self::Cas => "ab/cd/ef/abcdef123456789.jpg",
            Self::Flat => "photo.jpg",
        }
    }
}

impl FromStr for StorageStrategy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "cas" => Ok(Self::Cas),
            "flat" => Ok(Self::Flat),
            _ => Err(Error::UnknownStrategy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Cas => write!(f, "cas"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

/// What to do when a flat or date destination name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateHandling {
    /// Try `name (1).ext`, `name (2).ext`, ...
    #[default]
    Rename,
    /// Append an 8-character random suffix.
    Uuid,
    /// Keep the name; the later commit replaces the earlier file.
    Overwrite,
}

impl FromStr for DuplicateHandling {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "uuid" => Ok(Self::Uuid),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(Error::UnknownDuplicateHandling {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DuplicateHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => write!(f, "rename"),
            Self::Uuid => write!(f, "uuid"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Filesystem scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Metadata scan cadence, e.g. `5m`
    pub quick_scan_interval: String,
    /// Content verification cadence, e.g. `30m`
    pub full_scan_interval: String,
    /// Glob patterns skipped while scanning, order preserved
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// Per-repository file handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    pub preserve_original_filename: bool,
    pub handle_duplicate_filenames: DuplicateHandling,
    /// Bytes; 0 means no limit
    pub max_file_size: i64,
    pub compress_files: bool,
    pub create_backups: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
}

/// The `.lumiliorepo` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub version: String,
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub storage_strategy: StorageStrategy,
    pub sync_settings: SyncSettings,
    pub local_settings: LocalSettings,
}

impl RepositoryConfig {
    /// The default template.
    ///
    /// Id and name are empty, so the template fails [`validate`](Self::validate)
    /// until a constructor fills them in.
    pub fn template() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            id: String::new(),
            name: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            storage_strategy: StorageStrategy::Date,
            sync_settings: SyncSettings {
                quick_scan_interval: "5m".to_string(),
                full_scan_interval: "30m".to_string(),
                ignore_patterns: default_ignore_patterns(),
            },
            local_settings: LocalSettings {
                preserve_original_filename: true,
                handle_duplicate_filenames: DuplicateHandling::Uuid,
                max_file_size: 0,
                compress_files: false,
                create_backups: false,
                backup_path: None,
            },
        }
    }

    /// A fully formed config with defaults, a fresh id and the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Start building a fully formed config.
    pub fn builder(name: impl Into<String>) -> RepositoryConfigBuilder {
        let mut config = Self::template();
        config.id = Uuid::new_v4().to_string();
        config.name = name.into();
        config.created_at = Utc::now();
        RepositoryConfigBuilder { config }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(invalid("version", "version is required"));
        }
        if self.id.trim().is_empty() {
            return Err(invalid("id", "repository ID is required"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name", "repository name is required"));
        }
        parse_interval(&self.sync_settings.quick_scan_interval)
            .map_err(|e| invalid("quick_scan_interval", e))?;
        parse_interval(&self.sync_settings.full_scan_interval)
            .map_err(|e| invalid("full_scan_interval", e))?;
        if self.local_settings.max_file_size < 0 {
            return Err(invalid("max_file_size", "max_file_size cannot be negative"));
        }
        Ok(())
    }

    /// Load and validate the config stored at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let layout = RepositoryLayout::resolve(root)?;
        let path = layout.config_file();

        let config: Self = match ConfigStore::new().load_as(&path, ConfigFormat::Yaml) {
            Ok(config) => config,
            Err(e) if e.is_not_found() => {
                return Err(Error::ConfigNotFound {
                    path: path.to_native(),
                });
            }
            Err(lumilio_fs::Error::ConfigParse { message, .. }) => {
                return Err(Error::ConfigParse {
                    path: path.to_native(),
                    message,
                });
            }
            Err(e) => return Err(e.into()),
        };

        config.validate().map_err(|e| Error::InvalidConfig {
            path: path.to_native(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Validate, then atomically write the config to `root`.
    ///
    /// Also used for updates; an invalid config is never persisted.
    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let layout = RepositoryLayout::resolve(root)?;
        let path = layout.config_file();
        ConfigStore::new().save_as(&path, self, ConfigFormat::Yaml)?;
        tracing::debug!(path = %path, id = %self.id, "Saved repository configuration");
        Ok(())
    }

    /// Parsed quick scan interval.
    pub fn quick_scan_interval(&self) -> Result<Duration> {
        parse_interval(&self.sync_settings.quick_scan_interval)
            .map_err(|e| invalid("quick_scan_interval", e))
    }

    /// Parsed full scan interval.
    pub fn full_scan_interval(&self) -> Result<Duration> {
        parse_interval(&self.sync_settings.full_scan_interval)
            .map_err(|e| invalid("full_scan_interval", e))
    }

    /// Fill blank fields from the template. Identity is left alone.
    pub fn merge_with_defaults(&mut self) {
        let defaults = Self::template();
        if self.version.trim().is_empty() {
            self.version = defaults.version;
        }
        if self.sync_settings.quick_scan_interval.trim().is_empty() {
            self.sync_settings.quick_scan_interval = defaults.sync_settings.quick_scan_interval;
        }
        if self.sync_settings.full_scan_interval.trim().is_empty() {
            self.sync_settings.full_scan_interval = defaults.sync_settings.full_scan_interval;
        }
        if self.sync_settings.ignore_patterns.is_empty() {
            self.sync_settings.ignore_patterns = defaults.sync_settings.ignore_patterns;
        }
    }

    /// Upload size limit in bytes, if any.
    pub fn max_file_size(&self) -> Option<u64> {
        u64::try_from(self.local_settings.max_file_size)
            .ok()
            .filter(|limit| *limit > 0)
    }
}

/// Builder returned by [`RepositoryConfig::builder`].
#[derive(Debug, Clone)]
pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    pub fn storage_strategy(mut self, strategy: StorageStrategy) -> Self {
        self.config.storage_strategy = strategy;
        self
    }

    /// Replace the scan intervals, and the ignore list when one is given.
    pub fn sync_settings(
        mut self,
        quick_interval: impl Into<String>,
        full_interval: impl Into<String>,
        ignore_patterns: Option<Vec<String>>,
    ) -> Self {
        self.config.sync_settings.quick_scan_interval = quick_interval.into();
        self.config.sync_settings.full_scan_interval = full_interval.into();
        if let Some(patterns) = ignore_patterns {
            self.config.sync_settings.ignore_patterns = patterns;
        }
        self
    }

    pub fn local_settings(
        mut self,
        preserve_filename: bool,
        duplicates: DuplicateHandling,
        max_file_size: i64,
        compress: bool,
        backup: bool,
    ) -> Self {
        let local = &mut self.config.local_settings;
        local.preserve_original_filename = preserve_filename;
        local.handle_duplicate_filenames = duplicates;
        local.max_file_size = max_file_size;
        local.compress_files = compress;
        local.create_backups = backup;
        self
    }

    pub fn duplicate_handling(mut self, duplicates: DuplicateHandling) -> Self {
        self.config.local_settings.handle_duplicate_filenames = duplicates;
        self
    }

    pub fn max_file_size(mut self, bytes: i64) -> Self {
        self.config.local_settings.max_file_size = bytes;
        self
    }

    pub fn backup_path(mut self, path: impl Into<String>) -> Self {
        self.config.local_settings.backup_path = Some(path.into());
        self
    }

    pub fn build(self) -> RepositoryConfig {
        self.config
    }
}

/// Whether `path` holds a `.lumiliorepo` file.
pub fn is_repository_root(path: &Path) -> bool {
    path.join(RepoPath::ConfigFile.as_str()).is_file()
}

/// Parse a scan interval such as `5m`, `1h30m`, `90s` or `1.5h`.
///
/// A bare `0` is accepted. Negative values are not.
pub fn parse_interval(value: &str) -> std::result::Result<Duration, String> {
    let trimmed = value.trim();
    humantime::parse_duration(trimmed)
        .or_else(|e| parse_decimal_segments(trimmed).ok_or(e))
        .map_err(|e| format!("invalid duration '{value}': {e}"))
}

/// Sum `<decimal><unit>` segments where the decimal may carry a fraction.
fn parse_decimal_segments(value: &str) -> Option<Duration> {
    if value == "0" {
        return Some(Duration::ZERO);
    }
    if value.is_empty() {
        return None;
    }

    let mut rest = value;
    let mut seconds = 0f64;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        let (number, tail) = rest.split_at(number_len);
        if !number.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        let amount: f64 = number.parse().ok()?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1e-9,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        seconds += amount * scale;
        rest = next;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn invalid(field: &'static str, message: impl Into<String>) -> Error {
    Error::InvalidField {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn template_is_not_valid() {
        let template = RepositoryConfig::template();
        assert!(template.id.is_empty());
        assert!(template.name.is_empty());
        assert!(template.validate().is_err());
    }

    #[test]
    fn new_config_is_valid() {
        let config = RepositoryConfig::new("Family Photos");
        config.validate().unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(Uuid::parse_str(&config.id).is_ok());
        assert_eq!(config.storage_strategy, StorageStrategy::Date);
    }

    #[test]
    fn new_configs_get_distinct_ids() {
        let a = RepositoryConfig::new("a");
        let b = RepositoryConfig::new("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn max_file_size_zero_means_unlimited() {
        assert_eq!(RepositoryConfig::new("x").max_file_size(), None);
        let limited = RepositoryConfig::builder("x").max_file_size(1024).build();
        assert_eq!(limited.max_file_size(), Some(1024));
    }

    #[test]
    fn strategy_from_str_is_case_insensitive() {
        assert_eq!("CAS".parse::<StorageStrategy>().unwrap(), StorageStrategy::Cas);
        assert!("hash".parse::<StorageStrategy>().is_err());
        assert_eq!(
            "Overwrite".parse::<DuplicateHandling>().unwrap(),
            DuplicateHandling::Overwrite
        );
    }

    #[test]
    fn parse_interval_accepts_compound_units() {
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("").is_err());
    }

    #[rstest]
    #[case("0", Duration::ZERO)]
    #[case("1.5h", Duration::from_secs(5400))]
    #[case("0.5m30s", Duration::from_secs(60))]
    #[case("2.5s", Duration::from_millis(2500))]
    #[case(" 1.5h ", Duration::from_secs(5400))]
    fn parse_interval_accepts_decimal_fractions(#[case] value: &str, #[case] expected: Duration) {
        assert_eq!(parse_interval(value).unwrap(), expected);
    }

    #[rstest]
    #[case("-1h")]
    #[case("-0.5m")]
    #[case("1.5")]
    #[case("1.5x")]
    #[case(".h")]
    #[case("1..5h")]
    fn parse_interval_rejects_malformed(#[case] value: &str) {
        assert!(parse_interval(value).is_err());
    }
}
