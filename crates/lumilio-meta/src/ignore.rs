//! Scanner ignore defaults

/// Patterns skipped while scanning a repository, in match order.
///
/// Covers OS metadata files, editor and download leftovers, and the
/// repository's own system directory.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "ehthumbs.db",
    "Icon?",
    "Icon\r",
    "*.tmp",
    "*.temp",
    "*.part",
    "*.partial",
    "*.wbk",
    "*.bak",
    "*.orig",
    "*~",
    "~$*",
    "*.swp",
    "*.swo",
    ".*.swp",
    ".lumilio",
    ".Trash",
    ".Trashes",
    ".fseventsd",
    ".Spotlight-V100",
    ".TemporaryItems",
    "lost+found",
    "desktop.ini",
    "*._*",
    "npm-debug.log",
    "yarn-error.log",
];
