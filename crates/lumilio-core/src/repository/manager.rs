use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use lumilio_fs::RepoPath;
use lumilio_meta::{RepositoryConfig, is_repository_root};
use uuid::Uuid;

use super::{
    InMemoryRepositoryStore, Repository, RepositoryStatus, RepositoryStore, ValidationResult,
};
use crate::directory::{DefaultDirectoryManager, DirectoryManager, check_access, resolve_root};
use crate::staging::DefaultStagingManager;
use crate::{Error, Result};

/// What existed at a root before initialization touched it.
#[derive(Debug, Clone, Copy)]
struct Preexisting {
    root: bool,
    system_dir: bool,
    inbox: bool,
}

/// Registry and lifecycle facade over many repository roots.
///
/// Owns its registry store; there is no process-wide state.
#[derive(Debug)]
pub struct RepositoryManager<S: RepositoryStore = InMemoryRepositoryStore> {
    store: S,
    directories: DefaultDirectoryManager,
    staging: DefaultStagingManager,
}

impl RepositoryManager {
    /// Manager over a fresh in-memory registry.
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepositoryStore::new())
    }
}

impl<S: RepositoryStore> RepositoryManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            directories: DefaultDirectoryManager::new(),
            staging: DefaultStagingManager::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn staging_manager(&self) -> &DefaultStagingManager {
        &self.staging
    }

    pub fn directory_manager(&self) -> &DefaultDirectoryManager {
        &self.directories
    }

    /// Check a root without modifying the registry.
    ///
    /// Problems are reported in the result rather than as errors. Checking
    /// stops early only when the directory or its config is unusable.
    pub fn validate_repository(&self, path: &Path) -> ValidationResult {
        let mut result = ValidationResult::default();

        let root = match resolve_root(path) {
            Ok(layout) => layout.root().to_native(),
            Err(e) => {
                result.error(format!("Invalid path: {e}"));
                return result;
            }
        };

        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                result.error("Path is not a directory");
                return result;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                result.error("Repository directory does not exist");
                return result;
            }
            Err(e) => {
                result.error(format!("Cannot access repository directory: {e}"));
                return result;
            }
        }

        if !is_repository_root(&root) {
            result.error(format!("Missing {} configuration file", RepoPath::ConfigFile));
            return result;
        }

        let config = match RepositoryConfig::load(&root) {
            Ok(config) => config,
            Err(e) => {
                result.error(format!("Invalid configuration: {e}"));
                return result;
            }
        };

        match self.directories.validate_structure(&root) {
            Ok(structure) => {
                if !structure.valid {
                    result.valid = false;
                }
                result.errors.extend(structure.invalid_paths);
                result.errors.extend(structure.permission_issues);
                result.warnings.extend(structure.warnings);
            }
            Err(e) => result.error(format!("Directory structure validation failed: {e}")),
        }

        match self.is_nested_repository(&root) {
            Ok(Some(parent)) => result.error(format!(
                "Repository is nested inside another repository at: {}",
                parent.display()
            )),
            Ok(None) => {}
            Err(e) => result.warn(format!("Could not check for nested repositories: {e}")),
        }

        if Uuid::parse_str(&config.id).is_err() {
            result.error("Repository ID is not a valid UUID");
        }

        if let Err(message) = check_access(&root) {
            result.warn(format!("Permission issues: {message}"));
        }

        tracing::debug!(root = %root.display(), valid = result.valid, "Validated repository");
        result
    }

    /// The nearest ancestor of `path` holding a config file, if any.
    ///
    /// `path` itself is not considered.
    pub fn is_nested_repository(&self, path: &Path) -> Result<Option<PathBuf>> {
        let layout = resolve_root(path)?;
        let mut current = layout.root().parent();
        while let Some(dir) = current {
            let native = dir.to_native();
            if is_repository_root(&native) {
                return Ok(Some(native));
            }
            current = dir.parent();
        }
        Ok(None)
    }

    /// Create a repository at `path` and register it.
    ///
    /// On failure after the structure is created, everything this call added
    /// is removed again. A root directory that already existed is kept.
    pub fn initialize_repository(
        &mut self,
        path: &Path,
        config: RepositoryConfig,
    ) -> Result<Repository> {
        let layout = resolve_root(path)?;
        let root = layout.root().to_native();

        let root_existed = match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => true,
            Ok(_) => return Err(Error::path(&root, "not a directory")),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(Error::io(&root, e)),
        };
        if is_repository_root(&root) {
            return Err(Error::AlreadyExists {
                path: layout.config_file().to_native(),
            });
        }
        if let Some(parent) = self.is_nested_repository(&root)? {
            return Err(Error::NestedRepository { path: root, parent });
        }
        self.check_registry_overlap(&root)?;

        config.validate()?;
        require_uuid(&config)?;
        if self.store.get(&config.id).is_some() {
            return Err(Error::AlreadyRegistered(format!("id {}", config.id)));
        }

        let preexisting = Preexisting {
            root: root_existed,
            system_dir: layout.path(RepoPath::SystemDir).exists(),
            inbox: layout.path(RepoPath::Inbox).exists(),
        };

        match self.create_and_register(&root, config) {
            Ok(repository) => {
                tracing::info!(
                    id = %repository.id,
                    path = %repository.path.display(),
                    "Initialized repository"
                );
                Ok(repository)
            }
            Err(e) => {
                rollback(&root, preexisting);
                Err(e)
            }
        }
    }

    fn create_and_register(&mut self, root: &Path, config: RepositoryConfig) -> Result<Repository> {
        self.directories.create_structure(root)?;
        config.save(root)?;
        let canonical = lumilio_fs::io::canonicalize(root)?;
        let repository = Repository::new(canonical, config);
        self.store.insert(repository.clone())?;
        Ok(repository)
    }

    /// Register an existing, valid repository.
    pub fn add_repository(&mut self, path: &Path) -> Result<Repository> {
        let root = canonical_root(path)?;
        if self.store.get_by_path(&root).is_some() {
            return Err(Error::AlreadyRegistered(format!("path {}", root.display())));
        }

        let validation = self.validate_repository(&root);
        if !validation.valid {
            return Err(Error::InvalidRepository {
                path: root,
                errors: validation.errors,
            });
        }

        let config = RepositoryConfig::load(&root)?;
        if self.store.get(&config.id).is_some() {
            return Err(Error::AlreadyRegistered(format!("id {}", config.id)));
        }
        self.check_registry_overlap(&root)?;

        let repository = Repository::new(root, config);
        self.store.insert(repository.clone())?;
        tracing::info!(id = %repository.id, path = %repository.path.display(), "Added repository");
        Ok(repository)
    }

    pub fn get_repository(&self, id: &str) -> Result<Repository> {
        self.store
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("repository {id}")))
    }

    pub fn get_repository_by_path(&self, path: &Path) -> Result<Repository> {
        let root = match canonical_root(path) {
            Ok(root) => root,
            Err(_) => resolve_root(path)?.root().to_native(),
        };
        self.store
            .get_by_path(&root)
            .ok_or_else(|| Error::NotFound(format!("repository at {}", root.display())))
    }

    pub fn list_repositories(&self) -> Vec<Repository> {
        self.store.list()
    }

    /// Rewrite the config file and refresh the registry row.
    ///
    /// The config must keep the repository's id.
    pub fn update_repository(&mut self, id: &str, config: RepositoryConfig) -> Result<Repository> {
        let mut repository = self.get_repository(id)?;
        if config.id != id {
            return Err(lumilio_meta::Error::InvalidField {
                field: "id",
                message: format!("config id {} does not match repository {id}", config.id),
            }
            .into());
        }

        config.save(&repository.path)?;
        repository.name = config.name.clone();
        repository.config = config;
        repository.status = RepositoryStatus::Active;
        repository.updated_at = Utc::now();
        self.store.update(repository.clone())?;

        tracing::info!(%id, "Updated repository configuration");
        Ok(repository)
    }

    /// Deregister a repository. Files on disk are untouched.
    pub fn remove_repository(&mut self, id: &str) -> Result<Repository> {
        let removed = self
            .store
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("repository {id}")))?;
        tracing::info!(%id, "Removed repository from registry");
        Ok(removed)
    }

    /// Deregister several repositories, or none if any id is unknown.
    pub fn remove_repositories(&mut self, ids: &[&str]) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| self.store.get(id).is_none()) {
            return Err(Error::NotFound(format!("repository {missing}")));
        }
        for id in ids {
            self.store.remove(id);
        }
        tracing::info!(count = ids.len(), "Removed repositories from registry");
        Ok(())
    }

    pub fn load_config(&self, root: &Path) -> Result<RepositoryConfig> {
        Ok(RepositoryConfig::load(root)?)
    }

    pub fn save_config(&self, root: &Path, config: &RepositoryConfig) -> Result<()> {
        Ok(config.save(root)?)
    }

    /// Reject a root that contains, or sits inside, a registered root.
    fn check_registry_overlap(&self, root: &Path) -> Result<()> {
        for registered in self.store.list() {
            if registered.path == root {
                continue;
            }
            if root.starts_with(&registered.path) {
                return Err(Error::NestedRepository {
                    path: root.to_path_buf(),
                    parent: registered.path,
                });
            }
            if registered.path.starts_with(root) {
                return Err(Error::NestedRepository {
                    path: registered.path,
                    parent: root.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

fn require_uuid(config: &RepositoryConfig) -> Result<()> {
    Uuid::parse_str(&config.id).map_err(|e| lumilio_meta::Error::InvalidField {
        field: "id",
        message: format!("repository ID is not a valid UUID: {e}"),
    })?;
    Ok(())
}

fn canonical_root(path: &Path) -> Result<PathBuf> {
    lumilio_fs::io::canonicalize(path).map_err(|e| {
        if e.is_not_found() {
            Error::path(path, "directory does not exist")
        } else {
            e.into()
        }
    })
}

/// Best-effort removal of what a failed initialization added.
fn rollback(root: &Path, preexisting: Preexisting) {
    let mut targets = Vec::new();
    if !preexisting.root {
        targets.push(root.to_path_buf());
    } else {
        targets.push(root.join(RepoPath::ConfigFile.as_str()));
        if !preexisting.system_dir {
            targets.push(root.join(RepoPath::SystemDir.as_str()));
        }
        if !preexisting.inbox {
            targets.push(root.join(RepoPath::Inbox.as_str()));
        }
    }

    for target in targets {
        let removed = if target.is_dir() {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        match removed {
            Ok(()) => tracing::debug!(path = %target.display(), "Rolled back"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "Rollback failed");
            }
        }
    }
}
