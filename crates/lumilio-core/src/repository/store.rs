//! Registry storage

use std::collections::HashMap;
use std::path::Path;

use super::Repository;
use crate::{Error, Result};

/// Persistence for registry rows.
///
/// Implementations enforce uniqueness by id and by root path.
pub trait RepositoryStore: Send + Sync {
    fn insert(&mut self, repository: Repository) -> Result<()>;

    fn get(&self, id: &str) -> Option<Repository>;

    fn get_by_path(&self, path: &Path) -> Option<Repository>;

    /// All rows, ordered by name then id.
    fn list(&self) -> Vec<Repository>;

    /// Replace an existing row.
    fn update(&mut self, repository: Repository) -> Result<()>;

    fn remove(&mut self, id: &str) -> Option<Repository>;
}

/// Process-local registry keyed by repository id.
#[derive(Debug, Default)]
pub struct InMemoryRepositoryStore {
    repositories: HashMap<String, Repository>,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryStore for InMemoryRepositoryStore {
    fn insert(&mut self, repository: Repository) -> Result<()> {
        if self.repositories.contains_key(&repository.id) {
            return Err(Error::AlreadyRegistered(format!("id {}", repository.id)));
        }
        if self.get_by_path(&repository.path).is_some() {
            return Err(Error::AlreadyRegistered(format!(
                "path {}",
                repository.path.display()
            )));
        }
        self.repositories.insert(repository.id.clone(), repository);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<Repository> {
        self.repositories.get(id).cloned()
    }

    fn get_by_path(&self, path: &Path) -> Option<Repository> {
        self.repositories
            .values()
            .find(|repository| repository.path == path)
            .cloned()
    }

    fn list(&self) -> Vec<Repository> {
        let mut repositories: Vec<_> = self.repositories.values().cloned().collect();
        repositories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        repositories
    }

    fn update(&mut self, repository: Repository) -> Result<()> {
        match self.repositories.get_mut(&repository.id) {
            Some(existing) => {
                *existing = repository;
                Ok(())
            }
            None => Err(Error::NotFound(format!("repository {}", repository.id))),
        }
    }

    fn remove(&mut self, id: &str) -> Option<Repository> {
        self.repositories.remove(id)
    }
}
