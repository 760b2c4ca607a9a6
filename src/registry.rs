//! Repository registrations
//!
//! The engine does not own registration CRUD; it only needs to look up
//! which repositories are enrolled and the credential to act with. The
//! shipped store reads a static TOML file at startup.

use crate::error::{Error, Result};
use crate::types::RepoHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One registered repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRegistration {
    /// `owner/repo` full name
    pub full_name: String,
    /// Access credential used for all provider calls on this repository
    pub token: String,
}

impl RepositoryRegistration {
    /// Parse the full name into owner/repo coordinates.
    pub fn handle(&self) -> Result<RepoHandle> {
        RepoHandle::parse(&self.full_name)
            .ok_or_else(|| Error::Registry(format!("invalid full_name: {}", self.full_name)))
    }
}

/// Narrow lookup interface over the registration store
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// All registered repositories.
    async fn list(&self) -> Result<Vec<RepositoryRegistration>>;

    /// Look up a registration by `owner/repo` full name.
    async fn find(&self, full_name: &str) -> Result<Option<RepositoryRegistration>>;
}

/// TOML file format for the registry
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    repositories: Vec<RepositoryRegistration>,
}

/// Registration store backed by a TOML file, loaded once at startup
#[derive(Debug, Default)]
pub struct FileRegistry {
    registrations: Vec<RepositoryRegistration>,
}

impl FileRegistry {
    /// Load registrations from a TOML file.
    ///
    /// The file holds a list of `[[repositories]]` tables with `full_name`
    /// and `token` keys.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Registry(format!("failed to read {}: {e}", path.display())))?;

        let file: RegistryFile = toml::from_str(&content)
            .map_err(|e| Error::Registry(format!("failed to parse {}: {e}", path.display())))?;

        Ok(Self {
            registrations: file.repositories,
        })
    }

    /// Build a registry from in-memory registrations (used by tests and the
    /// sweep's bootstrap path).
    pub fn from_registrations(registrations: Vec<RepositoryRegistration>) -> Self {
        Self { registrations }
    }
}

#[async_trait]
impl RegistrationStore for FileRegistry {
    async fn list(&self) -> Result<Vec<RepositoryRegistration>> {
        Ok(self.registrations.clone())
    }

    async fn find(&self, full_name: &str) -> Result<Option<RepositoryRegistration>> {
        Ok(self
            .registrations
            .iter()
            .find(|r| r.full_name == full_name)
            .cloned())
    }
}
