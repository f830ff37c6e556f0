//! Versioned secret storage.
//!
//! [`SecretBackend`] mirrors a managed secret service: versions are appended,
//! listed, read and destroyed, never edited. [`CredentialStore`] layers the
//! "one live version" discipline on top.
//!
//! # File backend
//!
//! [`FileSecretBackend`] keeps every version in a single JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "secrets": [
//!     { "id": 1, "payload": null, "sha256": "…", "created_at": "…", "destroyed_at": "…" },
//!     { "id": 2, "payload": "{…}", "sha256": "…", "created_at": "…", "destroyed_at": null }
//!   ]
//! }
//! ```
//!
//! Destroying a version drops its payload but keeps the history entry. The
//! checksum is verified on every access. Writes go to a sibling temp file
//! that is renamed over the original, so a crash leaves either the old or
//! the new document.

use super::CredentialBundle;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the secrets file format.
const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Secret payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Secrets file format {found} is not supported (expected {FILE_FORMAT_VERSION})")]
    UnsupportedFormat { found: u32 },
    #[error("No active secret version")]
    NoActiveVersion,
    #[error("Secret version {0} does not exist")]
    VersionNotFound(u64),
    #[error("Secret version {0} is destroyed")]
    VersionDestroyed(u64),
    #[error("Secret version {0} failed its checksum")]
    ChecksumMismatch(u64),
    #[error("Secret backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionState {
    Enabled,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub id: u64,
    pub state: VersionState,
    pub created_at: DateTime<Utc>,
}

impl VersionInfo {
    pub fn is_active(&self) -> bool {
        self.state == VersionState::Enabled
    }
}

pub trait SecretBackend {
    /// Append a version and return its id. Ids increase monotonically.
    fn add_version(&self, payload: &str) -> Result<u64, StoreError>;

    fn list_versions(&self) -> Result<Vec<VersionInfo>, StoreError>;

    fn access_version(&self, id: u64) -> Result<String, StoreError>;

    fn destroy_version(&self, id: u64) -> Result<(), StoreError>;
}

// =========================================================================
// File backend
// =========================================================================

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SecretFile {
    version: u32,
    secrets: Vec<StoredVersion>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredVersion {
    id: u64,
    payload: Option<String>,
    sha256: String,
    created_at: DateTime<Utc>,
    destroyed_at: Option<DateTime<Utc>>,
}

impl StoredVersion {
    fn info(&self) -> VersionInfo {
        VersionInfo {
            id: self.id,
            state: if self.destroyed_at.is_some() {
                VersionState::Destroyed
            } else {
                VersionState::Enabled
            },
            created_at: self.created_at,
        }
    }
}

impl SecretFile {
    fn empty() -> Self {
        Self {
            version: FILE_FORMAT_VERSION,
            secrets: Vec::new(),
        }
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut StoredVersion, StoreError> {
        self.secrets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::VersionNotFound(id))
    }
}

/// Secret versions in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileSecretBackend {
    path: PathBuf,
}

impl FileSecretBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store; anything unreadable is an error.
    fn read(&self) -> Result<SecretFile, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SecretFile::empty()),
            Err(e) => return Err(e.into()),
        };
        let file: SecretFile = serde_json::from_str(&content)?;
        if file.version != FILE_FORMAT_VERSION {
            return Err(StoreError::UnsupportedFormat { found: file.version });
        }
        Ok(file)
    }

    fn write(&self, file: &SecretFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// SHA-256 of a payload, as a hex string.
pub fn payload_checksum(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

impl SecretBackend for FileSecretBackend {
    fn add_version(&self, payload: &str) -> Result<u64, StoreError> {
        let mut file = self.read()?;
        let id = file.secrets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        file.secrets.push(StoredVersion {
            id,
            payload: Some(payload.to_string()),
            sha256: payload_checksum(payload),
            created_at: Utc::now(),
            destroyed_at: None,
        });
        self.write(&file)?;
        Ok(id)
    }

    fn list_versions(&self) -> Result<Vec<VersionInfo>, StoreError> {
        Ok(self.read()?.secrets.iter().map(StoredVersion::info).collect())
    }

    fn access_version(&self, id: u64) -> Result<String, StoreError> {
        let file = self.read()?;
        let stored = file
            .secrets
            .iter()
            .find(|s| s.id == id)
            .ok_or(StoreError::VersionNotFound(id))?;
        let payload = match (&stored.payload, stored.destroyed_at) {
            (Some(p), None) => p,
            _ => return Err(StoreError::VersionDestroyed(id)),
        };
        if payload_checksum(payload) != stored.sha256 {
            return Err(StoreError::ChecksumMismatch(id));
        }
        Ok(payload.clone())
    }

    fn destroy_version(&self, id: u64) -> Result<(), StoreError> {
        let mut file = self.read()?;
        let stored = file.find_mut(id)?;
        if stored.destroyed_at.is_none() {
            stored.payload = None;
            stored.destroyed_at = Some(Utc::now());
            self.write(&file)?;
        }
        Ok(())
    }
}

// =========================================================================
// Credential store
// =========================================================================

/// Outcome of writing a new live version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub new_version: u64,
    pub destroyed: Vec<u64>,
    /// Versions that should have been destroyed but were not.
    pub failed: Vec<(u64, String)>,
}

impl RotationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct CredentialStore<'a> {
    backend: &'a dyn SecretBackend,
}

impl<'a> CredentialStore<'a> {
    pub fn new(backend: &'a dyn SecretBackend) -> Self {
        Self { backend }
    }

    /// Canonical active version: the most recently created one.
    pub fn current_version(&self) -> Result<VersionInfo, StoreError> {
        self.backend
            .list_versions()?
            .into_iter()
            .filter(VersionInfo::is_active)
            .max_by_key(|v| (v.created_at, v.id))
            .ok_or(StoreError::NoActiveVersion)
    }

    pub fn load(&self) -> Result<CredentialBundle, StoreError> {
        let current = self.current_version()?;
        let payload = self.backend.access_version(current.id)?;
        Ok(CredentialBundle::from_payload(&payload)?)
    }

    pub fn versions(&self) -> Result<Vec<VersionInfo>, StoreError> {
        self.backend.list_versions()
    }

    /// Store `bundle` with a new access token as the only live version.
    pub fn rotate(
        &self,
        bundle: &CredentialBundle,
        new_token: &str,
    ) -> Result<RotationReport, StoreError> {
        self.replace(&bundle.with_access_token(new_token))
    }

    /// Append `bundle` as a new version, then destroy every other active one.
    ///
    /// Destruction failures are logged and collected in the report.
    pub fn replace(&self, bundle: &CredentialBundle) -> Result<RotationReport, StoreError> {
        let new_version = self.backend.add_version(&bundle.to_payload()?)?;
        tracing::info!(version = new_version, "stored new credential version");

        let mut report = RotationReport {
            new_version,
            ..Default::default()
        };
        for stale in self
            .backend
            .list_versions()?
            .into_iter()
            .filter(|v| v.is_active() && v.id != new_version)
        {
            match self.backend.destroy_version(stale.id) {
                Ok(()) => {
                    tracing::debug!(version = stale.id, "destroyed credential version");
                    report.destroyed.push(stale.id);
                }
                Err(e) => {
                    tracing::warn!(version = stale.id, error = %e, "failed to destroy credential version");
                    report.failed.push((stale.id, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}
