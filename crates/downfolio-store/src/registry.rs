//! JSON-file registries for templates and jobs.
//!
//! A registry is an index of user-authored markdown files: it records a name
//! and the absolute path of the file, never a copy. Removing an entry leaves
//! the file alone.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{DocumentType, Job, JobKey, Template, TemplateKey};
use crate::outcome::ParseOutcome;
use crate::paths::Profile;

/// File name of the registry inside the `Templates` and `Jobs` directories.
pub const STORAGE_FILE: &str = "storage.json";

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} {key} already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} file not found: {}", .path.display())]
    FileNotFound { kind: &'static str, path: PathBuf },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write registry {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize registry")]
    Serialize(#[from] serde_json::Error),
}

/// A record that can be stored in a [`Registry`].
pub trait RegistryEntry: Clone + Serialize + DeserializeOwned {
    /// Identity used for uniqueness and lookup.
    type Key: PartialEq + fmt::Display;

    /// Name used in error messages ("Template", "Job").
    const KIND: &'static str;

    fn key(&self) -> Self::Key;

    fn file_path(&self) -> &Path;

    fn set_file_path(&mut self, path: PathBuf);
}

impl RegistryEntry for Template {
    type Key = TemplateKey;
    const KIND: &'static str = "Template";

    fn key(&self) -> TemplateKey {
        TemplateKey::new(self.name.clone(), self.doc_type)
    }

    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn set_file_path(&mut self, path: PathBuf) {
        self.file_path = path;
    }
}

impl RegistryEntry for Job {
    type Key = JobKey;
    const KIND: &'static str = "Job";

    fn key(&self) -> JobKey {
        JobKey(self.name.clone())
    }

    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn set_file_path(&mut self, path: PathBuf) {
        self.file_path = path;
    }
}

/// A list of entries persisted as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct Registry<E> {
    path: PathBuf,
    _entry: PhantomData<E>,
}

pub type TemplateRegistry = Registry<Template>;
pub type JobRegistry = Registry<Job>;

impl Registry<Template> {
    /// The template registry of `profile`.
    pub fn templates(profile: &Profile) -> Self {
        Self::new(profile.templates_dir().join(STORAGE_FILE))
    }

    /// Registered templates of one document type, in registration order.
    pub fn of_type(&self, doc_type: DocumentType) -> Vec<Template> {
        self.list()
            .into_iter()
            .filter(|t| t.doc_type == doc_type)
            .collect()
    }
}

impl Registry<Job> {
    /// The job registry of `profile`.
    pub fn jobs(profile: &Profile) -> Self {
        Self::new(profile.jobs_dir().join(STORAGE_FILE))
    }
}

impl<E: RegistryEntry> Registry<E> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries, reporting whether the result is a fallback.
    pub fn list_checked(&self) -> ParseOutcome<Vec<E>> {
        if !self.path.exists() {
            return ParseOutcome::Parsed(Vec::new());
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                return ParseOutcome::Degraded {
                    value: Vec::new(),
                    reason: format!("failed to read {}: {e}", self.path.display()),
                };
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => ParseOutcome::Parsed(entries),
            Err(e) => ParseOutcome::Degraded {
                value: Vec::new(),
                reason: format!("failed to parse {}: {e}", self.path.display()),
            },
        }
    }

    /// All entries. An absent or unparsable file yields an empty list.
    pub fn list(&self) -> Vec<E> {
        match self.list_checked() {
            ParseOutcome::Parsed(entries) => entries,
            ParseOutcome::Degraded { value, reason } => {
                error!(kind = E::KIND, %reason, "registry unreadable; treating as empty");
                value
            }
        }
    }

    pub fn get(&self, key: &E::Key) -> Option<E> {
        self.list().into_iter().find(|e| e.key() == *key)
    }

    /// Register `entry`, pointing it at `source`.
    ///
    /// The stored path is `source` made absolute; the file itself is not
    /// copied. Fails if the key is taken or `source` does not exist.
    pub fn add(&self, mut entry: E, source: &Path) -> Result<E, RegistryError> {
        let mut entries = self.list();
        let key = entry.key();

        if entries.iter().any(|e| e.key() == key) {
            return Err(RegistryError::Duplicate {
                kind: E::KIND,
                key: key.to_string(),
            });
        }

        if !source.exists() {
            return Err(RegistryError::FileNotFound {
                kind: E::KIND,
                path: source.to_path_buf(),
            });
        }

        let absolute = std::path::absolute(source).map_err(|e| RegistryError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        entry.set_file_path(absolute);

        entries.push(entry.clone());
        self.save(&entries)?;

        debug!(kind = E::KIND, %key, path = %entry.file_path().display(), "registered");
        Ok(entry)
    }

    /// Remove the entry for `key` from the registry and return it.
    ///
    /// The referenced file is left untouched.
    pub fn remove(&self, key: &E::Key) -> Result<E, RegistryError> {
        let mut entries = self.list();
        let index = entries
            .iter()
            .position(|e| e.key() == *key)
            .ok_or_else(|| RegistryError::NotFound {
                kind: E::KIND,
                key: key.to_string(),
            })?;

        let removed = entries.remove(index);
        self.save(&entries)?;
        Ok(removed)
    }

    /// Full text of the file behind `key`.
    pub fn read_content(&self, key: &E::Key) -> Result<String, RegistryError> {
        let entry = self.get(key).ok_or_else(|| RegistryError::NotFound {
            kind: E::KIND,
            key: key.to_string(),
        })?;

        let path = entry.file_path();
        if !path.exists() {
            return Err(RegistryError::FileNotFound {
                kind: E::KIND,
                path: path.to_path_buf(),
            });
        }

        std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save(&self, entries: &[E]) -> Result<(), RegistryError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| RegistryError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_key_distinguishes_type() {
        let resume = Template::new("base", DocumentType::Resume);
        let letter = Template::new("base", DocumentType::CoverLetter);
        assert_ne!(resume.key(), letter.key());
    }

    #[test]
    fn errors_render_like_cli_messages() {
        let err = RegistryError::Duplicate {
            kind: Template::KIND,
            key: TemplateKey::new("base", DocumentType::Resume).to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template \"base\" of type \"resume\" already exists"
        );

        let err = RegistryError::NotFound {
            kind: Job::KIND,
            key: JobKey::from("acme").to_string(),
        };
        assert_eq!(err.to_string(), "Job \"acme\" not found");
    }

    #[test]
    fn unparsable_file_lists_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry: JobRegistry = Registry::new(tmp.path().join(STORAGE_FILE));
        std::fs::write(registry.path(), "{ not json").unwrap();

        assert!(registry.list_checked().is_degraded());
        assert!(registry.list().is_empty());
    }
}
