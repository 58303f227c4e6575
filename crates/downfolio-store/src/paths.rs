use std::io;
use std::path::{Path, PathBuf};

use crate::env::EnvProvider;

/// Location of a downfolio profile directory and the paths inside it.
///
/// Resolution chain: `--home` flag > `DOWNFOLIO_HOME` env var > `~/Downfolio`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    root: PathBuf,
}

impl Profile {
    /// Environment variable that overrides the default profile location.
    pub const HOME_ENV: &str = "DOWNFOLIO_HOME";

    /// Name of the profile directory under the user's home directory.
    pub const DEFAULT_DIR_NAME: &str = "Downfolio";

    /// Build a profile rooted at an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the profile root from a CLI flag, the environment, or the
    /// home directory, in that order.
    pub fn resolve(cli_home: Option<&Path>, env: &dyn EnvProvider) -> Self {
        if let Some(home) = cli_home {
            return Self::new(home);
        }
        if let Some(home) = env.var(Self::HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(home);
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(Self::DEFAULT_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("Templates")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("Jobs")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("Output")
    }

    /// A profile counts as initialized once its root directory exists.
    pub fn is_initialized(&self) -> bool {
        self.root.is_dir()
    }

    /// Create the root and the `Templates`, `Jobs` and `Output` directories.
    /// Idempotent.
    pub fn ensure_layout(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.templates_dir(),
            self.jobs_dir(),
            self.output_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// List the `.md` files directly inside `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn markdown_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
