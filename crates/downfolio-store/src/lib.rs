//! Local persistence for downfolio.
//!
//! Everything downfolio keeps on disk lives under a single profile directory
//! (`~/Downfolio` by default):
//!
//! ```text
//! ~/Downfolio/
//!   config.toml            API keys and default models (mode 0600)
//!   Templates/storage.json template registry
//!   Jobs/storage.json      job registry
//!   Output/<name>/         generated documents
//! ```

pub mod config;
pub mod env;
pub mod models;
pub mod outcome;
pub mod paths;
pub mod registry;

pub use config::{Config, ConfigError, ConfigStore};
pub use env::{EnvProvider, MapEnv, ProcessEnv};
pub use models::{DocumentType, Job, JobKey, OutputFormat, Provider, Template, TemplateKey};
pub use outcome::ParseOutcome;
pub use paths::Profile;
pub use registry::{JobRegistry, Registry, RegistryEntry, RegistryError, TemplateRegistry};
