//! Shared test utilities for downfolio integration tests.
//!
//! - [`TestProfile`]: a profile directory inside a `TempDir`, with helpers to
//!   drop templates and jobs into it and a config store whose environment is
//!   a fixed map instead of the process environment.
//! - [`StubBackend`]: an [`LlmBackend`] that returns canned replies and
//!   records every call.
//! - [`RecordingRunner`]: a [`CommandRunner`] that records converter
//!   invocations, writes the `-o` target on success and fails on demand.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use downfolio_core::ai::{AiError, ChatCall, Customizer, LlmBackend};
use downfolio_core::convert::{CommandOutput, CommandRunner, Converter};
use downfolio_store::{
    ConfigStore, DocumentType, Job, JobRegistry, MapEnv, Profile, Template, TemplateRegistry,
};

// ---------------------------------------------------------------------------
// TestProfile
// ---------------------------------------------------------------------------

/// A throwaway profile. The directory is removed when this is dropped.
pub struct TestProfile {
    _dir: TempDir,
    profile: Profile,
    env: MapEnv,
}

impl TestProfile {
    /// An initialized profile (`Templates/`, `Jobs/`, `Output/` exist).
    pub fn new() -> Self {
        let profile = Self::uninitialized();
        profile
            .profile
            .ensure_layout()
            .expect("failed to create profile layout");
        profile
    }

    /// A profile whose root directory does not exist yet.
    pub fn uninitialized() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let profile = Profile::new(dir.path().join("Downfolio"));
        Self {
            _dir: dir,
            profile,
            env: MapEnv::new(),
        }
    }

    /// Replace the environment seen by [`TestProfile::config`].
    pub fn with_env(mut self, env: MapEnv) -> Self {
        self.env = env;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn root(&self) -> &Path {
        self.profile.root()
    }

    /// Config store for this profile, isolated from the process environment.
    pub fn config(&self) -> ConfigStore {
        ConfigStore::new(self.profile.config_file(), Arc::new(self.env.clone()))
    }

    /// Store `key = value` in the config file.
    pub fn set_config(&self, key: &str, value: &str) {
        self.config()
            .set_value(key, value)
            .unwrap_or_else(|e| panic!("failed to set {key}: {e}"));
    }

    pub fn templates(&self) -> TemplateRegistry {
        TemplateRegistry::templates(&self.profile)
    }

    pub fn jobs(&self) -> JobRegistry {
        JobRegistry::jobs(&self.profile)
    }

    /// Write `Templates/<file_name>`.
    pub fn write_template(&self, file_name: &str, content: &str) -> PathBuf {
        write_file(&self.profile.templates_dir().join(file_name), content)
    }

    /// Write `Jobs/<file_name>`.
    pub fn write_job(&self, file_name: &str, content: &str) -> PathBuf {
        write_file(&self.profile.jobs_dir().join(file_name), content)
    }

    /// Write `Templates/<name>.md` and register it.
    pub fn add_template(&self, name: &str, doc_type: DocumentType, content: &str) -> PathBuf {
        let path = self.write_template(&format!("{name}-{doc_type}.md"), content);
        self.templates()
            .add(Template::new(name, doc_type), &path)
            .unwrap_or_else(|e| panic!("failed to register template {name}: {e}"));
        path
    }

    /// Write `Jobs/<name>.md` and register it.
    pub fn add_job(&self, name: &str, content: &str) -> PathBuf {
        let path = self.write_job(&format!("{name}.md"), content);
        self.jobs()
            .add(Job::new(name), &path)
            .unwrap_or_else(|e| panic!("failed to register job {name}: {e}"));
        path
    }

    /// `Output/<name>`.
    pub fn output_dir(&self, name: &str) -> PathBuf {
        self.profile.output_dir().join(name)
    }

    /// A customizer over `backend` reading this profile's config.
    pub fn customizer(&self, backend: Arc<dyn LlmBackend>) -> Customizer {
        Customizer::new(backend, self.config())
    }
}

impl Default for TestProfile {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).expect("failed to create parent dir");
    }
    std::fs::write(path, content)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// StubBackend
// ---------------------------------------------------------------------------

/// Canned LLM backend.
///
/// Queued responses are returned first, in order; after that every call gets
/// the fallback reply.
pub struct StubBackend {
    queued: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: String,
    calls: Mutex<Vec<ChatCall>>,
}

impl StubBackend {
    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: text.into(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Return `responses` in order, then an empty reply.
    pub fn with_responses(responses: Vec<Result<String, AiError>>) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(responses.into()),
            fallback: String::new(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn complete(&self, call: &ChatCall) -> Result<String, AiError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(call.clone());

        let next = self.queued.lock().expect("queue lock poisoned").pop_front();
        match next {
            Some(response) => response,
            None if self.fallback.is_empty() => Err(AiError::EmptyResponse {
                provider: call.provider,
            }),
            None => Ok(self.fallback.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

/// One recorded subprocess run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn is_version_check(&self) -> bool {
        self.args == ["--version"]
    }

    /// The value following `-o`, if any.
    pub fn output(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Scriptable stand-in for the converter binary.
///
/// By default every run succeeds and a successful conversion writes a
/// placeholder to its `-o` path.
#[derive(Default)]
pub struct RecordingRunner {
    installed: bool,
    fail_patterns: Vec<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            installed: true,
            ..Self::default()
        }
    }

    /// Every run fails to start, as if the binary were missing.
    pub fn not_installed() -> Self {
        Self::default()
    }

    /// Runs whose arguments include `arg` exit with status 1.
    pub fn failing_on(mut self, arg: impl Into<String>) -> Self {
        self.fail_patterns.push(arg.into());
        self
    }

    /// A converter using this runner that finds no TeX installation.
    pub fn converter(self: &Arc<Self>) -> Converter {
        Converter::new(self.clone(), "pandoc").with_tex_dirs(Vec::new())
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .expect("invocations lock poisoned")
            .clone()
    }

    /// Invocations other than `--version` availability checks.
    pub fn conversions(&self) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| !i.is_version_check())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let invocation = Invocation {
            program: program.to_owned(),
            args: args.to_vec(),
        };
        self.invocations
            .lock()
            .expect("invocations lock poisoned")
            .push(invocation.clone());

        if !self.installed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{program}: command not found"),
            ));
        }

        if self
            .fail_patterns
            .iter()
            .any(|p| args.iter().any(|a| a == p))
        {
            return Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "conversion failed".to_owned(),
            });
        }

        if let Some(out) = invocation.output() {
            std::fs::write(out, format!("converted by {program}"))?;
        }

        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
