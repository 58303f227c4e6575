use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of document a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
}

impl DocumentType {
    /// Every document type, in generation order.
    pub const ALL: [DocumentType; 2] = [Self::Resume, Self::CoverLetter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "cover-letter",
        }
    }

    /// Human-readable label (e.g. "Cover letter").
    pub fn label(self) -> &'static str {
        match self {
            Self::Resume => "Resume",
            Self::CoverLetter => "Cover letter",
        }
    }

    /// Markdown file name used for generated output.
    pub fn output_file_name(self) -> &'static str {
        match self {
            Self::Resume => "resume.md",
            Self::CoverLetter => "cover_letter.md",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(Self::Resume),
            "cover-letter" => Ok(Self::CoverLetter),
            other => Err(UnknownVariant::new("document type", other, "resume, cover-letter")),
        }
    }
}

// ---------------------------------------------------------------------------

/// An LLM vendor reachable over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Providers in preference order for automatic selection.
    pub const ALL: [Provider; 2] = [Self::OpenAi, Self::Anthropic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Config key and environment variable holding the API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Config key holding the user's default model.
    pub fn model_key(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_MODEL",
            Self::Anthropic => "ANTHROPIC_MODEL",
        }
    }

    /// Config key and environment variable overriding the API base URL.
    pub fn base_url_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::Anthropic => "ANTHROPIC_BASE_URL",
        }
    }

    /// Model used when neither the caller nor the config names one.
    pub fn fallback_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-5",
        }
    }

    /// Models offered for this provider, smallest first.
    pub fn known_models(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-4-turbo"],
            Self::Anthropic => &["claude-haiku-4-5", "claude-sonnet-4-5", "claude-opus-4-5"],
        }
    }

    pub fn is_known_model(self, model: &str) -> bool {
        self.known_models().contains(&model)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(UnknownVariant::new("provider", other, "openai, anthropic")),
        }
    }
}

// ---------------------------------------------------------------------------

/// Output format of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Docx,
    Pdf,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Whether producing this format needs the external converter.
    pub fn is_binary(self) -> bool {
        !matches!(self, Self::Markdown)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(UnknownVariant::new("output format", other, "markdown, docx, pdf")),
        }
    }
}

/// Error returned when parsing an unrecognised enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
            expected,
        }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {}: {:?} (expected one of: {})",
            self.kind, self.value, self.expected
        )
    }
}

impl std::error::Error for UnknownVariant {}

// ---------------------------------------------------------------------------
// Registry records
// ---------------------------------------------------------------------------

/// A registered résumé or cover-letter template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Absolute path to the markdown file. Set by the registry on `add`.
    pub file_path: PathBuf,
}

impl Template {
    pub fn new(name: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            name: name.into(),
            doc_type,
            file_path: PathBuf::new(),
        }
    }
}

/// A registered job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    /// Absolute path to the markdown file. Set by the registry on `add`.
    pub file_path: PathBuf,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: PathBuf::new(),
        }
    }
}

/// Identity of a template: unique per `(name, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub name: String,
    pub doc_type: DocumentType,
}

impl TemplateKey {
    pub fn new(name: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            name: name.into(),
            doc_type,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} of type {:?}", self.name, self.doc_type.as_str())
    }
}

/// Identity of a job: unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey(pub String);

impl From<&str> for JobKey {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
