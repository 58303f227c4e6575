//! Document generation pipeline.
//!
//! Resolves the provider, reads the job description, then for each requested
//! document type (résumé first) reads the template, customizes it and writes
//! the result in the requested formats under `<profile>/Output/<name>/`.
//! Everything runs in sequence and the first failure aborts the run; files
//! written before the failure stay on disk.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use downfolio_store::models::UnknownVariant;
use downfolio_store::{
    DocumentType, JobKey, JobRegistry, OutputFormat, Profile, Provider, RegistryError,
    TemplateKey, TemplateRegistry,
};

use crate::ai::{AiError, CustomizeRequest, Customizer};
use crate::convert::{ConvertError, Converter};

/// Which documents to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentSelection {
    #[default]
    Resume,
    CoverLetter,
    Both,
}

impl DocumentSelection {
    /// Selected document types in generation order.
    pub fn types(self) -> &'static [DocumentType] {
        match self {
            Self::Resume => &[DocumentType::Resume],
            Self::CoverLetter => &[DocumentType::CoverLetter],
            Self::Both => &DocumentType::ALL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "cover-letter",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for DocumentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentSelection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Self::Both),
            other => match other.parse::<DocumentType>() {
                Ok(DocumentType::Resume) => Ok(Self::Resume),
                Ok(DocumentType::CoverLetter) => Ok(Self::CoverLetter),
                Err(_) => Err(UnknownVariant {
                    kind: "document selection",
                    value: other.to_owned(),
                    expected: "resume, cover-letter, both",
                }),
            },
        }
    }
}

/// Parameters of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub job: String,
    pub selection: DocumentSelection,
    pub resume_template: Option<String>,
    pub cover_letter_template: Option<String>,
    pub formats: Vec<OutputFormat>,
    pub provider: Option<Provider>,
    pub model: Option<String>,
    /// Directory name under `Output/`.
    pub output_name: String,
}

impl GenerationRequest {
    fn template_for(&self, doc_type: DocumentType) -> Option<&str> {
        match doc_type {
            DocumentType::Resume => self.resume_template.as_deref(),
            DocumentType::CoverLetter => self.cover_letter_template.as_deref(),
        }
    }
}

/// One customized document and the files written for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub doc_type: DocumentType,
    pub provider: Provider,
    pub model: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub documents: Vec<GeneratedDocument>,
}

impl GenerationReport {
    /// Every file written, in creation order.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.documents.iter().flat_map(|d| d.files.iter())
    }
}

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no {} template selected", .doc_type.label().to_lowercase())]
    MissingTemplate { doc_type: DocumentType },

    #[error(
        "model {model:?} is not a valid {} model (expected one of: {})",
        .provider.display_name(),
        .provider.known_models().join(", ")
    )]
    InvalidModel { provider: Provider, model: String },

    #[error("output name must be a plain directory name, got {0:?}")]
    InvalidOutputName(String),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("failed to create output directory {}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs generation against one profile.
#[derive(Debug, Clone)]
pub struct Pipeline {
    profile: Profile,
    templates: TemplateRegistry,
    jobs: JobRegistry,
    customizer: Customizer,
    converter: Converter,
}

impl Pipeline {
    pub fn new(profile: Profile, customizer: Customizer, converter: Converter) -> Self {
        Self {
            templates: TemplateRegistry::templates(&profile),
            jobs: JobRegistry::jobs(&profile),
            profile,
            customizer,
            converter,
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationReport, GenerateError> {
        // Checks that need neither the network nor the filesystem.
        let mut plan = Vec::new();
        for &doc_type in request.selection.types() {
            let name = request
                .template_for(doc_type)
                .ok_or(GenerateError::MissingTemplate { doc_type })?;
            plan.push(TemplateKey::new(name, doc_type));
        }
        let output_name = validate_output_name(&request.output_name)?;

        // An empty model means "use the default", which is not checked
        // against the known list.
        let explicit_model = request.model.as_deref().filter(|m| !m.is_empty());
        let resolved = self.customizer.resolve(request.provider, explicit_model)?;
        if explicit_model.is_some() && !resolved.provider.is_known_model(&resolved.model) {
            return Err(GenerateError::InvalidModel {
                provider: resolved.provider,
                model: resolved.model,
            });
        }

        info!(job = %request.job, "reading job description");
        let job_description = self.jobs.read_content(&JobKey(request.job.clone()))?;

        let output_dir = self.profile.output_dir().join(output_name);
        std::fs::create_dir_all(&output_dir).map_err(|source| GenerateError::CreateOutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let mut documents = Vec::new();
        for key in plan {
            let doc_type = key.doc_type;
            info!(template = %key.name, %doc_type, "reading template");
            let template = self.templates.read_content(&key)?;

            let result = self
                .customizer
                .customize_with(
                    &resolved,
                    &CustomizeRequest {
                        template,
                        job_description: job_description.clone(),
                        doc_type,
                        provider: Some(resolved.provider),
                        model: Some(resolved.model.clone()),
                    },
                )
                .await?;

            let files = if request.formats.is_empty() {
                Vec::new()
            } else {
                info!(%doc_type, formats = ?request.formats, "writing output");
                self.converter
                    .convert_markdown_to_formats(
                        &result.content,
                        doc_type.output_file_name(),
                        &output_dir,
                        &request.formats,
                    )
                    .await?
            };

            documents.push(GeneratedDocument {
                doc_type,
                provider: result.provider,
                model: result.model,
                files,
            });
        }

        info!(output_dir = %output_dir.display(), "documents ready");
        Ok(GenerationReport {
            output_dir,
            documents,
        })
    }
}

/// The output name becomes a single directory under `Output/`. Returns the
/// trimmed name, which is the one used on disk.
fn validate_output_name(name: &str) -> Result<&str, GenerateError> {
    let trimmed = name.trim();
    let is_plain = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\']);
    if is_plain {
        Ok(trimmed)
    } else {
        Err(GenerateError::InvalidOutputName(name.to_owned()))
    }
}
