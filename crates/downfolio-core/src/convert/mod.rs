//! Markdown to docx/pdf conversion through an external Pandoc binary.
//!
//! Subprocesses go through [`CommandRunner`] so tests can script exit codes
//! and inspect the exact argument lists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use downfolio_store::{ConfigStore, OutputFormat};

/// Config key and environment variable naming the converter binary.
pub const PANDOC_PATH_KEY: &str = "PANDOC_PATH";

pub const DEFAULT_PROGRAM: &str = "pandoc";

/// PDF engines in the order they are tried. There is no third attempt.
pub const PDF_ENGINES: [&str; 2] = ["pdflatex", "xelatex"];

/// Directories where a TeX distribution usually puts its binaries.
pub const TEX_DIRS: [&str; 4] = [
    "/Library/TeX/texbin",
    "/usr/local/texlive",
    "/usr/share/texlive",
    "/usr/texbin",
];

/// Errors from converting a markdown file.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("markdown file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error(
        "{program} is not installed or not runnable; install Pandoc to convert to docx/pdf \
         (https://pandoc.org/installing.html) or set PANDOC_PATH"
    )]
    ConverterUnavailable { program: String },

    #[error("Pandoc conversion to {format} failed: {detail}")]
    Failed { format: OutputFormat, detail: String },

    #[error("{}", pdf_diagnostic(.tex_dir.as_deref(), .detail))]
    PdfEnginesExhausted {
        /// A TeX directory that exists on this machine, if any.
        tex_dir: Option<PathBuf>,
        /// Output of the last attempt.
        detail: String,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn pdf_diagnostic(tex_dir: Option<&Path>, detail: &str) -> String {
    let remedy = match tex_dir {
        Some(dir) => format!(
            "A TeX installation was found at {} but neither pdflatex nor xelatex could run. \
             Make sure that directory's binaries are on your PATH (open a new shell after \
             installing) and that the distribution is complete.",
            dir.display()
        ),
        None => "No TeX installation was found. Install a PDF engine (pdflatex or xelatex), \
                 for example via MacTeX, BasicTeX or TeX Live. Alternatively, install \
                 wkhtmltopdf and run: pandoc --pdf-engine=wkhtmltopdf"
            .to_owned(),
    };
    if detail.is_empty() {
        format!("PDF conversion failed. {remedy}")
    } else {
        format!("PDF conversion failed: {detail}\n\n{remedy}")
    }
}

// ---------------------------------------------------------------------------
// Subprocess seam
// ---------------------------------------------------------------------------

/// Captured result of one subprocess run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr if there is any, else stdout, trimmed.
    fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_owned()
        } else {
            stderr.to_owned()
        }
    }
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// `Err` means the process could not be started at all; a non-zero exit
    /// is reported through [`CommandOutput::exit_code`].
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn CommandRunner) {}
};

/// Spawns real processes with tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRunner;

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Drives the converter binary.
#[derive(Clone)]
pub struct Converter {
    runner: Arc<dyn CommandRunner>,
    program: String,
    tex_dirs: Vec<PathBuf>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("program", &self.program)
            .field("tex_dirs", &self.tex_dirs)
            .finish()
    }
}

impl Converter {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            tex_dirs: TEX_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Real converter, using `PANDOC_PATH` from the environment or config
    /// when set.
    pub fn from_config(config: &ConfigStore) -> Self {
        let program = config
            .setting(PANDOC_PATH_KEY)
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_owned());
        Self::new(Arc::new(TokioRunner), program)
    }

    /// Replace the directories probed for a TeX installation.
    pub fn with_tex_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.tex_dirs = dirs;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether `<program> --version` runs and exits cleanly.
    pub async fn is_available(&self) -> bool {
        match self.runner.run(&self.program, &["--version".to_owned()]).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(program = %self.program, error = %e, "converter not runnable");
                false
            }
        }
    }

    /// Convert `markdown` to a Word document at `output`.
    pub async fn convert_to_docx(&self, markdown: &Path, output: &Path) -> Result<(), ConvertError> {
        ensure_source(markdown)?;

        let args = conversion_args(markdown, output, "markdown+smart", "docx", &["--standalone"]);
        let result = self.invoke(&args).await;
        match result {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => Err(ConvertError::Failed {
                format: OutputFormat::Docx,
                detail: exit_detail(&out),
            }),
            Err(e) => Err(ConvertError::Failed {
                format: OutputFormat::Docx,
                detail: e.to_string(),
            }),
        }
    }

    /// Convert `markdown` to PDF at `output`, trying pdflatex then xelatex.
    pub async fn convert_to_pdf(&self, markdown: &Path, output: &Path) -> Result<(), ConvertError> {
        ensure_source(markdown)?;

        let mut last_detail = String::new();
        for engine in PDF_ENGINES {
            let engine_flag = format!("--pdf-engine={engine}");
            let args = conversion_args(markdown, output, "markdown", "pdf", &[engine_flag.as_str()]);

            match self.invoke(&args).await {
                Ok(out) if out.success() => {
                    debug!(engine, "pdf engine succeeded");
                    return Ok(());
                }
                Ok(out) => {
                    last_detail = exit_detail(&out);
                    warn!(engine, detail = %last_detail, "pdf engine failed");
                }
                Err(e) => {
                    last_detail = e.to_string();
                    warn!(engine, error = %e, "pdf engine could not be started");
                }
            }
        }

        Err(ConvertError::PdfEnginesExhausted {
            tex_dir: self.tex_dirs.iter().find(|d| d.is_dir()).cloned(),
            detail: last_detail,
        })
    }

    /// Write `content` to `output_dir/file_name`, then produce each requested
    /// binary format next to it (docx before pdf).
    ///
    /// Returns every created path in creation order. Files created before a
    /// failure are left in place.
    pub async fn convert_markdown_to_formats(
        &self,
        content: &str,
        file_name: &str,
        output_dir: &Path,
        formats: &[OutputFormat],
    ) -> Result<Vec<PathBuf>, ConvertError> {
        let markdown = output_dir.join(file_name);
        std::fs::write(&markdown, content).map_err(|source| ConvertError::Write {
            path: markdown.clone(),
            source,
        })?;
        let mut created = vec![markdown.clone()];

        if formats.iter().any(|f| f.is_binary()) && !self.is_available().await {
            return Err(ConvertError::ConverterUnavailable {
                program: self.program.clone(),
            });
        }

        if formats.contains(&OutputFormat::Docx) {
            let docx = markdown.with_extension(OutputFormat::Docx.extension());
            self.convert_to_docx(&markdown, &docx).await?;
            created.push(docx);
        }

        if formats.contains(&OutputFormat::Pdf) {
            let pdf = markdown.with_extension(OutputFormat::Pdf.extension());
            self.convert_to_pdf(&markdown, &pdf).await?;
            created.push(pdf);
        }

        for path in &created {
            info!(path = %path.display(), "created");
        }
        Ok(created)
    }

    async fn invoke(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        debug!(program = %self.program, args = ?args, "running converter");
        self.runner.run(&self.program, args).await
    }
}

fn ensure_source(markdown: &Path) -> Result<(), ConvertError> {
    if markdown.exists() {
        Ok(())
    } else {
        Err(ConvertError::SourceNotFound {
            path: markdown.to_path_buf(),
        })
    }
}

fn conversion_args(
    markdown: &Path,
    output: &Path,
    from: &str,
    to: &str,
    extra: &[&str],
) -> Vec<String> {
    let mut args = vec![
        markdown.display().to_string(),
        "-o".to_owned(),
        output.display().to_string(),
        "--from".to_owned(),
        from.to_owned(),
        "--to".to_owned(),
        to.to_owned(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_owned()));
    args
}

fn exit_detail(output: &CommandOutput) -> String {
    let detail = output.detail();
    let code = output
        .exit_code
        .map_or_else(|| "signal".to_owned(), |c| c.to_string());
    if detail.is_empty() {
        format!("exit status {code}")
    } else {
        format!("exit status {code}: {detail}")
    }
}
