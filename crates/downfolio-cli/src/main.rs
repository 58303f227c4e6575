mod config_cmd;
mod convert_cmd;
mod generate_cmd;
mod init_cmd;
mod job_cmds;
mod markdown_cmds;
mod profile_files;
mod template_cmds;

use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};

use downfolio_core::markdown::DEFAULT_PREVIEW_LIMIT;
use downfolio_core::pipeline::DocumentSelection;
use downfolio_store::{DocumentType, OutputFormat, ProcessEnv, Profile, Provider};

#[derive(Parser)]
#[command(
    name = "downfolio",
    version,
    about = "Tailor resumes and cover letters to job descriptions with LLMs"
)]
struct Cli {
    /// Profile directory (overrides DOWNFOLIO_HOME; defaults to ~/Downfolio)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the profile directories and store API keys
    Init {
        /// OpenAI API key to store
        #[arg(long)]
        openai_key: Option<String>,
        /// Anthropic API key to store
        #[arg(long)]
        anthropic_key: Option<String>,
    },
    /// Read and write stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Template management
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Job description management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Customize templates for a job and write the results under Output/
    Generate(GenerateArgs),
    /// Convert an existing markdown file to docx and/or pdf
    Convert(ConvertArgs),
    /// Check that a markdown file is usable
    Validate {
        /// Markdown file to check
        file: PathBuf,
    },
    /// Print a plain-text preview of a markdown file
    Preview {
        /// Markdown file to preview
        file: PathBuf,
        /// Maximum number of characters to print
        #[arg(long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
        limit: usize,
    },
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Store a value
    Set {
        /// Config key (e.g. OPENAI_API_KEY, OPENAI_MODEL)
        key: String,
        /// Value to store
        value: String,
    },
    /// Replace a value that is already stored
    Update {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show a stored value (masked)
    Get {
        /// Config key
        key: String,
    },
    /// Show every stored key with masked values
    List,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Register a markdown file from the Templates directory
    Add {
        /// Template type
        #[arg(long = "type")]
        doc_type: DocumentType,
        /// Markdown file inside the Templates directory
        #[arg(long)]
        file: PathBuf,
        /// Name to register under (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// List registered templates grouped by type
    List,
    /// Unregister a template (the file is kept)
    Remove {
        /// Template name
        #[arg(long)]
        name: String,
        /// Template type
        #[arg(long = "type")]
        doc_type: DocumentType,
    },
    /// List markdown files in the Templates directory that are not registered
    Files,
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// Register a markdown file from the Jobs directory
    Add {
        /// Markdown file inside the Jobs directory
        #[arg(long)]
        file: PathBuf,
        /// Name to register under (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// List registered jobs
    List,
    /// Unregister a job (the file is kept)
    Remove {
        /// Job name
        #[arg(long)]
        name: String,
    },
    /// List markdown files in the Jobs directory that are not registered
    Files,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Registered job name
    #[arg(long)]
    pub job: String,
    /// Documents to generate: resume, cover-letter or both
    #[arg(long = "type", default_value = "resume")]
    pub selection: DocumentSelection,
    /// Resume template name (optional when only one is registered)
    #[arg(long)]
    pub resume_template: Option<String>,
    /// Cover letter template name (optional when only one is registered)
    #[arg(long)]
    pub cover_letter_template: Option<String>,
    /// Output formats: markdown, docx, pdf (repeatable; defaults to markdown)
    #[arg(long = "format", value_delimiter = ',')]
    pub formats: Vec<OutputFormat>,
    /// Directory name under Output/ (defaults to the job name)
    #[arg(long)]
    pub output: Option<String>,
    /// LLM provider: openai or anthropic
    #[arg(long)]
    pub provider: Option<Provider>,
    /// Model name (must be a known model of the provider)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Markdown file to convert
    pub file: PathBuf,
    /// Target formats: docx, pdf (repeatable)
    #[arg(long = "format", value_delimiter = ',', required = true)]
    pub formats: Vec<String>,
    /// Directory for the converted files (defaults to the file's directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Base name of the converted files (defaults to the file stem)
    #[arg(long)]
    pub output_name: Option<String>,
    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

/// Fail unless `downfolio init` has created the profile directory.
fn require_initialized(profile: &Profile) -> anyhow::Result<()> {
    if !profile.is_initialized() {
        anyhow::bail!(
            "no downfolio profile at {}; run `downfolio init` first",
            profile.root().display()
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = Profile::resolve(cli.home.as_deref(), &ProcessEnv);

    match cli.command {
        Commands::Init {
            openai_key,
            anthropic_key,
        } => init_cmd::run_init(&profile, openai_key.as_deref(), anthropic_key.as_deref()),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "downfolio", &mut std::io::stdout());
            Ok(())
        }
        Commands::Validate { file } => markdown_cmds::run_validate(&file),
        Commands::Preview { file, limit } => markdown_cmds::run_preview(&file, limit),
        Commands::Config { command } => {
            require_initialized(&profile)?;
            config_cmd::run_config_command(command, &profile)
        }
        Commands::Template { command } => {
            require_initialized(&profile)?;
            template_cmds::run_template_command(command, &profile)
        }
        Commands::Job { command } => {
            require_initialized(&profile)?;
            job_cmds::run_job_command(command, &profile)
        }
        Commands::Generate(args) => {
            require_initialized(&profile)?;
            generate_cmd::run_generate(&profile, args).await
        }
        Commands::Convert(args) => {
            require_initialized(&profile)?;
            convert_cmd::run_convert(&profile, args).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

/// `path` for display, relative to `base` when it lives under it.
pub(crate) fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
