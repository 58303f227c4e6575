//! `downfolio convert`: run the converter over an existing markdown file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use downfolio_core::convert::{ConvertError, Converter};
use downfolio_store::{ConfigStore, OutputFormat, Profile};

use crate::ConvertArgs;

pub async fn run_convert(profile: &Profile, args: ConvertArgs) -> Result<()> {
    let converter = Converter::from_config(&ConfigStore::for_profile(profile));
    convert_file(&converter, &args).await
}

async fn convert_file(converter: &Converter, args: &ConvertArgs) -> Result<()> {
    let input = &args.file;
    if !input.is_file() {
        bail!("file not found: {}", input.display());
    }
    if input.extension().is_none_or(|ext| ext != "md") {
        bail!("input file must be a markdown file (.md): {}", input.display());
    }

    let formats = binary_formats(&args.formats);
    if formats.is_empty() {
        bail!("no valid output format given; use --format docx and/or --format pdf");
    }

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let base_name = match &args.output_name {
        Some(name) => name.clone(),
        None => crate::profile_files::default_name(input)?,
    };
    let targets: Vec<(OutputFormat, PathBuf)> = formats
        .iter()
        .map(|&f| (f, output_dir.join(format!("{base_name}.{}", f.extension()))))
        .collect();

    if !args.force {
        let existing: Vec<String> = targets
            .iter()
            .filter(|(_, path)| path.exists())
            .map(|(_, path)| path.display().to_string())
            .collect();
        if !existing.is_empty() {
            bail!(
                "refusing to overwrite {}; pass --force to replace",
                existing.join(", ")
            );
        }
    }

    if !converter.is_available().await {
        return Err(ConvertError::ConverterUnavailable {
            program: converter.program().to_owned(),
        }
        .into());
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    for (format, path) in &targets {
        match format {
            OutputFormat::Docx => converter.convert_to_docx(input, path).await?,
            OutputFormat::Pdf => converter.convert_to_pdf(input, path).await?,
            OutputFormat::Markdown => continue,
        }
        println!("Created {}", path.display());
    }
    Ok(())
}

/// Keep `docx` and `pdf` (docx first, no duplicates); warn about the rest.
fn binary_formats(requested: &[String]) -> Vec<OutputFormat> {
    let mut wanted = Vec::new();
    for raw in requested {
        match raw.trim().to_lowercase().parse::<OutputFormat>() {
            Ok(format) if format.is_binary() => {
                if !wanted.contains(&format) {
                    wanted.push(format);
                }
            }
            _ => eprintln!("warning: ignoring format {raw:?} (valid formats are docx and pdf)"),
        }
    }
    wanted.sort_by_key(|f| *f != OutputFormat::Docx);
    wanted
}
