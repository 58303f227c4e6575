//! `downfolio generate`: fill in the request defaults, build the real
//! customizer and converter from the profile's config, and run the pipeline.

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use downfolio_core::ai::{Customizer, HttpBackend};
use downfolio_core::convert::Converter;
use downfolio_core::pipeline::{GenerationRequest, Pipeline};
use downfolio_store::{ConfigStore, DocumentType, OutputFormat, Profile, TemplateRegistry};

use crate::GenerateArgs;

pub async fn run_generate(profile: &Profile, args: GenerateArgs) -> Result<()> {
    let request = build_request(profile, args)?;

    let config = ConfigStore::for_profile(profile);
    let backend = Arc::new(HttpBackend::from_config(&config));
    let converter = Converter::from_config(&config);
    let customizer = Customizer::new(backend, config);
    let pipeline = Pipeline::new(profile.clone(), customizer, converter);

    let report = pipeline.run(&request).await?;

    let output_root = profile.output_dir();
    for document in &report.documents {
        println!(
            "{} generated with {} ({})",
            document.doc_type.label(),
            document.provider.display_name(),
            document.model
        );
        for file in &document.files {
            println!("  {}", crate::display_relative(file, &output_root));
        }
    }
    println!();
    println!("Documents ready: {}", report.output_dir.display());
    Ok(())
}

/// Turn command-line arguments into a pipeline request.
///
/// A template flag may be omitted when exactly one template of that type is
/// registered; formats default to markdown; the output directory defaults to
/// the job name.
fn build_request(profile: &Profile, args: GenerateArgs) -> Result<GenerationRequest> {
    let templates = TemplateRegistry::templates(profile);

    let mut resume_template = args.resume_template;
    let mut cover_letter_template = args.cover_letter_template;
    for &doc_type in args.selection.types() {
        let slot = match doc_type {
            DocumentType::Resume => &mut resume_template,
            DocumentType::CoverLetter => &mut cover_letter_template,
        };
        if slot.is_none() {
            *slot = Some(only_template(&templates, doc_type)?);
        }
    }

    let formats = if args.formats.is_empty() {
        vec![OutputFormat::Markdown]
    } else {
        args.formats
    };

    Ok(GenerationRequest {
        output_name: args.output.unwrap_or_else(|| args.job.clone()),
        job: args.job,
        selection: args.selection,
        resume_template,
        cover_letter_template,
        formats,
        provider: args.provider,
        model: args.model,
    })
}

fn only_template(templates: &TemplateRegistry, doc_type: DocumentType) -> Result<String> {
    let label = doc_type.label().to_lowercase();
    let flag = format!("--{doc_type}-template");
    let mut candidates = templates.of_type(doc_type);
    match candidates.len() {
        0 => bail!("no {label} templates registered; add one with `downfolio template add`"),
        1 => {
            let only = candidates.remove(0);
            info!(template = %only.name, %doc_type, "using the only registered template");
            Ok(only.name)
        }
        _ => {
            let names: Vec<String> = candidates.into_iter().map(|t| t.name).collect();
            bail!(
                "several {label} templates registered ({}); choose one with {flag}",
                names.join(", ")
            )
        }
    }
}
