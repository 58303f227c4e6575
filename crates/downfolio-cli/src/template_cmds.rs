//! `downfolio template` subcommands.
//!
//! - `template add --type T --file F [--name N]` -- register a file from `Templates/`
//! - `template list`                              -- registered templates by type
//! - `template remove --name N --type T`          -- drop the registry record
//! - `template files`                             -- unregistered files in `Templates/`

use anyhow::Result;

use downfolio_store::{DocumentType, Profile, Template, TemplateKey, TemplateRegistry};

use crate::TemplateCommands;
use crate::profile_files::{default_name, require_inside, unregistered};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub fn run_template_command(command: TemplateCommands, profile: &Profile) -> Result<()> {
    let registry = TemplateRegistry::templates(profile);
    match command {
        TemplateCommands::Add {
            doc_type,
            file,
            name,
        } => cmd_add(profile, &registry, doc_type, &file, name),
        TemplateCommands::List => cmd_list(&registry),
        TemplateCommands::Remove { name, doc_type } => {
            let removed = registry.remove(&TemplateKey::new(name, doc_type))?;
            println!(
                "{} template {:?} removed (file kept at {}).",
                removed.doc_type.label(),
                removed.name,
                removed.file_path.display()
            );
            Ok(())
        }
        TemplateCommands::Files => cmd_files(profile, &registry),
    }
}

// -----------------------------------------------------------------------
// downfolio template add
// -----------------------------------------------------------------------

fn cmd_add(
    profile: &Profile,
    registry: &TemplateRegistry,
    doc_type: DocumentType,
    file: &std::path::Path,
    name: Option<String>,
) -> Result<()> {
    let path = require_inside(file, &profile.templates_dir())?;
    let name = match name {
        Some(name) => name,
        None => default_name(&path)?,
    };

    let added = registry.add(Template::new(name, doc_type), &path)?;
    println!(
        "{} template {:?} registered -> {}",
        added.doc_type.label(),
        added.name,
        added.file_path.display()
    );
    Ok(())
}

// -----------------------------------------------------------------------
// downfolio template list
// -----------------------------------------------------------------------

fn cmd_list(registry: &TemplateRegistry) -> Result<()> {
    let templates = registry.list();
    if templates.is_empty() {
        println!("No templates registered. Use `downfolio template add` to register one.");
        return Ok(());
    }

    for doc_type in DocumentType::ALL {
        let of_type: Vec<&Template> = templates.iter().filter(|t| t.doc_type == doc_type).collect();
        if of_type.is_empty() {
            continue;
        }
        println!("{} templates:", doc_type.label());
        let name_w = of_type.iter().map(|t| t.name.len()).max().unwrap_or(4);
        for t in of_type {
            println!("  {:<name_w$}  {}", t.name, t.file_path.display());
        }
    }
    println!();
    println!("{} template(s) found", templates.len());
    Ok(())
}

// -----------------------------------------------------------------------
// downfolio template files
// -----------------------------------------------------------------------

fn cmd_files(profile: &Profile, registry: &TemplateRegistry) -> Result<()> {
    let dir = profile.templates_dir();
    let templates = registry.list();
    let files = unregistered(&dir, templates.iter().map(|t| t.file_path.as_path()))?;

    if files.is_empty() {
        println!("No unregistered markdown files in {}", dir.display());
        return Ok(());
    }
    println!("Unregistered markdown files in {}:", dir.display());
    for file in &files {
        println!("  {}", crate::display_relative(file, &dir));
    }
    Ok(())
}
