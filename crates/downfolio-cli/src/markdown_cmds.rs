//! `downfolio validate` and `downfolio preview`. Both read any markdown file
//! and never touch the profile.

use std::path::Path;

use anyhow::{Context, Result, bail};

use downfolio_core::markdown::{FrontMatter, preview, validate_markdown};

fn read(file: &Path) -> Result<String> {
    if !file.is_file() {
        bail!("file not found: {}", file.display());
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

pub fn run_validate(file: &Path) -> Result<()> {
    let report = validate_markdown(&read(file)?);

    if !report.is_valid() {
        for problem in report.problems() {
            println!("  x {problem}");
        }
        bail!("validation failed: {}", file.display());
    }

    if matches!(report.front_matter, FrontMatter::Valid) {
        println!("  ok front matter");
    }
    println!("  ok syntax");
    if report.has_headings {
        println!("  ok structure ({} headings)", report.headings.len());
        for heading in &report.headings {
            let indent = "  ".repeat(heading.level.saturating_sub(1));
            println!("       {indent}{}", heading.text);
        }
    } else {
        println!("  -- no headings found");
    }
    println!("{} is valid", file.display());
    Ok(())
}

pub fn run_preview(file: &Path, limit: usize) -> Result<()> {
    let content = read(file)?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    println!("Preview: {name}");
    println!("{}", "-".repeat(40));
    println!("{}", preview(&content, limit));
    Ok(())
}
