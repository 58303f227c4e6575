//! `downfolio job` subcommands: the job-description counterpart of
//! `template`, without a type.

use std::path::Path;

use anyhow::Result;

use downfolio_store::{Job, JobKey, JobRegistry, Profile};

use crate::JobCommands;
use crate::profile_files::{default_name, require_inside, unregistered};

pub fn run_job_command(command: JobCommands, profile: &Profile) -> Result<()> {
    let registry = JobRegistry::jobs(profile);
    match command {
        JobCommands::Add { file, name } => cmd_add(profile, &registry, &file, name),
        JobCommands::List => cmd_list(&registry),
        JobCommands::Remove { name } => {
            let removed = registry.remove(&JobKey(name))?;
            println!(
                "Job {:?} removed (file kept at {}).",
                removed.name,
                removed.file_path.display()
            );
            Ok(())
        }
        JobCommands::Files => {
            let dir = profile.jobs_dir();
            let jobs = registry.list();
            let files = unregistered(&dir, jobs.iter().map(|j| j.file_path.as_path()))?;
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
    }
}

fn cmd_add(profile: &Profile, registry: &JobRegistry, file: &Path, name: Option<String>) -> Result<()> {
    let path = require_inside(file, &profile.jobs_dir())?;
    let name = match name {
        Some(name) => name,
        None => default_name(&path)?,
    };

    let added = registry.add(Job::new(name), &path)?;
    println!("Job {:?} registered -> {}", added.name, added.file_path.display());
    Ok(())
}

fn cmd_list(registry: &JobRegistry) -> Result<()> {
    let jobs = registry.list();
    if jobs.is_empty() {
        println!("No jobs registered. Use `downfolio job add` to register one.");
        return Ok(());
    }

    let name_w = jobs.iter().map(|j| j.name.len()).max().unwrap_or(4).max(4);
    println!("{:<name_w$}  FILE", "NAME");
    for job in &jobs {
        println!("{:<name_w$}  {}", job.name, job.file_path.display());
    }
    println!();
    println!("{} job(s) found", jobs.len());
    Ok(())
}
