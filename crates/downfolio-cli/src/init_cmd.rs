//! `downfolio init`: create the profile layout and merge API keys into the
//! stored configuration.

use anyhow::{Context, Result};

use downfolio_store::{ConfigStore, Profile, Provider};

pub fn run_init(
    profile: &Profile,
    openai_key: Option<&str>,
    anthropic_key: Option<&str>,
) -> Result<()> {
    let root = profile.root();
    let existed = profile.is_initialized();

    profile
        .ensure_layout()
        .with_context(|| format!("failed to create profile at {}", root.display()))?;

    // Keys that are not given keep their stored value.
    let config = ConfigStore::for_profile(profile);
    for (provider, key) in [
        (Provider::OpenAi, openai_key),
        (Provider::Anthropic, anthropic_key),
    ] {
        if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
            config.set_value(provider.api_key_var(), key)?;
        }
    }
    if !config.path().exists() {
        config.save(&config.load())?;
    }

    if existed {
        println!("Downfolio profile updated: {}", root.display());
    } else {
        println!("Downfolio initialized: {}", root.display());
    }
    println!();
    println!("  Templates: {}", profile.templates_dir().display());
    println!("  Jobs:      {}", profile.jobs_dir().display());
    println!("  Output:    {}", profile.output_dir().display());
    println!("  Config:    {}", config.path().display());
    println!();
    for provider in Provider::ALL {
        let status = if config.api_key(provider).is_some() {
            "configured"
        } else {
            "not set"
        };
        println!("  {:<18} {status}", provider.api_key_var());
    }

    Ok(())
}
