use std::io::{self, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, CustomUserError, Text, validator::Validation};
use locus_core::{
    Config, ProviderConfig, ProviderId, ScreenState,
    provider::{ipapi, provider_from_config},
};

use crate::{
    consent::ConsentPrompt,
    render::TerminalRenderer,
    session::{TerminalRetry, run_screen},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "locus", version, about = "Show where you are on a map")]
pub struct Cli {
    /// Provider to use instead of the configured default ("ipapi" or "fixed").
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Print the obtained location as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Grant location access without asking.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Locate this device and show it on a map (default).
    Show,

    /// Configure settings for a specific provider.
    Configure {
        /// Provider short name, e.g. "ipapi" or "fixed".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Some(Command::Configure { ref provider }) => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(&mut config, id)
            }
            Some(Command::Show) | None => self.show(&config).await,
        }
    }

    async fn show(&self, config: &Config) -> Result<()> {
        let id = match &self.provider {
            Some(name) => ProviderId::try_from(name.as_str())?,
            None => config.default_provider_id()?,
        };
        tracing::debug!(provider = %id, "using location provider");

        let mut provider = provider_from_config(id, config)?;
        if !(self.yes || config.remember_consent) {
            provider = Box::new(ConsentPrompt::new(provider));
        }

        // Keep stdout clean for the JSON document.
        let out: Box<dyn Write> =
            if self.json { Box::new(io::stderr()) } else { Box::new(io::stdout()) };
        let mut renderer = TerminalRenderer::new(out);

        let last = run_screen(provider, &mut renderer, &mut TerminalRetry).await?;

        if let (true, ScreenState::Ready(sample)) = (self.json, &last) {
            println!("{}", serde_json::to_string_pretty(sample)?);
        }

        Ok(())
    }
}

fn configure(config: &mut Config, id: ProviderId) -> Result<()> {
    let mut section = config.provider_config(id).cloned().unwrap_or_default();

    match id {
        ProviderId::IpApi => {
            let endpoint = Text::new("Lookup endpoint:")
                .with_default(section.endpoint.as_deref().unwrap_or(ipapi::DEFAULT_ENDPOINT))
                .prompt()?;
            let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
                .with_default(section.timeout_secs.unwrap_or(ipapi::DEFAULT_TIMEOUT.as_secs()))
                .with_error_message("Please type a whole number of seconds")
                .prompt()?;

            section.endpoint = Some(endpoint);
            section.timeout_secs = Some(timeout_secs);
        }
        ProviderId::Fixed => {
            let latitude = CustomType::<f64>::new("Latitude:")
                .with_validator(|value: &f64| -> Result<Validation, CustomUserError> {
                    Ok(if (-90.0..=90.0).contains(value) {
                        Validation::Valid
                    } else {
                        Validation::Invalid("Latitude must be between -90 and 90".into())
                    })
                })
                .prompt()?;
            let longitude = CustomType::<f64>::new("Longitude:")
                .with_validator(|value: &f64| -> Result<Validation, CustomUserError> {
                    Ok(if (-180.0..=180.0).contains(value) {
                        Validation::Valid
                    } else {
                        Validation::Invalid("Longitude must be between -180 and 180".into())
                    })
                })
                .prompt()?;
            let grant = Confirm::new("Grant location permission when asked?")
                .with_default(section.grant_permission.unwrap_or(true))
                .prompt()?;

            section = ProviderConfig {
                grant_permission: Some(grant),
                ..ProviderConfig::fixed(latitude, longitude)
            };
        }
    }

    config.upsert_provider(id, section);

    if config.default_provider_id()? != id
        && Confirm::new(&format!("Use '{id}' as the default provider?")).with_default(true).prompt()?
    {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Saved {id} settings to {}", Config::config_file_path()?.display());

    Ok(())
}
