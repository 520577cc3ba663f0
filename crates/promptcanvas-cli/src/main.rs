//! CLI binary for generating images from a prompt.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptcanvas_image::{ProviderKind, ServiceConfig, Session, SubmitOutcome};
use promptcanvas_types::GenerationStatus;

#[derive(Parser)]
#[command(name = "promptcanvas", version, about = "Generate images from text prompts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one image from a prompt
    Generate {
        /// Text description of the image
        prompt: String,

        /// Don't call the image service; return a synthetic result
        #[arg(long)]
        dry_run: bool,

        /// Give up on the service after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Image model to request (e.g. dall-e-3)
        #[arg(long)]
        model: Option<String>,

        /// Image size to request (e.g. 1024x1024)
        #[arg(long)]
        size: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved service configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let directive = log_directive(cli.verbose, std::env::var("RUST_LOG").ok());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            prompt,
            dry_run,
            timeout_secs,
            model,
            size,
            json,
        } => {
            let overrides = Overrides {
                dry_run,
                timeout_secs,
                model,
                size,
            };
            cmd_generate(prompt, overrides, json).await?;
        }
        Commands::Config => {
            cmd_config()?;
        }
    }

    Ok(())
}

/// `-v` forces `debug`; otherwise `RUST_LOG` wins over the `info` default.
fn log_directive(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return "debug".to_string();
    }
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Command-line settings that take precedence over the environment.
#[derive(Debug, Default)]
struct Overrides {
    dry_run: bool,
    timeout_secs: Option<u64>,
    model: Option<String>,
    size: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut ServiceConfig) {
        if self.dry_run {
            config.provider = ProviderKind::DryRun;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(model) = self.model {
            config.model = Some(model);
        }
        if let Some(size) = self.size {
            config.size = size;
        }
    }
}

/// Environment config with `overrides` applied. `--dry-run` works even when
/// the environment names a provider that is not usable.
fn resolve_config(overrides: Overrides) -> anyhow::Result<ServiceConfig> {
    let mut config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) if overrides.dry_run => {
            tracing::debug!("ignoring environment config for dry run: {e}");
            ServiceConfig::default()
        }
        Err(e) => return Err(e).context("invalid image service configuration"),
    };
    overrides.apply(&mut config);
    Ok(config)
}

async fn cmd_generate(prompt: String, overrides: Overrides, json: bool) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let client = config.build_client()?;
    let session = Session::new(client, config.policy.clone());

    session.set_prompt(prompt).await;
    match session.generate_image().await {
        SubmitOutcome::Rejected(e) => bail!("prompt not submitted: {e}"),
        SubmitOutcome::Discarded => bail!("generation was cancelled"),
        SubmitOutcome::Finished(status) => print_status(&status, json),
    }
}

fn print_status(status: &GenerationStatus, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    }

    match status {
        GenerationStatus::Succeeded { artifact } => {
            if !json {
                println!("Generated: {}", artifact.id);
                println!("Provider:  {} ({})", artifact.provider, artifact.model);
                match artifact.url {
                    Some(ref url) => println!("URL:       {url}"),
                    None => println!("URL:       (none)"),
                }
                if let Some(ref revised) = artifact.revised_prompt {
                    println!("Revised:   {revised}");
                }
            }
            Ok(())
        }
        GenerationStatus::Failed { error } => {
            let hint = if error.retryable {
                " (retrying may help)"
            } else {
                ""
            };
            bail!("generation failed: {}{hint}", error.message)
        }
        other => bail!("unexpected generation status: {}", other.label()),
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid image service configuration")?;
    let client = config.build_client()?;

    println!("Provider:        {}", config.provider);
    println!(
        "Model:           {}",
        config.model.as_deref().unwrap_or("(adapter default)")
    );
    println!("Size:            {}", config.size);
    println!("Timeout:         {}s", config.timeout.as_secs());
    println!("Max prompt:      {} chars", config.policy.max_chars);
    println!("Clear on success: {}", config.policy.clear_on_success);
    println!("Registered:      {}", client.provider_names().join(", "));
    Ok(())
}
