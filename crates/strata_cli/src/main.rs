//! Strata CLI
//!
//! Resolve a platform hierarchy for a given environment, or list the
//! registered platforms.
//!
//! ```text
//! strata resolve --user-agent "Mozilla/5.0 (iPad; CPU OS 8_4 like Mac OS X)" --width 768 --height 1024
//! strata resolve --global cordova --platform android --json
//! strata list --config strata.toml
//! ```

mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strata_platform::{
    Dimensions, ImmediateReady, Platform, PlatformConfig, PlatformContext, StaticDimensions,
};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about = "Strata platform resolution tool", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the active platforms for an environment
    Resolve {
        /// User agent string
        #[arg(short = 'u', long, default_value = "")]
        user_agent: String,

        /// Page URL; its query string may force a platform
        #[arg(long, default_value = "")]
        url: String,

        /// navigator.platform value
        #[arg(long, default_value = "")]
        navigator_platform: String,

        /// Pretend to be this platform
        #[arg(short, long)]
        platform: Option<String>,

        /// Host globals present in the environment (e.g. cordova)
        #[arg(short, long = "global")]
        globals: Vec<String>,

        /// Viewport width
        #[arg(long, default_value_t = 0.0)]
        width: f32,

        /// Viewport height
        #[arg(long, default_value_t = 0.0)]
        height: f32,

        /// Platform configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered platforms
    List {
        /// Platform configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve {
            user_agent,
            url,
            navigator_platform,
            platform,
            globals,
            width,
            height,
            config,
            json,
        } => {
            let mut ctx = PlatformContext::new()
                .with_url(url)
                .with_user_agent(user_agent)
                .with_navigator_platform(navigator_platform)
                .with_dimensions(StaticDimensions(Dimensions::new(width, height)));
            for global in globals {
                ctx = ctx.with_global(global);
            }
            cmd_resolve(ctx, platform.as_deref(), config.as_deref(), json)
        }
        Commands::List { config } => cmd_list(config.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PlatformConfig> {
    match path {
        Some(path) => {
            debug!("Loading platform config from {}", path.display());
            PlatformConfig::from_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(PlatformConfig::default()),
    }
}

fn cmd_resolve(
    ctx: PlatformContext,
    platform_override: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut platform: Platform = load_config(config)?
        .into_platform(ctx)
        .context("Failed to build platform registry")?;

    platform
        .load(platform_override)
        .context("Failed to resolve platforms")?;

    platform.prepare_ready(&ImmediateReady);
    let snapshot = pollster::block_on(platform.ready()).context("Platform never became ready")?;
    info!("Resolved {} platforms", snapshot.platforms.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", report::snapshot(&snapshot));
    }
    Ok(())
}

fn cmd_list(config: Option<&Path>) -> Result<()> {
    let registry = load_config(config)?
        .into_registry()
        .context("Failed to build platform registry")?;
    registry
        .validate()
        .context("Platform registry is misconfigured")?;

    print!("{}", report::registry(&registry));
    Ok(())
}
