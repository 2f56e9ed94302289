//! halycon-gen
//!
//! Fetches the Selling Partner API models, converts them to OpenAPI 3 and
//! generates a Go client package for each one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use config::Config;
use halycon_cli::{describe_models, init_config, run, Result, RunOptions};

/// Command-line interface for halycon-gen.
#[derive(Parser, Debug)]
#[command(name = "halycon-gen", about = "Generate SP-API clients from upstream models", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Commands>,
    /// Configuration file (defaults to the user config dir, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter, e.g. `info` or `pipeline=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the generation pipeline (default)
    Run(RunArgs),
    /// List the models that would be generated
    List,
    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to --config, then the user config dir)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Only generate this model (source file name); repeatable
    #[arg(long = "model")]
    models: Vec<String>,
    /// Keep going after a model fails
    #[arg(long)]
    isolate: bool,
    /// Do not install the generator if it is missing
    #[arg(long)]
    skip_install: bool,
    /// Skip the final dependency tidy
    #[arg(long)]
    skip_tidy: bool,
    /// Workspace root
    #[arg(long)]
    root: Option<PathBuf>,
    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        RunOptions {
            models: args.models,
            isolate: args.isolate,
            skip_install: args.skip_install,
            skip_tidy: args.skip_tidy,
            root: args.root,
            report: args.report,
        }
    }
}

fn load_config(path: Option<&Path>, log_level: Option<&str>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }
    Ok(config)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { cmd, config: config_path, log_level } = cli;

    match cmd.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::InitConfig { path, force } => {
            let target = match path.or(config_path) {
                Some(target) => target,
                None => Config::default_path()?,
            };
            init_config(&target, force)?;
            println!("Configuration written to {}", target.display());
        }
        Commands::List => {
            let config = load_config(config_path.as_deref(), log_level.as_deref())?;
            for line in describe_models(&config)? {
                println!("{}", line);
            }
        }
        Commands::Run(args) => {
            let mut config = load_config(config_path.as_deref(), log_level.as_deref())?;
            let options = RunOptions::from(args);
            options.apply(&mut config);
            logging::init(&config.logging.level, config.logging.file.as_deref())?;
            run(&config, &options).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match dispatch(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
