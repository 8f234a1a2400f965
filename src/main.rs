mod cli;
mod commands;
mod config;
mod display;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use reconcile::HttpGateway;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub project: PathBuf,
    api_url: Option<String>,
    token: Option<String>,
}

impl Context {
    /// Resolve API settings for commands that talk to the API.
    pub fn config(&self) -> Result<Config> {
        Config::resolve(&self.project, self.api_url.clone(), self.token.clone())
    }

    pub fn gateway(&self) -> Result<HttpGateway> {
        let config = self.config()?;
        log::debug!("Using API at {}", config.api_url);
        Ok(HttpGateway::new(&config.gateway()))
    }
}

fn main() {
    if let Err(e) = run() {
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        project: cli.project,
        api_url: cli.api_url,
        token: cli.token,
    };

    match cli.command {
        Command::Preview(args) => commands::deploy::preview(&ctx, &args),
        Command::Deploy(args) => commands::deploy::run(&ctx, &args),
        Command::Destroy(args) => commands::destroy::run(&ctx, &args),
        Command::Functions(cmd) => commands::functions::run(&ctx, cmd),
        Command::Webhooks(cmd) => commands::webhooks::run(&ctx, cmd),
        Command::Subgraphs(cmd) => commands::subgraphs::run(&ctx, cmd),
        Command::Convert { value } => commands::convert::run(&value),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sendblocks", &mut io::stdout());
            Ok(())
        }
    }
}
