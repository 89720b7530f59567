//! phrasemine CLI
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use phrasemine::Cli;
use phrasemine_core::cancel::CancelToken;
use phrasemine_core::config::ConfigLoader;
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;

    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let (config, config_sources) = loader.load().context("failed to load configuration")?;

    let filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    observability::init(filter)?;

    debug!(
        config_file = ?config_sources.primary_file(),
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        "CLI initialized"
    );

    // A tripped token turns Ctrl+C into a graceful stop: the engines return
    // partial results and the run exits 0.
    let stop = CancelToken::new();
    {
        let handler = stop.clone();
        ctrlc::set_handler(move || handler.cancel())
            .context("failed to register interrupt handler")?;
    }

    let result = phrasemine::run::run(cli, &config, &stop);
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
