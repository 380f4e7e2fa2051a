pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod driver;
pub mod form;
pub mod render;
pub mod screen;
pub mod shell;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting staffdesk"
    );
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides.into_iter().chain(
            cli.rc_overrides
                .into_iter()
                .map(|kv| (kv.key, kv.value)),
        ),
    );

    let mut renderer = render::Renderer::stdout(&cfg)?;
    let inv = cli::Invocation::parse(&cfg, cli.rest)?;

    let backend =
        backend::HttpBackend::from_config(&cfg).context("failed to set up the API client")?;
    let mut ws = driver::Workspace::new(backend);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(async {
        if inv.command == "shell" {
            shell::run(&mut ws, &cfg, &mut renderer, io::stdin().lock()).await
        } else {
            commands::dispatch(&mut ws, &mut renderer, &mut commands::StdinConfirm, inv).await
        }
    })?;

    info!("done");
    Ok(())
}
