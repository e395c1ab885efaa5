pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;
pub mod render;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting todo CLI");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let origin = cfg.api_origin();
    let client = api::ApiClient::new(&origin, cfg.http_timeout())
        .with_context(|| format!("failed to build API client for {origin}"))?;
    debug!(origin = %origin, "API client ready");

    let mut store = store::TaskStore::new(client);
    let mut renderer = render::Renderer::new(&cfg)?;
    let command = cli.command.unwrap_or_default();

    commands::dispatch(&mut store, &cfg, &mut renderer, command)?;

    info!("done");
    Ok(())
}
