pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod persistence;
pub mod planner;
pub mod render;
pub mod session;
pub mod store;
pub mod task;
pub mod views;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::store::TaskStore;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daybook"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  debug!(?cfg, "resolved config");

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let gateway =
    persistence::FileGateway::open(
      &data_dir,
      &cfg.data.key
    )
    .with_context(|| {
      format!(
        "failed to open task storage \
         at {}",
        data_dir.display()
      )
    })?;

  let today = datetime::today();
  let store = if cfg.data.seed {
    persistence::load_or_seed(
      &gateway, today
    )
  } else {
    persistence::load_or_else(
      &gateway,
      TaskStore::new
    )
  };

  let session_file =
    session::SessionFile::new(&data_dir);
  let session =
    session_file.load(today);
  let mut planner =
    planner::Planner::new(
      store,
      gateway,
      session.cursor
    );
  session.apply(&mut planner);

  let renderer =
    render::Renderer::new(&cfg);
  commands::dispatch(
    &mut planner,
    &renderer,
    cli.command,
    today
  )?;

  session_file
    .save(&session::Session::capture(
      &planner
    ))
    .context("failed to save session")?;

  info!("done");
  Ok(())
}
