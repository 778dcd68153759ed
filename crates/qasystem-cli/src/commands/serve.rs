//! Serve command

use crate::app::ServeArgs;
use anyhow::Result;
use qasystem_core::{Config, Context, LocalGenerator};
use qasystem_server::{start_server, AppState};

pub async fn run(args: ServeArgs, config: Config) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let ctx = Context::from_config(&config)?;
    let state = AppState::new(ctx)
        .with_local_generator(LocalGenerator::new(config.generation.excerpt_chars));

    start_server(state, &bind).await
}
