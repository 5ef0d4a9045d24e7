use anyhow::Context;
use clap::Parser;
use cli::{Commands, GlobalArgs, LogLevel};
use commands::{list_endpoints::list_endpoints, render::render};
use context::GatewayContext;
use env_logger::Target;
use log::LevelFilter;

use crate::cli::Cli;

mod cli;
mod commands;
mod context;
mod output;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    configure_logging(&cli.global_args);

    let context = GatewayContext::new(&cli.global_args)?;
    let client = context
        .create_client()
        .await
        .context("Couldn't initialize k8s API client!")?;

    match cli.command.unwrap_or_default() {
        Commands::Render(args) => render(args, &context, client).await?,
        Commands::ListEndpoints(args) => list_endpoints(args, &context, client).await?,
    }

    Ok(())
}

fn configure_logging(global_args: &GlobalArgs) {
    let log_level = global_args.get_log_level();
    let mut logger = env_logger::builder();

    // stdout is reserved for the rendered configuration
    logger
        .format_timestamp(None)
        .format_module_path(matches!(log_level, LogLevel::Trace))
        .format_target(false)
        .format_level(false)
        .target(Target::Stderr);

    match log_level {
        LogLevel::Normal => logger.filter(Some("gateway_config"), LevelFilter::Info),
        LogLevel::Verbose => logger.filter(Some("gateway_config"), LevelFilter::Debug),
        LogLevel::Trace => logger.filter(None, LevelFilter::Debug),
    };

    logger.init();
}
