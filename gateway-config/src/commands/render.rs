use std::fs;

use anyhow::Context;
use gateway_config_core::templates::render_haproxy_config;
use kube::Client;
use log::info;

use crate::{cli::RenderArgs, context::GatewayContext};

pub async fn render(args: RenderArgs, context: &GatewayContext, client: Client) -> anyhow::Result<()> {
    let rules = context.derive_rules(&client).await?;
    let config = render_haproxy_config(&rules.services, &rules.master);

    if let Some(output) = args.output {
        fs::write(&output, config).context(format!("Couldn't write the output to {output}"))?;

        info!("Configuration written to {output}");
    } else {
        print!("{config}");
    }

    Ok(())
}
