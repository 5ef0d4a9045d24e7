use std::net::SocketAddr;

use gateway_config_core::gateway::{Balance, GatewayEndpoint, Mode};
use kube::Client;
use serde::Serialize;

use crate::{
    cli::ListEndpointsArgs,
    context::GatewayContext,
    output::{CliPrint, TableCellOption, TableCellSlice, TableOutputRow},
};

pub async fn list_endpoints(
    args: ListEndpointsArgs,
    context: &GatewayContext,
    client: Client,
) -> anyhow::Result<()> {
    let rules = context.derive_rules(&client).await?;
    let endpoint_views = std::iter::once(&rules.master)
        .chain(&rules.services)
        .map(|e| e.into())
        .collect::<Vec<EndpointView>>();

    endpoint_views.print(args.output)?;

    Ok(())
}

#[derive(Serialize)]
struct EndpointView<'a> {
    pub name: &'a str,
    pub bind: SocketAddr,
    pub mode: Mode,
    pub balance: Balance,
    pub servers: Vec<String>,
}

impl<'a> From<&'a GatewayEndpoint> for EndpointView<'a> {
    fn from(value: &'a GatewayEndpoint) -> Self {
        EndpointView {
            name: &value.name,
            bind: value.bind,
            mode: value.mode,
            balance: value.balance,
            servers: value
                .servers
                .iter()
                .map(|s| format!("{}:{}", s.address, s.port))
                .collect(),
        }
    }
}

impl<'a> TableOutputRow for EndpointView<'a> {
    fn get_name(&self) -> String {
        self.name.to_owned()
    }

    fn get_column_names() -> Vec<&'static str> {
        vec!["name", "bind", "mode", "balance", "servers"]
    }

    fn get_row(&self) -> Vec<String> {
        let servers = (!self.servers.is_empty()).then(|| TableCellSlice::from(self.servers.as_slice()));

        vec![
            self.name.to_owned(),
            self.bind.to_string(),
            self.mode.to_string(),
            self.balance.to_string(),
            TableCellOption::from(servers).to_string(),
        ]
    }
}
