use anyhow::{anyhow, Context};
use gateway_config_core::{
    gateway::{derive_gateway_rules, masters::MasterSettings, GatewayRules},
    kubernetes::{
        operations::{bearer_token, create_local_client, create_token_client, ApiAccess},
        ClusterSnapshot,
    },
};
use kube::Client;
use log::{debug, info};

use crate::cli::GlobalArgs;

/// Settings resolved once at startup and shared by every command.
pub struct GatewayContext {
    api_access: Option<ApiAccess>,
    kube_config: Option<String>,
    kube_context: Option<String>,
    master_settings: MasterSettings,
}

impl GatewayContext {
    pub fn new(global_args: &GlobalArgs) -> anyhow::Result<Self> {
        let api_access = match (&global_args.api_host, &global_args.api_token) {
            (Some(host), Some(token)) => Some(ApiAccess {
                host: host.to_owned(),
                token: bearer_token(token),
                verify_tls: !global_args.insecure_skip_tls_verify,
            }),
            (Some(_), None) => {
                return Err(anyhow!("An API token must be provided together with the API host!"))
            }
            (None, Some(_)) => {
                return Err(anyhow!("An API host must be provided together with the API token!"))
            }
            (None, None) => None,
        };

        let master_settings = MasterSettings {
            listen_port: global_args.master_listen_port,
            backend_port: global_args.master_backend_port,
            skip_unlabeled_nodes: global_args.skip_unlabeled_nodes,
        };

        Ok(Self {
            api_access,
            kube_config: global_args.kube_config.to_owned(),
            kube_context: global_args.kube_context.to_owned(),
            master_settings,
        })
    }

    pub fn master_settings(&self) -> &MasterSettings {
        &self.master_settings
    }

    pub async fn create_client(&self) -> anyhow::Result<Client> {
        match self.api_access {
            Some(ref access) => {
                debug!("Connecting to {} with a bearer token...", access.host);
                create_token_client(access)
            }
            None => {
                debug!("Connecting with kubeconfig credentials...");
                create_local_client(&self.kube_config, &self.kube_context).await
            }
        }
    }

    pub async fn derive_rules(&self, client: &Client) -> anyhow::Result<GatewayRules> {
        let snapshot = ClusterSnapshot::fetch(client)
            .await
            .context("Couldn't retrieve resources from the cluster!")?;
        let rules = derive_gateway_rules(&snapshot, self.master_settings())
            .context("Couldn't derive gateway rules from the cluster resources!")?;

        info!(
            "Derived {} service listeners and {} control-plane backends",
            rules.services.len(),
            rules.master.servers.len()
        );

        Ok(rules)
    }
}
