use k8s_openapi::api::core::v1::Node;
use log::{debug, warn};

use crate::{
    helpers::{sanitize_name, RequireMetadata},
    DEFAULT_MASTER_BACKEND_PORT, DEFAULT_MASTER_LISTEN_PORT, MASTER_ADDRESS_TYPE,
    MASTER_ROLE_LABEL, MASTER_ROLE_LABEL_VALUE,
};

use super::{DerivationError, GatewayEndpoint, GatewayServer, Mode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSettings {
    /// Port the proxy listens on for control-plane traffic.
    pub listen_port: u16,
    /// API server port on the control-plane nodes.
    pub backend_port: u16,
    /// Treat nodes without the master role label as workers instead of failing.
    pub skip_unlabeled_nodes: bool,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_MASTER_LISTEN_PORT,
            backend_port: DEFAULT_MASTER_BACKEND_PORT,
            skip_unlabeled_nodes: false,
        }
    }
}

/// Builds the control-plane listener, backed by the internal addresses of
/// every node labeled as a master.
pub fn derive_master_endpoint(
    nodes: &[Node],
    settings: &MasterSettings,
) -> Result<GatewayEndpoint, DerivationError> {
    let mut master_endpoint =
        GatewayEndpoint::listening_on("master", settings.listen_port, Mode::Tcp);

    for node in nodes {
        let node_name = node.require_name_or_else(|| {
            DerivationError::MissingObjectMetadata("Node", "name")
        })?;

        let role = node
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(MASTER_ROLE_LABEL));

        match role {
            Some(role) if role == MASTER_ROLE_LABEL_VALUE => {}
            Some(role) => {
                debug!("Node '{node_name}' isn't a master ({MASTER_ROLE_LABEL}={role})");
                continue;
            }
            None if settings.skip_unlabeled_nodes => {
                warn!("Node '{node_name}' is missing the {MASTER_ROLE_LABEL} label, skipping");
                continue;
            }
            None => {
                return Err(DerivationError::MissingMasterLabel {
                    node: node_name.to_owned(),
                })
            }
        }

        let addresses = node
            .status
            .as_ref()
            .and_then(|status| status.addresses.as_deref())
            .ok_or_else(|| DerivationError::missing("Node", node_name, "status.addresses"))?;

        master_endpoint.servers.extend(
            addresses
                .iter()
                .filter(|address| address.type_ == MASTER_ADDRESS_TYPE)
                .map(|address| GatewayServer {
                    name: sanitize_name(node_name),
                    address: address.address.to_owned(),
                    port: settings.backend_port,
                }),
        );
    }

    Ok(master_endpoint)
}
