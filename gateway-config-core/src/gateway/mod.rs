use std::{
    fmt::Display,
    net::{Ipv4Addr, SocketAddr},
    str::FromStr,
};

use serde::Serialize;
use serde_with::SerializeDisplay;
use thiserror::Error;

use crate::kubernetes::ClusterSnapshot;

use self::{
    loadbalancers::derive_loadbalancer_endpoints,
    masters::{derive_master_endpoint, MasterSettings},
};

pub mod error;
pub mod loadbalancers;
pub mod masters;

pub use error::DerivationError;

/// Rules for a single render: the control-plane listener and the service
/// listeners, in cluster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRules {
    pub master: GatewayEndpoint,
    pub services: Vec<GatewayEndpoint>,
}

pub fn derive_gateway_rules(
    snapshot: &ClusterSnapshot,
    settings: &MasterSettings,
) -> Result<GatewayRules, DerivationError> {
    let services = derive_loadbalancer_endpoints(&snapshot.services, &snapshot.endpoints)?;
    let master = derive_master_endpoint(&snapshot.nodes, settings)?;

    Ok(GatewayRules { master, services })
}

/// A single HAProxy `listen` section: where to bind, how to balance and
/// which backends to forward to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayEndpoint {
    pub name: String,
    pub bind: SocketAddr,
    pub mode: Mode,
    pub balance: Balance,
    pub servers: Vec<GatewayServer>,
}

impl GatewayEndpoint {
    /// Creates an endpoint listening on all interfaces, named `<prefix>-<port>`.
    pub fn listening_on(prefix: &str, port: u16, mode: Mode) -> Self {
        Self {
            name: format!("{prefix}-{port}"),
            bind: SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), port),
            mode,
            balance: Balance::default(),
            servers: Vec::new(),
        }
    }
}

/// Backend entry, displayed as `server <name> <address>:<port>`.
#[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay)]
pub struct GatewayServer {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl Display for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server {} {}:{}", self.name, self.address, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Tcp,
    Http,
    Udp,
    Sctp,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::Tcp => "tcp",
            Mode::Http => "http",
            Mode::Udp => "udp",
            Mode::Sctp => "sctp",
        })
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Unknown proxy mode '{}'!", .0)]
pub struct UnknownModeError(pub String);

impl FromStr for Mode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Mode::Tcp),
            "http" => Ok(Mode::Http),
            "udp" => Ok(Mode::Udp),
            "sctp" => Ok(Mode::Sctp),
            _ => Err(UnknownModeError(s.to_owned())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Balance {
    #[default]
    LeastConn,
}

impl Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Balance::LeastConn => "leastconn",
        })
    }
}
