pub mod gateway;
pub mod helpers;
pub mod kubernetes;
pub mod templates;

pub const MASTER_ROLE_LABEL: &str = "node-role.kubernetes.io/master";
pub const MASTER_ROLE_LABEL_VALUE: &str = "true";
pub const MASTER_ADDRESS_TYPE: &str = "InternalIP";

pub const LOADBALANCER_SERVICE_TYPE: &str = "LoadBalancer";
pub const INGRESS_SERVICE_MARKER: &str = "ingress";
pub const RESERVED_PORTS: [i32; 3] = [80, 443, 7443];

pub const DEFAULT_MASTER_LISTEN_PORT: u16 = 7443;
pub const DEFAULT_MASTER_BACKEND_PORT: u16 = 6443;
