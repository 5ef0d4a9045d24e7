use std::fmt::Write;

use crate::gateway::GatewayEndpoint;

const HAPROXY_PREAMBLE: &str = "global
    log /dev/log local0
    log /dev/log local1 notice
    maxconn 4096
    daemon

defaults
    log global
    option dontlognull
    timeout connect 5s
    timeout client 1m
    timeout server 1m
";

/// Renders the full HAProxy configuration: the fixed preamble, the
/// control-plane listener and then every service listener in order.
pub fn render_haproxy_config(services: &[GatewayEndpoint], master: &GatewayEndpoint) -> String {
    let mut config = String::from(HAPROXY_PREAMBLE);

    for endpoint in std::iter::once(master).chain(services) {
        config.push('\n');
        config.push_str(&listen_section_template(endpoint));
    }

    config
}

pub fn listen_section_template(endpoint: &GatewayEndpoint) -> String {
    let mut section = format!(
"listen {}
    bind {}
    mode {}
    balance {}
",
        endpoint.name, endpoint.bind, endpoint.mode, endpoint.balance
    );

    for server in &endpoint.servers {
        // writing into a String can't fail
        let _ = writeln!(section, "    {server}");
    }

    section
}
