use itertools::iproduct;
use k8s_openapi::{
    api::core::v1::{EndpointSubset, Endpoints, Service, ServicePort},
    apimachinery::pkg::util::intstr::IntOrString,
};
use log::debug;

use crate::{
    helpers::{pretty_type_name, sanitize_name, RequireMetadata},
    INGRESS_SERVICE_MARKER, LOADBALANCER_SERVICE_TYPE, RESERVED_PORTS,
};

use super::{DerivationError, GatewayEndpoint, GatewayServer, Mode};

/// Correlates every `LoadBalancer` service with its endpoints and produces one
/// gateway endpoint per (matching endpoint, subset, port).
///
/// Output order follows the input order, duplicates included.
pub fn derive_loadbalancer_endpoints(
    services: &[Service],
    endpoints: &[Endpoints],
) -> Result<Vec<GatewayEndpoint>, DerivationError> {
    let mut gateway_endpoints = Vec::new();

    for (service, endpoint) in iproduct!(services, endpoints) {
        if !is_matching_loadbalancer(service, endpoint)? {
            continue;
        }

        let subsets = match endpoint.subsets.as_deref() {
            Some(subsets) if !subsets.is_empty() => subsets,
            _ => continue,
        };
        let service_name = require_name(service)?;
        let ports = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_deref())
            .unwrap_or_default();

        for subset in subsets {
            for port in ports {
                if is_reserved_port(service_name, port.port) {
                    debug!("Skipping reserved port {} of '{service_name}'", port.port);
                    continue;
                }

                gateway_endpoints.push(build_endpoint(service_name, port, subset)?);
            }
        }
    }

    Ok(gateway_endpoints)
}

/// Reserved ports are only proxied for ingress services.
pub fn is_reserved_port(service_name: &str, port: i32) -> bool {
    RESERVED_PORTS.contains(&port) && !service_name.contains(INGRESS_SERVICE_MARKER)
}

fn is_matching_loadbalancer(
    service: &Service,
    endpoint: &Endpoints,
) -> Result<bool, DerivationError> {
    let service_name = require_name(service)?;

    if service_name != require_name(endpoint)? {
        return Ok(false);
    }

    if require_namespace(service)? != require_namespace(endpoint)? {
        return Ok(false);
    }

    let service_type = service
        .spec
        .as_ref()
        .and_then(|spec| spec.type_.as_deref())
        .ok_or_else(|| DerivationError::missing("Service", service_name, "spec.type"))?;

    Ok(service_type == LOADBALANCER_SERVICE_TYPE)
}

fn build_endpoint(
    service_name: &str,
    port: &ServicePort,
    subset: &EndpointSubset,
) -> Result<GatewayEndpoint, DerivationError> {
    let listen_port = u16::try_from(port.port).map_err(|_| {
        DerivationError::invalid("Service", service_name, format!("port {}", port.port))
    })?;
    let mode = port
        .protocol
        .as_deref()
        .ok_or_else(|| DerivationError::missing("Service", service_name, "spec.ports.protocol"))?
        .parse::<Mode>()
        .map_err(|error| DerivationError::invalid("Service", service_name, error.to_string()))?;
    let target_port = get_target_port(service_name, port)?;

    let mut gateway_endpoint =
        GatewayEndpoint::listening_on(&sanitize_name(service_name), listen_port, mode);

    gateway_endpoint.servers = subset
        .addresses
        .iter()
        .flatten()
        .enumerate()
        .map(|(index, address)| GatewayServer {
            name: format!("srv{index}"),
            address: address.ip.to_owned(),
            port: target_port,
        })
        .collect();

    Ok(gateway_endpoint)
}

fn get_target_port(service_name: &str, port: &ServicePort) -> Result<u16, DerivationError> {
    match port.target_port {
        Some(IntOrString::Int(target_port)) => u16::try_from(target_port).map_err(|_| {
            DerivationError::invalid("Service", service_name, format!("target port {target_port}"))
        }),
        Some(IntOrString::String(ref name)) => Err(DerivationError::invalid(
            "Service",
            service_name,
            format!("named target port '{name}' can't be used as a backend port"),
        )),
        None => Err(DerivationError::missing(
            "Service",
            service_name,
            "spec.ports.targetPort",
        )),
    }
}

fn require_name<T: kube::Resource>(resource: &T) -> Result<&str, DerivationError> {
    resource.require_name_or_else(|| {
        DerivationError::MissingObjectMetadata(pretty_type_name::<T>(), "name")
    })
}

fn require_namespace<T: kube::Resource>(resource: &T) -> Result<&str, DerivationError> {
    resource.require_namespace_or_else(|| {
        DerivationError::MissingObjectMetadata(pretty_type_name::<T>(), "namespace")
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{Endpoints, Service};
    use serde_json::{json, Value};

    use crate::gateway::{DerivationError, Mode};

    use super::{derive_loadbalancer_endpoints, is_reserved_port};

    fn service(name: &str, namespace: &str, type_: &str, ports: Value) -> Service {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": name, "namespace": namespace },
            "spec": { "type": type_, "ports": ports },
        }))
        .unwrap()
    }

    fn endpoints(name: &str, namespace: &str, subsets: Value) -> Endpoints {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Endpoints",
            "metadata": { "name": name, "namespace": namespace },
            "subsets": subsets,
        }))
        .unwrap()
    }

    fn tcp_port(port: i32, target_port: i32) -> Value {
        json!({ "port": port, "protocol": "TCP", "targetPort": target_port })
    }

    fn lines(endpoint: &crate::gateway::GatewayEndpoint) -> Vec<String> {
        endpoint.servers.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_port_with_two_addresses_yields_one_endpoint() {
        let services = [service("web", "default", "LoadBalancer", json!([tcp_port(9000, 8080)]))];
        let endpoints = [endpoints(
            "web",
            "default",
            json!([{ "addresses": [{ "ip": "10.0.0.1" }, { "ip": "10.0.0.2" }] }]),
        )];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "web-9000");
        assert_eq!(result[0].bind.to_string(), "0.0.0.0:9000");
        assert_eq!(result[0].mode, Mode::Tcp);
        assert_eq!(result[0].balance.to_string(), "leastconn");
        assert_eq!(
            lines(&result[0]),
            vec!["server srv0 10.0.0.1:8080", "server srv1 10.0.0.2:8080"]
        );
    }

    #[test]
    fn non_loadbalancer_services_are_ignored() {
        let subsets = json!([{ "addresses": [{ "ip": "10.0.0.1" }] }]);
        let services = [
            service("a", "default", "ClusterIP", json!([tcp_port(9000, 9000)])),
            service("b", "default", "NodePort", json!([tcp_port(9000, 9000)])),
        ];
        let endpoints = [
            endpoints("a", "default", subsets.clone()),
            endpoints("b", "default", subsets),
        ];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn name_and_namespace_must_both_match() {
        let subsets = json!([{ "addresses": [{ "ip": "10.0.0.1" }] }]);
        let services = [service("web", "prod", "LoadBalancer", json!([tcp_port(9000, 9000)]))];
        let endpoints = [
            endpoints("web", "staging", subsets.clone()),
            endpoints("api", "prod", subsets),
        ];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn reserved_ports_are_only_kept_for_ingress_services() {
        let ports = json!([tcp_port(80, 8080), tcp_port(443, 8443), tcp_port(7443, 7443), tcp_port(9000, 9000)]);
        let subsets = json!([{ "addresses": [{ "ip": "10.0.0.1" }] }]);
        let services = [
            service("web", "default", "LoadBalancer", ports.clone()),
            service("nginx-ingress", "default", "LoadBalancer", ports),
        ];
        let endpoints = [
            endpoints("web", "default", subsets.clone()),
            endpoints("nginx-ingress", "default", subsets),
        ];

        let names = derive_loadbalancer_endpoints(&services, &endpoints)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            vec![
                "web-9000",
                "nginx-ingress-80",
                "nginx-ingress-443",
                "nginx-ingress-7443",
                "nginx-ingress-9000",
            ]
        );
    }

    #[test]
    fn ingress_marker_is_case_sensitive() {
        assert!(is_reserved_port("Ingress-gw", 443));
        assert!(!is_reserved_port("my-ingress", 443));
        assert!(!is_reserved_port("web", 8443));
    }

    #[test]
    fn every_subset_produces_its_own_endpoint() {
        let services = [service("web", "default", "LoadBalancer", json!([tcp_port(9000, 8080)]))];
        let endpoints = [endpoints(
            "web",
            "default",
            json!([
                { "addresses": [{ "ip": "10.0.0.1" }] },
                { "notReadyAddresses": [{ "ip": "10.0.0.9" }] },
            ]),
        )];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, result[1].name);
        assert_eq!(lines(&result[0]), vec!["server srv0 10.0.0.1:8080"]);
        assert!(result[1].servers.is_empty());
    }

    #[test]
    fn duplicate_matching_endpoints_are_not_merged() {
        let services = [service("web", "default", "LoadBalancer", json!([tcp_port(9000, 8080)]))];
        let subsets = json!([{ "addresses": [{ "ip": "10.0.0.1" }] }]);
        let endpoints = [
            endpoints("web", "default", subsets.clone()),
            endpoints("web", "default", subsets),
        ];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], result[1]);
        assert_eq!(lines(&result[1]), vec!["server srv0 10.0.0.1:8080"]);
    }

    #[test]
    fn endpoints_without_subsets_and_services_without_ports_yield_nothing() {
        let services = [
            service("web", "default", "LoadBalancer", json!([tcp_port(9000, 9000)])),
            service("empty", "default", "LoadBalancer", json!([])),
        ];
        let endpoints: Vec<Endpoints> = vec![
            serde_json::from_value(json!({
                "apiVersion": "v1",
                "kind": "Endpoints",
                "metadata": { "name": "web", "namespace": "default" },
            }))
            .unwrap(),
            endpoints("empty", "default", json!([{ "addresses": [{ "ip": "10.0.0.1" }] }])),
        ];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn names_and_modes_are_normalized() {
        let services = [service(
            "dns server",
            "kube-system",
            "LoadBalancer",
            json!([{ "port": 53, "protocol": "UDP", "targetPort": 5353 }]),
        )];
        let endpoints = [endpoints(
            "dns server",
            "kube-system",
            json!([{ "addresses": [{ "ip": "10.0.0.53" }] }]),
        )];

        let result = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert_eq!(result[0].name, "dns-server-53");
        assert_eq!(result[0].mode.to_string(), "udp");
    }

    #[test]
    fn named_target_ports_are_rejected() {
        let services = [service(
            "web",
            "default",
            "LoadBalancer",
            json!([{ "port": 9000, "protocol": "TCP", "targetPort": "http" }]),
        )];
        let endpoints = [endpoints(
            "web",
            "default",
            json!([{ "addresses": [{ "ip": "10.0.0.1" }] }]),
        )];

        let result = derive_loadbalancer_endpoints(&services, &endpoints);

        assert!(matches!(
            result,
            Err(DerivationError::InvalidObjectData { .. })
        ));
    }

    #[test]
    fn derivation_is_deterministic() {
        let services = [
            service("b", "default", "LoadBalancer", json!([tcp_port(9001, 1), tcp_port(9002, 2)])),
            service("a", "default", "LoadBalancer", json!([tcp_port(9000, 3)])),
        ];
        let endpoints = [
            endpoints("a", "default", json!([{ "addresses": [{ "ip": "10.0.0.2" }, { "ip": "10.0.0.1" }] }])),
            endpoints("b", "default", json!([{ "addresses": [{ "ip": "10.0.0.3" }] }])),
        ];

        let first = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();
        let second = derive_loadbalancer_endpoints(&services, &endpoints).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["b-9001", "b-9002", "a-9000"]
        );
        assert_eq!(
            lines(&first[2]),
            vec!["server srv0 10.0.0.2:3", "server srv1 10.0.0.1:3"]
        );
    }
}
