use k8s_openapi::api::core::v1::{Endpoints, Node, Service};
use kube::Client;
use log::info;

use self::operations::{list_cluster_resources, FetchError};

pub mod operations;

/// Everything a single render needs from the cluster, read once per run.
#[derive(Debug, Default, Clone)]
pub struct ClusterSnapshot {
    pub services: Vec<Service>,
    pub endpoints: Vec<Endpoints>,
    pub nodes: Vec<Node>,
}

impl ClusterSnapshot {
    pub async fn fetch(client: &Client) -> Result<Self, FetchError> {
        info!("Fetching services...");
        let services = list_cluster_resources::<Service>(client).await?;

        info!("Fetching endpoints...");
        let endpoints = list_cluster_resources::<Endpoints>(client).await?;

        info!("Fetching nodes...");
        let nodes = list_cluster_resources::<Node>(client).await?;

        Ok(Self {
            services,
            endpoints,
            nodes,
        })
    }
}
