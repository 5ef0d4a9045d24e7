use std::fmt::Debug;

use anyhow::Context;
use http::{header, HeaderValue, Uri};
use k8s_openapi::serde::de::DeserializeOwned;
use kube::{
    api::ListParams,
    client::ClientBuilder,
    config::{AuthInfo, KubeConfigOptions, Kubeconfig},
    Api, Client, Config, Resource,
};
use log::debug;
use secrecy::SecretString;
use thiserror::Error;
use tower_http::set_header::{SetRequestHeader, SetRequestHeaderLayer};

use crate::helpers::pretty_type_name;

pub const USER_AGENT: &str = "gateway-config";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Cluster API responded with {} ({})", .code, .message)]
    Api { code: u16, message: String },
    #[error("Couldn't reach the cluster API! Reason: {}", .0)]
    Transport(kube::Error),
    #[error("Cluster API returned malformed {} resources! Reason: {}", .kind, .source)]
    MalformedResource {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl FetchError {
    fn from_kube<K>(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => FetchError::Api {
                code: response.code,
                message: response.message,
            },
            kube::Error::SerdeError(source) => FetchError::MalformedResource {
                kind: pretty_type_name::<K>(),
                source,
            },
            error => FetchError::Transport(error),
        }
    }
}

/// Direct access to an API server with a service account token.
#[derive(Debug, Clone)]
pub struct ApiAccess {
    pub host: String,
    /// Raw JWT, sent as `Authorization: Bearer <token>`.
    pub token: SecretString,
    pub verify_tls: bool,
}

pub async fn create_local_client(
    config_path: &Option<String>,
    context_name: &Option<String>,
) -> anyhow::Result<Client> {
    let config_options = KubeConfigOptions {
        context: context_name.to_owned(),
        ..Default::default()
    };

    let config = match config_path {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &config_options).await?
        }
        None => Config::from_kubeconfig(&config_options).await?,
    };

    let client = with_user_agent(ClientBuilder::try_from(config)?).build();

    Ok(client)
}

pub fn create_token_client(access: &ApiAccess) -> anyhow::Result<Client> {
    let config = create_token_config(access)?;
    let client = with_user_agent(ClientBuilder::try_from(config)?).build();

    Ok(client)
}

/// Tags every API request with `User-Agent: gateway-config`.
pub fn with_user_agent<Svc>(
    builder: ClientBuilder<Svc>,
) -> ClientBuilder<SetRequestHeader<Svc, HeaderValue>> {
    builder.with_layer(&SetRequestHeaderLayer::overriding(
        header::USER_AGENT,
        HeaderValue::from_static(USER_AGENT),
    ))
}

pub fn create_token_config(access: &ApiAccess) -> anyhow::Result<Config> {
    let host = if access.host.contains("://") {
        access.host.to_owned()
    } else {
        format!("https://{}", access.host)
    };
    let cluster_url = host
        .parse::<Uri>()
        .context(format!("Invalid API host '{}'!", access.host))?;

    debug!(
        "Using API server {cluster_url} (TLS verification: {})",
        access.verify_tls
    );

    let mut config = Config::new(cluster_url);
    config.accept_invalid_certs = !access.verify_tls;
    config.auth_info = AuthInfo {
        token: Some(access.token.clone()),
        ..Default::default()
    };

    Ok(config)
}

/// Lists every `K` across all namespaces (`GET /api/v1/<kind>`).
pub async fn list_cluster_resources<K>(client: &Client) -> Result<Vec<K>, FetchError>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let api: Api<K> = Api::all(client.clone());
    let list = api
        .list(&ListParams::default())
        .await
        .map_err(FetchError::from_kube::<K>)?;

    debug!("Retrieved {} {} resources", list.items.len(), pretty_type_name::<K>());

    Ok(list.items)
}

pub fn bearer_token(token: &str) -> SecretString {
    SecretString::new(token.to_owned())
}
