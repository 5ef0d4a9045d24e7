use clap::{builder::FalseyValueParser, Args, Parser, Subcommand, ValueEnum};
use gateway_config_core::{DEFAULT_MASTER_BACKEND_PORT, DEFAULT_MASTER_LISTEN_PORT};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// API server address (e.g. https://10.0.20.7:6443), kubeconfig is used when unset
    #[arg(long, global = true, env = "GATEWAY_CONFIG_API_HOST")]
    pub api_host: Option<String>,
    /// service account token (raw JWT), required with --api-host
    #[arg(long, global = true, env = "GATEWAY_CONFIG_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    /// don't verify the API server certificate (only applies to --api-host)
    #[arg(long, global = true, env = "GATEWAY_CONFIG_INSECURE_SKIP_TLS_VERIFY", value_parser = FalseyValueParser::new())]
    pub insecure_skip_tls_verify: bool,
    /// override default kubeconfig
    #[arg(long, global = true)]
    pub kube_config: Option<String>,
    /// override default kubeconfig context
    #[arg(long, global = true)]
    pub kube_context: Option<String>,
    /// port the proxy listens on for control-plane traffic
    #[arg(long, global = true, env = "GATEWAY_CONFIG_MASTER_LISTEN_PORT", default_value_t = DEFAULT_MASTER_LISTEN_PORT)]
    pub master_listen_port: u16,
    /// API server port on the control-plane nodes
    #[arg(long, global = true, env = "GATEWAY_CONFIG_MASTER_BACKEND_PORT", default_value_t = DEFAULT_MASTER_BACKEND_PORT)]
    pub master_backend_port: u16,
    /// skip nodes missing the master role label instead of failing
    #[arg(long, global = true, env = "GATEWAY_CONFIG_SKIP_UNLABELED_NODES", value_parser = FalseyValueParser::new())]
    pub skip_unlabeled_nodes: bool,
    /// enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose_logging: bool,
    /// enable trace output (more detailed than verbose, overrides it if present)
    #[arg(long = "trace", global = true)]
    pub trace_logging: bool,
}

impl GlobalArgs {
    pub fn get_log_level(&self) -> LogLevel {
        if self.trace_logging {
            return LogLevel::Trace;
        }

        if self.verbose_logging {
            return LogLevel::Verbose;
        }

        LogLevel::Normal
    }
}

pub enum LogLevel {
    Normal,
    Verbose,
    Trace,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// render the HAProxy configuration (default)
    #[command(alias = "r")]
    Render(RenderArgs),
    /// list the gateway endpoints derived from the cluster
    #[command(alias = "ls")]
    ListEndpoints(ListEndpointsArgs),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Render(RenderArgs::default())
    }
}

#[derive(Debug, Default, Args)]
pub struct RenderArgs {
    /// if set, the command will write the config to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListEndpointsArgs {
    /// output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::TableWithHeaders)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Names,
    Table,
    TableWithHeaders,
    Json,
    JsonPretty,
    Yaml,
}
