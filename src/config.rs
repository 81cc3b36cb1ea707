use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Agent URL used when nothing else is configured.
pub const DEFAULT_AGENT_URL: &str = "https://api-dev.provue.ai/api/webapp/agent/test-agent";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CHANNEL_CAPACITY: u32 = 16;

/// Legacy variable name for the upstream agent URL.
pub const AGENT_URL_ENV: &str = "WEATHER_AGENT_API_URL";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Upstream agent endpoint
    #[arg(long, env = AGENT_URL_ENV)]
    pub agent_url: Option<String>,

    /// Bounded capacity of the relay channel between upstream reader and response body
    #[arg(long)]
    pub channel_capacity: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Full URL of the streaming agent endpoint.
    pub url: String,
    /// Send `x-mastra-dev-playground: true` with every upstream request.
    pub dev_playground: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                host: DEFAULT_HOST.to_string(),
            },
            agent: AgentConfig {
                url: DEFAULT_AGENT_URL.to_string(),
                dev_playground: true,
            },
            relay: RelayConfig {
                channel_capacity: DEFAULT_CHANNEL_CAPACITY as usize,
            },
            logging: LoggingConfig { json: false },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("agent.url", DEFAULT_AGENT_URL)?
            .set_default("agent.dev_playground", true)?
            .set_default("relay.channel_capacity", i64::from(DEFAULT_CHANNEL_CAPACITY))?
            .set_default("logging.json", false)?;

        // 2. Config file: explicit path is mandatory, ./config.* is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path))),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Prefixed environment, e.g. WEATHER_CHAT_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Legacy agent URL variable. Clap also reads it for --agent-url, so
        // this only matters when the flag layer is bypassed.
        if let Ok(url) = env::var(AGENT_URL_ENV)
            && !url.trim().is_empty()
        {
            builder = builder.set_override("agent.url", url)?;
        }

        // 5. CLI overrides
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(url) = cli.agent_url.filter(|u| !u.trim().is_empty()) {
            builder = builder.set_override("agent.url", url)?;
        }
        if let Some(capacity) = cli.channel_capacity {
            let capacity = i64::try_from(capacity)
                .map_err(|e| config::ConfigError::Message(e.to_string()))?;
            builder = builder.set_override("relay.channel_capacity", capacity)?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.agent.url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "agent.url cannot be empty".to_string(),
            ));
        }
        if url::Url::parse(&self.agent.url).is_err() {
            return Err(config::ConfigError::Message(format!(
                "agent.url is not a valid URL: {}",
                self.agent.url
            )));
        }
        if self.relay.channel_capacity == 0 {
            return Err(config::ConfigError::Message(
                "relay.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
