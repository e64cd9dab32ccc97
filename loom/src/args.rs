use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use loom_config::Config;
use url::Url;

/// Loom inference bridge
#[derive(Debug, Parser)]
#[command(name = "loom", about = "Structured reasoning bridge over an LLM gateway")]
pub struct Args {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, env = "LOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "LOOM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the LM gateway base URL
    #[arg(long, env = "LOOM_GATEWAY_URL")]
    pub gateway_url: Option<Url>,

    /// Override the default model
    #[arg(long, env = "LOOM_DEFAULT_MODEL")]
    pub default_model: Option<String>,
}

impl Args {
    /// Load the configuration file, if any, and apply overrides
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.server.listen_address = Some(listen);
        }
        if let Some(url) = &self.gateway_url {
            config.gateway.base_url = url.clone();
        }
        if let Some(model) = &self.default_model {
            config.gateway.default_model.clone_from(model);
        }

        config.validate()?;
        Ok(config)
    }
}
