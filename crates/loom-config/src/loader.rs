use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_gateway()?;
        self.validate_engine()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_gateway(&self) -> anyhow::Result<()> {
        let gateway = &self.gateway;

        if !matches!(gateway.base_url.scheme(), "http" | "https") {
            anyhow::bail!("gateway.base_url must use http or https, got '{}'", gateway.base_url.scheme());
        }

        if gateway.default_model.trim().is_empty() {
            anyhow::bail!("gateway.default_model must not be empty");
        }

        if !(0.0..=2.0).contains(&gateway.temperature) {
            anyhow::bail!("gateway.temperature must be between 0.0 and 2.0");
        }

        Ok(())
    }

    fn validate_engine(&self) -> anyhow::Result<()> {
        if self.engine.max_tool_iterations == 0 {
            anyhow::bail!("engine.max_tool_iterations must be at least 1");
        }
        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        if !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }
        Ok(())
    }
}
