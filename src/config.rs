use anyhow::{Context, Result};
use clap_serde_derive::ClapSerde;

use crate::pipeline::loader::DEFAULT_MODEL_PATH;

pub const DEFAULT_CONFIG_FILE: &str = "SalaryPredictor.toml";
pub const DEFAULT_TEMPLATE_PATH: &str = "templates/index.html";

#[derive(ClapSerde, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub address: String,

    /// The port the listener binds to
    #[default(5000)]
    #[arg(short, long, env)]
    pub port: u16,

    /// Path to the serialized salary pipeline, loaded once at startup
    #[default(DEFAULT_MODEL_PATH.to_string())]
    #[arg(short, long, env)]
    pub model_path: String,

    /// Path to the HTML page served on `/`
    #[default(DEFAULT_TEMPLATE_PATH.to_string())]
    #[arg(short, long, env)]
    pub template_path: String,

    /// OTLP collector endpoint, telemetry export is disabled when empty
    #[default(String::new())]
    #[arg(long, env)]
    pub otel_endpoint: String,

    /// Keep logging to the console while exporting to an OTLP collector
    #[default(false)]
    #[arg(long, env)]
    pub console: bool,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&str)
    }

    pub fn from_toml_str(str: &str) -> Result<Self> {
        let opt: <Config as ClapSerde>::Opt =
            toml::from_str(str).context("Invalid configuration file")?;
        Ok(Config::from(opt))
    }

    pub fn otel_endpoint(&self) -> Option<&str> {
        Some(self.otel_endpoint.trim()).filter(|endpoint| !endpoint.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_layout() {
        let config = Config::default();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.model_path, DEFAULT_MODEL_PATH);
        assert_eq!(config.template_path, DEFAULT_TEMPLATE_PATH);
        assert_eq!(config.otel_endpoint(), None);
        assert!(!config.console);
    }

    #[test]
    fn toml_overrides_only_the_given_keys() {
        let config = Config::from_toml_str(
            r#"
            port = 8080
            model_path = "/srv/models/salary.json"
            otel_endpoint = "http://collector:4317"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model_path, "/srv/models/salary.json");
        assert_eq!(config.otel_endpoint(), Some("http://collector:4317"));
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.template_path, DEFAULT_TEMPLATE_PATH);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml_str("port = \"not a number\"").is_err());
    }
}
