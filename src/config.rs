use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepcamConfig {
    pub service: ServiceConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// IP address to bind to
    #[serde(default = "default_service_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_service_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    /// Pretty-print JSON reports
    #[serde(default = "default_report_pretty")]
    pub pretty: bool,
}

impl RepcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("repcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("service.ip", default_service_ip())?
            .set_default("service.port", default_service_port() as i64)?
            .set_default("report.pretty", default_report_pretty())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with REPCAM_ prefix
            .add_source(Environment::with_prefix("REPCAM").separator("_"))
            .build()?;

        let config: RepcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.ip.is_empty() {
            return Err(ConfigError::Message(
                "Service bind address must not be empty".to_string(),
            ));
        }

        if self.service.port == 0 {
            return Err(ConfigError::Message(
                "Service port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RepcamConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                ip: default_service_ip(),
                port: default_service_port(),
            },
            report: ReportConfig {
                pretty: default_report_pretty(),
            },
        }
    }
}

// Default value functions
fn default_service_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_service_port() -> u16 {
    5000
}
fn default_report_pretty() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = RepcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service.port, 5000);
        assert!(config.report.pretty);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RepcamConfig::default();

        config.service.port = 0;
        assert!(config.validate().is_err());

        config.service.port = 8080;
        assert!(config.validate().is_ok());

        config.service.ip = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = RepcamConfig::load_from_file("/nonexistent/repcam.toml").unwrap();
        assert_eq!(config.service.ip, "0.0.0.0");
        assert_eq!(config.service.port, 5000);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[service]\nport = 9000\n\n[report]\npretty = false").unwrap();

        let config = RepcamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.service.port, 9000);
        assert!(!config.report.pretty);
        // Untouched values keep their defaults.
        assert_eq!(config.service.ip, "0.0.0.0");
    }
}
