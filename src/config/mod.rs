use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod validation;

pub const DEFAULT_CONFIG_PATH: &str = "/opt/ssl-bot/config.yaml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Contact address handed to the certificate tool
    #[serde(alias = "contact_address")]
    pub email: String,
    /// Substrings; a host containing any of them is never provisioned
    #[serde(alias = "excluded_domain_substrings")]
    pub exclude_domains: Vec<String>,
    pub auto_renew: bool,
    /// Seconds between scans when run from a timer
    pub scan_interval: u64,
    pub nginx: NginxConfig,
    pub certbot: CertbotConfig,
}

// nginx layout and the commands used to control it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NginxConfig {
    pub config_dir: PathBuf,
    pub web_root_base: PathBuf,
    pub web_user: String,
    pub binary: String,
    pub service_manager: String,
    pub service_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CertbotConfig {
    pub binary: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            exclude_domains: vec![
                "localhost".to_string(),
                "test".to_string(),
                "staging".to_string(),
            ],
            auto_renew: true,
            scan_interval: 86400,
            nginx: NginxConfig::default(),
            certbot: CertbotConfig::default(),
        }
    }
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/nginx"),
            web_root_base: PathBuf::from("/var/www"),
            web_user: "www-data:www-data".to_string(),
            binary: "nginx".to_string(),
            service_manager: "systemctl".to_string(),
            service_name: "nginx".to_string(),
        }
    }
}

impl Default for CertbotConfig {
    fn default() -> Self {
        Self {
            binary: "certbot".to_string(),
        }
    }
}

impl AppConfig {
    /// Read and validate the YAML file at `path`, merged over the defaults.
    ///
    /// A missing file is not an error: the defaults come back unchanged.
    pub fn try_load(path: &Path) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;

        validation::validate_config(&config)?;

        Ok(config)
    }

    /// Load the configuration, falling back to the defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Failed to load config file {}: {:#}; using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.email, "admin@example.com");
        assert_eq!(config.exclude_domains, vec!["localhost", "test", "staging"]);
        assert!(config.auto_renew);
        assert_eq!(config.scan_interval, 86400);
        assert_eq!(config.nginx.config_dir, PathBuf::from("/etc/nginx"));
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let (_dir, path) = write_config("email: ops@company.org\nscan_interval: 3600\n");

        let config = AppConfig::try_load(&path).unwrap();
        assert_eq!(config.email, "ops@company.org");
        assert_eq!(config.scan_interval, 3600);
        assert_eq!(config.exclude_domains, vec!["localhost", "test", "staging"]);
        assert!(config.auto_renew);
    }

    #[test]
    fn test_nested_sections_and_aliases() {
        let (_dir, path) = write_config(
            "contact_address: certs@company.org\n\
             excluded_domain_substrings: [internal]\n\
             nginx:\n  config_dir: /srv/nginx\n\
             certbot:\n  binary: /usr/local/bin/certbot\n",
        );

        let config = AppConfig::try_load(&path).unwrap();
        assert_eq!(config.email, "certs@company.org");
        assert_eq!(config.exclude_domains, vec!["internal"]);
        assert_eq!(config.nginx.config_dir, PathBuf::from("/srv/nginx"));
        assert_eq!(config.nginx.binary, "nginx");
        assert_eq!(config.certbot.binary, "/usr/local/bin/certbot");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.yaml"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let (_dir, path) = write_config("email: [unterminated\n  - : :\n");

        assert!(AppConfig::try_load(&path).is_err());
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let (_dir, path) = write_config("email: not-an-address\n");

        let result = AppConfig::try_load(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not-an-address"));
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn test_yaml_round_trip_of_effective_config() {
        let yaml = AppConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("email: admin@example.com"));
        assert!(yaml.contains("config_dir: /etc/nginx"));
    }
}
