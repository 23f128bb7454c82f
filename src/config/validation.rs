use super::AppConfig;
use anyhow::{bail, Result};

/// Configuration validation errors with helpful messages
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid contact address '{address}': {reason}")]
    InvalidEmail { address: String, reason: String },

    #[error("Invalid scan interval {value}: {reason}")]
    InvalidInterval { value: u64, reason: String },

    #[error("Invalid exclusion entry at position {index}: {reason}")]
    InvalidExclusion { index: usize, reason: String },

    #[error("Invalid setting: {field} {reason}")]
    InvalidSetting { field: String, reason: String },
}

/// Validates the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_email(&config.email)?;
    validate_interval(config.scan_interval)?;
    validate_exclusions(&config.exclude_domains)?;
    validate_not_empty(
        &config.nginx.config_dir.to_string_lossy(),
        "nginx.config_dir",
    )?;
    validate_not_empty(&config.nginx.binary, "nginx.binary")?;
    validate_not_empty(&config.nginx.service_manager, "nginx.service_manager")?;
    validate_not_empty(&config.certbot.binary, "certbot.binary")?;
    Ok(())
}

/// Validates the contact address certbot registers with
fn validate_email(address: &str) -> Result<()> {
    if address.chars().any(char::is_whitespace) {
        bail!(ValidationError::InvalidEmail {
            address: address.to_string(),
            reason: "address cannot contain whitespace".to_string(),
        });
    }

    match address.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => bail!(ValidationError::InvalidEmail {
            address: address.to_string(),
            reason: "expected exactly one '@' between a user and a domain".to_string(),
        }),
    }
}

fn validate_interval(seconds: u64) -> Result<()> {
    if seconds == 0 {
        bail!(ValidationError::InvalidInterval {
            value: seconds,
            reason: "scan_interval must be at least 1 second".to_string(),
        });
    }
    Ok(())
}

/// Exclusions are substring matches, so an empty entry would exclude every host
fn validate_exclusions(exclusions: &[String]) -> Result<()> {
    for (index, entry) in exclusions.iter().enumerate() {
        if entry.trim().is_empty() {
            bail!(ValidationError::InvalidExclusion {
                index,
                reason: "entry is empty and would match every domain".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_not_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!(ValidationError::InvalidSetting {
            field: field.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_email_without_at_sign() {
        let mut config = AppConfig::default();
        config.email = "admin.example.com".to_string();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exactly one '@'"));
    }

    #[test]
    fn test_email_with_spaces() {
        let mut config = AppConfig::default();
        config.email = "admin @example.com".to_string();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("whitespace"));
    }

    #[test]
    fn test_email_with_two_at_signs() {
        let mut config = AppConfig::default();
        config.email = "a@b@example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_interval() {
        let mut config = AppConfig::default();
        config.scan_interval = 0;

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1 second"));
    }

    #[test]
    fn test_empty_exclusion_entry() {
        let mut config = AppConfig::default();
        config.exclude_domains.push("  ".to_string());

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("position 3"));
    }

    #[test]
    fn test_empty_exclusion_list_is_fine() {
        let mut config = AppConfig::default();
        config.exclude_domains.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_certbot_binary() {
        let mut config = AppConfig::default();
        config.certbot.binary = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("certbot.binary cannot be empty"));
    }
}
