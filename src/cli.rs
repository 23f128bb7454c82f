use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::logging::{LogSettings, DEFAULT_LOG_FILE};

#[derive(Parser, Debug)]
#[command(name = "ssl-bot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find nginx sites without TLS and secure them with certbot", long_about = None)]
pub struct Cli {
    /// Scan nginx configuration and request certificates for hosts without TLS
    #[arg(long)]
    pub scan_and_apply: bool,

    /// Renew certificates (dry run first) and reload nginx
    #[arg(long)]
    pub renew: bool,

    /// Show certificates and hosts still lacking TLS
    #[arg(long)]
    pub status: bool,

    /// Create an nginx site for DOMAIN, then secure it
    #[arg(long, value_name = "DOMAIN")]
    pub add_domain: Option<String>,

    /// Document root for --add-domain (default: <web_root_base>/<DOMAIN>/html)
    #[arg(long, value_name = "PATH")]
    pub webroot: Option<PathBuf>,

    /// List host names configured in sites-available
    #[arg(long)]
    pub list_domains: bool,

    /// Print the effective configuration as YAML
    #[arg(long)]
    pub show_config: bool,

    /// Print --status and --list-domains output as JSON
    #[arg(long)]
    pub json: bool,

    /// Configuration file
    #[arg(long, env = "SSL_BOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "SSL_BOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// File that log lines are appended to
    #[arg(long, env = "SSL_BOT_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log to the console only
    #[arg(long)]
    pub no_log_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ScanAndApply,
    Renew,
    Status,
    AddDomain {
        domain: String,
        webroot: Option<PathBuf>,
    },
    ListDomains,
    ShowConfig,
}

impl Cli {
    /// The selected operation. When several flags are given the first one in
    /// declaration order wins.
    pub fn operation(&self) -> Option<Operation> {
        if self.scan_and_apply {
            Some(Operation::ScanAndApply)
        } else if self.renew {
            Some(Operation::Renew)
        } else if self.status {
            Some(Operation::Status)
        } else if let Some(domain) = &self.add_domain {
            Some(Operation::AddDomain {
                domain: domain.clone(),
                webroot: self.webroot.clone(),
            })
        } else if self.list_domains {
            Some(Operation::ListDomains)
        } else if self.show_config {
            Some(Operation::ShowConfig)
        } else {
            None
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level.clone(),
            file: (!self.no_log_file).then(|| self.log_file.clone()),
        }
    }
}
