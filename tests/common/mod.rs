use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use ssl_bot::config::AppConfig;

pub const CONTACT: &str = "ops@example.org";

/// A throwaway nginx root plus web root
pub struct NginxTree {
    pub dir: TempDir,
}

impl NginxTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nginx/sites-available")).unwrap();
        fs::create_dir_all(dir.path().join("nginx/sites-enabled")).unwrap();
        fs::create_dir_all(dir.path().join("www")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("nginx")
    }

    pub fn available(&self, name: &str) -> PathBuf {
        self.root().join("sites-available").join(name)
    }

    pub fn enabled(&self, name: &str) -> PathBuf {
        self.root().join("sites-enabled").join(name)
    }

    pub fn write_available(&self, name: &str, content: &str) -> PathBuf {
        let path = self.available(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[cfg(unix)]
    pub fn enable(&self, name: &str) {
        std::os::unix::fs::symlink(self.available(name), self.enabled(name)).unwrap();
    }

    pub fn config(&self, exclusions: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.email = CONTACT.to_string();
        config.exclude_domains = exclusions.iter().map(|s| s.to_string()).collect();
        config.nginx.config_dir = self.root();
        config.nginx.web_root_base = self.dir.path().join("www");
        config
    }
}

pub fn http_site(names: &str, root: &str) -> String {
    format!(
        "server {{\n    listen 80;\n    server_name {names};\n    root {root};\n}}\n"
    )
}

pub fn tls_site(names: &str) -> String {
    format!(
        "server {{\n    listen 443 ssl;\n    server_name {names};\n    \
         ssl_certificate /etc/letsencrypt/live/{names}/fullchain.pem;\n}}\n"
    )
}
