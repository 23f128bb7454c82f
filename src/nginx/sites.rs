//! Creating new nginx sites and listing the configured ones.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::DomainEntry;
use super::parser::is_usable_server_name;
use super::scanner::{read_records, SITES_AVAILABLE, SITES_ENABLED};
use crate::process::{CommandRunner, Invocation, ProcessError};

/// Distribution placeholder sites left out of `--list-domains`
const SKIPPED_SITES: &[&str] = &["default", "000-default"];

lazy_static! {
    /// Host names: letters, digits, period and hyphen only
    static ref INVALID_HOST_CHAR: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> SiteError {
    let path = path.to_path_buf();
    move |source| SiteError::Io {
        action,
        path,
        source,
    }
}

/// Checks that `domain` is a plain host name the scanner will pick up again
pub fn validate_domain(domain: &str) -> Result<(), SiteError> {
    let invalid = |reason: &str| SiteError::InvalidDomain {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };

    if domain.is_empty() {
        return Err(invalid("domain cannot be empty"));
    }
    if domain.len() > 253 {
        return Err(invalid("domain cannot exceed 253 characters"));
    }
    if let Some(c) = INVALID_HOST_CHAR.find(domain) {
        return Err(invalid(&format!(
            "domain contains invalid character '{}'",
            c.as_str()
        )));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid("domain contains an empty label"));
        }
        if label.len() > 63 {
            return Err(invalid("label cannot exceed 63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("label cannot start or end with dash"));
        }
    }
    if !is_usable_server_name(domain) {
        return Err(invalid("name is reserved and would never be secured"));
    }

    Ok(())
}

/// `<base>/<domain>/html`
pub fn default_webroot(base: &Path, domain: &str) -> PathBuf {
    base.join(domain).join("html")
}

pub fn render_index_page(domain: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Welcome to {domain}</title>
    <meta charset="utf-8">
</head>
<body>
    <h1>Welcome to {domain}</h1>
    <p>This site was configured by ssl-bot.</p>
    <p>A TLS certificate will be requested and installed automatically.</p>
</body>
</html>
"#
    )
}

/// Plain-HTTP server block for a new site; certbot adds the TLS listener later
pub fn render_server_block(domain: &str, webroot: &Path) -> String {
    let root = webroot.display();
    format!(
        r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain};
    root {root};
    index index.html index.htm;

    # Security headers
    add_header X-Frame-Options "SAMEORIGIN" always;
    add_header X-XSS-Protection "1; mode=block" always;
    add_header X-Content-Type-Options "nosniff" always;

    location / {{
        try_files $uri $uri/ =404;
    }}

    location ~* \.(jpg|jpeg|png|gif|ico|css|js)$ {{
        expires 1y;
        add_header Cache-Control "public, immutable";
    }}

    location ~ /\. {{
        deny all;
    }}
}}
"#
    )
}

/// Create the webroot with a placeholder page and hand it to the web user.
///
/// An existing `index.html` is left alone.
pub fn create_web_directory<R: CommandRunner>(
    runner: &R,
    webroot: &Path,
    domain: &str,
    web_user: &str,
) -> Result<(), SiteError> {
    fs::create_dir_all(webroot).map_err(io_error("create", webroot))?;

    let index = webroot.join("index.html");
    if index.exists() {
        debug!("{} already exists, keeping it", index.display());
    } else {
        fs::write(&index, render_index_page(domain)).map_err(io_error("write", &index))?;
    }

    // Ownership goes on the site directory, one level above the webroot
    let site_dir = webroot.parent().unwrap_or(webroot).display().to_string();
    runner.run_checked(
        &Invocation::new("chown")
            .arg("-R")
            .arg(web_user)
            .arg(&site_dir),
    )?;
    runner.run_checked(&Invocation::new("chmod").args(["-R", "755"]).arg(&site_dir))?;

    info!("Created web directory {}", webroot.display());
    Ok(())
}

/// Write `sites-available/<domain>.conf` and enable it. Returns the config path.
pub fn write_site_config(
    config_dir: &Path,
    domain: &str,
    webroot: &Path,
) -> Result<PathBuf, SiteError> {
    let available_dir = config_dir.join(SITES_AVAILABLE);
    let enabled_dir = config_dir.join(SITES_ENABLED);
    fs::create_dir_all(&available_dir).map_err(io_error("create", &available_dir))?;
    fs::create_dir_all(&enabled_dir).map_err(io_error("create", &enabled_dir))?;

    // Dotted names only pass discovery with a `.conf` suffix
    let file_name = format!("{domain}.conf");
    let config_path = available_dir.join(&file_name);
    fs::write(&config_path, render_server_block(domain, webroot))
        .map_err(io_error("write", &config_path))?;

    let enabled_path = enabled_dir.join(&file_name);
    if fs::symlink_metadata(&enabled_path).is_err() {
        enable_site(&config_path, &enabled_path)?;
    } else {
        debug!("{} is already enabled", domain);
    }

    info!("Wrote nginx config for {} to {}", domain, config_path.display());
    Ok(config_path)
}

#[cfg(unix)]
fn enable_site(config_path: &Path, enabled_path: &Path) -> Result<(), SiteError> {
    std::os::unix::fs::symlink(config_path, enabled_path).map_err(io_error("link", enabled_path))
}

#[cfg(not(unix))]
fn enable_site(config_path: &Path, enabled_path: &Path) -> Result<(), SiteError> {
    fs::copy(config_path, enabled_path)
        .map(|_| ())
        .map_err(io_error("copy", enabled_path))
}

/// Every usable host name declared in `sites-available`, one entry per name
/// and file.
pub fn list_domains(config_dir: &Path) -> Vec<DomainEntry> {
    let available_dir = config_dir.join(SITES_AVAILABLE);
    let enabled_dir = config_dir.join(SITES_ENABLED);

    let entries = match fs::read_dir(&available_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist", available_dir.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Cannot list {}: {}", available_dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut domains = Vec::new();
    for path in files {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if SKIPPED_SITES.contains(&file_name.as_str()) {
            continue;
        }

        let records = read_records(&path);
        let enabled = enabled_dir.join(&file_name).exists();
        let mut seen: Vec<&str> = Vec::new();
        for record in &records {
            for name in record.server_names() {
                if seen.contains(&name.as_str()) {
                    continue;
                }
                seen.push(name);
                domains.push(DomainEntry {
                    domain: name.clone(),
                    config_file: path.clone(),
                    enabled,
                });
            }
        }
    }

    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nginx::parser::extract_virtual_hosts;
    use crate::process::fakes::ScriptedRunner;
    use tempfile::TempDir;

    #[test]
    fn test_valid_domains() {
        for domain in ["example.com", "www.example.co.uk", "my-site.io", "xn--bcher-kva.example"] {
            assert!(validate_domain(domain).is_ok(), "{domain} should be valid");
        }
    }

    #[test]
    fn test_invalid_domains() {
        let cases = [
            ("", "cannot be empty"),
            ("exa mple.com", "invalid character ' '"),
            ("*.example.com", "invalid character '*'"),
            ("example..com", "empty label"),
            ("-example.com", "start or end with dash"),
            ("localhost", "reserved"),
        ];
        for (domain, message) in cases {
            let err = validate_domain(domain).unwrap_err();
            assert!(
                err.to_string().contains(message),
                "{domain}: expected '{message}' in '{err}'"
            );
        }
    }

    #[test]
    fn test_default_webroot() {
        assert_eq!(
            default_webroot(Path::new("/var/www"), "example.com"),
            PathBuf::from("/var/www/example.com/html")
        );
    }

    #[test]
    fn test_rendered_server_block_scans_back() {
        let rendered = render_server_block("fresh.example.com", Path::new("/var/www/fresh/html"));
        let extraction = extract_virtual_hosts(Path::new("fresh"), &rendered);

        assert!(extraction.errors.is_empty());
        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.server_names(), ["fresh.example.com"]);
        assert_eq!(record.document_root(), Path::new("/var/www/fresh/html"));
        assert!(!record.has_existing_tls());
    }

    #[test]
    fn test_create_web_directory() {
        let dir = TempDir::new().unwrap();
        let webroot = dir.path().join("example.com").join("html");
        let runner = ScriptedRunner::new();

        create_web_directory(&runner, &webroot, "example.com", "www-data:www-data").unwrap();

        let index = fs::read_to_string(webroot.join("index.html")).unwrap();
        assert!(index.contains("Welcome to example.com"));

        let site_dir = dir.path().join("example.com").display().to_string();
        assert_eq!(
            runner.command_lines(),
            vec![
                format!("chown -R www-data:www-data {site_dir}"),
                format!("chmod -R 755 {site_dir}"),
            ]
        );
    }

    #[test]
    fn test_existing_index_is_kept() {
        let dir = TempDir::new().unwrap();
        let webroot = dir.path().join("html");
        fs::create_dir_all(&webroot).unwrap();
        fs::write(webroot.join("index.html"), "custom").unwrap();

        create_web_directory(&ScriptedRunner::new(), &webroot, "a.com", "www-data").unwrap();
        assert_eq!(fs::read_to_string(webroot.join("index.html")).unwrap(), "custom");
    }

    #[test]
    fn test_chown_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.fail("chown", 1, "chown: invalid user: 'www-data:www-data'");

        let result = create_web_directory(
            &runner,
            &dir.path().join("site").join("html"),
            "site.com",
            "www-data:www-data",
        );
        assert!(matches!(result, Err(SiteError::Process(_))));
        assert!(!runner.was_invoked("chmod"));
    }

    #[test]
    fn test_write_site_config_enables_site() {
        let dir = TempDir::new().unwrap();
        let config_path =
            write_site_config(dir.path(), "new.example.com", Path::new("/var/www/new/html"))
                .unwrap();

        assert_eq!(
            config_path,
            dir.path().join(SITES_AVAILABLE).join("new.example.com.conf")
        );
        let enabled = dir.path().join(SITES_ENABLED).join("new.example.com.conf");
        assert!(enabled.exists());
        assert_eq!(
            fs::read_to_string(&enabled).unwrap(),
            fs::read_to_string(&config_path).unwrap()
        );

        // Writing again keeps the existing link
        write_site_config(dir.path(), "new.example.com", Path::new("/var/www/new/html")).unwrap();
    }

    #[test]
    fn test_list_domains() {
        let dir = TempDir::new().unwrap();
        let available = dir.path().join(SITES_AVAILABLE);
        let enabled = dir.path().join(SITES_ENABLED);
        fs::create_dir_all(&available).unwrap();
        fs::create_dir_all(&enabled).unwrap();

        fs::write(
            available.join("default"),
            "server { listen 80 default_server; server_name default.example.com; }",
        )
        .unwrap();
        fs::write(
            available.join("blog"),
            "server { server_name blog.example.com www.blog.example.com; }\n\
             server { listen 443 ssl; server_name blog.example.com; }",
        )
        .unwrap();
        fs::write(available.join("api.conf"), "server { server_name _ api.example.com; }").unwrap();
        fs::write(enabled.join("blog"), "").unwrap();

        let domains = list_domains(dir.path());
        let summary: Vec<(&str, bool)> = domains
            .iter()
            .map(|d| (d.domain.as_str(), d.enabled))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("api.example.com", false),
                ("blog.example.com", true),
                ("www.blog.example.com", true),
            ]
        );
        assert_eq!(domains[0].config_file, available.join("api.conf"));
    }

    #[test]
    fn test_list_domains_without_sites_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_domains(dir.path()).is_empty());
    }
}
