//! Locating nginx configuration files and reading host records from them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::models::VirtualHostRecord;
use super::parser::{extract_virtual_hosts, Extraction};

pub const SITES_AVAILABLE: &str = "sites-available";
pub const SITES_ENABLED: &str = "sites-enabled";
pub const MAIN_CONFIG: &str = "nginx.conf";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// List the configuration files under an nginx root.
///
/// `sites-available` comes first, then `sites-enabled`, then `nginx.conf`.
/// Within a directory, names are sorted. A site enabled through a symlink is
/// listed under both directories.
pub fn discover_config_files(root: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();

    for directory in [root.join(SITES_AVAILABLE), root.join(SITES_ENABLED)] {
        configs.extend(site_files(&directory));
    }

    let main_config = root.join(MAIN_CONFIG);
    if main_config.is_file() {
        configs.push(main_config);
    }

    info!("Found {} nginx config file(s): {:?}", configs.len(), configs);
    configs
}

fn site_files(directory: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist, skipping", directory.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Cannot list {}: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cannot read entry in {}: {}", directory.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_site_file_name(&name) {
            continue;
        }
        // Follows symlinks, so dangling links in sites-enabled drop out here
        if !path.is_file() {
            debug!("{} is not a regular file, skipping", path.display());
            continue;
        }
        files.push(path);
    }

    files.sort();
    files
}

/// Site files are either `*.conf` or have no extension at all
fn is_site_file_name(name: &str) -> bool {
    name.ends_with(".conf") || !name.contains('.')
}

/// Read one file and extract its host records.
pub fn scan_file(path: &Path) -> Result<Extraction, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = String::from_utf8_lossy(&bytes);
    Ok(extract_virtual_hosts(path, &contents))
}

/// Host records from one file. Problems are logged and leave the file (or
/// the affected block) out.
pub fn read_records(path: &Path) -> Vec<VirtualHostRecord> {
    let extraction = match scan_file(path) {
        Ok(extraction) => extraction,
        Err(e) => {
            error!("{}", e);
            return Vec::new();
        }
    };

    for e in &extraction.errors {
        warn!("Skipping server block in {}: {}", path.display(), e);
    }
    debug!(
        "{}: {} host record(s)",
        path.display(),
        extraction.records.len()
    );
    extraction.records
}

/// Records from every file under `root`, in discovery order.
pub fn scan(root: &Path) -> Vec<VirtualHostRecord> {
    discover_config_files(root)
        .iter()
        .flat_map(|path| read_records(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn nginx_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(SITES_AVAILABLE)).unwrap();
        fs::create_dir(dir.path().join(SITES_ENABLED)).unwrap();
        dir
    }

    #[test]
    fn test_discovery_order_and_filtering() {
        let root = nginx_root();
        let available = root.path().join(SITES_AVAILABLE);
        fs::write(available.join("zeta"), "").unwrap();
        fs::write(available.join("alpha.conf"), "").unwrap();
        fs::write(available.join("notes.txt"), "").unwrap();
        fs::write(available.join("backup.conf.bak"), "").unwrap();
        fs::write(root.path().join(SITES_ENABLED).join("beta"), "").unwrap();
        fs::write(root.path().join(MAIN_CONFIG), "").unwrap();

        let files = discover_config_files(root.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(root.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();

        assert_eq!(
            names,
            vec![
                "sites-available/alpha.conf",
                "sites-available/zeta",
                "sites-enabled/beta",
                "nginx.conf",
            ]
        );
    }

    #[test]
    fn test_missing_directories_are_skipped() {
        let root = TempDir::new().unwrap();
        assert!(discover_config_files(root.path()).is_empty());

        fs::write(root.path().join(MAIN_CONFIG), "").unwrap();
        assert_eq!(
            discover_config_files(root.path()),
            vec![root.path().join(MAIN_CONFIG)]
        );
    }

    #[test]
    fn test_subdirectories_are_not_config_files() {
        let root = nginx_root();
        fs::create_dir(root.path().join(SITES_AVAILABLE).join("snippets")).unwrap();
        assert!(discover_config_files(root.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_site_is_discovered_twice() {
        let root = nginx_root();
        let available = root.path().join(SITES_AVAILABLE).join("shop");
        fs::write(&available, "server { server_name shop.example.com; }").unwrap();
        std::os::unix::fs::symlink(&available, root.path().join(SITES_ENABLED).join("shop"))
            .unwrap();

        assert_eq!(discover_config_files(root.path()).len(), 2);

        let records = scan(root.path());
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.primary_domain() == "shop.example.com"));
    }

    #[test]
    fn test_scan_file_reports_missing_file() {
        let root = TempDir::new().unwrap();
        let result = scan_file(&root.path().join("gone"));
        assert!(matches!(result, Err(ScanError::Io { .. })));
    }

    #[test]
    fn test_scan_tolerates_invalid_utf8() {
        let root = nginx_root();
        let mut contents = b"# caf\xe9\nserver { server_name latin1.example.com; }".to_vec();
        contents.push(b'\n');
        fs::write(root.path().join(SITES_AVAILABLE).join("latin1"), contents).unwrap();

        let records = scan(root.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].primary_domain(), "latin1.example.com");
    }
}
