use serde::Serialize;
use std::path::{Path, PathBuf};

/// One nginx `server { ... }` block that declares at least one usable host name.
///
/// Records are built by the scanner and never modified afterwards; every scan
/// produces fresh ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualHostRecord {
    source_file: PathBuf,
    server_names: Vec<String>,
    document_root: PathBuf,
    has_existing_tls: bool,
    raw_text: String,
}

impl VirtualHostRecord {
    /// Returns `None` when `server_names` is empty.
    pub fn new(
        source_file: PathBuf,
        server_names: Vec<String>,
        document_root: PathBuf,
        has_existing_tls: bool,
        raw_text: String,
    ) -> Option<Self> {
        if server_names.is_empty() {
            return None;
        }
        Some(Self {
            source_file,
            server_names,
            document_root,
            has_existing_tls,
            raw_text,
        })
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Host names in declaration order
    pub fn server_names(&self) -> &[String] {
        &self.server_names
    }

    /// First declared name
    pub fn primary_domain(&self) -> &str {
        &self.server_names[0]
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn has_existing_tls(&self) -> bool {
        self.has_existing_tls
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// A host name found in `sites-available`, for `--list-domains`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainEntry {
    pub domain: String,
    pub config_file: PathBuf,
    pub enabled: bool,
}
