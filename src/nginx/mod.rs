//! nginx configuration handling
//!
//! - `scanner` finds config files and turns them into host records
//! - `parser` splits text into server blocks and reads their directives
//! - `sites` creates and lists sites
//! - `controller` tests and reloads the running server

pub mod controller;
pub mod models;
pub mod parser;
pub mod scanner;
pub mod sites;

pub use controller::NginxController;
pub use models::{DomainEntry, VirtualHostRecord};
pub use parser::{extract_virtual_hosts, Extraction, ParseError};
pub use scanner::{discover_config_files, read_records, scan, scan_file, ScanError};
