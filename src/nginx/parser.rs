//! Server block extraction from nginx configuration text.
//!
//! Blocks are found with a depth-counting scanner that skips `#` comments
//! and quoted strings, so `location { ... }` and other nested blocks stay
//! inside their `server { ... }`. The directives of a block are then read
//! with the same tokenizing rules, keeping only those at the block's own
//! level.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::models::VirtualHostRecord;

/// Document root reported for blocks without a `root` directive
pub const DEFAULT_DOCUMENT_ROOT: &str = "/var/www/html";

const IGNORED_NAMES: &[&str] = &["_", "localhost", "default_server"];
const SECURE_PORT: &str = "443";
const CERTIFICATE_DIRECTIVES: &[&str] = &["ssl_certificate", "ssl_certificate_key"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("server block opened at line {line} is never closed")]
    UnterminatedBlock { line: usize },

    #[error("'{directive}' in server block at line {line} has no terminating ';'")]
    MalformedDirective { directive: &'static str, line: usize },
}

/// Body of one `server { ... }` block, braces excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerBlock<'a> {
    /// 1-based line of the `server` keyword
    pub line: usize,
    pub body: &'a str,
}

/// A statement at the top level of a server block, quotes removed from its
/// arguments. Block headers such as `location / {` are statements too, with
/// `terminated` false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<String>,
    /// Ended by `;`
    pub terminated: bool,
}

/// Everything extracted from one file
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<VirtualHostRecord>,
    pub errors: Vec<ParseError>,
}

/// Extract a record for every usable server block in `contents`.
///
/// Blocks that fail to parse are reported in [`Extraction::errors`] and do
/// not stop the remaining blocks from being read.
pub fn extract_virtual_hosts(source: &Path, contents: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for block in split_server_blocks(contents) {
        match block.and_then(|block| parse_server_block(source, &block)) {
            Ok(Some(record)) => extraction.records.push(record),
            Ok(None) => {}
            Err(e) => extraction.errors.push(e),
        }
    }

    extraction
}

/// Split configuration text into `server` block bodies.
///
/// An unterminated block is reported as an error and ends the scan, since
/// everything after its opening brace belongs to it.
pub fn split_server_blocks(text: &str) -> Vec<Result<ServerBlock<'_>, ParseError>> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' if at_token_start(bytes, i) => i = comment_end(bytes, i),
            b'"' | b'\'' if at_token_start(bytes, i) => i = quote_end(bytes, i),
            b's' if at_token_start(bytes, i) && bytes[i..].starts_with(b"server") => {
                let after = i + "server".len();
                let Some(open) = opening_brace(bytes, after) else {
                    i = after;
                    continue;
                };

                let line = line_number(bytes, i);
                match find_block_end(bytes, open) {
                    Some(close) => {
                        blocks.push(Ok(ServerBlock {
                            line,
                            body: &text[open + 1..close],
                        }));
                        i = close + 1;
                    }
                    None => {
                        blocks.push(Err(ParseError::UnterminatedBlock { line }));
                        break;
                    }
                }
            }
            _ => i += 1,
        }
    }

    blocks
}

/// Statements at depth 0 of a block body, in order.
///
/// Nested blocks are skipped whole. Words follow nginx's rules: quotes and
/// `#` only count at the start of a word, and `${name}` belongs to the word
/// it appears in.
pub fn top_level_directives(body: &str) -> Vec<Directive> {
    let bytes = body.as_bytes();
    let mut directives = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'#' => i = comment_end(bytes, i),
            b';' => {
                if depth == 0 {
                    push_directive(&mut directives, &mut words, true);
                }
                i += 1;
            }
            b'{' => {
                if depth == 0 {
                    push_directive(&mut directives, &mut words, false);
                }
                depth += 1;
                i += 1;
            }
            b'}' => {
                if depth == 0 {
                    push_directive(&mut directives, &mut words, false);
                } else {
                    depth -= 1;
                }
                i += 1;
            }
            _ => {
                let (word, next) = read_word(body, i);
                if depth == 0 {
                    words.push(word.to_string());
                }
                i = next;
            }
        }
    }
    push_directive(&mut directives, &mut words, false);

    directives
}

fn push_directive(directives: &mut Vec<Directive>, words: &mut Vec<String>, terminated: bool) {
    let mut drained = words.drain(..);
    if let Some(name) = drained.next() {
        directives.push(Directive {
            name,
            args: drained.collect(),
            terminated,
        });
    }
}

/// One word starting at `start` and the offset just past it. Quoted words
/// come back without their quotes.
fn read_word(text: &str, start: usize) -> (&str, usize) {
    let bytes = text.as_bytes();
    let first = bytes[start];

    if first == b'"' || first == b'\'' {
        let end = quote_end(bytes, start);
        let inner_end = if end > start + 1 && bytes[end - 1] == first {
            end - 1
        } else {
            end
        };
        return (&text[start + 1..inner_end], end);
    }

    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'}')
                    .map_or(bytes.len(), |offset| i + offset + 1);
            }
            b';' | b'{' | b'}' => break,
            b if b.is_ascii_whitespace() => break,
            _ => i += 1,
        }
    }
    (&text[start..i], i)
}

/// Build a record from one block.
///
/// `Ok(None)` means the block declares no usable host name.
pub fn parse_server_block(
    source: &Path,
    block: &ServerBlock<'_>,
) -> Result<Option<VirtualHostRecord>, ParseError> {
    let directives = top_level_directives(block.body);

    let Some(declared) = first_directive(&directives, "server_name", block.line)? else {
        return Ok(None);
    };

    let server_names = usable_names(declared.iter().map(String::as_str));
    if server_names.is_empty() {
        return Ok(None);
    }

    let document_root = first_directive(&directives, "root", block.line)?
        .and_then(|args| args.first())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_ROOT));

    let has_existing_tls = directives.iter().any(|directive| {
        CERTIFICATE_DIRECTIVES.contains(&directive.name.as_str())
            || (directive.name == "listen"
                && directive
                    .args
                    .first()
                    .is_some_and(|address| is_secure_address(address)))
    });

    Ok(VirtualHostRecord::new(
        source.to_path_buf(),
        server_names,
        document_root,
        has_existing_tls,
        block.body.to_string(),
    ))
}

/// False for catch-all and placeholder names that can never get a certificate
pub fn is_usable_server_name(name: &str) -> bool {
    !name.is_empty() && !IGNORED_NAMES.contains(&name) && !name.starts_with('~')
}

/// Split a `server_name` value into usable names, keeping declaration order
pub fn filter_server_names(declaration: &str) -> Vec<String> {
    usable_names(declaration.split_whitespace().map(unquote))
}

fn usable_names<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in candidates {
        if is_usable_server_name(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Arguments of the first `name` statement. A statement that never reaches
/// its `;` makes the whole block unusable.
fn first_directive<'a>(
    directives: &'a [Directive],
    name: &'static str,
    line: usize,
) -> Result<Option<&'a [String]>, ParseError> {
    match directives.iter().find(|directive| directive.name == name) {
        Some(directive) if !directive.terminated => Err(ParseError::MalformedDirective {
            directive: name,
            line,
        }),
        Some(directive) => Ok(Some(&directive.args)),
        None => Ok(None),
    }
}

// `443`, `*:443`, `[::]:443`, `10.0.0.1:443`
fn is_secure_address(address: &str) -> bool {
    !address.starts_with("unix:") && address.rsplit(':').next() == Some(SECURE_PORT)
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

// nginx only treats `#` and quotes specially at the start of a token
fn at_token_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'\r' | b'\n' | b';' | b'{' | b'}')
}

fn comment_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

/// Offset just past the closing quote; an unterminated string runs to EOF
fn quote_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn opening_brace(bytes: &[u8], after: usize) -> Option<usize> {
    let mut i = after;
    // `server_name`, `servers` and friends are different tokens
    if i < bytes.len() && !(bytes[i].is_ascii_whitespace() || bytes[i] == b'{') {
        return None;
    }
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    (i < bytes.len() && bytes[i] == b'{').then_some(i)
}

fn find_block_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'#' if at_token_start(bytes, i) => i = comment_end(bytes, i),
            b'"' | b'\'' if at_token_start(bytes, i) => i = quote_end(bytes, i),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    None
}

fn line_number(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}
