//! `rg` / `fd` process adapters

use super::{MatchCandidate, SearchError, SearchMode, SearchOptions, Searcher};
use ignore::WalkBuilder;
use memchr::memchr;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

/// ripgrep's exit status for "ran fine, found nothing". fd exits 0 on an
/// empty listing, so any non-zero fd status is a failure.
const RG_NO_MATCHES: i32 = 1;

/// Runs ripgrep for content searches and fd for file listings
#[derive(Debug, Clone)]
pub struct ExternalSearcher {
    rg: String,
    fd: String,
}

impl Default for ExternalSearcher {
    fn default() -> Self {
        Self::new("rg", "fd")
    }
}

impl ExternalSearcher {
    pub fn new(rg: impl Into<String>, fd: impl Into<String>) -> Self {
        Self {
            rg: rg.into(),
            fd: fd.into(),
        }
    }

    /// Arguments for a ripgrep content search
    pub fn rg_args(query: &str, options: &SearchOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--line-number",
            "--no-heading",
            "--color",
            "never",
            "--fixed-strings",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push(if options.case_sensitive { "--case-sensitive" } else { "--ignore-case" }.into());
        if options.search_hidden {
            args.push("--hidden".into());
        }
        args.push("-e".into());
        args.push(query.into());
        if let Some(dir) = &options.directory {
            args.push(dir.as_os_str().to_owned());
        }

        args
    }

    /// Arguments for an fd file listing
    pub fn fd_args(pattern: &str, options: &SearchOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["--type", "f", "--color", "never"]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.push(if options.case_sensitive { "--case-sensitive" } else { "--ignore-case" }.into());
        if options.search_hidden {
            args.push("--hidden".into());
        }
        if let Some(dir) = &options.directory {
            args.push("--search-path".into());
            args.push(dir.as_os_str().to_owned());
        }
        if !pattern.is_empty() {
            args.push("--fixed-strings".into());
            args.push(pattern.into());
        }

        args
    }

    fn content_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let output = run_tool(&self.rg, Self::rg_args(query, options), Some(RG_NO_MATCHES))?;
        let Some(output) = output else {
            return Ok(Vec::new());
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut candidates = parse_content_output(&stdout);
        truncate(&mut candidates, options.max_results);
        Ok(candidates)
    }

    fn file_search(
        &self,
        pattern: &str,
        options: &SearchOptions,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        let mut candidates = match run_tool(&self.fd, Self::fd_args(pattern, options), None) {
            Ok(Some(output)) => parse_file_output(&String::from_utf8_lossy(&output.stdout)),
            Ok(None) => Vec::new(),
            Err(SearchError::ToolMissing { tool }) => {
                debug!(%tool, "file lister missing, walking the tree directly");
                walk_files(pattern, options)
            }
            Err(e) => return Err(e),
        };

        truncate(&mut candidates, options.max_results);
        Ok(candidates)
    }
}

impl Searcher for ExternalSearcher {
    fn search(
        &self,
        query: &str,
        mode: SearchMode,
        options: &SearchOptions,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        match mode {
            SearchMode::Content => self.content_search(query, options),
            SearchMode::Files => self.file_search(query, options),
        }
    }
}

/// Run a tool to completion. `Ok(None)` means it exited with `no_matches`.
fn run_tool(
    tool: &str,
    args: Vec<OsString>,
    no_matches: Option<i32>,
) -> Result<Option<Output>, SearchError> {
    debug!(tool, ?args, "running search tool");

    let output = Command::new(tool)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SearchError::ToolMissing {
                tool: tool.to_string(),
            },
            _ => SearchError::Io {
                tool: tool.to_string(),
                source,
            },
        })?;

    // None = killed by signal
    match output.status.code() {
        Some(0) => Ok(Some(output)),
        Some(code) if Some(code) == no_matches => Ok(None),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(tool, status = %output.status, %stderr, "search tool failed");
            Err(SearchError::Failed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

fn truncate(candidates: &mut Vec<MatchCandidate>, max_results: Option<usize>) {
    if let Some(max) = max_results {
        candidates.truncate(max);
    }
}

/// Parse one `path:line:content` line. Returns `None` when a delimiter is
/// missing or the line number does not parse.
pub fn parse_content_line(line: &str) -> Option<MatchCandidate> {
    let bytes = line.as_bytes();
    let first = memchr(b':', bytes)?;
    let second = first + 1 + memchr(b':', &bytes[first + 1..])?;

    let path = &line[..first];
    if path.is_empty() {
        return None;
    }
    let line_number: u32 = line[first + 1..second].parse().ok()?;
    let content = line[second + 1..].trim_end_matches('\r');

    Some(MatchCandidate::line(path, line_number, content))
}

/// Parse ripgrep output, skipping lines that do not parse
pub fn parse_content_output(stdout: &str) -> Vec<MatchCandidate> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parsed = parse_content_line(line);
            if parsed.is_none() {
                debug!(line, "skipping malformed search output line");
            }
            parsed
        })
        .collect()
}

/// Parse a one-path-per-line listing
pub fn parse_file_output(stdout: &str) -> Vec<MatchCandidate> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(MatchCandidate::file)
        .collect()
}

/// Built-in file listing used when `fd` is not installed
fn walk_files(pattern: &str, options: &SearchOptions) -> Vec<MatchCandidate> {
    let root = options.directory.as_deref().unwrap_or(Path::new("."));
    let needle = if options.case_sensitive {
        pattern.to_string()
    } else {
        pattern.to_lowercase()
    };

    let walker = WalkBuilder::new(root)
        .hidden(!options.search_hidden)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let shown = if options.directory.is_none() {
            path.strip_prefix(".").unwrap_or(path)
        } else {
            path
        };
        let shown = shown.to_string_lossy();

        let haystack = if options.case_sensitive {
            shown.to_string()
        } else {
            shown.to_lowercase()
        };
        if haystack.contains(&needle) {
            files.push(MatchCandidate::file(shown.into_owned()));
        }
    }

    files
}
