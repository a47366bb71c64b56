//! Search collaborators
//!
//! Candidate discovery is delegated to external tools:
//! - content mode runs `rg` and parses `path:line:content` lines
//! - file mode runs `fd`, falling back to a built-in directory walk
//!
//! The [`Searcher`] trait is the seam the finder state talks to, so tests
//! can substitute canned results.

pub mod external;
pub mod types;

pub use external::{parse_content_line, parse_content_output, parse_file_output, ExternalSearcher};
pub use types::{MatchCandidate, ResultSet, SearchMode, SearchOptions};

use std::io;
use thiserror::Error;

/// Failure of a search collaborator. "No matches" is never an error.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{tool} not found (is it installed and on PATH?)")]
    ToolMissing { tool: String },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Produces raw candidates for a query
pub trait Searcher {
    fn search(
        &self,
        query: &str,
        mode: SearchMode,
        options: &SearchOptions,
    ) -> Result<Vec<MatchCandidate>, SearchError>;
}
