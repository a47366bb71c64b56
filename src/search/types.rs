use crate::query::Scorer;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which collaborator a search goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Line-oriented content search (`path:line:content`)
    #[default]
    Content,
    /// Recursive file listing filtered by substring
    Files,
}

impl SearchMode {
    pub fn toggled(self) -> Self {
        match self {
            SearchMode::Content => SearchMode::Files,
            SearchMode::Files => SearchMode::Content,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Content => "content",
            SearchMode::Files => "files",
        }
    }
}

/// Options passed through to the search collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub search_hidden: bool,
    /// Cap on returned candidates (None = unlimited)
    pub max_results: Option<usize>,
    /// Directory to search in (None = current directory)
    pub directory: Option<PathBuf>,
}

/// One searchable item: a file path, or a content line with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub path: String,
    /// 1-based line number, 0 when not applicable (file mode)
    pub line_number: u32,
    pub content: String,
    pub score: u32,
}

impl MatchCandidate {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line_number: 0,
            content: String::new(),
            score: 0,
        }
    }

    pub fn line(path: impl Into<String>, line_number: u32, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line_number,
            content: content.into(),
            score: 0,
        }
    }

    pub fn with_score(self, score: u32) -> Self {
        Self { score, ..self }
    }
}

/// Ordered results of one search.
///
/// File searches are sorted by score (descending, stable). Content
/// searches keep the order the search tool emitted them in.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    candidates: Vec<MatchCandidate>,
}

impl ResultSet {
    /// Score raw collaborator output against `query` and order it for `mode`
    pub fn from_search(query: &str, mode: SearchMode, raw: Vec<MatchCandidate>) -> Self {
        let scorer = Scorer::with_defaults();

        let mut candidates: Vec<MatchCandidate> = raw
            .into_iter()
            .map(|c| {
                let score = match mode {
                    SearchMode::Files => scorer.score(query, &c.path),
                    SearchMode::Content => scorer.score(query, &c.content),
                };
                c.with_score(score)
            })
            .collect();

        if mode == SearchMode::Files {
            candidates.sort_by(|a, b| b.score.cmp(&a.score));
        }

        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchCandidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[MatchCandidate] {
        &self.candidates
    }
}
