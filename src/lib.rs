//! # fzgrep - Interactive fuzzy finder
//!
//! fzgrep lets you type a query, browse a ranked list of matching files or
//! grep-style content lines with an optional preview pane, and prints the
//! confirmed selection to stdout.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`query`] - Fuzzy scoring and match positions
//! - [`search`] - Candidates, result sets and the `rg`/`fd` collaborators
//! - [`tui`] - Key decoding, finder state, preview and rendering
//! - [`output`] - Printing of the confirmed selection
//! - [`utils`] - Config and history storage
//!
//! ## Quick Start
//!
//! ```no_run
//! use fzgrep::search::{ExternalSearcher, SearchMode, SearchOptions};
//! use fzgrep::tui::{self, App, FsPreview};
//!
//! let mut app = App::new(
//!     Box::new(ExternalSearcher::default()),
//!     SearchOptions::default(),
//!     SearchMode::Content,
//! );
//! app.set_query("fn main");
//!
//! let mut previews = FsPreview::default();
//! if let Some(selection) = tui::run(&mut app, &mut previews).unwrap() {
//!     for candidate in selection {
//!         println!("{}:{}", candidate.path, candidate.line_number);
//!     }
//! }
//! ```
//!
//! ## Scoring
//!
//! Query characters are matched in order against the candidate text. Word
//! boundaries, consecutive runs, exact case and completing the whole query
//! earn bonuses; see [`query::scorer`].

pub mod output;
pub mod query;
pub mod search;
pub mod tui;
pub mod utils;
