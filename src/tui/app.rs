use crate::search::{MatchCandidate, ResultSet, SearchMode, SearchOptions, Searcher};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Default number of remembered queries
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Preview pane placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    None,
    Right,
    Bottom,
}

impl PreviewMode {
    /// None -> Right -> Bottom -> None
    pub fn next(self) -> Self {
        match self {
            PreviewMode::None => PreviewMode::Right,
            PreviewMode::Right => PreviewMode::Bottom,
            PreviewMode::Bottom => PreviewMode::None,
        }
    }
}

/// Cursor movements over the result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Finder state: query, results, viewport, selection and history
pub struct App {
    query: String,
    results: ResultSet,
    /// Indices into `results`; ordered so selections come out ascending
    selection: BTreeSet<usize>,
    cursor: usize,
    offset: usize,
    max_display: usize,
    history: Vec<String>,
    /// `history.len()` means the live query, not a recalled one
    history_index: usize,
    history_limit: usize,
    pub search_mode: SearchMode,
    pub preview_mode: PreviewMode,
    pub options: SearchOptions,
    pub status_message: String,
    searcher: Box<dyn Searcher>,
}

impl App {
    pub fn new(searcher: Box<dyn Searcher>, options: SearchOptions, search_mode: SearchMode) -> Self {
        Self {
            query: String::new(),
            results: ResultSet::default(),
            selection: BTreeSet::new(),
            cursor: 0,
            offset: 0,
            max_display: 1,
            history: Vec::new(),
            history_index: 0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            search_mode,
            preview_mode: PreviewMode::None,
            options,
            status_message: String::new(),
            searcher,
        }
    }

    /// Seed the history log (e.g. from disk). Keeps the newest `limit` entries.
    pub fn with_history(mut self, mut history: Vec<String>, limit: usize) -> Self {
        history.retain(|q| !q.is_empty());
        history.dedup();
        self.history_limit = limit.max(1);
        if history.len() > self.history_limit {
            history.drain(..history.len() - self.history_limit);
        }
        self.history_index = history.len();
        self.history = history;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn max_display(&self) -> usize {
        self.max_display
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_index(&self) -> usize {
        self.history_index
    }

    pub fn current(&self) -> Option<&MatchCandidate> {
        self.results.get(self.cursor)
    }

    /// Submit a query: replace it, reset the viewport and record it in history
    pub fn set_query(&mut self, text: &str) {
        self.replace_query(text);
        self.commit_query();
    }

    /// Record the current query in history without touching the viewport
    pub fn commit_query(&mut self) {
        if self.query.is_empty() || self.history.last() == Some(&self.query) {
            return;
        }

        self.history.push(self.query.clone());
        if self.history.len() > self.history_limit {
            self.history.remove(0);
        }
        self.history_index = self.history.len();
    }

    /// Replace the query without touching history
    fn replace_query(&mut self, text: &str) {
        self.query = text.to_string();
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn push_char(&mut self, c: char) {
        let mut query = std::mem::take(&mut self.query);
        query.push(c);
        self.replace_query(&query);
    }

    pub fn pop_char(&mut self) {
        let mut query = std::mem::take(&mut self.query);
        query.pop();
        self.replace_query(&query);
    }

    /// Delete word backward from query (Ctrl+W)
    pub fn delete_word(&mut self) {
        let mut query = std::mem::take(&mut self.query);
        // Remove trailing whitespace first
        while query.ends_with(' ') {
            query.pop();
        }
        while !query.is_empty() && !query.ends_with(' ') {
            query.pop();
        }
        self.replace_query(&query);
    }

    pub fn clear_query(&mut self) {
        self.replace_query("");
    }

    /// Run the collaborator for the current mode and replace the result set.
    /// Errors leave an empty result set and a status message.
    pub fn run_search(&mut self) {
        let outcome = self
            .searcher
            .search(&self.query, self.search_mode, &self.options);

        match outcome {
            Ok(raw) => {
                self.results = ResultSet::from_search(&self.query, self.search_mode, raw);
                self.status_message = String::new();
                debug!(
                    query = %self.query,
                    mode = self.search_mode.label(),
                    count = self.results.len(),
                    "search finished"
                );
            }
            Err(e) => {
                warn!(query = %self.query, error = %e, "search failed");
                self.results = ResultSet::default();
                self.status_message = format!("Error: {}", e);
            }
        }

        self.selection.clear();
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_cursor(&mut self, movement: Movement) {
        if self.results.is_empty() {
            return;
        }

        let last = self.results.len() - 1;
        self.cursor = match movement {
            Movement::Up => self.cursor.saturating_sub(1),
            Movement::Down => (self.cursor + 1).min(last),
            Movement::PageUp => self.cursor.saturating_sub(self.max_display),
            Movement::PageDown => self.cursor.saturating_add(self.max_display).min(last),
            Movement::Home => 0,
            Movement::End => last,
        };
        self.adjust_viewport();
    }

    /// Rows available for results, as computed by the layout
    pub fn set_max_display(&mut self, rows: usize) {
        self.max_display = rows.max(1);
        self.adjust_viewport();
    }

    /// Keep `offset <= cursor < offset + max_display`
    fn adjust_viewport(&mut self) {
        if self.results.is_empty() {
            self.cursor = 0;
            self.offset = 0;
            return;
        }

        self.cursor = self.cursor.min(self.results.len() - 1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.max_display {
            self.offset = self.cursor + 1 - self.max_display;
        }
    }

    pub fn toggle_select(&mut self) {
        if self.cursor >= self.results.len() {
            return;
        }
        if !self.selection.remove(&self.cursor) {
            self.selection.insert(self.cursor);
        }
    }

    /// Selected candidates in ascending index order, or the one under the
    /// cursor when nothing is selected
    pub fn collect_selection(&self) -> Vec<MatchCandidate> {
        if self.selection.is_empty() {
            return self.current().cloned().into_iter().collect();
        }

        self.selection
            .iter()
            .filter_map(|&i| self.results.get(i))
            .cloned()
            .collect()
    }

    pub fn toggle_search_mode(&mut self) {
        self.search_mode = self.search_mode.toggled();
    }

    pub fn cycle_preview_mode(&mut self) {
        self.preview_mode = self.preview_mode.next();
    }

    /// Recall the previous history entry into the query. Recalled text is
    /// not recorded again; the history itself is left unchanged.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() || self.history_index == 0 {
            return;
        }
        self.history_index -= 1;
        let recalled = self.history[self.history_index].clone();
        self.replace_query(&recalled);
    }

    /// Recall the next history entry, or an empty live query past the end.
    /// Like [`App::history_prev`] this never records into the history.
    pub fn history_next(&mut self) {
        if self.history_index >= self.history.len() {
            return;
        }
        self.history_index += 1;
        let recalled = self
            .history
            .get(self.history_index)
            .cloned()
            .unwrap_or_default();
        self.replace_query(&recalled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Returns `count` content lines for any query and counts calls
    struct FakeSearcher {
        count: usize,
        calls: Rc<Cell<usize>>,
    }

    impl Searcher for FakeSearcher {
        fn search(
            &self,
            _query: &str,
            mode: SearchMode,
            _options: &SearchOptions,
        ) -> Result<Vec<MatchCandidate>, SearchError> {
            self.calls.set(self.calls.get() + 1);
            Ok((0..self.count)
                .map(|i| match mode {
                    SearchMode::Content => MatchCandidate::line(format!("f{i}.rs"), i as u32 + 1, "x"),
                    SearchMode::Files => MatchCandidate::file(format!("f{i}.rs")),
                })
                .collect())
        }
    }

    struct FailingSearcher;

    impl Searcher for FailingSearcher {
        fn search(
            &self,
            _query: &str,
            _mode: SearchMode,
            _options: &SearchOptions,
        ) -> Result<Vec<MatchCandidate>, SearchError> {
            Err(SearchError::ToolMissing { tool: "rg".into() })
        }
    }

    fn make_app(count: usize) -> App {
        let searcher = FakeSearcher {
            count,
            calls: Rc::new(Cell::new(0)),
        };
        let mut app = App::new(Box::new(searcher), SearchOptions::default(), SearchMode::Content);
        app.set_query("x");
        app.run_search();
        app
    }

    fn assert_viewport(app: &App) {
        if app.results().is_empty() {
            assert_eq!(app.cursor(), 0);
            return;
        }
        assert!(app.offset() <= app.cursor());
        assert!(app.cursor() < app.offset() + app.max_display());
        assert!(app.cursor() < app.results().len());
    }

    #[test]
    fn test_down_stops_at_last() {
        let mut app = make_app(7);
        for _ in 0..7 {
            app.move_cursor(Movement::Down);
        }
        assert_eq!(app.cursor(), 6);
        app.move_cursor(Movement::Down);
        assert_eq!(app.cursor(), 6);
    }

    #[test]
    fn test_up_at_top_is_noop() {
        let mut app = make_app(3);
        app.move_cursor(Movement::Up);
        assert_eq!(app.cursor(), 0);
    }

    #[test]
    fn test_page_and_jump_movements() {
        let mut app = make_app(25);
        app.set_max_display(10);

        app.move_cursor(Movement::PageDown);
        assert_eq!(app.cursor(), 10);
        app.move_cursor(Movement::PageDown);
        app.move_cursor(Movement::PageDown);
        assert_eq!(app.cursor(), 24);
        app.move_cursor(Movement::PageUp);
        assert_eq!(app.cursor(), 14);
        app.move_cursor(Movement::Home);
        assert_eq!(app.cursor(), 0);
        app.move_cursor(Movement::End);
        assert_eq!(app.cursor(), 24);
        assert_eq!(app.offset(), 15);
    }

    #[test]
    fn test_movement_on_empty_results() {
        let mut app = make_app(0);
        for m in [Movement::Down, Movement::End, Movement::PageDown, Movement::Up] {
            app.move_cursor(m);
            assert_eq!(app.cursor(), 0);
        }
        assert!(app.current().is_none());
    }

    #[test]
    fn test_viewport_invariant_holds() {
        let moves = [
            Movement::Down,
            Movement::PageDown,
            Movement::Down,
            Movement::End,
            Movement::Up,
            Movement::PageUp,
            Movement::Home,
            Movement::PageDown,
            Movement::Up,
        ];

        for max_display in 1..=12 {
            let mut app = make_app(30);
            app.set_max_display(max_display);
            for (i, m) in moves.iter().cycle().take(60).enumerate() {
                app.move_cursor(*m);
                assert_viewport(&app);
                // Shrinking the viewport mid-way must keep the invariant too
                if i == 30 {
                    app.set_max_display(max_display.div_ceil(2));
                    assert_viewport(&app);
                }
            }
        }
    }

    #[test]
    fn test_toggle_select_and_collect() {
        let mut app = make_app(5);
        app.move_cursor(Movement::Down);
        app.move_cursor(Movement::Down);
        app.toggle_select();
        app.move_cursor(Movement::Home);
        app.toggle_select();

        let picked: Vec<String> = app.collect_selection().into_iter().map(|c| c.path).collect();
        assert_eq!(picked, vec!["f0.rs", "f2.rs"]);

        // Toggle again removes
        app.toggle_select();
        assert_eq!(app.selection().len(), 1);
        assert!(app.is_selected(2));
    }

    #[test]
    fn test_collect_falls_back_to_cursor() {
        let mut app = make_app(3);
        app.move_cursor(Movement::End);
        let picked = app.collect_selection();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].path, "f2.rs");

        let empty = make_app(0);
        assert!(empty.collect_selection().is_empty());
    }

    #[test]
    fn test_toggle_select_on_empty_is_noop() {
        let mut app = make_app(0);
        app.toggle_select();
        assert!(app.selection().is_empty());
    }

    #[test]
    fn test_search_clears_selection() {
        let mut app = make_app(5);
        app.toggle_select();
        app.move_cursor(Movement::Down);
        app.toggle_select();
        assert_eq!(app.selection().len(), 2);

        app.run_search();
        assert!(app.selection().is_empty());
        assert_eq!(app.cursor(), 0);
        assert_eq!(app.offset(), 0);
    }

    #[test]
    fn test_search_error_gives_empty_results() {
        let mut app = App::new(Box::new(FailingSearcher), SearchOptions::default(), SearchMode::Content);
        app.set_query("x");
        app.run_search();
        assert!(app.results().is_empty());
        assert!(app.status_message.starts_with("Error:"));
    }

    #[test]
    fn test_set_query_resets_viewport_without_searching() {
        let calls = Rc::new(Cell::new(0));
        let searcher = FakeSearcher {
            count: 20,
            calls: Rc::clone(&calls),
        };
        let mut app = App::new(Box::new(searcher), SearchOptions::default(), SearchMode::Content);
        app.run_search();
        app.set_max_display(5);
        app.move_cursor(Movement::End);
        assert_eq!(calls.get(), 1);

        app.set_query("abc");
        assert_eq!(app.cursor(), 0);
        assert_eq!(app.offset(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_history_dedups_against_last_entry() {
        let mut app = make_app(0);
        app.set_query("foo");
        app.set_query("foo");
        app.set_query("");
        app.set_query("bar");
        app.set_query("foo");
        assert_eq!(app.history(), ["x", "foo", "bar", "foo"]);
        assert_eq!(app.history_index(), 4);
    }

    #[test]
    fn test_history_round_trip_to_live() {
        let mut app = App::new(
            Box::new(FailingSearcher),
            SearchOptions::default(),
            SearchMode::Content,
        );
        app.set_query("abc");
        app.history_prev();
        assert_eq!(app.query(), "abc");
        app.history_next();
        assert_eq!(app.query(), "");
        assert_eq!(app.history_index(), app.history().len());
    }

    #[test]
    fn test_history_boundaries() {
        let mut app = App::new(
            Box::new(FailingSearcher),
            SearchOptions::default(),
            SearchMode::Content,
        );
        app.history_prev();
        app.history_next();
        assert_eq!(app.query(), "");

        app.set_query("one");
        app.set_query("two");
        app.history_prev();
        app.history_prev();
        assert_eq!(app.query(), "one");
        app.history_prev();
        assert_eq!(app.query(), "one");
        // Recalling does not re-record
        assert_eq!(app.history(), ["one", "two"]);
        app.history_next();
        assert_eq!(app.query(), "two");
    }

    #[test]
    fn test_recall_leaves_history_unchanged() {
        let mut app = App::new(
            Box::new(FailingSearcher),
            SearchOptions::default(),
            SearchMode::Content,
        )
        .with_history(vec!["one".into(), "two".into(), "three".into()], 10);

        app.history_prev();
        app.history_prev();
        app.history_next();
        assert_eq!(app.query(), "three");
        app.history_prev();
        app.history_next();
        app.history_next();
        assert_eq!(app.query(), "");

        assert_eq!(app.history(), ["one", "two", "three"]);
        assert_eq!(app.history_index(), 3);
    }

    #[test]
    fn test_history_limit() {
        let app = App::new(
            Box::new(FailingSearcher),
            SearchOptions::default(),
            SearchMode::Content,
        )
        .with_history(vec!["a".into(), "b".into(), "b".into(), "c".into()], 2);
        assert_eq!(app.history(), ["b", "c"]);
        assert_eq!(app.history_index(), 2);
    }

    #[test]
    fn test_query_editing() {
        let mut app = make_app(0);
        app.clear_query();
        for c in "foo bar".chars() {
            app.push_char(c);
        }
        assert_eq!(app.query(), "foo bar");
        app.delete_word();
        assert_eq!(app.query(), "foo ");
        app.delete_word();
        assert_eq!(app.query(), "");
        app.push_char('a');
        app.pop_char();
        assert_eq!(app.query(), "");
        // Editing never records history
        assert_eq!(app.history(), ["x"]);
    }

    #[test]
    fn test_mode_switches() {
        let mut app = make_app(0);
        app.toggle_search_mode();
        assert_eq!(app.search_mode, SearchMode::Files);
        app.toggle_search_mode();
        assert_eq!(app.search_mode, SearchMode::Content);

        assert_eq!(app.preview_mode, PreviewMode::None);
        app.cycle_preview_mode();
        assert_eq!(app.preview_mode, PreviewMode::Right);
        app.cycle_preview_mode();
        assert_eq!(app.preview_mode, PreviewMode::Bottom);
        app.cycle_preview_mode();
        assert_eq!(app.preview_mode, PreviewMode::None);
    }
}
