use crate::query::match_positions;
use crate::search::{MatchCandidate, SearchMode};
use crate::tui::app::{App, PreviewMode};
use crate::tui::preview::PreviewSource;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::path::Path;

/// Title, query line and a blank line
pub const HEADER_ROWS: u16 = 3;
/// Status line and key hints
pub const FOOTER_ROWS: u16 = 2;
/// Rows the right-hand preview leaves free at the bottom
pub const PREVIEW_MARGIN: u16 = 2;
/// Width of the `>* ` marker column in front of each result
const MARKER_WIDTH: usize = 3;
/// Width of the line-number gutter in the preview
const GUTTER_WIDTH: usize = 5;
const FILLER: &str = "~";
const KEY_HINTS: &str =
    "Enter: confirm  Tab: select  ^T: mode  ^V: preview  ^R/^F: history  Esc: quit";

/// Screen regions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderLayout {
    pub results: Rect,
    pub preview: Option<Rect>,
    /// Result rows that fit between header and footer (at least 1)
    pub max_display: usize,
}

/// Split the screen into the results pane and the optional preview pane
pub fn compute_layout(area: Rect, mode: PreviewMode) -> FinderLayout {
    let (results, preview) = match mode {
        PreviewMode::None => (area, None),
        PreviewMode::Right => {
            let left = area.width / 2;
            let results = Rect::new(area.x, area.y, left, area.height);
            let preview = Rect::new(
                area.x + left,
                area.y,
                area.width - left,
                area.height.saturating_sub(PREVIEW_MARGIN),
            );
            (results, Some(preview))
        }
        PreviewMode::Bottom => {
            let preview_height = area.height / 3;
            let results_height = area.height - preview_height;
            let results = Rect::new(area.x, area.y, area.width, results_height);
            let preview = Rect::new(area.x, area.y + results_height, area.width, preview_height);
            (results, Some(preview))
        }
    };

    let max_display = results
        .height
        .saturating_sub(HEADER_ROWS + FOOTER_ROWS)
        .max(1) as usize;

    FinderLayout {
        results,
        preview,
        max_display,
    }
}

/// Compute the layout for `area` and push its row count into the app so the
/// viewport invariant holds for the frame about to be drawn
pub fn prepare(app: &mut App, area: Rect) -> FinderLayout {
    let layout = compute_layout(area, app.preview_mode);
    app.set_max_display(layout.max_display);
    layout
}

pub fn draw(f: &mut Frame, app: &App, previews: &mut dyn PreviewSource) {
    let layout = compute_layout(f.area(), app.preview_mode);

    draw_results(f, app, &layout);
    if let Some(area) = layout.preview {
        draw_preview(f, app, previews, area);
    }
}

/// Text shown for a candidate in the result list
pub fn display_text(candidate: &MatchCandidate, mode: SearchMode) -> String {
    match mode {
        SearchMode::Files => candidate.path.clone(),
        SearchMode::Content => format!(
            "{}:{}: {}",
            candidate.path,
            candidate.line_number,
            candidate.content.trim()
        ),
    }
}

/// First (0-based) preview line so that `target_line` (1-based, 0 = none)
/// sits at about half the pane height
pub fn preview_window(target_line: u32, height: usize) -> usize {
    if target_line == 0 {
        return 0;
    }
    (target_line as usize - 1).saturating_sub(height / 2)
}

/// 1-based page of the viewport and total page count
pub fn page_info(offset: usize, max_display: usize, total: usize) -> (usize, usize) {
    let max_display = max_display.max(1);
    let page = offset / max_display + 1;
    let pages = total.div_ceil(max_display).max(1);
    (page, pages)
}

fn draw_results(f: &mut Frame, app: &App, layout: &FinderLayout) {
    let chunks = Layout::vertical([
        Constraint::Length(HEADER_ROWS),
        Constraint::Min(0),
        Constraint::Length(FOOTER_ROWS),
    ])
    .split(layout.results);

    draw_header(f, app, chunks[0]);
    draw_rows(f, app, layout.max_display, chunks[1]);
    draw_footer(f, app, layout.max_display, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" fzgrep ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("[{}]", app.search_mode.label()),
            Style::default().fg(Color::Magenta),
        ),
    ]);
    let query = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::styled(app.query(), Style::default().fg(Color::Yellow)),
    ]);

    f.render_widget(Paragraph::new(vec![title, query, Line::default()]), area);

    if area.height > 1 {
        let column = (2 + app.query().chars().count()).min(u16::MAX as usize) as u16;
        f.set_cursor_position((area.x + column.min(area.width.saturating_sub(1)), area.y + 1));
    }
}

fn draw_rows(f: &mut Frame, app: &App, max_display: usize, area: Rect) {
    let text_width = (area.width as usize).saturating_sub(MARKER_WIDTH);

    let lines: Vec<Line> = (0..max_display)
        .map(|row| {
            let index = app.offset() + row;
            match app.results().get(index) {
                Some(candidate) => result_line(app, index, candidate, text_width),
                None => Line::styled(FILLER, Style::default().fg(Color::DarkGray)),
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}

fn result_line<'a>(app: &App, index: usize, candidate: &MatchCandidate, width: usize) -> Line<'a> {
    let is_cursor = index == app.cursor();
    let is_selected = app.is_selected(index);

    let marker = format!(
        "{}{} ",
        if is_cursor { '>' } else { ' ' },
        if is_selected { '*' } else { ' ' }
    );

    let text: String = display_text(candidate, app.search_mode)
        .chars()
        .take(width)
        .collect();

    let mut spans = vec![Span::styled(marker, Style::default().fg(Color::Magenta))];
    spans.extend(highlight_matches(&text, &match_positions(app.query(), &text)));

    let line = Line::from(spans);
    if is_cursor {
        line.style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        line
    }
}

/// Split `text` into spans, styling the chars at `positions` (sorted)
fn highlight_matches<'a>(text: &str, positions: &[usize]) -> Vec<Span<'a>> {
    let match_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_matched = false;
    let mut next = positions.iter().peekable();

    for (idx, ch) in text.chars().enumerate() {
        let matched = next.next_if(|&&p| p == idx).is_some();
        if matched != current_matched && !current.is_empty() {
            let chunk = std::mem::take(&mut current);
            spans.push(if current_matched {
                Span::styled(chunk, match_style)
            } else {
                Span::raw(chunk)
            });
        }
        current_matched = matched;
        current.push(ch);
    }

    if !current.is_empty() {
        spans.push(if current_matched {
            Span::styled(current, match_style)
        } else {
            Span::raw(current)
        });
    }

    spans
}

fn draw_footer(f: &mut Frame, app: &App, max_display: usize, area: Rect) {
    let total = app.results().len();
    let (page, pages) = page_info(app.offset(), max_display, total);

    let mut status = format!(
        "{} results | {} selected | page {}/{}",
        total,
        app.selection().len(),
        page,
        pages
    );
    if !app.status_message.is_empty() {
        status.push_str(" | ");
        status.push_str(&app.status_message);
    }

    let status_style = if app.status_message.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let lines = vec![
        Line::styled(status, status_style),
        Line::styled(KEY_HINTS, Style::default().fg(Color::DarkGray)),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_preview(f: &mut Frame, app: &App, previews: &mut dyn PreviewSource, area: Rect) {
    let Some(candidate) = app.current() else {
        let empty = Paragraph::new("No preview available")
            .block(Block::default().borders(Borders::ALL).title(" Preview "));
        f.render_widget(empty, area);
        return;
    };

    let height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;

    let content = match previews.load(Path::new(&candidate.path)) {
        Ok(content) => preview_text(&content, candidate.line_number, height, width),
        Err(e) => Text::from(Line::styled(
            format!("Error: {}", e),
            Style::default().fg(Color::Red),
        )),
    };

    let preview = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", candidate.path)),
    );
    f.render_widget(preview, area);
}

fn preview_text(content: &str, target_line: u32, height: usize, width: usize) -> Text<'static> {
    let start = preview_window(target_line, height);
    let content_width = width.saturating_sub(GUTTER_WIDTH);

    let line_num_style = Style::default().fg(Color::DarkGray);
    let target_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let lines: Vec<Line> = content
        .lines()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(idx, line)| {
            let actual_line = idx + 1;
            let shown: String = line.chars().take(content_width).collect();
            let content_style = if actual_line == target_line as usize {
                target_style
            } else {
                Style::default()
            };

            Line::from(vec![
                Span::styled(format!("{:4} ", actual_line), line_num_style),
                Span::styled(shown, content_style),
            ])
        })
        .collect();

    Text::from(lines)
}
