//! Printing of the confirmed selection

use crate::search::{MatchCandidate, SearchMode};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Plain-text form of one confirmed candidate: the path in file mode,
/// `path:line: content` in content mode
pub fn format_candidate(candidate: &MatchCandidate, mode: SearchMode) -> String {
    match mode {
        SearchMode::Files => candidate.path.clone(),
        SearchMode::Content => format!(
            "{}:{}: {}",
            candidate.path, candidate.line_number, candidate.content
        ),
    }
}

/// Print the selection to stdout, one candidate per line
pub fn print_selection(
    candidates: &[MatchCandidate],
    mode: SearchMode,
    color: bool,
) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_selection(&mut stdout, candidates, mode)
}

/// Write the selection in grep style with a magenta path and green line number
pub fn write_selection<W: WriteColor>(
    out: &mut W,
    candidates: &[MatchCandidate],
    mode: SearchMode,
) -> io::Result<()> {
    for candidate in candidates {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", candidate.path)?;
        out.reset()?;

        if mode == SearchMode::Content {
            write!(out, ":")?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "{}", candidate.line_number)?;
            out.reset()?;
            write!(out, ": {}", candidate.content)?;
        }

        writeln!(out)?;
    }

    out.flush()
}
