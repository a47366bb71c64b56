//! Interactive finder
//!
//! The terminal is switched to raw mode and the interface is drawn on
//! stderr, leaving stdout free for the final selection. Keystrokes are read
//! as raw bytes from the controlling terminal and decoded by [`keys`].

pub mod app;
pub mod keys;
pub mod preview;
pub mod ui;

pub use app::{App, Movement, PreviewMode};
pub use keys::{decode, Key};
pub use preview::{FsPreview, PreviewError, PreviewSource};

use crate::search::{MatchCandidate, SearchMode};
use anyhow::{bail, Context, Result};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use memchr::memchr;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io::{self, Read, Stderr};
use std::sync::Once;
use tracing::{debug, warn};

const ESC: u8 = 0x1b;

/// What the driving loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
    Confirm,
}

/// Apply one key to the finder state
pub fn handle_key(app: &mut App, key: Key) -> Action {
    match key {
        Key::Char(byte) if byte.is_ascii_graphic() => {
            app.push_char(byte as char);
            app.run_search();
        }
        Key::Space => {
            app.push_char(' ');
            app.run_search();
        }
        Key::Backspace => {
            app.pop_char();
            app.run_search();
        }
        Key::Ctrl('w') => {
            app.delete_word();
            app.run_search();
        }
        Key::Ctrl('u') => {
            app.clear_query();
            app.run_search();
        }

        Key::Enter => {
            app.commit_query();
            return Action::Confirm;
        }
        Key::Escape | Key::Ctrl('c') | Key::Ctrl('q') => return Action::Quit,

        Key::Up | Key::Ctrl('p') => app.move_cursor(Movement::Up),
        Key::Down | Key::Ctrl('n') => app.move_cursor(Movement::Down),
        Key::PageUp => app.move_cursor(Movement::PageUp),
        Key::PageDown => app.move_cursor(Movement::PageDown),
        Key::Home => app.move_cursor(Movement::Home),
        Key::End => app.move_cursor(Movement::End),

        Key::Tab => {
            app.toggle_select();
            app.move_cursor(Movement::Down);
        }
        Key::Ctrl('t') => {
            app.toggle_search_mode();
            app.run_search();
        }
        Key::Ctrl('v') => app.cycle_preview_mode(),
        Key::Ctrl('r') => {
            app.history_prev();
            app.run_search();
        }
        Key::Ctrl('f') => {
            app.history_next();
            app.run_search();
        }

        Key::Char(_) | Key::Left | Key::Right | Key::Delete | Key::Ctrl(_) => {}
    }

    Action::Continue
}

/// One unit of decoded input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    /// Non-ASCII text typed or pasted into the query
    Text(char),
}

/// Bytes requested per read; a held key or a paste delivers several keys at once
pub const READ_BUFFER_BYTES: usize = 256;

/// Longest `ESC [` sequence scanned for its final byte
const MAX_SEQUENCE_BYTES: usize = 16;

/// Splits raw reads into keys. Reads are cut at ESC bytes so every escape
/// sequence is decoded on its own, and an incomplete escape sequence or
/// UTF-8 tail is held until the rest of it arrives.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pending: Vec<u8>,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Input> {
        // A read holding nothing but ESC is the Escape key itself
        let lone_escape = bytes == [ESC];

        self.pending.extend_from_slice(bytes);
        let buffered = std::mem::take(&mut self.pending);

        let mut inputs = Vec::new();
        let mut rest = &buffered[..];

        while let Some(&first) = rest.first() {
            if first == ESC {
                match escape_len(rest) {
                    Some(len) => {
                        inputs.extend(decode(&rest[..len]).map(Input::Key));
                        rest = &rest[len..];
                    }
                    None if lone_escape => {
                        inputs.push(Input::Key(Key::Escape));
                        rest = &rest[1..];
                    }
                    None => break,
                }
            } else {
                let end = memchr(ESC, rest).unwrap_or(rest.len());
                let consumed = push_text(&rest[..end], end == rest.len(), &mut inputs);
                rest = &rest[consumed..];
                if consumed < end {
                    break;
                }
            }
        }

        self.pending = rest.to_vec();
        inputs
    }
}

/// Length of the escape sequence at the start of `bytes`, or `None` while
/// it is still incomplete
fn escape_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1) {
        None => None,
        Some(b'[') => {
            for (i, &b) in bytes.iter().enumerate().skip(2).take(MAX_SEQUENCE_BYTES - 2) {
                if b == ESC {
                    return Some(i);
                }
                if (0x40..=0x7e).contains(&b) {
                    return Some(i + 1);
                }
            }
            (bytes.len() >= MAX_SEQUENCE_BYTES).then_some(MAX_SEQUENCE_BYTES)
        }
        Some(b'O') => (bytes.len() >= 3).then_some(3),
        Some(_) => Some(1),
    }
}

/// Turn an ESC-free run into keys and text chars. Returns the bytes used;
/// an incomplete UTF-8 tail is left unconsumed when `at_end` is set.
fn push_text(run: &[u8], at_end: bool, inputs: &mut Vec<Input>) -> usize {
    let mut pos = 0;

    while pos < run.len() {
        let (valid, bad) = match std::str::from_utf8(&run[pos..]) {
            Ok(text) => (text.len(), None),
            Err(e) => (e.valid_up_to(), Some(e.error_len())),
        };

        // Prefix is valid by construction
        let text = std::str::from_utf8(&run[pos..pos + valid]).unwrap_or_default();
        inputs.extend(text.chars().filter_map(|c| {
            if c.is_ascii() {
                decode(&[c as u8]).map(Input::Key)
            } else {
                Some(Input::Text(c))
            }
        }));
        pos += valid;

        match bad {
            None => break,
            Some(None) if at_end => break,
            Some(len) => {
                let len = len.unwrap_or(run.len() - pos);
                inputs.extend(decode(&run[pos..pos + len]).map(Input::Key));
                pos += len;
            }
        }
    }

    pos
}

/// Terminal restore shared by the guard and the panic hook
fn restore_terminal() -> io::Result<()> {
    let mut stderr = io::stderr();
    let leave = execute!(stderr, LeaveAlternateScreen, Show);
    let raw = disable_raw_mode();
    leave.and(raw)
}

/// Run `restore` before the existing panic hook. Release builds abort on
/// panic, so `Drop` alone never sees a panic there.
fn chain_restore_hook<F>(restore: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

static PANIC_HOOK: Once = Once::new();

/// Raw mode plus alternate screen on stderr for the guard's lifetime
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        PANIC_HOOK.call_once(|| {
            chain_restore_hook(|| {
                let _ = restore_terminal();
            })
        });

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stderr = io::stderr();
        if let Err(e) = execute!(stderr, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("failed to enter alternate screen");
        }
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal() {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Keystrokes come from the controlling terminal so stdin may be a pipe
fn open_input() -> Box<dyn Read> {
    match File::open("/dev/tty") {
        Ok(tty) => Box::new(tty),
        Err(e) => {
            debug!(error = %e, "no controlling terminal, reading keys from stdin");
            Box::new(io::stdin())
        }
    }
}

/// Run the finder until the user confirms or quits.
///
/// Returns the chosen candidates on confirm, `None` on quit.
pub fn run(app: &mut App, previews: &mut dyn PreviewSource) -> Result<Option<Vec<MatchCandidate>>> {
    let _guard = RawModeGuard::enable()?;

    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut input = open_input();

    if !app.query().is_empty() || app.search_mode == SearchMode::Files {
        app.run_search();
    }

    run_app(&mut terminal, app, previews, &mut input)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    app: &mut App,
    previews: &mut dyn PreviewSource,
    input: &mut dyn Read,
) -> Result<Option<Vec<MatchCandidate>>> {
    let mut decoder = InputDecoder::new();
    let mut buf = [0u8; READ_BUFFER_BYTES];

    loop {
        terminal.draw(|f| {
            ui::prepare(app, f.area());
            ui::draw(f, app, previews);
        })?;

        let n = input.read(&mut buf).context("failed to read key")?;
        if n == 0 {
            bail!("input closed");
        }

        for event in decoder.feed(&buf[..n]) {
            let action = match event {
                Input::Key(key) => handle_key(app, key),
                Input::Text(c) => {
                    app.push_char(c);
                    app.run_search();
                    Action::Continue
                }
            };

            match action {
                Action::Continue => {}
                Action::Quit => return Ok(None),
                Action::Confirm => return Ok(Some(app.collect_selection())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_run_splits_into_keys() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"ab c"),
            vec![
                Input::Key(Key::Char(b'a')),
                Input::Key(Key::Char(b'b')),
                Input::Key(Key::Space),
                Input::Key(Key::Char(b'c')),
            ]
        );
    }

    #[test]
    fn test_escape_sequence_is_one_key() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\x1b[A"), vec![Input::Key(Key::Up)]);
        assert_eq!(decoder.feed(b"\x1b"), vec![Input::Key(Key::Escape)]);
    }

    #[test]
    fn test_utf8_text() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed("é".as_bytes()), vec![Input::Text('é')]);
    }

    #[test]
    fn test_split_utf8_is_held_back() {
        let mut decoder = InputDecoder::new();
        let bytes = "a€".as_bytes();
        assert_eq!(decoder.feed(&bytes[..3]), vec![Input::Key(Key::Char(b'a'))]);
        assert_eq!(decoder.feed(&bytes[3..]), vec![Input::Text('€')]);
    }

    #[test]
    fn test_sequences_split_across_small_reads() {
        let mut decoder = InputDecoder::new();
        let keys: Vec<Input> = b"\x1b[B\x1b[B\x1b[B"
            .chunks(keys::MAX_KEY_BYTES)
            .flat_map(|chunk| decoder.feed(chunk))
            .collect();
        assert_eq!(keys, vec![Input::Key(Key::Down); 3]);
    }

    #[test]
    fn test_several_sequences_in_one_read() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[A\x1b[5~\x1bOH"),
            vec![
                Input::Key(Key::Up),
                Input::Key(Key::PageUp),
                Input::Key(Key::Home),
            ]
        );
    }

    #[test]
    fn test_escape_between_text() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"a\x1b[Bb"),
            vec![
                Input::Key(Key::Char(b'a')),
                Input::Key(Key::Down),
                Input::Key(Key::Char(b'b')),
            ]
        );
    }

    #[test]
    fn test_incomplete_sequence_is_carried() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"x\x1b["), vec![Input::Key(Key::Char(b'x'))]);
        assert_eq!(decoder.feed(b"6~"), vec![Input::Key(Key::PageDown)]);
    }

    #[test]
    fn test_double_escape_is_two_keys() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b\x1b[A"),
            vec![Input::Key(Key::Escape), Input::Key(Key::Up)]
        );
    }

    #[test]
    fn test_panic_runs_restore_before_previous_hook() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);
        chain_restore_hook(move || flag.store(true, Ordering::SeqCst));

        let result = std::panic::catch_unwind(|| panic!("draw failed"));
        // Back to the default hook
        let _ = std::panic::take_hook();

        assert!(result.is_err());
        assert!(restored.load(Ordering::SeqCst));
    }

    #[test]
    fn test_control_bytes_inside_text() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"x\x7f"),
            vec![Input::Key(Key::Char(b'x')), Input::Key(Key::Backspace)]
        );
    }
}
