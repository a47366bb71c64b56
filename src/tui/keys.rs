//! Raw terminal input decoding
//!
//! The terminal runs in non-canonical mode, so every read hands back the
//! raw bytes of one keystroke: a single byte for printable and control
//! keys, or a short escape sequence for navigation keys. [`decode`] turns
//! those bytes into a [`Key`]. Unknown sequences resolve to
//! [`Key::Escape`]; decoding never fails.

/// Upper bound on bytes consumed for a single key event
pub const MAX_KEY_BYTES: usize = 4;

const ESC: u8 = 0x1b;

/// A decoded key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(u8),
    Enter,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Tab,
    Space,
    /// Ctrl plus a lowercase letter
    Ctrl(char),
}

/// Decode one key event from raw input bytes.
///
/// Returns `None` only for an empty read, which means end of input.
/// Bytes past [`MAX_KEY_BYTES`] are ignored.
pub fn decode(bytes: &[u8]) -> Option<Key> {
    let bytes = &bytes[..bytes.len().min(MAX_KEY_BYTES)];

    match bytes {
        [] => None,
        [byte] => Some(decode_single(*byte)),
        [ESC, b'[', rest @ ..] if !rest.is_empty() => Some(decode_csi(rest)),
        [ESC, b'O', final_byte] => Some(decode_ss3(*final_byte)),
        _ => Some(Key::Escape),
    }
}

fn decode_single(byte: u8) -> Key {
    match byte {
        b'\r' | b'\n' => Key::Enter,
        ESC => Key::Escape,
        127 | 8 => Key::Backspace,
        b'\t' => Key::Tab,
        b' ' => Key::Space,
        1..=26 => Key::Ctrl((byte - 1 + b'a') as char),
        _ => Key::Char(byte),
    }
}

/// `ESC [` sequences; `rest` is everything after the bracket
fn decode_csi(rest: &[u8]) -> Key {
    match rest {
        [b'A', ..] => Key::Up,
        [b'B', ..] => Key::Down,
        [b'C', ..] => Key::Right,
        [b'D', ..] => Key::Left,
        [b'H', ..] => Key::Home,
        [b'F', ..] => Key::End,
        [digit, b'~', ..] => match digit {
            b'5' => Key::PageUp,
            b'6' => Key::PageDown,
            b'3' => Key::Delete,
            b'1' | b'7' => Key::Home,
            b'4' | b'8' => Key::End,
            _ => Key::Escape,
        },
        _ => Key::Escape,
    }
}

/// `ESC O` application-mode sequences
fn decode_ss3(final_byte: u8) -> Key {
    match final_byte {
        b'H' => Key::Home,
        b'F' => Key::End,
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        _ => Key::Escape,
    }
}
