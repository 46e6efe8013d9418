//! Filename sanitization.

use serde::{Deserialize, Serialize};

/// Characters rejected by at least one common filesystem
pub const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// How reserved characters are replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// Each reserved character becomes one space
    #[default]
    Space,
    /// Each reserved character becomes its full-width counterpart
    Fullwidth,
}

/// Replace every reserved character with a single space.
///
/// Does not trim, collapse spaces or limit length.
pub fn sanitize(name: &str) -> String {
    sanitize_with(name, SanitizeMode::Space)
}

/// Replace every reserved character according to `mode`.
pub fn sanitize_with(name: &str, mode: SanitizeMode) -> String {
    name.chars()
        .map(|c| {
            if !is_reserved(c) {
                return c;
            }
            match mode {
                SanitizeMode::Space => ' ',
                SanitizeMode::Fullwidth => to_fullwidth(c),
            }
        })
        .collect()
}

/// Whether `c` is in the reserved set
pub fn is_reserved(c: char) -> bool {
    RESERVED_CHARS.contains(&c)
}

/// Whether `name` contains any reserved character
pub fn has_reserved(name: &str) -> bool {
    name.chars().any(is_reserved)
}

// Full-width forms live at a fixed offset from ASCII punctuation.
fn to_fullwidth(c: char) -> char {
    match c {
        '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(' '),
        _ => c,
    }
}
