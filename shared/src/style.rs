//! ANSI escape helpers for the colored game messages.

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const PINK: &str = "\x1b[95m";

pub const CROWN: &str = "\u{1F451}";
pub const THUMBS_UP: &str = "\u{1F44D}";
pub const SAD_FACE: &str = "\u{2639}";

/// Wraps `text` in a color code and a reset.
pub fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}{RESET}")
}
