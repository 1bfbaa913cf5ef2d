use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated text.
const ELLIPSIS: &str = "...";
/// Display width of [`ELLIPSIS`].
const ELLIPSIS_WIDTH: usize = 3;

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters and most emoji occupy two columns, combining marks zero.
///
/// # Examples
///
/// ```
/// use tnews::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns.
///
/// When the text does not fit, as much of it as possible is kept and `...`
/// is appended. Widths of three columns or fewer cannot hold a character plus
/// the ellipsis, so the text is simply cut.
///
/// Returns `Cow::Borrowed` when no truncation is needed.
///
/// # Examples
///
/// ```
/// use tnews::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("日本語テスト", 7), "日本...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    /// Saw a bare ESC, deciding what follows.
    Start,
    /// Inside `ESC [` until a final byte in `@..=~`.
    Csi,
    /// Inside `ESC ]` until BEL or `ESC \`.
    Osc,
    /// Saw ESC inside an OSC body.
    OscEsc,
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Titles and summaries come from third-party sites through the backend, and
/// are printed straight into the terminal. CSI and OSC sequences are dropped
/// whole; tab, newline and carriage return survive.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// # Examples
///
/// ```
/// use tnews::util::strip_control_chars;
///
/// assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
/// assert_eq!(strip_control_chars("\x1b]0;title\x07text"), "text");
/// ```
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c == '\x1b' || is_stripped_control(c)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut state = Escape::None;

    for c in s.chars() {
        state = match (state, c) {
            (Escape::None, '\x1b') => Escape::Start,
            (Escape::None, c) if is_stripped_control(c) => Escape::None,
            (Escape::None, c) => {
                out.push(c);
                Escape::None
            }
            (Escape::Start, '[') => Escape::Csi,
            (Escape::Start, ']') => Escape::Osc,
            (Escape::Start, '\x1b') => Escape::Start,
            // Bare ESC: drop it and treat the next char normally.
            (Escape::Start, c) => {
                if !is_stripped_control(c) {
                    out.push(c);
                }
                Escape::None
            }
            (Escape::Csi, '\u{40}'..='\u{7e}') => Escape::None,
            (Escape::Csi, _) => Escape::Csi,
            (Escape::Osc, '\x07') => Escape::None,
            (Escape::Osc, '\x1b') => Escape::OscEsc,
            (Escape::Osc, _) => Escape::Osc,
            (Escape::OscEsc, '\\') => Escape::None,
            (Escape::OscEsc, _) => Escape::Osc,
        };
    }

    Cow::Owned(out)
}

/// Sanitizes text for a single list row: control characters are stripped
/// and every run of whitespace (including newlines) becomes one space.
///
/// # Examples
///
/// ```
/// use tnews::util::single_line;
///
/// assert_eq!(single_line("  Breaking:\n\tnew  model "), "Breaking: new model");
/// ```
pub fn single_line(s: &str) -> Cow<'_, str> {
    let clean = strip_control_chars(s);
    let needs_collapse = clean.starts_with(char::is_whitespace)
        || clean.ends_with(char::is_whitespace)
        || clean
            .as_bytes()
            .windows(2)
            .any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
        || clean.chars().any(|c| c.is_whitespace() && c != ' ');

    if !needs_collapse {
        return clean;
    }

    Cow::Owned(clean.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_wide_char_truncation() {
        // 6 chars x 2 columns = 12 columns
        assert_eq!(truncate_to_width("日本語テスト", 7), "日本...");
        assert_eq!(truncate_to_width("日本語テスト", 8), "日本...");
        assert_eq!(truncate_to_width("日本語テスト", 9), "日本語...");
        assert_eq!(truncate_to_width("日本", 10), "日本");
    }

    #[test]
    fn test_narrow_widths_cut_without_ellipsis() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
        assert_eq!(truncate_to_width("日本", 1), "");
        assert_eq!(truncate_to_width("日本", 3), "日");
        assert_eq!(truncate_to_width("Testing", 4), "T...");
    }

    #[test]
    fn test_truncation_borrows_when_fitting() {
        assert!(matches!(truncate_to_width("fits", 4), Cow::Borrowed(_)));
        assert!(matches!(truncate_to_width("", 0), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_c0_controls_and_del() {
        assert_eq!(
            strip_control_chars("he\x00ll\x07o\x08 w\x0bor\x0cld\x01!\x7f"),
            "hello world!"
        );
    }

    #[test]
    fn test_strip_csi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed text\x1b[0m"), "Red text");
        assert_eq!(strip_control_chars("before\x1b[2Aafter"), "beforeafter");
    }

    #[test]
    fn test_strip_osc_sequences() {
        assert_eq!(
            strip_control_chars("\x1b]0;malicious title\x07safe text"),
            "safe text"
        );
        assert_eq!(
            strip_control_chars("\x1b]0;malicious title\x1b\\safe text"),
            "safe text"
        );
    }

    #[test]
    fn test_strip_bare_esc() {
        assert_eq!(strip_control_chars("before\x1bafter"), "beforeafter");
        assert_eq!(strip_control_chars("trailing\x1b"), "trailing");
    }

    #[test]
    fn test_strip_preserves_unicode() {
        assert_eq!(
            strip_control_chars("日本語 \x1b[31m赤い\x1b[0m テキスト"),
            "日本語 赤い テキスト"
        );
    }

    #[test]
    fn test_single_line_collapses_whitespace() {
        assert_eq!(single_line("a\nb"), "a b");
        assert_eq!(single_line("a  \r\n  b"), "a b");
        assert_eq!(single_line("\x1b[1mbold\x1b[0m\ttitle"), "bold title");
    }

    #[test]
    fn test_single_line_borrows_clean_input() {
        assert!(matches!(single_line("already clean"), Cow::Borrowed(_)));
    }
}
