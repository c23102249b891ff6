//! Display width helpers for block labels.
//!
//! Labels may carry ANSI styling from the host, so widths are measured after
//! stripping escapes.

use unicode_width::UnicodeWidthChar;

/// Display width of `text` after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Strip styling, then cut or pad `text` to exactly `width` columns. A wide
/// character that would straddle the edge is replaced by padding.
pub fn fit_to_width(text: &str, width: usize, pad: char) -> String {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);

    let mut out = String::new();
    let mut used = 0;
    for ch in clean_str.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    while used < width {
        out.push(pad);
        used += 1;
    }
    out
}
