/// Color code definition for frames
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub reset: &'static str,
    pub bold: &'static str,
    /// Header and rule lines
    pub header: &'static str,
    /// The idle notice and the footer hint
    pub muted: &'static str,
    /// Empty cells of a bar
    pub empty: &'static str,
    /// The `current/total` counter
    pub stats: &'static str,
    /// Band colors for root bars, indexed by [`Band`](crate::render::Band)
    pub root_bands: [&'static str; 4],
    /// Band colors for nested bars, indexed by [`Band`](crate::render::Band)
    pub child_bands: [&'static str; 4],
}

static NOCOLOR: Colors = Colors {
    reset: "",
    bold: "",
    header: "",
    muted: "",
    empty: "",
    stats: "",
    root_bands: ["", "", "", ""],
    child_bands: ["", "", "", ""],
};

// 256-color palette
static COLOR: Colors = Colors {
    reset: "\x1b[0m",
    bold: "\x1b[1m",
    header: "\x1b[1;38;5;62m",
    muted: "\x1b[3;38;5;240m",
    empty: "\x1b[38;5;238m",
    stats: "\x1b[38;5;245m",
    // low, mid, high, complete
    root_bands: [
        "\x1b[38;5;62m",
        "\x1b[38;5;33m",
        "\x1b[38;5;39m",
        "\x1b[38;5;42m",
    ],
    child_bands: [
        "\x1b[38;5;135m",
        "\x1b[38;5;178m",
        "\x1b[38;5;36m",
        "\x1b[38;5;46m",
    ],
};

#[inline]
pub const fn colors(use_color: bool) -> Colors {
    if use_color { COLOR } else { NOCOLOR }
}

/// Terminal control codes used by the screen
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub enter_alt_screen: &'static str,
    pub leave_alt_screen: &'static str,
    pub hide_cursor: &'static str,
    pub show_cursor: &'static str,
    /// Move the cursor to the top-left corner
    pub home: &'static str,
    /// Erase from the cursor to the end of the line
    pub clear_line: &'static str,
    /// Erase from the cursor to the end of the screen
    pub clear_below: &'static str,
}

static NOCONTROL: Controls = Controls {
    enter_alt_screen: "",
    leave_alt_screen: "",
    hide_cursor: "",
    show_cursor: "",
    home: "",
    clear_line: "",
    clear_below: "",
};

static CONTROL: Controls = Controls {
    enter_alt_screen: "\x1b[?1049h",
    leave_alt_screen: "\x1b[?1049l",
    hide_cursor: "\x1b[?25l",
    show_cursor: "\x1b[?25h",
    home: "\x1b[H",
    clear_line: "\x1b[K",
    clear_below: "\x1b[J",
};

#[inline]
pub const fn controls(is_terminal: bool) -> Controls {
    if is_terminal { CONTROL } else { NOCONTROL }
}

pub fn is_esc_end(c: char) -> bool {
    // we only do very basic check right now
    c < u8::MAX as char && b"mAKGJBCDEFHSTfhlin".contains(&(c as u8))
}

/// Display width of a string, not counting escape sequences
pub fn display_width(s: &str) -> usize {
    use unicode_width::UnicodeWidthChar;
    let mut width = 0;
    let mut is_escaping = false;
    for c in s.chars() {
        if is_escaping {
            is_escaping = !is_esc_end(c);
        } else if c == '\x1b' {
            is_escaping = true;
        } else {
            width += c.width().unwrap_or(0);
        }
    }
    width
}

/// Character shown in place of control characters in user text
pub const REPLACEMENT: char = '\u{fffd}';

/// Push user text into `out`, replacing control characters (including
/// newlines and escapes) with [`REPLACEMENT`] so the text stays on one row
pub fn push_printable(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c.is_control() { REPLACEMENT } else { c }));
}

/// Push at most `width` columns of `line` into `out`.
///
/// Escape sequences are always kept, so colors opened before the cut
/// still get their reset. Returns the width that was left unused.
pub fn push_clipped(out: &mut String, mut width: usize, line: &str) -> usize {
    use unicode_width::UnicodeWidthChar;
    let mut clipped = false;
    let mut is_escaping = false;
    for c in line.chars() {
        // escapes are kept even after the cut
        if is_escaping {
            if is_esc_end(c) {
                is_escaping = false;
            }
            out.push(c);
            continue;
        }
        if c == '\x1b' {
            is_escaping = true;
            out.push(c);
            continue;
        }
        if clipped {
            continue;
        }
        let w = c.width().unwrap_or(0);
        if w > width {
            clipped = true;
            continue;
        }
        width -= w;
        out.push(c);
    }
    width
}
