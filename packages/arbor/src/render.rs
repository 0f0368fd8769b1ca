//! # Renderer
//!
//! Pure function from a [`Forest`] to a [`Frame`]. Nothing here touches the
//! terminal; the [`Screen`](crate::Screen) decides how a frame is painted.
//!
//! Each bar is formatted on one line:
//! ```text
//!   epochs [██████████████████████▌░░░░░░░░░░░░░░░░░░░░░░] 25/50  50.0%
//!   ├─ batches [███████████▌░░░░░░░░░░░░░░░░░░░░░░░░░░░░░] 13/50  26.0%
//!   └─ eval [░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░] 0/0   0.0%
//! ```
//! Bars get narrower with depth, down to a minimum, so deep nesting
//! stays readable.

use std::fmt::Write as _;

use crate::fmt::ansi;
use crate::tree::{Forest, ProgressNode, Visit};

const CHAR_FILLED: char = '\u{2588}'; // █
const CHAR_PARTIAL: char = '\u{258C}'; // ▌
const CHAR_EMPTY: char = '\u{2591}'; // ░
const BRANCH_MID: &str = "\u{251C}\u{2500} "; // ├─
const BRANCH_LAST: &str = "\u{2514}\u{2500} "; // └─
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Text of the frame displayed when there are no bars
pub const IDLE_MESSAGE: &str = "\u{23F3} No active progress bars";
/// Title in the frame header
pub const TITLE: &str = "\u{1F4CA} Progress Monitor";
/// Hint in the frame footer
pub const QUIT_HINT: &str = "Press 'q' or Ctrl+C to quit";

/// Layout options of the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Width of the bar (not counting the brackets) at depth 0
    pub bar_width: usize,
    /// Bars never get narrower than this
    pub min_bar_width: usize,
    /// How much narrower the bar gets per depth level
    pub depth_step: usize,
    /// Show the header and the quit hint around the bars
    pub chrome: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bar_width: 45,
            min_bar_width: 20,
            depth_step: 2,
            chrome: true,
        }
    }
}

impl RenderOptions {
    /// Width of the bar at depth
    pub fn bar_width_at(&self, depth: usize) -> usize {
        self.bar_width
            .saturating_sub(depth.saturating_mul(self.depth_step))
            .max(self.min_bar_width)
    }
}

/// Visual category of a bar, chosen by completion ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Band {
    /// Below 50%
    Low = 0,
    /// At least 50%
    Mid = 1,
    /// At least 75%
    High = 2,
    /// 100%
    Complete = 3,
}

impl Band {
    pub fn of(ratio: f64) -> Self {
        if ratio >= 1f64 {
            Self::Complete
        } else if ratio >= 0.75 {
            Self::High
        } else if ratio >= 0.5 {
            Self::Mid
        } else {
            Self::Low
        }
    }
}

/// Cell counts of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub filled: usize,
    /// If one partial cell follows the filled cells
    pub partial: bool,
    pub empty: usize,
}

impl Fill {
    /// Split `width` cells according to the ratio
    pub fn new(ratio: f64, width: usize) -> Self {
        let filled = ((ratio.clamp(0f64, 1f64) * width as f64) as usize).min(width);
        let partial = filled > 0 && filled < width;
        let empty = width - filled - usize::from(partial);
        Self {
            filled,
            partial,
            empty,
        }
    }
}

/// Kind of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// There are no bars
    Idle,
    /// At least one bar is displayed
    Active,
}

/// One fully rendered snapshot of the forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    lines: Vec<String>,
}

impl Frame {
    #[inline(always)]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.kind == FrameKind::Idle
    }
    #[inline(always)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Formats a forest into frames
#[derive(Debug, Clone)]
pub struct Renderer {
    options: RenderOptions,
    colors: ansi::Colors,
}

impl Renderer {
    pub fn new(options: RenderOptions, use_color: bool) -> Self {
        Self {
            options,
            colors: ansi::colors(use_color),
        }
    }

    #[inline(always)]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render the forest into a frame
    pub fn render(&self, forest: Forest<'_>) -> Frame {
        let c = &self.colors;
        if forest.is_empty() {
            return Frame {
                kind: FrameKind::Idle,
                lines: vec![
                    String::new(),
                    format!(" {}{IDLE_MESSAGE}{}", c.muted, c.reset),
                    String::new(),
                ],
            };
        }
        let mut lines = Vec::new();
        if self.options.chrome {
            lines.push(format!(" {}{RULE}{}", c.header, c.reset));
            lines.push(format!("   {}{TITLE}{}", c.header, c.reset));
            lines.push(format!(" {}{RULE}{}", c.header, c.reset));
            lines.push(String::new());
        }
        lines.extend(forest.walk().map(|visit| self.format_line(visit)));
        if self.options.chrome {
            lines.push(String::new());
            lines.push(format!("  {}{QUIT_HINT}{}", c.muted, c.reset));
        }
        Frame {
            kind: FrameKind::Active,
            lines,
        }
    }

    fn format_line(&self, visit: Visit<'_>) -> String {
        let mut out = String::new();
        if visit.depth == 0 {
            out.push_str("  ");
        } else {
            for _ in 1..visit.depth {
                out.push_str("  ");
            }
            out.push_str(if visit.is_last { BRANCH_LAST } else { BRANCH_MID });
        }
        self.format_node(&mut out, visit.node, visit.depth);
        out
    }

    fn format_node(&self, out: &mut String, node: &ProgressNode, depth: usize) {
        let c = &self.colors;
        let ratio = node.ratio();
        let band = Band::of(ratio);
        let band_color = if depth == 0 {
            c.root_bands[band as usize]
        } else {
            c.child_bands[band as usize]
        };
        let fill = Fill::new(ratio, self.options.bar_width_at(depth));

        // label
        if depth == 0 {
            out.push_str(c.bold);
        }
        out.push_str(band_color);
        ansi::push_printable(out, node.label());
        out.push_str(c.reset);

        // bar
        out.push_str(" [");
        if fill.filled > 0 || fill.partial {
            out.push_str(band_color);
            out.extend(std::iter::repeat_n(CHAR_FILLED, fill.filled));
            if fill.partial {
                out.push(CHAR_PARTIAL);
            }
            out.push_str(c.reset);
        }
        if fill.empty > 0 {
            out.push_str(c.empty);
            out.extend(std::iter::repeat_n(CHAR_EMPTY, fill.empty));
            out.push_str(c.reset);
        }
        out.push_str("] ");

        // counts and percentage
        out.push_str(c.stats);
        // _: fmt for string does not fail
        let _ = write!(out, "{}/{}", node.current(), node.total());
        out.push_str(c.reset);
        out.push(' ');
        out.push_str(c.bold);
        out.push_str(band_color);
        let _ = write!(out, "{:5.1}%", ratio * 100f64);
        out.push_str(c.reset);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BarTree, Event};

    fn plain() -> Renderer {
        Renderer::new(RenderOptions::default(), false)
    }

    fn count(line: &str, c: char) -> usize {
        line.chars().filter(|x| *x == c).count()
    }

    fn bar_line<'a>(frame: &'a Frame, label: &str) -> &'a str {
        frame
            .lines()
            .iter()
            .find(|l| l.contains(label))
            .map(|l| l.as_str())
            .unwrap()
    }

    #[test]
    fn test_empty_forest_is_idle_frame() {
        let tree = BarTree::new();
        let frame = plain().render(tree.forest());
        assert!(frame.is_idle());
        assert!(frame.to_string().contains(IDLE_MESSAGE));
        assert!(!frame.to_string().contains(QUIT_HINT));
    }

    #[test]
    fn test_complete_bar() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 10, "x")).unwrap();
        tree.advance(1, 10).unwrap();
        let frame = plain().render(tree.forest());
        assert_eq!(frame.kind(), FrameKind::Active);
        let line = bar_line(&frame, "10/10");
        assert_eq!(line, format!("  x [{}] 10/10 100.0%", "█".repeat(45)));

        // still clamped
        tree.advance(1, 5).unwrap();
        let frame = plain().render(tree.forest());
        assert!(bar_line(&frame, " x ").ends_with("10/10 100.0%"));
    }

    #[test]
    fn test_partial_bar() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 4, "half")).unwrap();
        tree.advance(1, 2).unwrap();
        let frame = plain().render(tree.forest());
        let line = bar_line(&frame, "half");
        // 45 * 0.5 = 22.5 -> 22 filled, 1 partial, 22 empty
        assert_eq!(count(line, CHAR_FILLED), 22);
        assert_eq!(count(line, CHAR_PARTIAL), 1);
        assert_eq!(count(line, CHAR_EMPTY), 22);
        assert!(line.ends_with("2/4  50.0%"));
    }

    #[test]
    fn test_unknown_total_renders_empty() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 0, "stream")).unwrap();
        tree.advance(1, 7).unwrap();
        let frame = plain().render(tree.forest());
        let line = bar_line(&frame, "stream");
        assert_eq!(count(line, CHAR_FILLED), 0);
        assert_eq!(count(line, CHAR_EMPTY), 45);
        assert!(line.ends_with("7/0   0.0%"));
    }

    #[test]
    fn test_negative_current_renders_empty() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 10, "back")).unwrap();
        tree.advance(1, -3).unwrap();
        let frame = plain().render(tree.forest());
        let line = bar_line(&frame, "back");
        assert_eq!(count(line, CHAR_FILLED), 0);
        assert!(line.ends_with("-3/10   0.0%"));
    }

    #[test]
    fn test_nested_bars_indent_and_shrink() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 5, "parent")).unwrap();
        tree.apply(&Event::create_child(2, 3, "first", 1)).unwrap();
        tree.apply(&Event::create_child(3, 3, "second", 1)).unwrap();
        tree.apply(&Event::create_child(4, 3, "deep", 3)).unwrap();
        let frame = plain().render(tree.forest());
        let lines: Vec<_> = frame
            .lines()
            .iter()
            .filter(|l| l.contains('['))
            .collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  parent ["));
        assert!(lines[1].starts_with("├─ first ["));
        assert!(lines[2].starts_with("└─ second ["));
        assert!(lines[3].starts_with("  └─ deep ["));
        assert_eq!(count(lines[0], CHAR_EMPTY), 45);
        assert_eq!(count(lines[1], CHAR_EMPTY), 43);
        assert_eq!(count(lines[3], CHAR_EMPTY), 41);
    }

    #[test]
    fn test_bar_width_floor() {
        let options = RenderOptions::default();
        assert_eq!(options.bar_width_at(0), 45);
        assert_eq!(options.bar_width_at(12), 21);
        assert_eq!(options.bar_width_at(13), 20);
        assert_eq!(options.bar_width_at(100), 20);
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(Band::of(0f64), Band::Low);
        assert_eq!(Band::of(0.49), Band::Low);
        assert_eq!(Band::of(0.5), Band::Mid);
        assert_eq!(Band::of(0.75), Band::High);
        assert_eq!(Band::of(0.99), Band::High);
        assert_eq!(Band::of(1f64), Band::Complete);
    }

    #[test]
    fn test_fill_edges() {
        assert_eq!(
            Fill::new(0f64, 20),
            Fill {
                filled: 0,
                partial: false,
                empty: 20
            }
        );
        assert_eq!(
            Fill::new(1f64, 20),
            Fill {
                filled: 20,
                partial: false,
                empty: 0
            }
        );
        assert_eq!(
            Fill::new(0.5, 20),
            Fill {
                filled: 10,
                partial: true,
                empty: 9
            }
        );
    }

    #[test]
    fn test_color_uses_palette_by_depth() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 2, "root")).unwrap();
        tree.apply(&Event::create_child(2, 2, "child", 1)).unwrap();
        tree.advance(1, 2).unwrap();
        tree.advance(2, 2).unwrap();
        let frame = Renderer::new(RenderOptions::default(), true).render(tree.forest());
        let colors = ansi::colors(true);
        assert!(bar_line(&frame, "root").contains(colors.root_bands[Band::Complete as usize]));
        assert!(bar_line(&frame, "child").contains(colors.child_bands[Band::Complete as usize]));
    }

    #[test]
    fn test_color_does_not_change_width() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 8, "root")).unwrap();
        tree.apply(&Event::create_child(2, 8, "child", 1)).unwrap();
        tree.advance(1, 3).unwrap();
        tree.advance(2, 7).unwrap();
        let plain = plain().render(tree.forest());
        let colored = Renderer::new(RenderOptions::default(), true).render(tree.forest());
        assert_ne!(plain, colored);
        for (p, c) in plain.lines().iter().zip(colored.lines()) {
            assert_eq!(ansi::display_width(p), ansi::display_width(c));
        }
    }

    #[test]
    fn test_chrome_can_be_disabled() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 2, "only")).unwrap();
        let options = RenderOptions {
            chrome: false,
            ..Default::default()
        };
        let frame = Renderer::new(options, false).render(tree.forest());
        assert_eq!(frame.lines().len(), 1);
    }

    #[test]
    fn test_control_chars_in_label_stay_on_one_line() {
        let mut tree = BarTree::new();
        tree.apply(&Event::create(1, 2, "two\nlines\x1b[2Jgone")).unwrap();
        let frame = plain().render(tree.forest());
        assert_eq!(frame.lines().len(), 7);
        let line = bar_line(&frame, "two");
        assert!(line.contains("two\u{fffd}lines\u{fffd}[2Jgone ["));
        assert!(!line.contains('\x1b'));
    }
}
