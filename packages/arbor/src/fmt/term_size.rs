/// Terminal dimensions are capped to this, so a bogus size from the
/// system never makes a huge frame
pub const MAX_TERM_SIZE: usize = 400;

/// Get the terminal width and height, each capped at [`MAX_TERM_SIZE`]
pub fn term_width_height() -> Option<(usize, usize)> {
    use terminal_size::{Height, Width, terminal_size};
    let (Width(w), Height(h)) = terminal_size()?;
    Some(((w as usize).min(MAX_TERM_SIZE), (h as usize).min(MAX_TERM_SIZE)))
}
