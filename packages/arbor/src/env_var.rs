use std::ffi::OsStr;

use crate::Context as _;

/// Like [`std::env::var`], but treat not-set as empty string.
///
/// ```rust
/// # use pistonite_arbor as arbor;
/// # fn main() -> arbor::Result<()> {
/// assert!(arbor::env_var("ARBOR_SURELY_NOT_SET")?.is_empty());
/// # Ok(()) }
/// ```
#[inline(always)]
pub fn env_var(var: impl AsRef<OsStr>) -> crate::Result<String> {
    env_var_impl(var.as_ref())
}
fn env_var_impl(var: &OsStr) -> crate::Result<String> {
    log::trace!("reading env var '{}'", var.display());
    match std::env::var(var) {
        Ok(v) => Ok(v),
        Err(std::env::VarError::NotPresent) => Ok(String::new()),
        Err(e) => {
            crate::rethrow!(e, "failed to read env var '{}'", var.display());
        }
    }
}

/// Parse a boolean flag from an env var value. Empty means not set.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "0" | "false" | "no" | "off" => Some(false),
        _ => Some(true),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("  "), None);
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("False"), Some(false));
    }
}
