pub use anyhow::{Context, Error, Result, bail};

/// # Error Handling
///
/// Operational failures (terminal IO, spawning threads, building the runtime)
/// are reported with [`anyhow`](https://docs.rs/anyhow), re-exported as
/// `arbor::Result`, `arbor::Error`, `arbor::Context` and `arbor::bail!`.
///
/// Events that do not match the live bar tree are not errors. They are
/// described by [`Anomaly`](crate::Anomaly) and only logged.
///
/// `arbor::check!` wraps `.with_context()`. The `Context` trait must be in
/// scope, which the prelude takes care of.
/// ```rust
/// # use pistonite_arbor as arbor;
/// use arbor::pre::*;
///
/// fn parse_capacity(s: &str) -> arbor::Result<usize> {
///     let capacity = arbor::check!(s.parse::<usize>(), "invalid capacity '{s}'")?;
///     Ok(capacity)
/// }
/// assert_eq!(parse_capacity("12").unwrap(), 12);
/// assert!(parse_capacity("twelve").is_err());
/// ```
#[macro_export]
macro_rules! check {
    ($result:expr, $($args:tt)*) => {{
        { $result }.with_context(|| format!($($args)*))
    }};
}

/// Return an `Err` that is already at hand, with additional context
#[macro_export]
macro_rules! rethrow {
    ($result:expr, $($args:tt)*) => {{
        return Err($result).context(format!($($args)*));
    }};
}
