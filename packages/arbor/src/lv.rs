use crate::Atomic;

pub(crate) static PRINT_LEVEL: Atomic<u8, Print> = Atomic::new_u8(Print::Normal as u8);

/// Color Level settable with `--color` flag or `ARBOR_COLOR`
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Color {
    Always,
    Never,
    #[default]
    Auto,
}
impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
            Self::Auto => write!(f, "auto"),
        }
    }
}
impl std::str::FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" | "1" | "true" => Ok(Self::Always),
            "never" | "0" | "false" => Ok(Self::Never),
            "auto" | "" => Ok(Self::Auto),
            other => anyhow::bail!("invalid color mode '{other}', expected always, never or auto"),
        }
    }
}
impl Color {
    /// Get if color should be used. If `Auto`, returns if stdout is terminal.
    pub fn is_colored_for_stdout(self) -> bool {
        use std::io::IsTerminal;
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Verbosity settable with `-v` and `-q` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Print {
    QuietQuiet,
    Quiet,
    Normal,
    Verbose,
    VerboseVerbose,
}
impl From<i8> for Print {
    fn from(value: i8) -> Self {
        match value {
            ..=-2 => Self::QuietQuiet,
            -1 => Self::Quiet,
            0 => Self::Normal,
            1 => Self::Verbose,
            2.. => Self::VerboseVerbose,
        }
    }
}
impl From<u8> for Print {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::QuietQuiet,
            1 => Self::Quiet,
            3 => Self::Verbose,
            4 => Self::VerboseVerbose,
            _ => Self::Normal,
        }
    }
}
impl From<Print> for u8 {
    fn from(value: Print) -> Self {
        value as Self
    }
}
impl From<Print> for log::LevelFilter {
    fn from(value: Print) -> Self {
        match value {
            Print::QuietQuiet => log::LevelFilter::Off,
            Print::Quiet => log::LevelFilter::Error,
            Print::Normal => log::LevelFilter::Warn,
            Print::Verbose => log::LevelFilter::Debug,
            Print::VerboseVerbose => log::LevelFilter::Trace,
        }
    }
}

/// Level of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lv {
    Error,
    Warn,
    Info,
    Debug,
    Trace,

    Off,
}
impl Lv {
    /// Check if the current print level can print this message level
    pub fn can_print(self, level: Print) -> bool {
        match self {
            Lv::Off => false,
            Lv::Error => level != Print::QuietQuiet,
            Lv::Warn => level > Print::Quiet,
            Lv::Info | Lv::Debug => level > Print::Normal,
            Lv::Trace => level == Print::VerboseVerbose,
        }
    }
    /// The line prefix of this level in the log output
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            Lv::Error => "E]",
            Lv::Warn => "W]",
            Lv::Info => "I]",
            Lv::Debug => "D]",
            Lv::Trace => "*]",
            Lv::Off => "",
        }
    }
}
impl From<log::Level> for Lv {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_print_from_flag_counts() {
        assert_eq!(Print::from(-3i8), Print::QuietQuiet);
        assert_eq!(Print::from(0i8), Print::Normal);
        assert_eq!(Print::from(5i8), Print::VerboseVerbose);
    }

    #[test]
    fn test_debug_needs_verbose() {
        assert!(!Lv::Debug.can_print(Print::Normal));
        assert!(Lv::Debug.can_print(Print::Verbose));
        assert!(Lv::Warn.can_print(Print::Normal));
        assert!(!Lv::Error.can_print(Print::QuietQuiet));
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("Always".parse::<Color>().unwrap(), Color::Always);
        assert_eq!("never".parse::<Color>().unwrap(), Color::Never);
        assert_eq!("".parse::<Color>().unwrap(), Color::Auto);
        assert!("rainbow".parse::<Color>().is_err());
    }
}
