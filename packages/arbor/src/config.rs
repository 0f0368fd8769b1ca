use std::path::PathBuf;
use std::time::Duration;

use crate::lv::Color;
use crate::{Context as _, RenderOptions, check};

/// Options for starting a [`Session`](crate::Session).
///
/// Build it with the setters, or read the environment with
/// [`from_env`](Self::from_env):
///
/// | Variable               | Effect                                         |
/// |------------------------|------------------------------------------------|
/// | `ARBOR_NO_ALTSCREEN`   | draw on the main screen instead of the alternate one |
/// | `ARBOR_QUEUE_CAPACITY` | capacity of the event queue                    |
/// | `ARBOR_COLOR`          | `always`, `never` or `auto`                    |
/// | `ARBOR_LOG_FILE`       | write logs to this file instead of stderr      |
///
/// ```rust
/// # use pistonite_arbor as arbor;
/// use arbor::{Color, Config};
///
/// let config = Config::default().capacity(64).color(Color::Never).alt_screen(false);
/// assert_eq!(config.get_capacity(), 64);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    capacity: usize,
    alt_screen: bool,
    color: Color,
    watch_keys: bool,
    startup_grace: Duration,
    log_file: Option<PathBuf>,
    render: RenderOptions,
}

/// Default capacity of the event queue
pub const DEFAULT_CAPACITY: usize = 1000;
/// Default time to wait for the loop to become ready on start
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_millis(50);

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            alt_screen: true,
            color: Color::Auto,
            watch_keys: true,
            startup_grace: DEFAULT_STARTUP_GRACE,
            log_file: None,
            render: RenderOptions::default(),
        }
    }
}

impl Config {
    /// Default config with overrides from the environment
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        if let Some(no_alt) = crate::env_var::parse_flag(&crate::env_var("ARBOR_NO_ALTSCREEN")?) {
            config.alt_screen = !no_alt;
        }
        let capacity = crate::env_var("ARBOR_QUEUE_CAPACITY")?;
        let capacity = capacity.trim();
        if !capacity.is_empty() {
            config.capacity = check!(
                capacity.parse::<usize>(),
                "invalid ARBOR_QUEUE_CAPACITY '{capacity}'"
            )?;
        }
        let color = crate::env_var("ARBOR_COLOR")?;
        config.color = check!(color.parse::<Color>(), "invalid ARBOR_COLOR")?;
        let log_file = crate::env_var("ARBOR_LOG_FILE")?;
        if !log_file.is_empty() {
            config.log_file = Some(PathBuf::from(log_file));
        }
        Ok(config)
    }

    /// Capacity of the event queue. Producers block when it is full.
    /// A capacity of 0 is treated as 1.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
    /// Draw on the alternate screen, so the terminal content is restored on quit
    pub fn alt_screen(mut self, alt_screen: bool) -> Self {
        self.alt_screen = alt_screen;
        self
    }
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
    /// Watch the terminal for the quit key
    pub fn watch_keys(mut self, watch_keys: bool) -> Self {
        self.watch_keys = watch_keys;
        self
    }
    /// How long start blocks waiting for the loop to be ready
    pub fn startup_grace(mut self, startup_grace: Duration) -> Self {
        self.startup_grace = startup_grace;
        self
    }
    /// Write logs to this file instead of stderr, from the start of the session
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
    pub fn render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    #[inline(always)]
    pub fn get_capacity(&self) -> usize {
        self.capacity.max(1)
    }
    #[inline(always)]
    pub fn get_alt_screen(&self) -> bool {
        self.alt_screen
    }
    #[inline(always)]
    pub fn get_color(&self) -> Color {
        self.color
    }
    #[inline(always)]
    pub fn get_watch_keys(&self) -> bool {
        self.watch_keys
    }
    #[inline(always)]
    pub fn get_startup_grace(&self) -> Duration {
        self.startup_grace
    }
    #[inline(always)]
    pub fn get_log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }
    #[inline(always)]
    pub fn get_render(&self) -> &RenderOptions {
        &self.render
    }
}
