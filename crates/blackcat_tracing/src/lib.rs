//! Log subscriber setup for blackcat.
//!
//! Provides [`TracingModule`] which installs a `tracing` subscriber and
//! exposes the chosen configuration as a component.
//!
//! The injector itself only emits events through the `tracing` facade.
//! Nothing is printed until a subscriber is installed, either by this
//! module or by the application.
//!
//! # Example
//!
//! ```
//! use blackcat_core::prelude::*;
//! use blackcat_tracing::{TracingConfig, TracingFormat, TracingModule};
//! use tracing::Level;
//!
//! let injector = Injector::new().with_debug(true);
//! injector.install(
//!     TracingModule::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! )?;
//!
//! let config = injector.resolve::<TracingConfig>()?;
//! assert_eq!(config.level, Level::DEBUG);
//! # Ok::<(), InjectError>(())
//! ```

use blackcat_core::prelude::*;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log target of the injector's own events.
const CORE_TARGET: &str = "blackcat_core";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig Component
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration component.
///
/// Registered as an instance by [`TracingModule`], so other components can
/// inject it and adapt their logging to the configured level.
///
/// # Example
///
/// ```
/// use blackcat_core::prelude::*;
/// use blackcat_tracing::{TracingConfig, TracingModule};
/// use tracing::Level;
///
/// #[derive(Default)]
/// struct Soundcheck {
///     verbose: bool,
/// }
///
/// let injector = Injector::new();
/// injector
///     .install(TracingModule::new().with_level(Level::TRACE))?
///     .register(
///         Component::new(Soundcheck::default)
///             .inject::<TracingConfig, _>("config", |check, config| {
///                 check.verbose = config.level <= Level::DEBUG;
///             }),
///     )?;
///
/// assert!(!injector.resolve::<Soundcheck>()?.verbose);
/// # Ok::<(), InjectError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingModule
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging module.
///
/// Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
/// formatting layer when the module is installed. Installing a second
/// subscriber is a no-op: the first one stays in place.
///
/// # Components Provided
///
/// | Component | Lifecycle | Description |
/// |-----------|-----------|-------------|
/// | [`TracingConfig`] | Instance | Tracing configuration (read-only) |
///
/// # Configuration Options
///
/// ```
/// use blackcat_tracing::{TracingFormat, TracingModule};
/// use tracing::Level;
///
/// // Development: pretty output with every injection step
/// let dev = TracingModule::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output, injector internals at warn
/// let prod = TracingModule::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("info,blackcat_core=warn");
/// ```
#[derive(Debug, Clone)]
pub struct TracingModule {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "`blackcat_core=debug`").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingModule {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingModule {
    /// Creates a new `TracingModule` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An unparsable filter falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    ///
    /// Each component construction runs inside a `construct` span.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration this module registers.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    /// Builds the filter for an injector.
    ///
    /// A debug injector logs its injection steps at `debug`, so the core
    /// target is raised to `debug` unless the filter already names it.
    fn env_filter(&self, debug_injector: bool) -> EnvFilter {
        let custom = self
            .env_filter
            .as_deref()
            .and_then(|filter| EnvFilter::try_new(filter).ok().map(|parsed| (filter, parsed)));
        let names_core = custom
            .as_ref()
            .is_some_and(|(filter, _)| filter.contains(CORE_TARGET));
        let filter = match custom {
            Some((_, parsed)) => parsed,
            None => EnvFilter::new(self.level.as_str()),
        };

        if !debug_injector || names_core {
            return filter;
        }
        match format!("{CORE_TARGET}=debug").parse::<Directive>() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }

    fn init_subscriber(&self, debug_injector: bool) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let fmt = tracing_subscriber::fmt::layer().with_span_events(span_events);
        let fmt = match self.format {
            TracingFormat::Pretty => fmt.pretty().boxed(),
            TracingFormat::Compact => fmt.compact().boxed(),
            TracingFormat::Json => fmt.json().boxed(),
        };

        // try_init().ok() leaves an existing global subscriber in place.
        tracing_subscriber::registry()
            .with(fmt)
            .with(self.env_filter(debug_injector))
            .try_init()
            .ok();
    }
}

impl Module for TracingModule {
    fn register(&self, injector: &Injector) -> Result<(), InjectError> {
        injector.register_instance(self.config())?;
        self.init_subscriber(injector.is_debug());

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            debug = injector.is_debug(),
            "TracingModule initialized"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "blackcat::tracing"
    }
}
