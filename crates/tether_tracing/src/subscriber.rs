//! Subscriber configuration and installation.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// How registry events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored output for terminals.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON, one object per event.
    Json,
}

/// Level and format a [`TracingSetup`] installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum level emitted when no filter directives apply.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::default(),
        }
    }
}

/// Errors raised while installing a subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// A global default subscriber is already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[source] TryInitError),
}

/// Builder for the process-wide `tracing` subscriber.
///
/// ```
/// use tether_tracing::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// let setup = TracingSetup::new()
///     .with_level(Level::WARN)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("tether_registry=debug");
///
/// assert_eq!(setup.config().level, Level::WARN);
/// ```
///
/// Directives passed to [`with_env_filter`](Self::with_env_filter) use the
/// `target=level,...` syntax of `EnvFilter`. If they fail to parse, only the
/// configured level is applied.
#[derive(Debug, Clone, Default)]
pub struct TracingSetup {
    config: TracingConfig,
    directives: Option<String>,
    span_events: bool,
}

impl TracingSetup {
    /// Info level, pretty output, no directives, no span events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Sets per-target filter directives, e.g. `tether_registry=debug`.
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Also emits an event when a span is entered or exited.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The level and format [`init`](Self::init) will install.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        self.config
    }

    fn filter(&self) -> EnvFilter {
        let level = self.config.level.as_str();
        self.directives
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(level))
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }

    fn output_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer().with_span_events(self.span_events());
        match self.config.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber as the global default.
    ///
    /// # Errors
    ///
    /// - [`TracingError::AlreadyInitialized`] if a global subscriber exists
    pub fn init(&self) -> Result<TracingConfig, TracingError> {
        tracing_subscriber::registry()
            .with(self.output_layer())
            .with(self.filter())
            .try_init()
            .map_err(TracingError::AlreadyInitialized)?;

        tracing::info!(
            level = %self.config.level,
            format = ?self.config.format,
            "tracing initialized"
        );
        Ok(self.config)
    }

    /// Like [`init`](Self::init), but keeps an already installed subscriber.
    pub fn init_or_keep(&self) {
        if let Err(err) = self.init() {
            tracing::debug!(error = %err, "keeping existing tracing subscriber");
        }
    }
}
