//! Logging infrastructure - structured tracing for declarations and calls
//!
//! Design: `tracing` events at the points that matter:
//! - struct types compiled (debug)
//! - libraries loaded and symbols bound (info/debug)
//! - foreign calls, returns and failures (trace/error)
//!
//! Nothing is printed until a subscriber is installed with [`init`] or
//! [`init_with_config`]; embedding applications may install their own.

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub use tracing::{debug, error, info, trace, warn};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the non-blocking file writer flushing for the life of the process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console only when `None`
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // TYPED_FFI_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("TYPED_FFI_LOG_LEVEL") {
            config.level = parse_level(&level).unwrap_or(Level::INFO);
        }

        if let Ok(path) = std::env::var("TYPED_FFI_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("TYPED_FFI_LOG_JSON").is_ok();
        config.show_spans = std::env::var("TYPED_FFI_LOG_SPANS").is_ok();

        config
    }

    /// Errors only
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Everything, with span events
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            show_spans: true,
            ..Self::default()
        }
    }
}

/// Parse a level name, case-insensitively
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration; later calls are no-ops
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("typed_ffi={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let console = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
                .boxed()
        };

        let file = config.log_path.as_deref().map(|path| {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "typed_ffi.log".to_string());
            let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(span_events)
                .boxed()
        });

        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .with(file)
            .try_init();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Log a compiled struct type
#[inline]
pub fn log_struct_compiled(name: &str, size: usize, align: usize, fields: usize) {
    debug!(
        target: "typed_ffi::descriptor",
        name,
        size,
        align,
        fields,
        "struct type compiled"
    );
}

/// Log a loaded shared library
#[inline]
pub fn log_library_loaded(path: &str) {
    info!(target: "typed_ffi::binder", path, "library loaded");
}

/// Log a resolved and prepared function symbol
#[inline]
pub fn log_symbol_bound(function: &str, origin: &str, signature: &str) {
    debug!(
        target: "typed_ffi::binder",
        function,
        origin,
        signature,
        "symbol bound"
    );
}

/// Log a foreign call
#[inline]
pub fn log_ffi_call(function: &str, args_count: usize) {
    trace!(
        target: "typed_ffi::ffi",
        function,
        args_count,
        "FFI call"
    );
}

/// Log a foreign return
#[inline]
pub fn log_ffi_return(function: &str, elapsed: Duration) {
    trace!(
        target: "typed_ffi::ffi",
        function,
        elapsed_ns = elapsed.as_nanos() as u64,
        "FFI return"
    );
}

/// Log a failed foreign call (marshalling or arity)
#[inline]
pub fn log_ffi_error(function: &str, error: &crate::error::Error) {
    error!(
        target: "typed_ffi::ffi",
        function,
        error = %error,
        "FFI error"
    );
}

/// Enter a debug span for the rest of the enclosing scope
#[macro_export]
macro_rules! traced_scope {
    ($name:expr) => {
        tracing::debug_span!($name).entered()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::performance().level, Level::ERROR);
        let debug = LogConfig::debug();
        assert_eq!(debug.level, Level::TRACE);
        assert!(debug.show_spans);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_with_config(LogConfig::performance());
        init_with_config(LogConfig::debug());
        assert!(is_initialized());
        log_struct_compiled("Point", 8, 4, 2);
        log_ffi_call("noop", 0);
    }
}
