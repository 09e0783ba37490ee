//! Structured logging support for operator calls
//!
//! With the `tracing` feature enabled, every operator `compute` runs inside a
//! debug span carrying the operator name and input shape, and emits an event
//! with its output size. Without the feature, all helpers compile to no-ops so
//! call sites need no `cfg`.
//!
//! # Example
//!
//! ```ignore
//! use tenxform_ops::tracing_support::{init_tracing, TracingConfig};
//!
//! // Initialize tracing at application startup
//! init_tracing(TracingConfig::default())?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., `RUST_LOG=tenxform_ops=debug`)
//! - `TENXFORM_LOG_FORMAT`: Set output format (`json`, `compact` or `pretty`, default: `pretty`)

#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (single line per event)
    Compact,
}

impl TracingFormat {
    /// Parse from string, falling back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Filter directive (e.g., "tenxform_ops=debug,info")
    pub filter: String,
    /// Enable ANSI colors
    pub with_ansi: bool,
    /// Show target module paths
    pub with_target: bool,
    /// Show thread IDs
    pub with_thread_ids: bool,
    /// Show file locations
    pub with_file: bool,
    /// Show line numbers
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var("TENXFORM_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);

        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tenxform_ops=info,warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_file: true,
            with_line_number: true,
        }
    }
}

/// Install a global tracing subscriber built from `config`.
///
/// Returns an error if the filter directive does not parse or a global
/// subscriber is already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        TracingFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
        TracingFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
        TracingFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}

/// Stub for when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> anyhow::Result<()> {
    Ok(())
}

/// Open a debug span for one operator call; the guard exits it on drop.
#[cfg(feature = "tracing")]
macro_rules! op_span {
    ($name:literal) => {
        tracing::debug_span!($name).entered()
    };
    ($name:literal, $($fields:tt)+) => {
        tracing::debug_span!($name, $($fields)+).entered()
    };
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
macro_rules! op_span {
    ($name:literal) => {
        ()
    };
    ($name:literal, $($fields:tt)+) => {
        ()
    };
}

/// Record the size of an operator's output
#[cfg(feature = "tracing")]
pub fn record_op(op: &str, output_shape: &[usize]) {
    tracing::debug!(
        op = op,
        output_shape = ?output_shape,
        elements = output_shape.iter().product::<usize>(),
        "op_computed"
    );
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_op(_op: &str, _output_shape: &[usize]) {}

/// Record a coordinate-table rebuild for bilinear resize
#[cfg(feature = "tracing")]
pub fn record_plan_rebuild(src: (usize, usize), dst: (usize, usize), align_corners: bool) {
    tracing::debug!(
        src_h = src.0,
        src_w = src.1,
        dst_h = dst.0,
        dst_w = dst.1,
        align_corners = align_corners,
        "resize_plan_rebuilt"
    );
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_plan_rebuild(_src: (usize, usize), _dst: (usize, usize), _align_corners: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_format_parse() {
        assert_eq!(TracingFormat::parse("json"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse("JSON"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse("compact"), TracingFormat::Compact);
        assert_eq!(TracingFormat::parse("pretty"), TracingFormat::Pretty);
        assert_eq!(TracingFormat::parse("unknown"), TracingFormat::Pretty);
    }

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert!(config.with_ansi);
        assert!(config.with_target);
        assert!(!config.filter.is_empty());
    }

    #[test]
    fn test_record_helpers() {
        let _span = op_span!("test_op", rank = 4);
        record_op("test_op", &[1, 3, 8, 8]);
        record_plan_rebuild((4, 4), (8, 8), false);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TracingConfig {
            filter: "tenxform_ops=notalevel".to_string(),
            ..TracingConfig::default()
        };
        assert!(init_tracing(config).is_err());
    }
}
