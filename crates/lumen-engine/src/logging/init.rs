use std::sync::Once;

/// Timestamp precision on log lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TimestampPrecision {
    /// No timestamp.
    Off,
    Seconds,
    #[default]
    Millis,
    Micros,
}

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "lumen_engine=debug,wgpu=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub timestamps: TimestampPrecision,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: TimestampPrecision::default(),
        }
    }
}

impl LoggingConfig {
    /// Config with an explicit filter, e.g. `"lumen_engine=trace"`.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { env_filter: Some(filter.into()), ..Self::default() }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info`.
/// Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
            // wgpu is chatty at info
            builder.filter_module("wgpu_core", log::LevelFilter::Warn);
            builder.filter_module("wgpu_hal", log::LevelFilter::Warn);
        }

        builder.write_style(config.write_style);
        match config.timestamps {
            TimestampPrecision::Off => builder.format_timestamp(None),
            TimestampPrecision::Seconds => builder.format_timestamp_secs(),
            TimestampPrecision::Millis => builder.format_timestamp_millis(),
            TimestampPrecision::Micros => builder.format_timestamp_micros(),
        };

        if builder.try_init().is_err() {
            // another logger won the race; keep it
            return;
        }

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::with_filter("debug"));
        init_logging(LoggingConfig::default());
        log::info!("still alive");
    }

    #[test]
    fn with_filter_keeps_other_defaults() {
        let config = LoggingConfig::with_filter("lumen_engine=trace");
        assert_eq!(config.env_filter.as_deref(), Some("lumen_engine=trace"));
        assert_eq!(config.timestamps, TimestampPrecision::Millis);
    }
}
