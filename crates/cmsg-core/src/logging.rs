//! Logging initialization using the `tracing` ecosystem.
//!
//! One subscriber with a console layer and, when [`LoggingConfig::log_dir`]
//! is set, a daily-rotating file layer (text or JSON lines). `RUST_LOG`
//! overrides [`LoggingConfig::level`].

use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Should be called once by the host process. A second call returns an error
/// and leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(file_layer(config))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .try_init()?;
    Ok(())
}

fn file_layer(config: &LoggingConfig) -> Option<BoxedLayer> {
    let dir = config.log_dir.as_ref()?;
    let writer = tracing_appender::rolling::daily(dir, &config.module_name);
    let layer = fmt::layer().with_writer(writer).with_ansi(false).with_thread_ids(true);
    Some(if config.json { layer.json().boxed() } else { layer.boxed() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_only_with_dir() {
        assert!(file_layer(&LoggingConfig::default()).is_none());

        let dir = std::env::temp_dir().join("cmsg-logging-test");
        let config = LoggingConfig {
            log_dir: Some(dir.to_string_lossy().into_owned()),
            json: true,
            ..LoggingConfig::default()
        };
        assert!(file_layer(&config).is_some());
    }

    #[test]
    fn second_init_is_an_error() {
        let config = LoggingConfig::default();
        init_logging(&config).unwrap();
        assert!(init_logging(&config).is_err());
    }
}
