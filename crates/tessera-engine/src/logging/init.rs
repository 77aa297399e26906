use std::sync::Once;

/// Logger configuration.
///
/// `filter` follows the `env_logger` syntax (e.g. "info",
/// "tessera_engine=debug,wgpu=warn"); when unset, `RUST_LOG` applies.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Idempotent; call early in `main`.
pub fn init(options: LogOptions) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = options.filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            // Batch statistics land on debug; default stays quieter.
            builder.filter_level(log::LevelFilter::Warn);
        }

        builder.write_style(options.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}
