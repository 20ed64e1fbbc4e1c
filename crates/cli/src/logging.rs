use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for our own crates at `level`
pub fn default_filter(level: &str) -> String {
    format!("sluice={level},sluice_migrate={level}")
}

/// Initialize logging to stderr, as JSON lines or plain text.
///
/// `RUST_LOG` wins over `level` when set. Stdout is left to command output.
pub fn init_logging(level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(level)))?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).with_target(false))
            .try_init()?;
    }

    Ok(())
}
