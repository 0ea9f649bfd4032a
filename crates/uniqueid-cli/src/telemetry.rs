//! Log output for the `uniqueid` binary.
//!
//! Logs go to stderr so that generated IDs on stdout stay machine-readable.
//! The filter is taken from `RUST_LOG` and defaults to `info`, e.g.
//!
//! ```bash
//! RUST_LOG=uniqueid=trace uniqueid generate --count 10
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
