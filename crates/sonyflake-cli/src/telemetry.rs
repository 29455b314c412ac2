//! Log output for the binary.
//!
//! Events go to stderr so that stdout only ever carries IDs or decomposed
//! fields. The filter is read from `RUST_LOG` and defaults to `info`; set
//! `RUST_LOG=sonyflake=trace` to see every allocation.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}
