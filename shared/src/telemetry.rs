use std::sync::Once;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the stderr fmt subscriber. `RUST_LOG` wins over the default `info` filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

pub struct Telemetry {
    start: Instant,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Milliseconds since the last lap (or since creation), restarting the clock.
    pub fn lap_ms(&mut self) -> u128 {
        let ms = self.elapsed_ms();
        self.start = Instant::now();
        ms
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
