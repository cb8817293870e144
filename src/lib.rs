//! PaintBoard stroke stabilizer
//!
//! Turns jittery pen input into an evenly timed stream of paint samples and
//! holds the dynadraw paint-op settings the stabilized stroke is drawn with.

pub mod brush;
pub mod config;
pub mod error;
pub mod input;

pub use config::StabilizerConfig;
pub use error::{Result, StabilizerError};
pub use input::{PaintInfo, SampledRange, StabilizedEventsSampler};

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber filtered by `RUST_LOG` (default `info`)
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_tracing() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}
