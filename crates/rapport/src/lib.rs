//! Public SDK surface for Rapport.
//!
//! This crate re-exports the building blocks and wires them into a
//! [`Rapport`] service with an explicit open/close lifecycle.

mod service;

/// Re-export for convenience.
pub use rapport_config as config;
pub use rapport_core as core;
/// Re-export for convenience.
pub use rapport_memory as memory;

pub use service::{Rapport, RapportError, default_storage_root};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
