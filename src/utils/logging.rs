//! Logger setup plus per-module switchable logging macros.
//!
//! A module opts in by declaring the flag the macros read:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! crate::log_info!("model ready");
//! ```
//! Flip the flag to `false` to silence one noisy module without touching
//! `RUST_LOG`.

use log::LevelFilter;

/// Install the global `env_logger`. `RUST_LOG` refines the default level.
pub fn init(default_level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
