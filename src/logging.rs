//! Logger setup and plain-message logging helpers used across the crate.

/// Initializes the logger with the `env_logger` crate.
///
/// The filter is taken from `RUST_LOG`; without it only errors are shown.
pub fn init_logger() {
    env_logger::init();
}

/// Initializes the logger with a default filter used when `RUST_LOG` is unset.
///
/// Returns an error if a global logger was already installed.
pub fn init_logger_with_default(filter: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
}

/// Logs an error that ends a session or loses output.
pub fn log_error(message: &str) {
    log::error!("{message}");
}

/// Logs a dropped frame or a failed sensor prompt.
pub fn log_warn(message: &str) {
    log::warn!("{message}");
}

/// Logs a session lifecycle event.
pub fn log_info(message: &str) {
    log::info!("{message}");
}

/// Logs per-frame decoder detail.
pub fn log_debug(message: &str) {
    log::debug!("{message}");
}
