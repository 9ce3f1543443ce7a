//! Common constants used across all services
//!
//! Single source of truth for window sizes, intervals and rounding scales

// Time constants
pub const MILLIS_PER_SEC: u64 = 1000;
pub const SECS_PER_MIN: u64 = 60;

/// Length of the trailing statistics window in milliseconds
#[allow(clippy::cast_possible_wrap)]
pub const STATISTICS_WINDOW_MS: i64 = (SECS_PER_MIN * MILLIS_PER_SEC) as i64;

/// Default period between two statistics sweeps
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 400;

/// Number of fractional digits kept in published statistics
pub const STATISTICS_SCALE: u32 = 2;

// Server defaults
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 9090;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Size constants
pub const BYTES_PER_KB: usize = 1024;
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * BYTES_PER_KB;
