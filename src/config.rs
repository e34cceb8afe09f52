use std::str::FromStr;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "LabVisit";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed path of the booking submission endpoint, relative to the base URL.
pub const BOOKING_PATH: &str = "/api/booking";

/// Default booking service base URL (local development server).
pub const DEFAULT_BOOKING_URL: &str = "http://localhost:3000";

/// Transport budget for an encoded prescription attachment.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024; // 2 MB

/// Longest edge of a downscaled prescription image.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 1600;

/// JPEG quality for the first encoding attempt.
pub const DEFAULT_PRIMARY_QUALITY: u8 = 60;

/// JPEG quality for the single fallback attempt.
pub const DEFAULT_FALLBACK_QUALITY: u8 = 30;

/// Leading digit of a local mobile subscriber number.
pub const DEFAULT_MOBILE_PREFIX: char = '7';

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "labvisit=debug"
    } else {
        "labvisit=info"
    }
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

/// Where and how bookings are submitted.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl BookingConfig {
    /// Full URL of the booking endpoint.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), BOOKING_PATH)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BOOKING_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Attachment compression tunables.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionConfig {
    /// Maximum estimated transport size in bytes.
    pub max_transport_bytes: usize,
    /// Cap on the longer image edge, in pixels.
    pub max_dimension: u32,
    pub primary_quality: u8,
    pub fallback_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_transport_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            max_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            primary_quality: DEFAULT_PRIMARY_QUALITY,
            fallback_quality: DEFAULT_FALLBACK_QUALITY,
        }
    }
}

/// Contact-step validation rules.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRules {
    pub mobile_prefix: char,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            mobile_prefix: DEFAULT_MOBILE_PREFIX,
        }
    }
}

/// Everything a booking session needs to be configured.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub booking: BookingConfig,
    pub compression: CompressionConfig,
    pub validation: ValidationRules,
}

impl Settings {
    /// Defaults with environment overrides.
    ///
    /// Recognised variables:
    /// - `LABVISIT_BOOKING_URL`
    /// - `LABVISIT_REQUEST_TIMEOUT_SECS`
    /// - `LABVISIT_MAX_ATTACHMENT_BYTES`
    /// - `LABVISIT_MOBILE_PREFIX` (single digit)
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(url) = std::env::var("LABVISIT_BOOKING_URL") {
            if !url.trim().is_empty() {
                settings.booking.base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = env_parse::<u64>("LABVISIT_REQUEST_TIMEOUT_SECS") {
            settings.booking.request_timeout_secs = secs;
        }
        if let Some(bytes) = env_parse::<usize>("LABVISIT_MAX_ATTACHMENT_BYTES") {
            settings.compression.max_transport_bytes = bytes;
        }
        if let Some(prefix) = env_parse::<char>("LABVISIT_MOBILE_PREFIX") {
            if prefix.is_ascii_digit() {
                settings.validation.mobile_prefix = prefix;
            } else {
                tracing::warn!(value = %prefix, "LABVISIT_MOBILE_PREFIX must be a digit, ignoring");
            }
        }

        settings
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            None
        }
    }
}
