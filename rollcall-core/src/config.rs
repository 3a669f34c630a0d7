//! Kiosk configuration
//!
//! Loaded from environment variables with sensible defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default attendance server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Period between automatic captures.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(3000);

/// Delay between camera start and the first automatic capture.
pub const DEFAULT_WARMUP: Duration = Duration::from_millis(1000);

/// JPEG quality used for frame snapshots (percent).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Default timeout for attendance API requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How frames are transmitted to the attendance server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitFlow {
    /// `POST /mark_attendance` with a multipart `image` file.
    #[default]
    Multipart,
    /// `POST /attendance/process-attendance` with a base64 data URL in JSON.
    Base64Json,
}

impl fmt::Display for SubmitFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multipart => write!(f, "multipart"),
            Self::Base64Json => write!(f, "json"),
        }
    }
}

impl FromStr for SubmitFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multipart" | "form" => Ok(Self::Multipart),
            "json" | "base64" => Ok(Self::Base64Json),
            other => Err(format!(
                "unknown submit flow '{other}' (expected 'multipart' or 'json')"
            )),
        }
    }
}

/// Kiosk configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    /// Attendance server base URL (default: http://127.0.0.1:5000)
    pub server_url: String,
    /// Submit flow (default: multipart)
    pub submit_flow: SubmitFlow,
    /// Automatic capture period (default: 3000 ms)
    pub scan_interval: Duration,
    /// Delay before the first automatic capture (default: 1000 ms)
    pub warmup: Duration,
    /// Snapshot JPEG quality, 1-100 (default: 80)
    pub jpeg_quality: u8,
    /// Request timeout (default: 30 s)
    pub request_timeout: Duration,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            submit_flow: SubmitFlow::default(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            warmup: DEFAULT_WARMUP,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl KioskConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let server_url = lookup("ROLLCALL_SERVER_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.server_url);

        let submit_flow = lookup("ROLLCALL_SUBMIT_FLOW")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.submit_flow);

        let scan_interval = lookup("ROLLCALL_SCAN_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.scan_interval);

        let warmup = lookup("ROLLCALL_WARMUP_MS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.warmup);

        let jpeg_quality = lookup("ROLLCALL_JPEG_QUALITY")
            .and_then(|v| v.parse::<u8>().ok())
            .map(|q| q.clamp(1, 100))
            .unwrap_or(defaults.jpeg_quality);

        let request_timeout = lookup("ROLLCALL_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            server_url,
            submit_flow,
            scan_interval,
            warmup,
            jpeg_quality,
            request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> KioskConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        KioskConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), KioskConfig::default());
        let config = KioskConfig::default();
        assert_eq!(config.scan_interval, Duration::from_millis(3000));
        assert_eq!(config.jpeg_quality, 80);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("ROLLCALL_SERVER_URL", "https://kiosk.example.edu/"),
            ("ROLLCALL_SUBMIT_FLOW", "json"),
            ("ROLLCALL_SCAN_INTERVAL_MS", "1500"),
            ("ROLLCALL_WARMUP_MS", "0"),
            ("ROLLCALL_JPEG_QUALITY", "95"),
            ("ROLLCALL_REQUEST_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(config.server_url, "https://kiosk.example.edu");
        assert_eq!(config.submit_flow, SubmitFlow::Base64Json);
        assert_eq!(config.scan_interval, Duration::from_millis(1500));
        assert_eq!(config.warmup, Duration::ZERO);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("ROLLCALL_SUBMIT_FLOW", "carrier-pigeon"),
            ("ROLLCALL_SCAN_INTERVAL_MS", "0"),
            ("ROLLCALL_JPEG_QUALITY", "0"),
            ("ROLLCALL_REQUEST_TIMEOUT_SECS", "soon"),
        ]);
        assert_eq!(config.submit_flow, SubmitFlow::Multipart);
        assert_eq!(config.scan_interval, DEFAULT_SCAN_INTERVAL);
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_submit_flow_parse() {
        assert_eq!("multipart".parse(), Ok(SubmitFlow::Multipart));
        assert_eq!("BASE64".parse(), Ok(SubmitFlow::Base64Json));
        assert!("xml".parse::<SubmitFlow>().is_err());
    }
}
