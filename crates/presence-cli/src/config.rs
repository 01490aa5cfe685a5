use presence_core::CaptureSettings;
use std::time::Duration;

/// Client configuration, loaded from environment variables.
pub struct Config {
    /// Base origin of the attendance backend.
    pub api_url: String,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Delay between auto-mode capture cycles, in milliseconds.
    pub capture_interval_ms: u64,
    /// How long success notices stay visible, in milliseconds.
    pub notice_ttl_ms: u64,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from `PRESENCE_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("PRESENCE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            camera_device: std::env::var("PRESENCE_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            capture_interval_ms: env_u64("PRESENCE_CAPTURE_INTERVAL_MS", 3000),
            notice_ttl_ms: env_u64("PRESENCE_NOTICE_TTL_MS", 3000),
            http_timeout_secs: env_u64("PRESENCE_HTTP_TIMEOUT_SECS", 30),
        }
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            interval: Duration::from_millis(self.capture_interval_ms),
            notice_ttl: Duration::from_millis(self.notice_ttl_ms),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
