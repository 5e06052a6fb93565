//! Service configuration.

use facecensor_core::DEFAULT_WELCOME_BONUS_CREDITS;
use facecensor_vision::DetectorConfig;

/// Largest accepted image upload (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/facecensor/db").
    pub data_dir: String,

    /// Directory holding original and censored images
    /// (default: "/data/facecensor/uploads").
    pub upload_dir: String,

    /// Shared HS256 secret used to validate bearer tokens.
    ///
    /// When unset, every authenticated endpoint answers 401.
    pub auth_jwt_secret: Option<String>,

    /// Admin API key for privileged endpoints (optional).
    pub admin_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum accepted image size in bytes.
    pub max_upload_bytes: usize,

    /// Maximum request body size in bytes (covers multipart overhead).
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Credits granted when an account is provisioned.
    pub welcome_bonus_credits: i64,

    /// Path to the SeetaFace model file.
    pub face_model_path: String,

    /// Detector tunables.
    pub detector: DetectorConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let detector = DetectorConfig {
            scale_factor: env_parse("DETECTOR_SCALE_FACTOR", defaults.detector.scale_factor),
            min_size: env_parse("DETECTOR_MIN_SIZE", defaults.detector.min_size),
            score_threshold: env_parse(
                "DETECTOR_SCORE_THRESHOLD",
                defaults.detector.score_threshold,
            ),
            window_step: defaults.detector.window_step,
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            auth_jwt_secret: std::env::var("AUTH_JWT_SECRET").ok(),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_body_bytes: env_parse("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_parse(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            welcome_bonus_credits: env_parse(
                "WELCOME_BONUS_CREDITS",
                defaults.welcome_bonus_credits,
            ),
            face_model_path: std::env::var("FACE_MODEL_PATH").unwrap_or(defaults.face_model_path),
            detector,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or
/// malformed.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/facecensor/db".into(),
            upload_dir: "/data/facecensor/uploads".into(),
            auth_jwt_secret: None,
            admin_api_key: None,
            cors_origins: vec!["*".into()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_body_bytes: DEFAULT_MAX_UPLOAD_BYTES + 1024 * 1024,
            request_timeout_seconds: 60,
            welcome_bonus_credits: DEFAULT_WELCOME_BONUS_CREDITS,
            face_model_path: "model/seeta_fd_frontal_v1.0.bin".into(),
            detector: DetectorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_policy() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert!(config.max_body_bytes > config.max_upload_bytes);
        assert_eq!(config.welcome_bonus_credits, 1);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        assert_eq!(env_parse("FACECENSOR_TEST_UNSET_VARIABLE", 7u32), 7);
    }
}
