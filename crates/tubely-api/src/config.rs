//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tubely_models::validate_bucket;

/// Upper bound accepted by S3 for presigned URL lifetimes.
pub const MAX_PLAYBACK_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Default playback link lifetime.
pub const DEFAULT_PLAYBACK_EXPIRY_SECS: u64 = 120;

/// Default upload body limit (1 GiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1 << 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            environment: "development".to_string(),
            jwt_secret: String::new(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: parse_var("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_var("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: parse_var("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret,
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Ingest pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Bucket every upload is written to
    pub bucket: String,
    /// Parent directory for per-request scratch directories
    pub scratch_dir: PathBuf,
    /// Lifetime of playback links
    pub playback_url_expiry: Duration,
    /// Kill ffprobe/ffmpeg after this many seconds
    pub media_timeout_secs: Option<u64>,
}

impl IngestConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            scratch_dir: std::env::temp_dir(),
            playback_url_expiry: Duration::from_secs(DEFAULT_PLAYBACK_EXPIRY_SECS),
            media_timeout_secs: Some(600),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bucket = std::env::var("S3_BUCKET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("S3_BUCKET"))?;
        validate_bucket(&bucket).map_err(|e| ConfigError::Invalid("S3_BUCKET", e.to_string()))?;

        let mut config = Self::new(bucket);

        if let Ok(dir) = std::env::var("SCRATCH_DIR") {
            if !dir.trim().is_empty() {
                config.scratch_dir = PathBuf::from(dir);
            }
        }

        if let Some(secs) = parse_var::<u64>("PLAYBACK_URL_EXPIRY_SECS") {
            config.playback_url_expiry = Duration::from_secs(clamp_expiry(secs));
        }

        match parse_var::<u64>("MEDIA_TIMEOUT_SECS") {
            Some(0) => config.media_timeout_secs = None,
            Some(secs) => config.media_timeout_secs = Some(secs),
            None => {}
        }

        Ok(config)
    }
}

/// Clamp a playback expiry to what presigning accepts.
pub fn clamp_expiry(secs: u64) -> u64 {
    secs.clamp(1, MAX_PLAYBACK_EXPIRY_SECS)
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const API_VARS: [&str; 7] = [
        "API_HOST",
        "API_PORT",
        "CORS_ORIGINS",
        "RATE_LIMIT_RPS",
        "MAX_BODY_SIZE",
        "ENVIRONMENT",
        "JWT_SECRET",
    ];

    const INGEST_VARS: [&str; 4] = [
        "S3_BUCKET",
        "SCRATCH_DIR",
        "PLAYBACK_URL_EXPIRY_SECS",
        "MEDIA_TIMEOUT_SECS",
    ];

    fn clear(vars: &[&str]) {
        for var in vars {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_api_config_requires_secret() {
        clear(&API_VARS);
        assert!(matches!(
            ApiConfig::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    #[serial]
    fn test_api_config_defaults() {
        clear(&API_VARS);
        std::env::set_var("JWT_SECRET", "s3cret");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 8091);
        assert_eq!(config.max_body_size, 1 << 30);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(!config.is_production());
        clear(&API_VARS);
    }

    #[test]
    #[serial]
    fn test_api_config_overrides() {
        clear(&API_VARS);
        std::env::set_var("JWT_SECRET", "s3cret");
        std::env::set_var("API_PORT", "9000");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        std::env::set_var("ENVIRONMENT", "Production");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(config.is_production());
        clear(&API_VARS);
    }

    #[test]
    #[serial]
    fn test_ingest_config_from_env() {
        clear(&INGEST_VARS);
        assert!(IngestConfig::from_env().is_err());

        std::env::set_var("S3_BUCKET", "tubely-videos");
        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.bucket, "tubely-videos");
        assert_eq!(config.playback_url_expiry, Duration::from_secs(120));
        assert_eq!(config.media_timeout_secs, Some(600));

        std::env::set_var("PLAYBACK_URL_EXPIRY_SECS", "99999999");
        std::env::set_var("MEDIA_TIMEOUT_SECS", "0");
        std::env::set_var("SCRATCH_DIR", "/var/tmp/tubely");
        let config = IngestConfig::from_env().unwrap();
        assert_eq!(
            config.playback_url_expiry,
            Duration::from_secs(MAX_PLAYBACK_EXPIRY_SECS)
        );
        assert_eq!(config.media_timeout_secs, None);
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/tubely"));
        clear(&INGEST_VARS);
    }

    #[test]
    #[serial]
    fn test_ingest_config_rejects_unreferenceable_bucket() {
        clear(&INGEST_VARS);
        for bad in ["videos,eu", " videos", "videos\t"] {
            std::env::set_var("S3_BUCKET", bad);
            assert!(
                matches!(IngestConfig::from_env(), Err(ConfigError::Invalid("S3_BUCKET", _))),
                "{bad:?} accepted"
            );
        }
        clear(&INGEST_VARS);
    }

    #[test]
    fn test_clamp_expiry() {
        assert_eq!(clamp_expiry(0), 1);
        assert_eq!(clamp_expiry(120), 120);
        assert_eq!(clamp_expiry(u64::MAX), MAX_PLAYBACK_EXPIRY_SECS);
    }
}
