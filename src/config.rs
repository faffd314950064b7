//! Configuration management for the StudyVault page server

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
    pub cache: CacheSettings,
    pub watermark: WatermarkConfig,
    /// Cookie carrying the viewer's session token
    pub session_cookie: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: BlobBackend,
    /// Base URL uploads are PUT to (HTTP backend)
    pub upload_url: Option<String>,
    /// Bearer token for the HTTP backend
    pub token: Option<String>,
    pub s3: Option<S3Config>,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    Http,
    S3,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Fixed rasterization scale (2.0 = 144 DPI)
    pub scale: f32,
    pub render_timeout_secs: u64,
    pub parse_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkConfig {
    /// Product/ownership tag leading the watermark text
    pub tag: String,
    /// Audience label trailing the date
    pub label: String,
    pub opacity: f32,
    pub font_size: f32,
    pub spacing: f32,
    pub font_path: Option<String>,
    /// Embed a fingerprint of the viewer session when one is supplied
    pub include_session: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                backend: BlobBackend::Http,
                upload_url: None,
                token: None,
                s3: None,
                fetch_timeout_secs: 30,
            },
            render: RenderConfig::default(),
            cache: CacheSettings::default(),
            watermark: WatermarkConfig::default(),
            session_cookie: "studyvault_session".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            render_timeout_secs: 30,
            parse_timeout_secs: 30,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 5 * 60,
            sweep_interval_secs: 60,
            max_entries: 64,
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            tag: "StudyVault — Do Not Share".to_string(),
            label: "MBBS".to_string(),
            opacity: 0.18,
            font_size: 48.0,
            spacing: 120.0,
            font_path: None,
            include_session: true,
        }
    }
}

impl StorageConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Read and parse an optional variable, falling back on absence or parse failure
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Map a `BLOB_BACKEND` value to a backend, falling back to HTTP
fn parse_backend(value: &str) -> BlobBackend {
    match value.trim().to_ascii_lowercase().as_str() {
        "s3" => BlobBackend::S3,
        "memory" => BlobBackend::Memory,
        "http" | "" => BlobBackend::Http,
        other => {
            tracing::warn!("Unknown BLOB_BACKEND {:?}, using the HTTP backend", other);
            BlobBackend::Http
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        let backend = parse_backend(&env::var("BLOB_BACKEND").unwrap_or_else(|_| "http".to_string()));

        // S3 credentials are only mandatory when the S3 backend is selected
        let s3 = if backend == BlobBackend::S3 {
            Some(S3Config {
                endpoint: env::var("S3_ENDPOINT")?,
                bucket: env::var("S3_BUCKET")?,
                access_key: env::var("S3_ACCESS_KEY")?,
                secret_key: env::var("S3_SECRET_KEY")?,
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "documents/".to_string()),
            })
        } else {
            None
        };

        let wm = defaults.watermark;

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_or("SERVER_PORT", defaults.server.port),
            },
            storage: StorageConfig {
                backend,
                upload_url: env_opt("BLOB_UPLOAD_URL"),
                token: env_opt("BLOB_TOKEN"),
                s3,
                fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", defaults.storage.fetch_timeout_secs),
            },
            render: RenderConfig {
                scale: env_or("RENDER_SCALE", defaults.render.scale),
                render_timeout_secs: env_or("RENDER_TIMEOUT_SECS", defaults.render.render_timeout_secs),
                parse_timeout_secs: env_or("PARSE_TIMEOUT_SECS", defaults.render.parse_timeout_secs),
            },
            cache: CacheSettings {
                ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache.ttl_secs),
                sweep_interval_secs: env_or("CACHE_SWEEP_SECS", defaults.cache.sweep_interval_secs),
                max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache.max_entries),
            },
            watermark: WatermarkConfig {
                tag: env::var("WATERMARK_TAG").unwrap_or(wm.tag),
                label: env::var("WATERMARK_LABEL").unwrap_or(wm.label),
                opacity: env_or("WATERMARK_OPACITY", wm.opacity),
                font_size: env_or("WATERMARK_FONT_SIZE", wm.font_size),
                spacing: env_or("WATERMARK_SPACING", wm.spacing),
                font_path: env_opt("WATERMARK_FONT_PATH"),
                include_session: env_or("WATERMARK_SESSION", wm.include_session),
            },
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.scale, 2.0);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.watermark.opacity, 0.18);
        assert_eq!(config.storage.backend, BlobBackend::Http);
        assert!(config.storage.s3.is_none());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("STUDYVAULT_TEST_PORT", "not-a-port");
        assert_eq!(env_or("STUDYVAULT_TEST_PORT", 3000u16), 3000);
        env::set_var("STUDYVAULT_TEST_PORT", " 8080 ");
        assert_eq!(env_or("STUDYVAULT_TEST_PORT", 3000u16), 8080);
        env::remove_var("STUDYVAULT_TEST_PORT");
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("s3"), BlobBackend::S3);
        assert_eq!(parse_backend(" Memory "), BlobBackend::Memory);
        assert_eq!(parse_backend("http"), BlobBackend::Http);
        // Typos fall back to HTTP with a warning
        assert_eq!(parse_backend("s4"), BlobBackend::Http);
    }
}
