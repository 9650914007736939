use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Public base URL, ending in `/`. Derived from the `Host` header when unset.
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub initialize_root: bool,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            base_url: None,
            initialize_root: true,
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_payload_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_true() -> bool {
    true
}

/// Which ResourceService/MementoService implementation backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Fjall,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Directory for binary content. In-memory when unset.
    pub binary_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: default_storage_path(),
            binary_path: None,
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/resources")
}

/// `Cache-Control` applied to successful GET/HEAD responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_max_age")]
    pub max_age: u64,
    #[serde(default = "default_true")]
    pub must_revalidate: bool,
    #[serde(default)]
    pub no_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: default_cache_max_age(),
            must_revalidate: true,
            no_cache: false,
        }
    }
}

fn default_cache_max_age() -> u64 {
    86400
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_allow_origin")]
    pub allow_origin: Vec<String>,
    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<String>,
    #[serde(default = "default_allow_headers")]
    pub allow_headers: Vec<String>,
    #[serde(default = "default_expose_headers")]
    pub expose_headers: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origin: default_allow_origin(),
            allow_methods: default_allow_methods(),
            allow_headers: default_allow_headers(),
            expose_headers: default_expose_headers(),
            allow_credentials: true,
            max_age: default_cors_max_age(),
        }
    }
}

fn default_allow_origin() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allow_methods() -> Vec<String> {
    ["GET", "HEAD", "OPTIONS", "POST", "PUT", "PATCH", "DELETE"]
        .map(String::from)
        .to_vec()
}

fn default_allow_headers() -> Vec<String> {
    [
        "Content-Type",
        "Link",
        "Accept",
        "Accept-Datetime",
        "Authorization",
        "Prefer",
        "Slug",
        "Origin",
    ]
    .map(String::from)
    .to_vec()
}

fn default_expose_headers() -> Vec<String> {
    [
        "Content-Type",
        "Link",
        "Memento-Datetime",
        "Preference-Applied",
        "Location",
        "Accept-Patch",
        "Accept-Post",
        "ETag",
        "Vary",
    ]
    .map(String::from)
    .to_vec()
}

fn default_cors_max_age() -> u64 {
    180
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Principals treated as the administrator agent.
    #[serde(default)]
    pub admin_users: Vec<String>,
    /// Header carrying an authenticated principal set by a trusted proxy.
    pub principal_header: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
