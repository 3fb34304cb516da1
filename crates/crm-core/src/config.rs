// ── Runtime client configuration ──
//
// These types describe *how* to reach the contacts backend and how long
// cached results stay fresh. They never touch disk: the CLI (via
// crm-config) constructs a `CrmConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

/// Backend used when no profile or flag names one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001/";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Cache behaviour shared by every `CacheStore` the application owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a settled entry counts as fresh. A subscriber arriving
    /// within this window gets the cached value with no background
    /// refetch. Zero means every new subscriber triggers a refetch.
    pub stale_time: Duration,
}

/// Configuration for one backend connection.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// Collection URL of the contacts backend (e.g. `http://localhost:3001/`).
    pub backend_url: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Cache freshness policy.
    pub cache: CacheConfig,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            cache: CacheConfig::default(),
        }
    }
}
