/// Relay configuration
///
/// # Environment variables
///
/// All settings can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | REMOTE_URL | (unset) | Remote datastore endpoint |
/// | DATA_DIR | /var/lib/order-relay | Local storage directory |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request HTTP timeout |
/// | FETCH_TIMEOUT_MS | 10000 | Read-path callback wait ceiling |
/// | SYNC_PACING_MS | 100 | Delay between reconciliation uploads |
/// | PERMISSIVE_SUCCESS | true | Treat absent success flags as success |
///
/// An unset or malformed `REMOTE_URL` means the store runs local-only.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote datastore endpoint, e.g. "https://example.test/exec"
    pub remote_url: Option<String>,
    /// Directory holding the embedded database file
    pub data_dir: String,
    /// HTTP request timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// Total wait ceiling for the read-path callback (milliseconds)
    pub fetch_timeout_ms: u64,
    /// Inter-request pacing between reconciliation uploads (milliseconds)
    pub sync_pacing_ms: u64,
    /// Probe/fetch responses lacking an explicit success flag count as
    /// successful. Required for wire compatibility with the deployed
    /// remote; disable to treat the absence as failure.
    pub permissive_success: bool,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            remote_url: std::env::var("REMOTE_URL").ok().filter(|v| !v.is_empty()),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "/var/lib/order-relay".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            fetch_timeout_ms: std::env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            sync_pacing_ms: std::env::var("SYNC_PACING_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            permissive_success: std::env::var("PERMISSIVE_SUCCESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// Override the endpoint and storage location.
    ///
    /// Mostly useful in tests.
    pub fn with_overrides(
        remote_url: Option<impl Into<String>>,
        data_dir: impl Into<String>,
    ) -> Self {
        let mut config = Self::from_env();
        config.remote_url = remote_url.map(Into::into);
        config.data_dir = data_dir.into();
        config
    }

    /// Whether the static configuration describes a usable remote.
    ///
    /// This is a shape check only — the URL must exist and carry an
    /// http(s) scheme. Actual reachability is settled by the startup
    /// probe.
    pub fn remote_configured(&self) -> bool {
        self.remote_url
            .as_deref()
            .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
