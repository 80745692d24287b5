//! Server configuration from the environment

/// Runtime settings for the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Bearer token guarding `/stats`
    pub admin_token: String,
    pub backend_version: String,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            admin_token: "dev-token".to_string(),
            backend_version: "0.0.1".to_string(),
            max_upload_bytes: 12_000_000,
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `ADMIN_TOKEN`, `BACKEND_VERSION` and `MAX_UPLOAD_BYTES`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            admin_token: lookup("ADMIN_TOKEN").unwrap_or(defaults.admin_token),
            backend_version: lookup("BACKEND_VERSION").unwrap_or(defaults.backend_version),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}
