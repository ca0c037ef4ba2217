//! API configuration.

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address, e.g. `0.0.0.0:3000`
    pub bind_addr: String,
    /// HMAC secret for bearer token verification
    pub jwt_secret: String,
    /// Directory holding the base clip and selectable clips
    pub assets_dir: String,
    /// File name of the default base clip inside `assets_dir`
    pub base_clip_file: String,
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// The JWT secret has no default: startup fails without it.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            bind_addr: std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET not set".to_string())?,
            assets_dir: std::env::var("ASSETS_DIR").unwrap_or_else(|_| "./assets".to_string()),
            base_clip_file: std::env::var("BASE_CLIP_FILE")
                .unwrap_or_else(|_| "default_base.mp4".to_string()),
        })
    }

    /// Full path of the default base clip.
    pub fn base_clip_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.assets_dir).join(&self.base_clip_file)
    }
}
