use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_SHARE_TOKEN_TTL_SECS: i64 = 72 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of bearer tokens handed out by link-share authentication.
    pub share_token_ttl_secs: i64,
    /// Public base URL for external access (e.g., "https://tasks.example.com").
    /// Used when building share links. If not set, responses only carry the hash.
    pub public_base_url: Option<String>,
}

impl ServerConfig {
    /// Loads a config from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.share_token_ttl_secs <= 0 {
            return Err(Error::Config(
                "share_token_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("trellis.db")
    }

    #[must_use]
    pub fn secret_path(&self) -> PathBuf {
        self.data_dir.join(".share_secret")
    }

    #[must_use]
    pub fn admin_token_path(&self) -> PathBuf {
        self.data_dir.join(".admin_token")
    }

    /// Builds the public link for a share hash, if a base URL is configured.
    #[must_use]
    pub fn share_url(&self, hash: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/share/{hash}/auth", base.trim_end_matches('/')))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            share_token_ttl_secs: DEFAULT_SHARE_TOKEN_TTL_SECS,
            public_base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.share_token_ttl_secs, 259_200);
        assert_eq!(config.db_path(), PathBuf::from("./data/trellis.db"));
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "port = 9000\nshare_token_ttl_secs = 60\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.share_token_ttl_secs, 60);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_ttl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "share_token_ttl_secs = 0\n").unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_share_url() {
        let config = ServerConfig {
            public_base_url: Some("https://tasks.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.share_url("abc").as_deref(),
            Some("https://tasks.example.com/share/abc/auth")
        );
        assert!(ServerConfig::default().share_url("abc").is_none());
    }
}
