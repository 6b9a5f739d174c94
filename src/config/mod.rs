//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `loxaudio` binary)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::Credential;
use crate::error::{AuthError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Controller endpoint
    #[serde(default)]
    pub server: ServerConfig,

    /// Login identity and credential
    #[serde(default)]
    pub auth: AuthConfig,

    /// Handshake behaviour
    #[serde(default)]
    pub handshake: HandshakeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AuthError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Server settings
        if let Ok(host) = std::env::var("LOXAUDIO_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("LOXAUDIO_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(path) = std::env::var("LOXAUDIO_PATH") {
            config.server.path = path;
        }
        if let Ok(tls) = std::env::var("LOXAUDIO_TLS") {
            config.server.tls = matches!(tls.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        // Auth settings
        if let Ok(user) = std::env::var("LOXAUDIO_USER") {
            config.auth.user = user;
        }
        if let Ok(token) = std::env::var("LOXAUDIO_TOKEN") {
            config.auth.token = Some(Credential::new(token));
        }

        // Handshake settings
        if let Ok(val) = std::env::var("LOXAUDIO_TIMEOUT_SECS") {
            if let Ok(val) = val.parse() {
                config.handshake.timeout_secs = val;
            }
        }

        config
    }

    /// Default config file location (`<config_dir>/loxaudio/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("loxaudio").join("config.toml"))
    }

    /// Load the default config file if present, overlaid with environment variables
    pub fn load() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        Ok(base.merge(Self::from_env()))
    }

    /// Merge with another config (other takes precedence where it differs from defaults)
    pub fn merge(self, other: Self) -> Self {
        let server_defaults = ServerConfig::default();
        let handshake_defaults = HandshakeConfig::default();

        Self {
            server: ServerConfig {
                host: if other.server.host != server_defaults.host {
                    other.server.host
                } else {
                    self.server.host
                },
                port: if other.server.port != server_defaults.port {
                    other.server.port
                } else {
                    self.server.port
                },
                path: if other.server.path != server_defaults.path {
                    other.server.path
                } else {
                    self.server.path
                },
                tls: other.server.tls || self.server.tls,
            },
            auth: AuthConfig {
                user: if other.auth.user.is_empty() {
                    self.auth.user
                } else {
                    other.auth.user
                },
                token: other.auth.token.or(self.auth.token),
            },
            handshake: HandshakeConfig {
                timeout_secs: if other.handshake.timeout_secs != handshake_defaults.timeout_secs {
                    other.handshake.timeout_secs
                } else {
                    self.handshake.timeout_secs
                },
            },
        }
    }

    /// Check the configuration is usable for an authentication attempt
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(AuthError::Config("server.host is empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(AuthError::Config("server.port must be non-zero".to_string()));
        }
        if self.auth.user.is_empty() {
            return Err(AuthError::Config("auth.user is empty".to_string()));
        }
        match &self.auth.token {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(AuthError::Config(
                "auth.token is missing (set LOXAUDIO_TOKEN)".to_string(),
            )),
        }
    }
}

/// Controller endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Controller host name or address
    pub host: String,

    /// WebSocket port
    pub port: u16,

    /// WebSocket path
    pub path: String,

    /// Use `wss://` instead of `ws://`
    pub tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7091,
            path: "/".to_string(),
            tls: false,
        }
    }
}

impl ServerConfig {
    /// Get the WebSocket URL
    pub fn url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{}://{}:{}{}", scheme, self.host, self.port, path)
    }
}

/// Login identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Active user identity
    pub user: String,

    /// Bearer token; never written back out
    #[serde(skip_serializing)]
    pub token: Option<Credential>,
}

/// Handshake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Deadline the caller applies around the whole handshake
    pub timeout_secs: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HandshakeConfig {
    /// Handshake deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 7091);
        assert_eq!(config.server.url(), "ws://127.0.0.1:7091/");
        assert_eq!(config.handshake.timeout(), Duration::from_secs(10));
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn test_server_url() {
        let config = ServerConfig {
            host: "audio.local".to_string(),
            port: 443,
            path: "ws".to_string(),
            tls: true,
        };
        assert_eq!(config.url(), "wss://audio.local:443/ws");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            host = "10.0.0.5"
            port = 7095

            [auth]
            user = "admin"
            token = "eyJhbGciOi"

            [handshake]
            timeout_secs = 3
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "10.0.0.5");
        assert_eq!(config.server.port, 7095);
        assert_eq!(config.server.path, "/");
        assert_eq!(config.auth.user, "admin");
        assert_eq!(config.auth.token.as_ref().unwrap().expose(), "eyJhbGciOi");
        assert_eq!(config.handshake.timeout_secs, 3);
    }

    #[test]
    fn test_token_never_serialized() {
        let mut config = Config::default();
        config.auth.token = Some(Credential::new("eyJhbGciOi"));

        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("eyJhbGciOi"));
        assert!(!format!("{config:?}").contains("eyJhbGciOi"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nuser = \"kitchen\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.auth.user, "kitchen");
        assert_eq!(config.server.port, 7091);

        assert!(matches!(
            Config::from_file(dir.path().join("missing.toml")),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = \"not a port\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(&err, AuthError::Config(msg) if msg.contains("parse")));
        assert_eq!(err.kind(), crate::error::ErrorKind::Other);
        assert!(!err.is_fallback_candidate());
    }

    #[test]
    fn test_merge_prefers_non_default_values() {
        let mut file = Config::default();
        file.server.host = "10.0.0.5".to_string();
        file.auth.user = "admin".to_string();
        file.auth.token = Some(Credential::new("from-file"));

        let mut env = Config::default();
        env.server.port = 7095;
        env.auth.token = Some(Credential::new("from-env"));

        let merged = file.merge(env);
        assert_eq!(merged.server.host, "10.0.0.5");
        assert_eq!(merged.server.port, 7095);
        assert_eq!(merged.auth.user, "admin");
        assert_eq!(merged.auth.token.unwrap().expose(), "from-env");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.auth.user = "admin".to_string();
        assert!(config.validate().is_err());

        config.auth.token = Some(Credential::new("jwt"));
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
