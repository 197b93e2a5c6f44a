use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::DEFAULT_FRAME_BYTES;
use crate::coordinator::CoordinatorConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub relay: RelayConfig,
    pub site: SiteConfig,
    pub extension: ExtensionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Path upgraded to the relay socket
    pub path: String,
    /// Status string replied to every inbound message
    pub reply_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Directory with the static site
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    pub relay_url: String,
    pub frame_bytes: usize,
    pub stop_timeout_ms: u64,
    pub event_queue_depth: usize,
    pub command_queue_depth: usize,
    pub relay_send_queue: usize,
    /// Capture pacing for file-backed tab audio
    pub capture_frame_ms: u64,
}

impl Config {
    /// Load defaults, then `path` (any format `config` knows, optional),
    /// then `ECHO_*` environment variables (`ECHO_SERVICE__HTTP__PORT=8080`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::with_defaults()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ECHO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self> {
        let settings = Self::with_defaults()?.build()?;
        Ok(settings.try_deserialize()?)
    }

    fn with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "echo-relay")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000_i64)?
            .set_default("relay.path", "/api/ws")?
            .set_default("relay.reply_text", "Processing audio...")?
            .set_default("site.root", "public")?
            .set_default("extension.relay_url", "ws://localhost:3000/api/ws")?
            .set_default("extension.frame_bytes", DEFAULT_FRAME_BYTES as i64)?
            .set_default("extension.stop_timeout_ms", 5000_i64)?
            .set_default("extension.event_queue_depth", 64_i64)?
            .set_default("extension.command_queue_depth", 8_i64)?
            .set_default("extension.relay_send_queue", 32_i64)?
            .set_default("extension.capture_frame_ms", 100_i64)?)
    }

    fn validate(&self) -> Result<()> {
        if !self.relay.path.starts_with('/') {
            anyhow::bail!("relay.path must start with '/': {}", self.relay.path);
        }
        if self.extension.frame_bytes == 0 {
            anyhow::bail!("extension.frame_bytes must be positive");
        }
        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

impl From<&ExtensionConfig> for CoordinatorConfig {
    fn from(ext: &ExtensionConfig) -> Self {
        Self {
            relay_url: ext.relay_url.clone(),
            frame_bytes: ext.frame_bytes,
            stop_timeout: Duration::from_millis(ext.stop_timeout_ms),
            event_queue_depth: ext.event_queue_depth,
            command_queue_depth: ext.command_queue_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_relay_contract() {
        let cfg = Config::defaults().unwrap();

        assert_eq!(cfg.service.http.port, 3000);
        assert_eq!(cfg.relay.path, "/api/ws");
        assert_eq!(cfg.extension.relay_url, "ws://localhost:3000/api/ws");
        assert_eq!(cfg.extension.frame_bytes, DEFAULT_FRAME_BYTES);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load("does/not/exist/echo-relay").unwrap();
        assert_eq!(cfg.service.name, "echo-relay");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("echo.toml");
        std::fs::write(
            &path,
            "[relay]\npath = \"/relay\"\nreply_text = \"ok\"\n\n[extension]\nframe_bytes = 1024\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.relay.path, "/relay");
        assert_eq!(cfg.relay.reply_text, "ok");
        assert_eq!(cfg.extension.frame_bytes, 1024);
        assert_eq!(cfg.extension.stop_timeout_ms, 5000);
    }

    #[test]
    fn test_rejects_relative_relay_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[relay]\npath = \"api/ws\"\n").unwrap();

        assert!(Config::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_coordinator_config_from_extension() {
        let cfg = Config::defaults().unwrap();
        let coord = CoordinatorConfig::from(&cfg.extension);

        assert_eq!(coord.stop_timeout, Duration::from_secs(5));
        assert_eq!(coord.command_queue_depth, 8);
    }
}
