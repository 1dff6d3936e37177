//! PostClaw configuration system.
//!
//! A TOML file supplies defaults; environment variables (the deployment
//! platform's usual way of passing credentials) override it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PostClawError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostClawConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub instagram: InstagramConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl PostClawConfig {
    /// Load config from the default path (~/.postclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PostClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PostClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".postclaw")
            .join("config.toml")
    }

    /// Overlay process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay variables from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("INSTAGRAM_TOKEN") {
            self.instagram.access_token = v;
        }
        if let Some(v) = get("CLOUDINARY_CLOUD_NAME") {
            self.cloudinary.cloud_name = v;
        }
        if let Some(v) = get("CLOUDINARY_API_KEY") {
            self.cloudinary.api_key = v;
        }
        if let Some(v) = get("CLOUDINARY_API_SECRET") {
            self.cloudinary.api_secret = v;
        }
        if let Some(v) = get("PORT") {
            match v.trim().parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {v}"),
            }
        }
    }

    /// Check that every required credential is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("TELEGRAM_TOKEN", &self.telegram.bot_token),
            ("INSTAGRAM_TOKEN", &self.instagram.access_token),
            ("CLOUDINARY_CLOUD_NAME", &self.cloudinary.cloud_name),
            ("CLOUDINARY_API_KEY", &self.cloudinary.api_key),
            ("CLOUDINARY_API_SECRET", &self.cloudinary.api_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PostClawError::Config(format!(
                    "{name} is required (set it in the environment or config file)"
                )));
            }
        }
        Ok(())
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_api_base_telegram")]
    pub api_base: String,
}

fn default_poll_interval() -> u64 { 1 }
fn default_api_base_telegram() -> String { "https://api.telegram.org".into() }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval_secs: default_poll_interval(),
            api_base: default_api_base_telegram(),
        }
    }
}

/// Instagram Graph API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_graph_base")]
    pub api_base: String,
}

fn default_graph_base() -> String { "https://graph.instagram.com".into() }

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base: default_graph_base(),
        }
    }
}

/// Cloudinary media hosting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Videos larger than this are uploaded in chunks.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_cloudinary_base")]
    pub api_base: String,
}

fn default_folder() -> String { "telegram_instagram".into() }
fn default_chunk_size() -> usize { 6_000_000 }
fn default_cloudinary_base() -> String { "https://api.cloudinary.com/v1_1".into() }

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            chunk_size: default_chunk_size(),
            api_base: default_cloudinary_base(),
        }
    }
}

/// Dispatch loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
    #[serde(default = "default_fault_backoff")]
    pub fault_backoff_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_publishes: usize,
}

fn default_tick() -> u64 { 30 }
fn default_fault_backoff() -> u64 { 60 }
fn default_max_concurrent() -> usize { 4 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick(),
            fault_backoff_secs: default_fault_backoff(),
            max_concurrent_publishes: default_max_concurrent(),
        }
    }
}

/// Publish protocol delays and per-call timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_image_delay")]
    pub image_delay_secs: u64,
    #[serde(default = "default_video_delay")]
    pub video_delay_secs: u64,
    #[serde(default = "default_create_timeout")]
    pub create_timeout_secs: u64,
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,
}

fn default_image_delay() -> u64 { 15 }
fn default_video_delay() -> u64 { 60 }
fn default_create_timeout() -> u64 { 60 }
fn default_publish_timeout() -> u64 { 30 }

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            image_delay_secs: default_image_delay(),
            video_delay_secs: default_video_delay(),
            create_timeout_secs: default_create_timeout(),
            publish_timeout_secs: default_publish_timeout(),
        }
    }
}

/// Media intake limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_max_video_secs")]
    pub max_video_duration_secs: u32,
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

fn default_max_video_secs() -> u32 { 60 }
fn default_max_video_bytes() -> u64 { 100 * 1024 * 1024 }

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_video_duration_secs: default_max_video_secs(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

/// Status server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 10000 }
fn default_host() -> String { "0.0.0.0".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("TELEGRAM_TOKEN", "tg".to_string()),
            ("INSTAGRAM_TOKEN", "ig".to_string()),
            ("CLOUDINARY_CLOUD_NAME", "cloud".to_string()),
            ("CLOUDINARY_API_KEY", "key".to_string()),
            ("CLOUDINARY_API_SECRET", "secret".to_string()),
        ])
    }

    #[test]
    fn test_default_config() {
        let config = PostClawConfig::default();
        assert_eq!(config.scheduler.tick_secs, 30);
        assert_eq!(config.scheduler.fault_backoff_secs, 60);
        assert_eq!(config.publish.video_delay_secs, 60);
        assert_eq!(config.publish.image_delay_secs, 15);
        assert_eq!(config.intake.max_video_bytes, 104_857_600);
        assert_eq!(config.gateway.port, 10000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [publish]
            video_delay_secs = 90

            [gateway]
            port = 8080
        "#;
        let config: PostClawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.publish.video_delay_secs, 90);
        assert_eq!(config.publish.image_delay_secs, 15);
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "0.0.0.0");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: PostClawConfig = toml::from_str("").unwrap();
        assert_eq!(config.cloudinary.folder, "telegram_instagram");
        assert_eq!(config.instagram.api_base, "https://graph.instagram.com");
    }

    #[test]
    fn test_env_overrides_and_validate() {
        let env = full_env();
        let mut config = PostClawConfig::default();
        assert!(config.validate().is_err());

        config.apply_env_with(|k| env.get(k).cloned());
        assert_eq!(config.telegram.bot_token, "tg");
        assert_eq!(config.cloudinary.api_secret, "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_instagram_token_is_named() {
        let mut env = full_env();
        env.remove("INSTAGRAM_TOKEN");
        let mut config = PostClawConfig::default();
        config.apply_env_with(|k| env.get(k).cloned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("INSTAGRAM_TOKEN"));
    }

    #[test]
    fn test_port_env_parsing() {
        let mut config = PostClawConfig::default();
        config.apply_env_with(|k| (k == "PORT").then(|| "4321".to_string()));
        assert_eq!(config.gateway.port, 4321);

        config.apply_env_with(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.gateway.port, 4321);
    }
}
