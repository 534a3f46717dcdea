//! 统一配置中心
//!
//! 提供中继服务的全局配置管理，包括：
//! - 监听地址与帧大小限制
//! - 远程附件存储（Telegram）凭据
//! - 本地附件缓存文件
//! - 可选的 Postgres 文档存储
//!
//! 加载顺序：内置默认值 → `relay.yaml`（可选）→ `RELAY_*` 环境变量，
//! 嵌套字段用 `__` 分隔，例如 `RELAY_SERVER__PORT=9000`。

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "relay.yaml";
/// 环境变量前缀
pub const ENV_PREFIX: &str = "RELAY_";

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// 远程附件存储配置
    pub blob: BlobConfig,
    /// 本地附件缓存配置
    pub attachments: AttachmentsConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 调试模式：提升日志级别
    #[serde(default)]
    pub debug: bool,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 单个入站帧的最大字节数
    pub max_frame_bytes: usize,
}

/// Telegram 附件存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobConfig {
    pub api_base: String,
    pub token: String,
    /// 群组 id 常为负数，环境变量里会被解析成整数
    #[serde(deserialize_with = "string_or_integer")]
    pub chat_id: String,
}

fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawChatId {
        Integer(i64),
        Text(String),
    }

    Ok(match RawChatId::deserialize(deserializer)? {
        RawChatId::Integer(id) => id.to_string(),
        RawChatId::Text(text) => text,
    })
}

/// 本地附件缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    pub path: PathBuf,
}

/// 数据库配置；未设置 `url` 时使用内存存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                max_frame_bytes: 10 * 1024 * 1024,
            },
            blob: BlobConfig {
                api_base: "https://api.telegram.org".to_string(),
                token: String::new(),
                chat_id: String::new(),
            },
            attachments: AttachmentsConfig {
                path: PathBuf::from("attachments.json"),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            debug: false,
        }
    }
}

impl AppConfig {
    /// 构建完整的配置来源链
    pub fn figment(config_file: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 从 `relay.yaml` 与环境变量加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// 从指定文件与环境变量加载并校验配置
    pub fn load_from(config_file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(config_file)
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// 只叠加环境变量，不读配置文件也不校验，用于测试和开发
    pub fn from_env_with_defaults() -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))
    }

    /// 监听地址，形如 `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.server.max_frame_bytes == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "max_frame_bytes must be greater than 0".to_string(),
            ));
        }

        // 远程附件存储必须有凭据
        if self.blob.token.trim().is_empty() {
            return Err(ConfigError::InvalidBlobConfig(
                "bot token is required".to_string(),
            ));
        }
        if self.blob.chat_id.trim().is_empty() {
            return Err(ConfigError::InvalidBlobConfig(
                "chat id is required".to_string(),
            ));
        }
        if !self.blob.api_base.starts_with("http://") && !self.blob.api_base.starts_with("https://")
        {
            return Err(ConfigError::InvalidBlobConfig(format!(
                "api base must be an http(s) url, got {}",
                self.blob.api_base
            )));
        }

        if self.attachments.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidAttachmentConfig(
                "cache path cannot be empty".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if url.is_empty() {
                return Err(ConfigError::InvalidDatabaseConfig(
                    "database url cannot be empty when set".to_string(),
                ));
            }
            if self.database.max_connections == 0 {
                return Err(ConfigError::InvalidDatabaseConfig(
                    "max connections must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid blob store configuration: {0}")]
    InvalidBlobConfig(String),
    #[error("Invalid attachment cache configuration: {0}")]
    InvalidAttachmentConfig(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.blob.token = "123:abc".to_string();
        config.blob.chat_id = "-100".to_string();
        config
    }

    #[test]
    fn defaults_match_the_relay_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.max_frame_bytes, 10 * 1024 * 1024);
        assert_eq!(config.attachments.path, PathBuf::from("attachments.json"));
        assert!(config.database.url.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn env_overrides_yaml_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "relay.yaml",
                r#"
server:
  port: 5000
blob:
  token: "from-file"
  chat_id: "-1"
"#,
            )?;
            jail.set_env("RELAY_SERVER__PORT", "6000");
            jail.set_env("RELAY_BLOB__CHAT_ID", "-42");
            jail.set_env("RELAY_DEBUG", "true");

            let config = AppConfig::load().map_err(|err| err.to_string())?;
            assert_eq!(config.server.port, 6000);
            assert_eq!(config.blob.token, "from-file");
            assert_eq!(config.blob.chat_id, "-42");
            assert_eq!(config.server.host, "0.0.0.0");
            assert!(config.debug);
            Ok(())
        });
    }

    #[test]
    fn numeric_chat_id_in_yaml_is_accepted() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "relay.yaml",
                r#"
blob:
  token: "123:abc"
  chat_id: -1001234567
"#,
            )?;

            let config = AppConfig::load().map_err(|err| err.to_string())?;
            assert_eq!(config.blob.chat_id, "-1001234567");
            Ok(())
        });
    }

    #[test]
    fn missing_token_fails_loading() {
        Jail::expect_with(|_jail| {
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::InvalidBlobConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn from_env_with_defaults_skips_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("RELAY_ATTACHMENTS__PATH", "/tmp/cache.json");
            let config = AppConfig::from_env_with_defaults().map_err(|err| err.to_string())?;
            assert_eq!(config.attachments.path, PathBuf::from("/tmp/cache.json"));
            assert!(config.blob.token.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
        config.server.port = 4000;

        config.blob.api_base = "ftp://example".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBlobConfig(_))
        ));
        config.blob.api_base = "https://api.telegram.org".to_string();

        config.database.url = Some("postgres://relay@db/relay".to_string());
        config.database.max_connections = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDatabaseConfig(_))
        ));
    }
}
