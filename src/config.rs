use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: u64,
    pub acquire_timeout: u64,
    pub idle_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// 令牌有效期（秒）
    pub expiration: u64,
}

/// 媒体文件配置
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// 文档根目录，`/data/media/gallery/...` 形式的路径都相对于它解析
    pub root: PathBuf,
    /// 上传图片大小上限（字节）
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")?,
            min_connections: env_or("DB_MIN_CONNECTIONS", 5),
            max_connections: env_or("DB_MAX_CONNECTIONS", 20),
            connect_timeout: env_or("DB_CONNECT_TIMEOUT", 10),
            acquire_timeout: env_or("DB_ACQUIRE_TIMEOUT", 10),
            idle_timeout: env_or("DB_IDLE_TIMEOUT", 600),
        };

        let server = ServerConfig {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            expiration: env_or("JWT_EXPIRATION", 30 * 24 * 3600),
        };

        let defaults = MediaConfig::default();
        let media = MediaConfig {
            root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            max_upload_bytes: env_or("UPLOAD_MAX_BYTES", defaults.max_upload_bytes),
        };

        Ok(Config {
            database,
            server,
            jwt,
            media,
        })
    }
}
