use crate::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify,
};

/// JWT令牌声明结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户名（主题）
    pub sub: String,
    /// 用户ID
    pub id: i32,
    /// 过期时间戳
    pub exp: usize,
}

/// OpenAPI安全配置插件
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert(Default::default());
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// 令牌校验失败的原因
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("令牌已过期")]
    Expired,
    #[error("令牌签名无效")]
    BadSignature,
    #[error("无效令牌")]
    Malformed,
    #[error("令牌签发失败: {0}")]
    Encode(String),
}

/// 会话由登录服务签发，这里只负责校验并取出当前用户
pub struct AuthService;

impl AuthService {
    /// 按配置的有效期签发 HS256 令牌
    ///
    /// 线上令牌由外部登录服务签发，本函数供运维工具和测试使用
    pub fn create_access_token(
        user_id: i32,
        username: &str,
        config: &JwtConfig,
    ) -> Result<String, TokenError> {
        let lifetime = Duration::seconds(config.expiration as i64);
        let claims = Claims {
            sub: username.to_string(),
            id: user_id,
            exp: (Utc::now() + lifetime).timestamp().max(0) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Encode(e.to_string()))
    }

    pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        })
    }
}
