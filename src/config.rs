/*
 * Responsibility
 * - 環境変数や設定の読み込み (Auth0 tenant/audience, 公開 URL, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - from_vars は環境変数に触らない純粋な constructor (テスト用)
 */
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::services::discovery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SERVER_NAME: &str = "Example MCP Server";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth0_domain: String,
    pub auth0_audience: String,
    pub access_token_leeway_seconds: u64,
    pub jwt_public_key_pem: String,

    /// 外部から見たこのサーバーの base URL (未設定なら resource_metadata を付けない)
    pub server_url: Option<Url>,
    pub server_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // 空文字は未設定扱い
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let port = match var("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth0_domain = required("AUTH0_DOMAIN")?.trim().to_string();
        let auth0_audience = required("AUTH0_AUDIENCE")?.trim().to_string();

        let access_token_leeway_seconds = var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(60);

        let jwt_public_key_pem = required("AUTH0_JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n");

        let server_url = var("MCP_SERVER_URL")
            .map(|v| Url::parse(v.trim()).map_err(|_| ConfigError::Invalid("MCP_SERVER_URL")))
            .transpose()?;
        if server_url.as_ref().is_some_and(Url::cannot_be_a_base) {
            return Err(ConfigError::Invalid("MCP_SERVER_URL"));
        }

        let server_name = var("MCP_SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth0_domain,
            auth0_audience,
            access_token_leeway_seconds,
            jwt_public_key_pem,
            server_url,
            server_name,
        })
    }

    /// `<server_url>/.well-known/oauth-protected-resource`, when a base URL is configured.
    pub fn resource_metadata_url(&self) -> Option<String> {
        self.server_url
            .as_ref()
            .map(|url| discovery::resource_metadata_url(url.as_str()))
    }
}
