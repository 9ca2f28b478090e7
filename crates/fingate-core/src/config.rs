//! Configuration loading and validation.
//!
//! Mirrors the `BaseConfig` pattern: a typed struct loaded once from the environment,
//! validated eagerly, with named defaults surfaced through a `ConfigDefaults`-style trait
//! rather than scattered literals.

use crate::error::{GatewayError, GatewayResult};
use crate::ids::generate_secure_random;
use std::time::Duration;

/// Default values for fields callers are allowed to omit from the environment.
pub trait ConfigDefaults {
    fn default_jwt_algorithm() -> &'static str {
        "HS256"
    }
    fn default_access_token_expires() -> u64 {
        3600
    }
    fn default_auth_code_expires() -> u64 {
        600
    }
    fn default_scope() -> &'static str {
        "full-access"
    }
    fn default_oauth_resource_path() -> &'static str {
        "/v2/mcp"
    }
    fn default_legacy_mount() -> &'static str {
        "/v1/mcp"
    }
    fn default_upstream_api_base() -> &'static str {
        "https://eodhd.com"
    }
    fn default_bind_addr() -> &'static str {
        "0.0.0.0:8080"
    }
}

#[derive(Debug, Clone)]
pub struct ClientMetaConfig {
    pub http_timeout: Duration,
    pub max_bytes: usize,
    pub default_ttl: Duration,
    pub min_ttl: Duration,
    pub max_ttl: Duration,
}

impl Default for ClientMetaConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(5),
            max_bytes: 64 * 1024,
            default_ttl: Duration::from_secs(3600),
            min_ttl: Duration::from_secs(60),
            max_ttl: Duration::from_secs(86400),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_expires: Duration,
    pub auth_code_expires: Duration,
    pub session_secret: String,
    pub default_scope: String,
    pub oauth_resource_path: String,
    pub legacy_mount: String,
    pub server_url: Option<String>,
    pub client_meta: ClientMetaConfig,
    pub storage_dir: Option<String>,
    pub storage_encryption_key: Option<String>,
    pub upstream_credential_env_var: String,
    pub upstream_api_base: String,
    pub upstream_api_timeout: Duration,
    pub identity_verify_timeout: Duration,
    pub bind_addr: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ConfigDefaults for AppConfig {}

impl AppConfig {
    /// Load from the process environment, loading a `.env` file first on a best-effort
    /// basis. Fatal misconfiguration (missing secret, mount/resource-path mismatch)
    /// returns an error; callers at the binary entry point are expected to exit on it.
    pub fn from_env() -> GatewayResult<Self> {
        let _ = dotenvy::dotenv();

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| GatewayError::missing_env("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(GatewayError::config("JWT_SECRET must not be empty"));
        }

        let jwt_algorithm = env_or("JWT_ALGORITHM", Self::default_jwt_algorithm());
        let access_token_expires =
            Duration::from_secs(env_parse("ACCESS_TOKEN_EXPIRES", Self::default_access_token_expires())?);
        let auth_code_expires =
            Duration::from_secs(env_parse("AUTH_CODE_EXPIRES", Self::default_auth_code_expires())?);
        let session_secret = std::env::var("SESSION_SECRET")
            .unwrap_or_else(|_| generate_secure_random(48));
        let default_scope = env_or("DEFAULT_SCOPE", Self::default_scope());
        let oauth_resource_path =
            env_or("MCP_OAUTH_RESOURCE_PATH", Self::default_oauth_resource_path());
        let legacy_mount = env_or("LEGACY_MCP_MOUNT", Self::default_legacy_mount());
        let server_url = std::env::var("MCP_SERVER_URL").ok();

        let client_meta = ClientMetaConfig {
            http_timeout: Duration::from_secs(env_parse(
                "CLIENT_META_HTTP_TIMEOUT",
                ClientMetaConfig::default().http_timeout.as_secs(),
            )?),
            max_bytes: env_parse("CLIENT_META_MAX_BYTES", ClientMetaConfig::default().max_bytes as u64)?
                as usize,
            default_ttl: Duration::from_secs(env_parse(
                "CLIENT_META_DEFAULT_TTL",
                ClientMetaConfig::default().default_ttl.as_secs(),
            )?),
            min_ttl: Duration::from_secs(env_parse(
                "CLIENT_META_MIN_TTL",
                ClientMetaConfig::default().min_ttl.as_secs(),
            )?),
            max_ttl: Duration::from_secs(env_parse(
                "CLIENT_META_MAX_TTL",
                ClientMetaConfig::default().max_ttl.as_secs(),
            )?),
        };

        let storage_dir = std::env::var("OAUTH_TOKEN_STORAGE_DIR").ok();
        let storage_encryption_key = std::env::var("OAUTH_STORAGE_ENCRYPTION_KEY").ok();
        let upstream_credential_env_var =
            env_or("UPSTREAM_CREDENTIAL_ENV_VAR", "EODHD_API_KEY");
        let upstream_api_base = env_or("UPSTREAM_API_BASE", Self::default_upstream_api_base());
        let upstream_api_timeout =
            Duration::from_secs(env_parse("UPSTREAM_API_TIMEOUT_SECS", 30)?);
        let identity_verify_timeout =
            Duration::from_secs(env_parse("IDENTITY_VERIFY_TIMEOUT_SECS", 10)?);
        let bind_addr = env_or(
            "FINGATE_BIND_ADDR",
            Self::default_bind_addr(),
        );
        let log_format = match env_or("FINGATE_LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = Self {
            jwt_secret,
            jwt_algorithm,
            access_token_expires,
            auth_code_expires,
            session_secret,
            default_scope,
            oauth_resource_path,
            legacy_mount,
            server_url,
            client_meta,
            storage_dir,
            storage_encryption_key,
            upstream_credential_env_var,
            upstream_api_base,
            upstream_api_timeout,
            identity_verify_timeout,
            bind_addr,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if !self.oauth_resource_path.starts_with('/') {
            return Err(GatewayError::config(
                "MCP_OAUTH_RESOURCE_PATH must be an absolute path",
            ));
        }
        if self.oauth_resource_path == self.legacy_mount {
            return Err(GatewayError::config(
                "MCP_OAUTH_RESOURCE_PATH must not collide with the legacy mount",
            ));
        }
        if self.client_meta.min_ttl > self.client_meta.max_ttl {
            return Err(GatewayError::config(
                "CLIENT_META_MIN_TTL must not exceed CLIENT_META_MAX_TTL",
            ));
        }
        Ok(())
    }

    pub fn config_name(&self) -> &'static str {
        "AppConfig"
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse(key: &str, default: u64) -> GatewayResult<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| GatewayError::config(format!("{key} must be a non-negative integer"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_fingate_env() {
        for key in [
            "JWT_SECRET",
            "MCP_OAUTH_RESOURCE_PATH",
            "LEGACY_MCP_MOUNT",
            "ACCESS_TOKEN_EXPIRES",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_jwt_secret_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_fingate_env();
        let result = AppConfig::from_env();
        assert!(matches!(result, Err(GatewayError::MissingEnv(_))));
    }

    #[test]
    fn resource_path_collision_with_legacy_mount_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_fingate_env();
        std::env::set_var("JWT_SECRET", "test-secret");
        std::env::set_var("MCP_OAUTH_RESOURCE_PATH", "/v1/mcp");
        std::env::set_var("LEGACY_MCP_MOUNT", "/v1/mcp");
        let result = AppConfig::from_env();
        assert!(result.is_err());
        clear_fingate_env();
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_fingate_env();
        std::env::set_var("JWT_SECRET", "test-secret");
        let config = AppConfig::from_env().expect("should load with only JWT_SECRET set");
        assert_eq!(config.oauth_resource_path, "/v2/mcp");
        assert_eq!(config.default_scope, "full-access");
        assert_eq!(config.access_token_expires, Duration::from_secs(3600));
        clear_fingate_env();
    }
}
