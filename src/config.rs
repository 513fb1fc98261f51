use std::{env, str::FromStr};
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    /// Base URL of the fal runner, workflows are streamed from `{run_url}/{workflow}/stream`.
    pub fal_run_url: Url,
    /// Base URL of the fal REST api, used for storage uploads.
    pub fal_rest_url: Url,
    pub max_body_bytes: usize,
}

trait FromEnvWithDefault: Sized {
    fn from_env_or_default(key: &str, default: Self) -> Self;
}

impl FromEnvWithDefault for u16 {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key)
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(default)
    }
}

impl FromEnvWithDefault for usize {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key)
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(default)
    }
}

impl FromEnvWithDefault for String {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key).unwrap_or(default)
    }
}

impl FromEnvWithDefault for Url {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key)
            .ok()
            .and_then(|val| Url::from_str(&val).ok())
            .unwrap_or(default)
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|e| panic!("invalid built-in url {}: {}", raw, e))
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: String::from_env_or_default("HOST", "0.0.0.0".into()),
            port: u16::from_env_or_default("PORT", 8080),
            env: String::from_env_or_default("ENV", "dev".into()),
            fal_run_url: Url::from_env_or_default("FAL__RUN_URL", default_url("https://fal.run")),
            fal_rest_url: Url::from_env_or_default(
                "FAL__REST_URL",
                default_url("https://rest.alpha.fal.ai"),
            ),
            max_body_bytes: usize::from_env_or_default(
                "UPLOAD__MAX_BODY_BYTES",
                1024 * 1024 * 64,
            ),
        }
    }

    /// Development environment, where the api is opened to other origins.
    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}
