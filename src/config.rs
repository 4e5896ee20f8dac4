use crate::auth::AuthConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub auth: AuthConfig,
    /// Redis URL of the key-value store. `None` selects the in-process store.
    pub store_url: Option<String>,
    pub score_cache_ttl: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            auth: AuthConfig {
                salt: required_secret("SALT")?,
                admin_login: std::env::var("ADMIN_LOGIN")
                    .unwrap_or_else(|_| "admin".to_string())
                    .trim()
                    .to_string(),
                admin_salt: required_secret("ADMIN_SALT")?,
            },
            store_url: std::env::var("STORE_URL")
                .or_else(|_| std::env::var("REDIS_URL"))
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| validate_store_url(&url).map(|_| url))
                .transpose()?,
            score_cache_ttl: Duration::from_secs(positive_number("SCORE_CACHE_TTL_SECS", 3600)?),
            max_body_bytes: positive_number("MAX_BODY_BYTES", 1024 * 1024)? as usize,
        };

        if config.auth.admin_login.is_empty() {
            anyhow::bail!("ADMIN_LOGIN cannot be empty");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Admin login: {}", config.auth.admin_login);
        match config.store_url {
            Some(ref url) => tracing::info!("Key-value store configured: {}", redact_url(url)),
            None => tracing::info!("No STORE_URL set, using in-process store"),
        }
        tracing::debug!("Score cache TTL: {:?}", config.score_cache_ttl);

        Ok(config)
    }
}

fn required_secret(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn positive_number(name: &str, default: u64) -> anyhow::Result<u64> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => anyhow::bail!("{} must be a positive integer", name),
    }
}

/// Accepts `redis://` and `rediss://` URLs with a host.
pub fn validate_store_url(raw: &str) -> anyhow::Result<url::Url> {
    let url = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("STORE_URL is invalid: {}", e))?;
    if url.scheme() != "redis" && url.scheme() != "rediss" {
        anyhow::bail!("STORE_URL must start with redis:// or rediss://");
    }
    if url.host_str().map_or(true, str::is_empty) {
        anyhow::bail!("STORE_URL must include a host");
    }
    Ok(url)
}

/// Strips credentials before a store URL is logged.
fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            let _ = url.set_password(None);
            let _ = url.set_username("");
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
