use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub sink: SinkConfig,
    pub retry_interval: Duration,
    pub delivery_timeout: Duration,
    pub max_body_size: usize,
    pub allowed_origins: Vec<String>,
    pub trusted_proxies: Vec<IpNet>,
    pub honeypot_field: Option<String>,
    pub rate_limit: u32,
    pub rate_limit_window: Duration,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub url: String,
    pub api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let sink = SinkConfig {
            url: env_required("FORMRELAY_SINK_URL")?,
            api_key: env_required("FORMRELAY_SINK_API_KEY")?,
        };

        let host: IpAddr = env_or("FORMRELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_HOST: {e}"))?;

        let port: u16 = env_or("FORMRELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_PORT: {e}"))?;

        let data_dir = PathBuf::from(env_or("FORMRELAY_DATA_DIR", "./data"));

        let retry_interval = env_secs("FORMRELAY_RETRY_INTERVAL_SECS", "30")?;
        let delivery_timeout = env_secs("FORMRELAY_DELIVERY_TIMEOUT_SECS", "10")?;

        let max_body_size: usize = env_or("FORMRELAY_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_MAX_BODY_SIZE: {e}"))?;

        let allowed_origins: Vec<String> = env_or("FORMRELAY_ALLOWED_ORIGINS", "")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        let trusted_proxies: Vec<IpNet> = env_or("FORMRELAY_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMRELAY_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let honeypot_field = Some(env_or("FORMRELAY_HONEYPOT_FIELD", "website"))
            .filter(|s| !s.trim().is_empty());

        let rate_limit: u32 = env_or("FORMRELAY_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RATE_LIMIT: {e}"))?;
        let rate_limit_window = env_secs("FORMRELAY_RATE_LIMIT_WINDOW_SECS", "60")?;

        let log_level = env_or("FORMRELAY_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            data_dir,
            sink,
            retry_interval,
            delivery_timeout,
            max_body_size,
            allowed_origins,
            trusted_proxies,
            honeypot_field,
            rate_limit,
            rate_limit_window,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: &str) -> Result<Duration, String> {
    let secs: u64 = env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))?;
    if secs == 0 {
        return Err(format!("Invalid {key}: must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
