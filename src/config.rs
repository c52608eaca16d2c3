use std::{collections::HashMap, str::FromStr};

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::Region;
use tracing::{debug, info};

/// Every key the service reads. Used to pull missing values from the
/// parameter store.
pub const CONFIG_KEYS: &[&str] = &[
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "DATABASE_CONNECT_TIMEOUT_SECS",
    "JWT_SECRET",
    "JWT_ISSUER",
    "JWT_AUDIENCE",
    "JWT_TTL_MINUTES",
    "AWS_REGION",
    "S3_BUCKET",
    "S3_ENDPOINT",
    "S3_ACCESS_KEY",
    "S3_SECRET_KEY",
    "MAIL_SENDER",
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    "OPENAI_BASE_URL",
    "LLM_TIMEOUT_SECS",
    "APP_HOST",
    "APP_PORT",
];

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    /// Custom endpoint (MinIO, localstack). `None` means regular AWS.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub llm: LlmConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Environment first, then the SSM parameter store under
    /// `PARAMETER_STORE_PREFIX` for keys the environment does not set.
    pub async fn load() -> anyhow::Result<Self> {
        let Some(prefix) = env_value("PARAMETER_STORE_PREFIX") else {
            return Self::from_env();
        };

        let region = env_value("AWS_REGION").unwrap_or_else(|| "us-east-1".into());
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;
        let ssm = aws_sdk_ssm::Client::new(&shared);

        let mut remote = HashMap::new();
        for key in CONFIG_KEYS.iter().filter(|k| env_value(k).is_none()) {
            if let Some(value) = fetch_parameter(&ssm, &prefix, key).await? {
                debug!(key, "config value loaded from parameter store");
                remote.insert((*key).to_string(), value);
            }
        }
        info!(prefix = %prefix, loaded = remote.len(), "parameter store overlay applied");

        Self::from_lookup(|key| env_value(key).or_else(|| remote.get(key).cloned()))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(env_value)
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            get(key).with_context(|| format!("required config value '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            connect_timeout_secs: parse_or(&get, "DATABASE_CONNECT_TIMEOUT_SECS", 10)?,
        };
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: or_default("JWT_ISSUER", "resume-service"),
            audience: or_default("JWT_AUDIENCE", "resume-service-users"),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60 * 24)?,
        };
        let storage = StorageConfig {
            region: or_default("AWS_REGION", "us-east-1"),
            bucket: or_default("S3_BUCKET", "resume-service-filestore"),
            endpoint: get("S3_ENDPOINT"),
            access_key: get("S3_ACCESS_KEY"),
            secret_key: get("S3_SECRET_KEY"),
        };
        let mail = MailConfig {
            sender: required("MAIL_SENDER")?,
        };
        let llm = LlmConfig {
            api_key: required("OPENAI_API_KEY")?,
            model: or_default("OPENAI_MODEL", "gpt-3.5-turbo"),
            base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            timeout_secs: parse_or(&get, "LLM_TIMEOUT_SECS", 120)?,
        };

        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");

        Ok(Self {
            database,
            jwt,
            storage,
            mail,
            llm,
            host: or_default("APP_HOST", "0.0.0.0"),
            port: parse_or(&get, "APP_PORT", 8080)?,
        })
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("config value '{key}' is not valid: {raw:?}")),
        None => Ok(default),
    }
}

async fn fetch_parameter(
    ssm: &aws_sdk_ssm::Client,
    prefix: &str,
    key: &str,
) -> anyhow::Result<Option<String>> {
    let name = format!("{}/{}", prefix.trim_end_matches('/'), key);
    match ssm.get_parameter().name(&name).with_decryption(true).send().await {
        Ok(out) => Ok(out
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)),
        Err(e) => {
            let err = e.into_service_error();
            if err.is_parameter_not_found() {
                Ok(None)
            } else {
                Err(anyhow::Error::new(err).context(format!("ssm get_parameter {name}")))
            }
        }
    }
}
