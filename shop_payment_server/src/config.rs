use std::{env, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use shop_common::{parse_boolean_flag, Secret};
use shop_payment_engine::{
    gateway::DEFAULT_STRIPE_API_URL,
    AUTH_TOKEN_TTL_HOURS,
    DEFAULT_FRONTEND_URL,
    DEFAULT_RESET_LINK_MINUTES,
};

const DEFAULT_SHOP_HOST: &str = "127.0.0.1";
const DEFAULT_SHOP_PORT: u16 = 4001;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_store.db";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAIL_FROM: &str = "info@widgets.com";
const RANDOM_SECRET_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the database schema is brought up to date before the server starts.
    pub run_migrations: bool,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    /// The sender address of password reset mails
    pub mail_from: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHOP_HOST.to_string(),
            port: DEFAULT_SHOP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SHOP_HOST").ok().unwrap_or_else(|| DEFAULT_SHOP_HOST.into());
        let port = parse_env("SHOP_PORT", DEFAULT_SHOP_PORT);
        let database_url = env::var("SHOP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SHOP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let run_migrations = parse_boolean_flag(env::var("SHOP_RUN_MIGRATIONS").ok(), true);
        let mail_from = env::var("SHOP_MAIL_FROM").ok().unwrap_or_else(|| DEFAULT_MAIL_FROM.into());
        Self {
            host,
            port,
            database_url,
            run_migrations,
            gateway: GatewayConfig::from_env_or_default(),
            auth: AuthConfig::from_env_or_default(),
            mail_from,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default` (loudly, if the value was malformed).
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    env::var(name)
        .map_err(|_| debug!("🪛️ {name} is not set. Using the default value of {default}."))
        .and_then(|s| {
            s.parse::<T>().map_err(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.")
            })
        })
        .unwrap_or(default)
}

//-------------------------------------------------  GatewayConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub api_url: String,
    /// The publishable key. This is not a secret and is handed to the storefront.
    pub key: String,
    pub secret: Secret<String>,
    pub timeout: StdDuration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            key: String::default(),
            secret: Secret::default(),
            timeout: StdDuration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("SHOP_STRIPE_API_URL").ok().unwrap_or_else(|| DEFAULT_STRIPE_API_URL.into());
        let key = env::var("SHOP_STRIPE_KEY").ok().unwrap_or_default();
        let secret = env::var("SHOP_STRIPE_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ SHOP_STRIPE_SECRET is not set. Every call to the payment gateway will be refused.");
            String::default()
        });
        let timeout = StdDuration::from_secs(parse_env("SHOP_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT_SECS));
        Self { api_url, key, secret: Secret::new(secret), timeout }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Signs password reset links and derives the key that encrypts email addresses in the reset flow.
    pub secret_key: Secret<String>,
    pub frontend_url: String,
    pub token_ttl: Duration,
    pub reset_link_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: random_secret(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            token_ttl: Duration::hours(AUTH_TOKEN_TTL_HOURS),
            reset_link_minutes: DEFAULT_RESET_LINK_MINUTES,
        }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let secret_key = match env::var("SHOP_SECRET_KEY") {
            Ok(s) if !s.is_empty() => Secret::new(s),
            _ => random_secret(),
        };
        let frontend_url = env::var("SHOP_FRONTEND_URL").ok().unwrap_or_else(|| DEFAULT_FRONTEND_URL.into());
        let token_ttl = Duration::hours(parse_env("SHOP_TOKEN_TTL_HOURS", AUTH_TOKEN_TTL_HOURS));
        let reset_link_minutes = parse_env("SHOP_RESET_LINK_MINUTES", DEFAULT_RESET_LINK_MINUTES);
        Self { secret_key, frontend_url, token_ttl, reset_link_minutes }
    }
}

fn random_secret() -> Secret<String> {
    warn!(
        "🚨️🚨️🚨️ SHOP_SECRET_KEY has not been set. I'm using a random value for this session. Password reset links \
         will stop working when the server restarts. DO NOT operate on production like this. 🚨️🚨️🚨️"
    );
    let key = thread_rng().sample_iter(&Alphanumeric).take(RANDOM_SECRET_LENGTH).map(char::from).collect::<String>();
    Secret::new(key)
}
