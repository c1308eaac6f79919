use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::application::policy::{OrderPolicy, PricePolicy, StatusPolicy};
use crate::auth::token::DEFAULT_TOKEN_TTL_DAYS;

const DEV_JWT_SECRET: &str = "shop-development-secret-change-me";

#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub upload_dir: PathBuf,
    pub order_policy: OrderPolicy,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = get("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let database_url = get("DATABASE_URL").filter(|u| !u.trim().is_empty());

        let jwt_secret = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            None => anyhow::bail!("JWT_SECRET must be set"),
        };

        let token_ttl_days = match get("TOKEN_TTL_DAYS") {
            Some(v) => v
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_DAYS {v:?}: {e}"))?,
            None => DEFAULT_TOKEN_TTL_DAYS,
        };
        if token_ttl_days <= 0 {
            anyhow::bail!("TOKEN_TTL_DAYS must be positive");
        }

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()));

        let price = match get("PRICE_POLICY") {
            Some(v) => v.parse::<PricePolicy>()?,
            None => PricePolicy::default(),
        };
        let status = match get("STATUS_POLICY") {
            Some(v) => v.parse::<StatusPolicy>()?,
            None => StatusPolicy::default(),
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")
            }
            _ => None,
        };

        Ok(Self {
            server_port,
            database_url,
            jwt_secret,
            token_ttl_days,
            upload_dir,
            order_policy: OrderPolicy { price, status },
            admin,
        })
    }
}
