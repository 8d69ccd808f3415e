//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use atm_types::{CashPolicy, DenominationSet, DispenseStrategy, RegisterRequest};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Administrator created at start-up when no account holds its mobile number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub pin: String,
}

impl From<AdminSeed> for RegisterRequest {
    fn from(seed: AdminSeed) -> Self {
        RegisterRequest {
            name: seed.name,
            email: seed.email,
            mobile: seed.mobile,
            pin: seed.pin,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub policy: CashPolicy,
    pub login_attempts: u32,
    pub admin: Option<AdminSeed>,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid PORT: {e}"))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let denominations: DenominationSet = match lookup("ATM_DENOMINATIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid ATM_DENOMINATIONS: {e}"))?,
            None => DenominationSet::default(),
        };
        let strategy: DispenseStrategy = match lookup("ATM_DISPENSE_STRATEGY") {
            Some(raw) => raw.parse()?,
            None => DispenseStrategy::default(),
        };

        let login_attempts: u32 = match lookup("LOGIN_ATTEMPTS_PER_MINUTE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid LOGIN_ATTEMPTS_PER_MINUTE: {e}"))?,
            None => 5,
        };

        let admin = match (lookup("ATM_ADMIN_MOBILE"), lookup("ATM_ADMIN_PIN")) {
            (Some(mobile), Some(pin)) => Some(AdminSeed {
                name: lookup("ATM_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                email: lookup("ATM_ADMIN_EMAIL").unwrap_or_else(|| "admin@atm.local".into()),
                mobile,
                pin,
            }),
            (None, None) => None,
            _ => anyhow::bail!("ATM_ADMIN_MOBILE and ATM_ADMIN_PIN must be set together"),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => anyhow::bail!("Unknown LOG_FORMAT: {other}. Supported: pretty, json"),
        };

        Ok(Self {
            port,
            database_url,
            policy: CashPolicy {
                denominations,
                strategy,
            },
            login_attempts,
            admin,
            log_format,
        })
    }

    /// Window over which `login_attempts` are counted.
    pub fn login_window(&self) -> Duration {
        Duration::from_secs(60)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "memory://")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.policy, CashPolicy::default());
        assert_eq!(config.policy.strategy, DispenseStrategy::Exact);
        assert_eq!(config.login_attempts, 5);
        assert!(config.admin.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_database_url_required() {
        assert!(load(&[]).is_err());
    }

    #[test]
    fn test_cash_policy_parsed() {
        let config = load(&[
            ("DATABASE_URL", "memory://"),
            ("ATM_DENOMINATIONS", "100, 500,2000"),
            ("ATM_DISPENSE_STRATEGY", "greedy"),
        ])
        .unwrap();

        assert_eq!(config.policy.denominations.to_string(), "100,500,2000");
        assert_eq!(config.policy.strategy, DispenseStrategy::Greedy);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ("ATM_DENOMINATIONS", "100,abc"),
            ("ATM_DISPENSE_STRATEGY", "random"),
            ("PORT", "http"),
            ("LOG_FORMAT", "xml"),
        ];
        for (key, value) in cases {
            let result = load(&[("DATABASE_URL", "memory://"), (key, value)]);
            assert!(result.is_err(), "{key}={value} should be rejected");
        }
    }

    #[test]
    fn test_admin_seed() {
        let config = load(&[
            ("DATABASE_URL", "memory://"),
            ("ATM_ADMIN_MOBILE", "9000000000"),
            ("ATM_ADMIN_PIN", "0000"),
        ])
        .unwrap();

        let seed = config.admin.unwrap();
        assert_eq!(seed.mobile, "9000000000");
        assert_eq!(seed.name, "Administrator");

        let partial = load(&[("DATABASE_URL", "memory://"), ("ATM_ADMIN_PIN", "0000")]);
        assert!(partial.is_err());
    }
}
