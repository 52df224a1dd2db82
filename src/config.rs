//! Configuration management for Biblion server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::models::user::Role;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    /// Name and card number of the seeded administrator account
    pub admin_name: String,
    pub admin_card: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Loan policy for one member role
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LoanPolicy {
    pub loan_period_days: i64,
    pub renewal_period_days: i64,
    pub max_renewals: u32,
    pub max_loans: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CirculationConfig {
    pub sweep_interval_secs: u64,
    pub member: LoanPolicy,
    pub staff: LoanPolicy,
    pub admin: LoanPolicy,
}

impl CirculationConfig {
    /// Loan policy for a role. Policies are configuration, not invariants.
    pub fn policy(&self, role: Role) -> LoanPolicy {
        match role {
            Role::Member => self.member,
            Role::Staff => self.staff,
            Role::Admin => self.admin,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub circulation: CirculationConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BIBLION_)
            .add_source(
                Environment::with_prefix("BIBLION")
                    .separator("_")
                    .try_parsing(true),
            )
            // Override JWT secret from JWT_SECRET env var if present
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
            jwt_expiration_hours: 24,
            admin_name: "Administrator".to_string(),
            admin_card: "ADMIN-0001".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            renewal_period_days: 7,
            max_renewals: 2,
            max_loans: 5,
        }
    }
}

impl Default for CirculationConfig {
    fn default() -> Self {
        let staff = LoanPolicy {
            loan_period_days: 28,
            renewal_period_days: 14,
            max_renewals: 3,
            max_loans: 10,
        };
        Self {
            sweep_interval_secs: 120,
            member: LoanPolicy::default(),
            staff,
            admin: staff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policies_differ_by_role() {
        let config = CirculationConfig::default();
        assert_eq!(config.policy(Role::Member).loan_period_days, 14);
        assert_eq!(config.policy(Role::Staff).loan_period_days, 28);
        assert_eq!(
            config.policy(Role::Admin).max_loans,
            config.policy(Role::Staff).max_loans
        );
    }
}
