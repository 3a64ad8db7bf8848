use std::env;

use auth::CostLimits;
use auth::HashingParams;
use auth::PasswordError;
use auth::PasswordHasher;
use auth::PasswordPolicy;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub hashing: HashingParams,
    pub password_policy: PasswordPolicy,
    /// Ceiling on stored-hash costs; derived from `hashing` when absent
    pub cost_limits: Option<CostLimits>,
    pub service: ServiceConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Allow soft-deleted credentials to be restored. Off by default so that
    /// deletion is final unless an operator opts into account recovery.
    pub allow_reactivate_deleted: bool,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CREDENTIAL__HASHING__MEMORY_KIB, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: CREDENTIAL__HASHING__ITERATIONS=4 overrides hashing.iterations
            .add_source(
                Environment::with_prefix("CREDENTIAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }

    /// Load configuration from a TOML document only.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Build the password hasher described by the `hashing`,
    /// `password_policy` and `cost_limits` sections.
    ///
    /// # Errors
    /// * `InvalidParams` - Argon2 cannot run with the configured parameters,
    ///   or the limits are below them
    pub fn password_hasher(&self) -> Result<PasswordHasher, PasswordError> {
        let hasher = PasswordHasher::with_config(self.hashing, self.password_policy)?;
        match self.cost_limits {
            Some(limits) => hasher.with_limits(limits),
            None => Ok(hasher),
        }
    }
}
