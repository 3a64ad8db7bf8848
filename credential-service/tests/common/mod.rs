use std::sync::Arc;

use auth::PasswordHasher;
use credential_service::config::Config;
use credential_service::credential::models::EmailAddress;
use credential_service::credential::service::CredentialService;
use credential_service::repositories::InMemoryCredentialRepository;

/// Test application wiring the service to an in-memory store
pub struct TestApp {
    pub config: Config,
    pub repository: Arc<InMemoryCredentialRepository>,
    pub service: CredentialService<InMemoryCredentialRepository>,
}

impl TestApp {
    /// Build the service with cheap hashing parameters from config/test.toml
    pub fn spawn() -> Self {
        Self::with_config(Self::test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let repository = Arc::new(InMemoryCredentialRepository::new());
        let hasher = config
            .password_hasher()
            .expect("Failed to build password hasher");
        let service = CredentialService::new(Arc::clone(&repository), hasher, config.service);

        Self {
            config,
            repository,
            service,
        }
    }

    pub fn test_config() -> Config {
        Config::from_toml(include_str!("../../config/test.toml"))
            .expect("Failed to load test configuration")
    }

    /// Hasher with the same settings the service uses
    pub fn hasher(&self) -> PasswordHasher {
        self.config
            .password_hasher()
            .expect("Failed to build password hasher")
    }
}

pub fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address.to_string()).expect("Invalid test email")
}
