//! Test context for unified test setup
//!
//! Wires a `ServiceFactory` to an in-memory store, optionally pointing the
//! callable functions client at a wiremock server.

use std::sync::Arc;

use idmc_registration::config::Settings;
use idmc_registration::database::{DatabaseService, MemoryStore};
use idmc_registration::models::{Registration, RegistrationStatus};
use idmc_registration::services::ServiceFactory;
use tempfile::TempDir;

use super::functions_mock::FunctionsMockServer;
use super::test_data::{create_group_request, TEST_ADMIN};

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub settings: Settings,
    pub services: ServiceFactory,
    pub functions: Option<FunctionsMockServer>,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(Settings::default(), None)
    }

    pub async fn with_settings(settings: Settings) -> Self {
        Self::build(settings, None)
    }

    /// Context whose functions client talks to a fresh mock server
    pub async fn with_functions_mock() -> Self {
        let mock = FunctionsMockServer::new().await;
        let mut settings = Settings::default();
        settings.functions.base_url = mock.base_url();
        settings.functions.timeout_seconds = 5;
        Self::build(settings, Some(mock))
    }

    /// Context over caller-assembled stores; `store` should back whatever
    /// `database` does not override
    pub async fn with_database(store: Arc<MemoryStore>, database: DatabaseService) -> Self {
        Self::assemble(Settings::default(), store, database, None)
    }

    fn build(settings: Settings, functions: Option<FunctionsMockServer>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let database = DatabaseService::from_memory(store.clone());
        Self::assemble(settings, store, database, functions)
    }

    fn assemble(
        mut settings: Settings,
        store: Arc<MemoryStore>,
        database: DatabaseService,
        functions: Option<FunctionsMockServer>,
    ) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        settings.logging.file_path = temp_dir.path().to_string_lossy().to_string();
        settings.features.stats_cache = false;

        let services = ServiceFactory::new(&settings, database)
            .expect("Failed to build services");

        Self { store, settings, services, functions, temp_dir }
    }

    /// Register through the service and confirm, returning the stored document
    pub async fn create_confirmed_registration(&self, email: &str, companions: usize) -> Registration {
        let created = self
            .services
            .registration_service
            .create_registration(create_group_request(email, companions))
            .await
            .expect("Failed to create registration");

        self.services
            .registration_service
            .update_status(&created.id, RegistrationStatus::Confirmed, TEST_ADMIN)
            .await
            .expect("Failed to confirm registration")
    }
}
