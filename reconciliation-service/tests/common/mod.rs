//! Common test utilities for reconciliation-service integration tests.

use reconciliation_service::config::{LimitsConfig, ReconciliationConfig};
use reconciliation_service::startup::Application;
use service_core::config::Config as CommonConfig;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,reconciliation_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Test configuration on an ephemeral port with a small per-dataset cap.
fn test_config() -> ReconciliationConfig {
    ReconciliationConfig {
        common: CommonConfig { port: 0 },
        service_name: "reconciliation-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        limits: LimitsConfig {
            max_records_per_dataset: 100,
            ..LimitsConfig::default()
        },
    }
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub client: reqwest::Client,
    pub address: String,
    pub http_port: u16,
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Spawn a test application and return an HTTP client pointed at it.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let app = Application::build(test_config())
        .await
        .expect("Failed to build application");

    let http_port = app.http_port();
    let address = format!("http://127.0.0.1:{}", http_port);

    // Start the application in the background
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let client = reqwest::Client::new();

    // Wait for server to be ready with retry
    let mut attempts = 0;
    loop {
        match client.get(format!("{}/health", address)).send().await {
            Ok(response) if response.status().is_success() => break,
            _ if attempts < 20 => {
                attempts += 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }
            _ => panic!("Service did not become healthy after 20 attempts"),
        }
    }

    TestApp {
        client,
        address,
        http_port,
    }
}
