//! Shared fixtures for handler and router tests.

use axum_test::TestServer;
use std::time::Duration;
use wiremock::MockServer;

use crate::config::{Config, GenerationMode};

/// Demo-mode config with no delay, no key, bound to an ephemeral port
pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.generator.mode = GenerationMode::Demo;
    config.generator.demo_delay = Duration::ZERO;
    config.openai.api_key = None;
    config
}

/// Config pointing the upstream client at a mock server's `/v1`
pub fn upstream_config(upstream: &MockServer, mode: GenerationMode) -> Config {
    let mut config = create_test_config();
    config.generator.mode = mode;
    config.openai.api_key = Some("sk-test".to_string());
    config.openai.base_url = format!("{}/v1", upstream.uri()).parse().expect("mock server URI is a valid URL");
    config
}

pub fn create_test_server(config: Config) -> TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}
