//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `LANDGEN_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **OPENAI_API_KEY** - Special case: sets `openai.api_key` if present
//! 3. **Environment variables** - Variables prefixed with `LANDGEN_` override everything above
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `LANDGEN_GENERATOR__MODE=demo` sets the `generator.mode` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! LANDGEN_PORT=8080
//!
//! # Upstream credential (preferred method)
//! OPENAI_API_KEY="sk-..."
//!
//! # Run without any upstream calls
//! LANDGEN_GENERATOR__MODE=demo
//! LANDGEN_GENERATOR__DEMO_DELAY=250ms
//! ```
//!
//! The API key is deliberately optional here. A server without one still starts, and every
//! generation request that needs the upstream fails with a 500 until one is configured.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "LANDGEN_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Upstream provider connection settings
    pub openai: OpenAiConfig,
    /// Which generation strategy backs `POST /api/generate`
    pub generator: GeneratorConfig,
    /// Settings rendered into the client form page
    pub form: FormConfig,
    /// CORS configuration for browser clients on other origins
    pub cors: CorsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Upstream (OpenAI-compatible) API settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Bearer credential for the upstream API. Usually supplied via `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`
    pub base_url: Url,
    /// Model used for structured concept generation
    pub model: String,
    /// Model used for image generation and edits
    pub image_model: String,
    /// Optional per-request timeout for upstream calls. Unset means wait indefinitely.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Generation strategy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// JSON-Schema constrained text generation via the Responses API
    #[default]
    Structured,
    /// Offline, deterministic concept synthesized from the budget tier
    Demo,
    /// Image generation (or edit, when a photo is supplied)
    Image,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Structured => "structured",
            GenerationMode::Demo => "demo",
            GenerationMode::Image => "image",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub mode: GenerationMode,
    /// Region the designer persona works in; embedded in the system prompt
    pub region: String,
    /// Artificial latency for demo mode
    #[serde(with = "humantime_serde")]
    pub demo_delay: Duration,
}

/// Budget slider and page settings for the client form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    /// Page title shown in the browser tab and heading
    pub title: String,
    pub min_budget: u32,
    pub max_budget: u32,
    pub budget_step: u32,
    pub default_budget: u32,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests. Empty means same-origin only.
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted request body in bytes. Photos travel as base64 data URLs, so this
    /// needs to be comfortably larger than the largest photo you expect.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            openai: OpenAiConfig::default(),
            generator: GeneratorConfig::default(),
            form: FormConfig::default(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.openai.com/v1").expect("static URL is valid"),
            model: "gpt-4o-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            request_timeout: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            region: "Fort Collins, Colorado".to_string(),
            demo_delay: Duration::from_millis(800),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: "Fort Collins Landscape Design Tool".to_string(),
            min_budget: 1000,
            max_budget: 75000,
            budget_step: 500,
            default_budget: 15000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        let form = &self.form;
        if form.min_budget >= form.max_budget {
            return Err(Error::Configuration {
                message: format!(
                    "Config validation: form.min_budget ({}) must be less than form.max_budget ({})",
                    form.min_budget, form.max_budget
                ),
            });
        }

        if form.budget_step == 0 {
            return Err(Error::Configuration {
                message: "Config validation: form.budget_step must be greater than 0".to_string(),
            });
        }

        if !(form.min_budget..=form.max_budget).contains(&form.default_budget) {
            return Err(Error::Configuration {
                message: format!(
                    "Config validation: form.default_budget ({}) must lie within [{}, {}]",
                    form.default_budget, form.min_budget, form.max_budget
                ),
            });
        }

        if self.limits.max_body_bytes == 0 {
            return Err(Error::Configuration {
                message: "Config validation: limits.max_body_bytes must be greater than 0".to_string(),
            });
        }

        if self.openai.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Configuration {
                message: "Config validation: openai.request_timeout must be greater than 0 when set".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // The conventional provider credential variable
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai.api_key".into()))
            // Prefixed environment variables override everything else
            .merge(Env::prefixed("LANDGEN_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
