//! Concept generation backends.
//!
//! This module defines the [`ConceptGenerator`] trait which abstracts where a landscape concept
//! comes from: the upstream provider with a JSON-Schema constrained response
//! ([`structured::StructuredGenerator`]) or a deterministic offline stand-in
//! ([`demo::DemoGenerator`]). Image generation takes a different request shape and lives in
//! [`images::ImageGenerator`].
//!
//! Exactly one backend serves `POST /api/generate`. It is chosen from configuration at startup,
//! never from request content.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{Config, GenerationMode};
use crate::errors::Result;

pub mod demo;
pub mod images;
pub mod openai;
pub mod prompt;
pub mod structured;
mod tier;

pub use tier::BudgetTier;

/// A validated concept submission, ready for a generator
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptBrief {
    pub address: String,
    pub budget: f64,
    pub tier: BudgetTier,
    pub notes: String,
    /// Site photo as a `data:image/...` URL, when one was uploaded
    pub photo_data_url: Option<String>,
}

/// Abstract concept generator
///
/// Implementations turn a brief into a provider-defined JSON concept. They hold no per-request
/// state; the same instance serves every request.
#[async_trait]
pub trait ConceptGenerator: Send + Sync {
    fn mode(&self) -> GenerationMode;

    /// Produce a concept for the brief.
    ///
    /// Returns the concept object only; the caller adds the response id and the echoed fields.
    async fn generate(&self, brief: &ConceptBrief) -> Result<Value>;
}

/// The backend wired to `POST /api/generate`
#[derive(Clone)]
pub enum Backend {
    Concepts(Arc<dyn ConceptGenerator>),
    Images(Arc<images::ImageGenerator>),
}

impl Backend {
    pub fn mode(&self) -> GenerationMode {
        match self {
            Backend::Concepts(generator) => generator.mode(),
            Backend::Images(_) => GenerationMode::Image,
        }
    }
}

/// Create the generation backend from configuration
///
/// This is the single point where config is turned into a backend. The HTTP client is built once
/// by the caller and shared by whichever backend needs it.
pub fn create_backend(config: &Config, http: reqwest::Client) -> Backend {
    match config.generator.mode {
        GenerationMode::Structured => Backend::Concepts(Arc::new(structured::StructuredGenerator::new(
            openai::OpenAiClient::new(http, &config.openai),
            config.openai.model.clone(),
            config.generator.region.clone(),
        ))),
        GenerationMode::Demo => Backend::Concepts(Arc::new(demo::DemoGenerator::new(config.generator.demo_delay))),
        GenerationMode::Image => Backend::Images(Arc::new(images::ImageGenerator::new(
            openai::OpenAiClient::new(http, &config.openai),
            config.openai.image_model.clone(),
        ))),
    }
}
