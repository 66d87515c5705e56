//! Structured concept generation through the Responses API.
//!
//! The request carries a strict JSON Schema, so the model's text output is itself a JSON document.
//! A refusal or an unparseable document is reported with whatever text the model produced.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::openai::OpenAiClient;
use super::{ConceptBrief, ConceptGenerator, prompt};
use crate::config::GenerationMode;
use crate::errors::{Error, Result, snippet};

const RESPONSES_PATH: &str = "responses";

pub struct StructuredGenerator {
    client: OpenAiClient,
    model: String,
    region: String,
}

impl StructuredGenerator {
    pub fn new(client: OpenAiClient, model: String, region: String) -> Self {
        Self { client, model, region }
    }
}

/// The slice of a Responses API payload that carries model output
#[derive(Debug, Deserialize)]
struct ResponsesPayload {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

enum ModelOutput {
    Text(String),
    Refusal(String),
    Missing,
}

/// Joins every `output_text` part in order. A refusal only counts when there is no text.
fn collect_output(payload: &ResponsesPayload) -> ModelOutput {
    let mut text: Option<String> = None;
    let mut refusal: Option<String> = None;

    for part in payload.output.iter().flat_map(|item| item.content.iter()) {
        match part.kind.as_str() {
            "output_text" => {
                if let Some(chunk) = &part.text {
                    text.get_or_insert_with(String::new).push_str(chunk);
                }
            }
            "refusal" => {
                refusal.get_or_insert_with(|| part.refusal.clone().unwrap_or_default());
            }
            _ => {}
        }
    }

    match (text, refusal) {
        (Some(text), _) => ModelOutput::Text(text),
        (None, Some(reason)) => ModelOutput::Refusal(reason),
        (None, None) => ModelOutput::Missing,
    }
}

/// Pull the concept document out of a raw Responses API payload.
pub fn extract_concept(response: &Value) -> Result<Value> {
    let payload = ResponsesPayload::deserialize(response).map_err(|e| Error::InvalidUpstreamBody {
        message: format!("Unexpected Responses API payload: {e}"),
        raw: Some(snippet(&response.to_string())),
    })?;

    let text = match collect_output(&payload) {
        ModelOutput::Text(text) => text,
        ModelOutput::Refusal(reason) => {
            return Err(Error::InvalidUpstreamBody {
                message: "Model refused to produce a concept".to_string(),
                raw: Some(snippet(&reason)),
            });
        }
        ModelOutput::Missing => {
            return Err(Error::InvalidUpstreamBody {
                message: "Model returned no output text".to_string(),
                raw: Some(snippet(&response.to_string())),
            });
        }
    };

    if text.trim().is_empty() {
        return Err(Error::InvalidUpstreamBody {
            message: "Model returned empty output text".to_string(),
            raw: Some(String::new()),
        });
    }

    serde_json::from_str(&text).map_err(|e| Error::InvalidUpstreamBody {
        message: format!("Model output was not valid JSON: {e}"),
        raw: Some(snippet(&text)),
    })
}

#[async_trait]
impl ConceptGenerator for StructuredGenerator {
    fn mode(&self) -> GenerationMode {
        GenerationMode::Structured
    }

    #[instrument(skip(self, brief), fields(model = %self.model, tier = %brief.tier))]
    async fn generate(&self, brief: &ConceptBrief) -> Result<Value> {
        let body = prompt::responses_request(&self.model, &self.region, brief);
        let response = self.client.post_json(RESPONSES_PATH, &body).await?;
        let concept = extract_concept(&response)?;
        debug!("Structured concept generated");
        Ok(concept)
    }
}
