//! Prompt and schema construction for structured concept generation.

use serde_json::{Value, json};

use super::ConceptBrief;

/// Name of the JSON schema sent with structured requests
pub const CONCEPT_SCHEMA_NAME: &str = "landscape_concept";

pub fn system_prompt(region: &str) -> String {
    format!(
        "You are a professional regenerative landscape designer in {region}. \
         Be practical, cost-aware, and implementation-oriented."
    )
}

pub fn user_prompt(brief: &ConceptBrief) -> String {
    let notes = if brief.notes.trim().is_empty() {
        "(none)"
    } else {
        brief.notes.trim()
    };

    let mut prompt = format!(
        "Create a landscape concept for:\n\
         Address: {}\n\
         Budget: ${} ({})\n\
         Goals/Notes: {}\n\n\
         Keep the estimate within reach of the budget. Recommend exactly 5 features, a 3-phase plan, \
         and a plant palette of 8-12 species suited to the local climate.",
        brief.address,
        format_budget(brief.budget),
        brief.tier,
        notes,
    );

    if brief.photo_data_url.is_some() {
        prompt.push_str("\nA photo of the current site is attached; base the concept on what it shows.");
    }

    prompt
}

/// Whole dollars print without a fractional part.
fn format_budget(budget: f64) -> String {
    if budget.fract() == 0.0 {
        format!("{budget:.0}")
    } else {
        format!("{budget:.2}")
    }
}

/// JSON Schema the upstream model output must satisfy
pub fn concept_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "design_summary",
            "recommended_features",
            "phased_plan",
            "plant_palette",
            "irrigation_strategy",
            "estimated_low",
            "estimated_high"
        ],
        "properties": {
            "design_summary": { "type": "string" },
            "recommended_features": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 5,
                "maxItems": 5
            },
            "phased_plan": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 3,
                "maxItems": 3
            },
            "plant_palette": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 8,
                "maxItems": 12
            },
            "irrigation_strategy": { "type": "string" },
            "estimated_low": { "type": "number" },
            "estimated_high": { "type": "number" }
        }
    })
}

/// Body for `POST /responses`
pub fn responses_request(model: &str, region: &str, brief: &ConceptBrief) -> Value {
    let mut user_content = vec![json!({ "type": "input_text", "text": user_prompt(brief) })];
    if let Some(data_url) = &brief.photo_data_url {
        user_content.push(json!({ "type": "input_image", "image_url": data_url }));
    }

    json!({
        "model": model,
        "input": [
            { "role": "system", "content": system_prompt(region) },
            { "role": "user", "content": user_content }
        ],
        "text": {
            "format": {
                "type": "json_schema",
                "name": CONCEPT_SCHEMA_NAME,
                "strict": true,
                "schema": concept_schema()
            }
        }
    })
}
