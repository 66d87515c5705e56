//! The generation proxy: one route, one upstream, chosen by configuration.

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::{
        concepts::{ConceptRequest, ConceptResponse},
        errors::ErrorBody,
        images::ImageRequest,
    },
    errors::{Error, Result},
    generation::{Backend, ConceptGenerator, images::ImageGenerator},
    metrics,
};

/// Generate a landscape concept
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generation",
    summary = "Generate a landscape concept",
    description = "Validates the submission and forwards it to the configured generation backend.

In `structured` and `demo` mode the body is a `ConceptRequest` and the response a `ConceptResponse`. \
In `image` mode the body is an `ImageRequest` and the response is the upstream image payload with \
`id`, `operation` and `imageBase64` added.

Upstream failures keep the upstream status when it is an error status and include a truncated copy \
of the upstream body as `raw`.",
    request_body(content = ConceptRequest, description = "Concept form submission (an `ImageRequest` in image mode)"),
    responses(
        (status = 200, description = "Concept generated", body = ConceptResponse),
        (status = 400, description = "Malformed body, blank address, bad budget, or a non-image photo", body = ErrorBody),
        (status = 413, description = "Body larger than `limits.max_body_bytes`", body = ErrorBody),
        (status = 500, description = "Missing API key, unreachable upstream, or an unusable upstream payload", body = ErrorBody),
        (status = 502, description = "Upstream answered with a non-error, non-success status", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let mode = state.backend.mode();
    let started = Instant::now();

    // Body limit and read failures still answer with an ErrorBody
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let error = Error::from(rejection);
            metrics::record_generation(mode, Some(&error), started.elapsed());
            return Err(error);
        }
    };
    debug!(%mode, bytes = body.len(), "Generation requested");

    let result = match &state.backend {
        Backend::Concepts(generator) => generate_concept(generator.as_ref(), &body)
            .await
            .map(|response| Json(response).into_response()),
        Backend::Images(generator) => generate_images(generator, &body)
            .await
            .map(|response| Json(response).into_response()),
    };

    metrics::record_generation(mode, result.as_ref().err(), started.elapsed());
    result
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {e}"),
    })
}

async fn generate_concept(generator: &dyn ConceptGenerator, body: &[u8]) -> Result<ConceptResponse> {
    let request: ConceptRequest = parse_body(body)?;
    let brief = request.to_brief()?;
    let concept = generator.generate(&brief).await?;
    Ok(request.respond(concept))
}

async fn generate_images(generator: &ImageGenerator, body: &[u8]) -> Result<Value> {
    let request: ImageRequest = parse_body(body)?;
    let job = request.to_job()?;
    generator.run(&job).await
}
