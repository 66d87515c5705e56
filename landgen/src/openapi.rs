//! OpenAPI documentation for the HTTP API, served as JSON at `/api/openapi.json` and rendered
//! with Scalar at `/api/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::api::models::{concepts, errors, images};
use crate::generation::BudgetTier;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "landgen",
        description = "Budget-aware landscape concept generation. One route proxies form submissions to the configured generation backend."
    ),
    paths(api::handlers::generate::generate),
    components(schemas(
        concepts::ConceptRequest,
        concepts::PhotoUpload,
        concepts::ConceptResponse,
        concepts::PhotoMeta,
        images::ImageRequest,
        errors::ErrorBody,
        BudgetTier,
    )),
    tags(
        (name = "generation", description = "Concept and image generation"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_generate_route() {
        let spec = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(spec["paths"]["/api/generate"]["post"].is_object());
        let schemas = spec["components"]["schemas"].as_object().unwrap();
        for name in ["ConceptRequest", "ConceptResponse", "ImageRequest", "ErrorBody", "PhotoUpload"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
