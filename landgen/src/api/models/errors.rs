use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every non-2xx response from the generation proxy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description of what went wrong
    pub error: String,
    /// Truncated upstream text, when the failure came from the upstream provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}
