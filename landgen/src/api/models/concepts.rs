use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::Result;
use crate::form;
use crate::generation::{BudgetTier, ConceptBrief};

/// Form submission for a landscape concept
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConceptRequest {
    /// Property address; must not be blank
    #[serde(default)]
    pub address: String,
    /// Target project budget in US dollars
    #[schema(value_type = f64, example = 15000)]
    pub budget: Number,
    /// Free-text goals, e.g. "xeriscape + shade"
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo: Option<PhotoUpload>,
}

/// A site photo as the browser form sends it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpload {
    pub name: String,
    /// MIME type reported by the browser; must start with `image/`
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size of the original file in bytes
    pub size: u64,
    /// `data:image/...;base64,...` URL of the file contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

/// Photo echo: metadata only, never the bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl From<&PhotoUpload> for PhotoMeta {
    fn from(photo: &PhotoUpload) -> Self {
        Self {
            name: photo.name.clone(),
            mime_type: photo.mime_type.clone(),
            size: photo.size,
        }
    }
}

/// A generated concept plus an echo of the submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConceptResponse {
    /// Fresh identifier for this response; not stable across requests
    pub id: Uuid,
    pub address: String,
    #[schema(value_type = f64)]
    pub budget: Number,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoMeta>,
    /// Provider-defined concept payload
    #[schema(value_type = Object)]
    pub concept: Value,
}

impl ConceptRequest {
    /// Validate the submission and derive the brief handed to a generator.
    pub fn to_brief(&self) -> Result<ConceptBrief> {
        form::validate_address(&self.address)?;
        let budget = form::validate_budget(&self.budget)?;
        if let Some(photo) = &self.photo {
            form::validate_photo(photo)?;
        }

        Ok(ConceptBrief {
            address: self.address.trim().to_string(),
            budget,
            tier: BudgetTier::from_budget(budget),
            notes: self.notes.clone().unwrap_or_default(),
            photo_data_url: self.photo.as_ref().and_then(|p| p.data_url.clone()),
        })
    }

    /// Wrap a generated concept with a fresh id and the echoed request fields.
    pub fn respond(self, concept: Value) -> ConceptResponse {
        ConceptResponse {
            id: Uuid::new_v4(),
            photo: self.photo.as_ref().map(PhotoMeta::from),
            address: self.address,
            budget: self.budget,
            notes: self.notes.unwrap_or_default(),
            concept,
        }
    }
}
