//! Image generation and edits.
//!
//! A job without an input image becomes a JSON `images/generations` call. A job with one becomes a
//! multipart `images/edits` call carrying the decoded bytes. Either way the upstream payload is
//! returned intact, with the first image lifted to the top level for the page.

use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::openai::OpenAiClient;
use crate::errors::{Error, Result, snippet};

const GENERATIONS_PATH: &str = "images/generations";
const EDITS_PATH: &str = "images/edits";

/// A validated image request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub prompt: String,
    /// Upstream size string, e.g. `1536x1024` or `auto`
    pub size: &'static str,
    pub n: u32,
    /// Present for edits
    pub image: Option<InputImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InputImage {
    fn file_name(&self) -> String {
        let extension = self
            .mime_type
            .strip_prefix("image/")
            .map(|sub| if sub == "jpeg" { "jpg" } else { sub })
            .unwrap_or("png");
        format!("site.{extension}")
    }
}

/// Which upstream operation served a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOperation {
    Generate,
    Edit,
}

impl ImageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageOperation::Generate => "generate",
            ImageOperation::Edit => "edit",
        }
    }
}

impl ImageJob {
    pub fn operation(&self) -> ImageOperation {
        if self.image.is_some() {
            ImageOperation::Edit
        } else {
            ImageOperation::Generate
        }
    }
}

pub struct ImageGenerator {
    client: OpenAiClient,
    model: String,
}

impl ImageGenerator {
    pub fn new(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }

    /// Run the job and return the upstream payload plus `id`, `operation` and `imageBase64`.
    #[instrument(skip(self, job), fields(model = %self.model, operation = job.operation().as_str(), n = job.n))]
    pub async fn run(&self, job: &ImageJob) -> Result<Value> {
        let response = match &job.image {
            None => self.generate(job).await?,
            Some(image) => self.edit(job, image).await?,
        };

        let result = decorate(response, job.operation())?;
        debug!("Image job completed");
        Ok(result)
    }

    async fn generate(&self, job: &ImageJob) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "prompt": job.prompt,
            "n": job.n,
            "size": job.size,
        });
        self.client.post_json(GENERATIONS_PATH, &body).await
    }

    async fn edit(&self, job: &ImageJob, image: &InputImage) -> Result<Value> {
        // surface a missing key before building the form
        self.client.api_key()?;

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name())
            .mime_str(&image.mime_type)
            .map_err(|e| Error::BadRequest {
                message: format!("imageBase64 has an unusable MIME type: {e}"),
            })?;

        let form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", job.prompt.clone())
            .text("n", job.n.to_string())
            .text("size", job.size)
            .part("image", part);

        self.client.post_multipart(EDITS_PATH, form).await
    }
}

/// Add the response id, the operation and the first image's base64 to the upstream payload.
fn decorate(response: Value, operation: ImageOperation) -> Result<Value> {
    let mut fields = match response {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::InvalidUpstreamBody {
                message: "Image response was not a JSON object".to_string(),
                raw: Some(snippet(&other.to_string())),
            });
        }
    };

    let first_image = fields
        .get("data")
        .and_then(|data| data.get(0))
        .and_then(|image| image.get("b64_json"))
        .cloned()
        .unwrap_or(Value::Null);

    fields.insert("id".to_string(), json!(Uuid::new_v4()));
    fields.insert("operation".to_string(), json!(operation.as_str()));
    fields.insert("imageBase64".to_string(), first_image);

    Ok(Value::Object(fields))
}
