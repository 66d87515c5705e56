use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{Error, Result};
use crate::generation::images::{ImageJob, InputImage};

/// Smallest base64 payload accepted as an input image
pub const MIN_IMAGE_BASE64_LEN: usize = 100;

/// Upper bound on images per request
pub const MAX_IMAGES: u32 = 4;

/// Image generation request, accepted when the server runs in `image` mode
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
    /// Ask for an edit of `imageBase64` rather than a fresh image
    #[serde(default)]
    pub is_edit: bool,
    /// Site photo, either bare base64 or a `data:` URL
    #[serde(default)]
    pub image_base64: Option<String>,
    /// `square`, `landscape` or `portrait`; anything else lets the provider choose
    #[serde(default)]
    pub aspect: Option<String>,
    /// Number of images, clamped to 1..=4
    #[serde(default)]
    pub n: Option<u32>,
}

impl ImageRequest {
    /// Validate the request and decide between a generate and an edit call.
    pub fn to_job(&self) -> Result<ImageJob> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(Error::BadRequest {
                message: "prompt is required".to_string(),
            });
        }

        let image = match self.image_base64.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(encoded) => Some(decode_input_image(encoded)?),
            None if self.is_edit => {
                return Err(Error::BadRequest {
                    message: "isEdit requires imageBase64".to_string(),
                });
            }
            None => None,
        };

        Ok(ImageJob {
            prompt: prompt.to_string(),
            size: size_for_aspect(self.aspect.as_deref()),
            n: self.n.unwrap_or(1).clamp(1, MAX_IMAGES),
            image,
        })
    }
}

fn size_for_aspect(aspect: Option<&str>) -> &'static str {
    match aspect.map(str::trim) {
        Some("square") => "1024x1024",
        Some("landscape") => "1536x1024",
        Some("portrait") => "1024x1536",
        _ => "auto",
    }
}

/// Decode bare base64 or a `data:image/...;base64,` URL.
fn decode_input_image(encoded: &str) -> Result<InputImage> {
    let (mime_type, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| Error::BadRequest {
                message: "imageBase64 data URL has no payload".to_string(),
            })?;
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            if !mime.starts_with("image/") {
                return Err(Error::BadRequest {
                    message: format!("imageBase64 must be an image, got {mime}"),
                });
            }
            (mime.to_string(), payload)
        }
        None => ("image/png".to_string(), encoded),
    };

    let payload = payload.trim();
    if payload.len() < MIN_IMAGE_BASE64_LEN {
        return Err(Error::BadRequest {
            message: format!(
                "imageBase64 is too small ({} characters, need at least {MIN_IMAGE_BASE64_LEN})",
                payload.len()
            ),
        });
    }

    let bytes = STANDARD.decode(payload).map_err(|e| Error::BadRequest {
        message: format!("imageBase64 is not valid base64: {e}"),
    })?;

    Ok(InputImage { mime_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_image(len: usize) -> String {
        STANDARD.encode(vec![7u8; len])
    }

    fn request(prompt: &str, image: Option<String>, is_edit: bool) -> ImageRequest {
        ImageRequest {
            prompt: prompt.to_string(),
            is_edit,
            image_base64: image,
            aspect: None,
            n: None,
        }
    }

    #[test]
    fn test_plain_prompt_is_a_generate_job() {
        let job = request("a pollinator garden", None, false).to_job().unwrap();

        assert!(job.image.is_none());
        assert_eq!(job.n, 1);
        assert_eq!(job.size, "auto");
    }

    #[test]
    fn test_image_makes_it_an_edit_job() {
        let job = request("add a patio", Some(encoded_image(120)), false).to_job().unwrap();

        let image = job.image.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes.len(), 120);
    }

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let data_url = format!("data:image/jpeg;base64,{}", encoded_image(120));
        let job = request("add a patio", Some(data_url), true).to_job().unwrap();

        assert_eq!(job.image.unwrap().mime_type, "image/jpeg");
    }

    #[test]
    fn test_undersized_image_is_rejected() {
        let err = request("add a patio", Some("aGVsbG8=".to_string()), true).to_job().unwrap_err();

        assert!(matches!(err, Error::BadRequest { .. }));
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let err = request("add a patio", Some("!".repeat(200)), false).to_job().unwrap_err();
        assert!(err.to_string().contains("not valid base64"));
    }

    #[test]
    fn test_non_image_data_url_is_rejected() {
        let data_url = format!("data:application/pdf;base64,{}", encoded_image(120));
        let err = request("add a patio", Some(data_url), false).to_job().unwrap_err();
        assert!(err.to_string().contains("must be an image"));
    }

    #[test]
    fn test_edit_without_image_is_rejected() {
        let err = request("add a patio", None, true).to_job().unwrap_err();
        assert!(err.to_string().contains("isEdit"));
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        assert!(request("   ", None, false).to_job().is_err());
    }

    #[test]
    fn test_aspect_and_count() {
        let mut req = request("front yard", None, false);
        req.aspect = Some("landscape".to_string());
        req.n = Some(12);

        let job = req.to_job().unwrap();
        assert_eq!(job.size, "1536x1024");
        assert_eq!(job.n, MAX_IMAGES);

        req.aspect = Some("portrait".to_string());
        req.n = Some(0);
        let job = req.to_job().unwrap();
        assert_eq!(job.size, "1024x1536");
        assert_eq!(job.n, 1);
    }
}
