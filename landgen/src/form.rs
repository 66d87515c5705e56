//! The concept form: server-side rendering of the page and the input rules it enforces.
//!
//! The browser checks the same rules before it sends anything (a non-image photo never leaves
//! the page), and the proxy re-applies them so a hand-crafted request cannot get further.

use minijinja::{Environment, context};
use serde_json::Number;

use crate::api::models::concepts::PhotoUpload;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::static_assets::Templates;

const PAGE_TEMPLATE: &str = "index.html";

pub fn validate_address(address: &str) -> Result<()> {
    if address.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "address is required".to_string(),
        });
    }
    Ok(())
}

/// Budgets must be finite and non-negative. The slider bounds are a page concern and are not
/// enforced here.
pub fn validate_budget(budget: &Number) -> Result<f64> {
    match budget.as_f64() {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(Error::BadRequest {
            message: format!("budget must be a non-negative number, got {budget}"),
        }),
    }
}

pub fn validate_photo(photo: &PhotoUpload) -> Result<()> {
    if !photo.mime_type.starts_with("image/") {
        return Err(Error::BadRequest {
            message: format!("Please choose an image file (got {})", display_mime(&photo.mime_type)),
        });
    }

    if let Some(data_url) = &photo.data_url
        && !data_url.starts_with("data:image/")
    {
        return Err(Error::BadRequest {
            message: "photo.dataUrl must be a data:image/... URL".to_string(),
        });
    }

    Ok(())
}

fn display_mime(mime: &str) -> &str {
    if mime.is_empty() { "unknown type" } else { mime }
}

/// Render the form page with slider bounds and generation mode from configuration.
pub fn render_page(config: &Config) -> Result<String> {
    let file = Templates::get(PAGE_TEMPLATE).ok_or_else(|| Error::Configuration {
        message: format!("page template {PAGE_TEMPLATE} is not embedded"),
    })?;
    let source = std::str::from_utf8(&file.data).map_err(|e| anyhow::anyhow!("page template is not UTF-8: {e}"))?;

    let env = Environment::new();
    let template = env
        .template_from_named_str(PAGE_TEMPLATE, source)
        .map_err(|e| anyhow::anyhow!("failed to parse page template: {e}"))?;

    let form = &config.form;
    let html = template
        .render(context! {
            title => &form.title,
            min_budget => form.min_budget,
            max_budget => form.max_budget,
            budget_step => form.budget_step,
            default_budget => form.default_budget,
            mode => config.generator.mode.as_str(),
        })
        .map_err(|e| anyhow::anyhow!("failed to render page template: {e}"))?;

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMode;

    fn photo(mime: &str, data_url: Option<&str>) -> PhotoUpload {
        PhotoUpload {
            name: "upload".to_string(),
            mime_type: mime.to_string(),
            size: 10,
            data_url: data_url.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_address_rejected() {
        assert!(validate_address("").is_err());
        assert!(validate_address("   ").is_err());
        assert!(validate_address("123 Main St").is_ok());
    }

    #[test]
    fn test_budget_rules() {
        assert_eq!(validate_budget(&Number::from(15000)).unwrap(), 15000.0);
        assert_eq!(validate_budget(&Number::from(0)).unwrap(), 0.0);
        assert!(validate_budget(&Number::from(-5)).is_err());
        assert_eq!(validate_budget(&Number::from_f64(1234.5).unwrap()).unwrap(), 1234.5);
    }

    #[test]
    fn test_photo_mime_rules() {
        assert!(validate_photo(&photo("image/png", None)).is_ok());
        assert!(validate_photo(&photo("image/jpeg", Some("data:image/jpeg;base64,AAAA"))).is_ok());

        let err = validate_photo(&photo("application/pdf", None)).unwrap_err();
        assert!(err.to_string().contains("application/pdf"));

        let err = validate_photo(&photo("", None)).unwrap_err();
        assert!(err.to_string().contains("unknown type"));

        assert!(validate_photo(&photo("image/png", Some("data:text/plain;base64,AAAA"))).is_err());
    }

    #[test]
    fn test_render_page_uses_form_config() {
        let mut config = Config::default();
        config.form.title = "Yard <Planner>".to_string();
        config.form.max_budget = 50000;
        config.form.default_budget = 12000;
        config.generator.mode = GenerationMode::Demo;

        let html = render_page(&config).unwrap();

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains(r#"max="50000""#));
        assert!(html.contains(r#"value="12000""#));
        assert!(html.contains(r#"data-mode="demo""#));
        // title is HTML-escaped
        assert!(html.contains("Yard &lt;Planner&gt;"));
    }

    #[test]
    fn test_render_page_guards_non_image_uploads() {
        let html = render_page(&Config::default()).unwrap();
        assert!(html.contains(r#"accept="image/*""#));
        assert!(html.contains("startsWith(\"image/\")"));

        // The guard must return before the request is issued
        let guard = html.find("!file.type.startsWith(\"image/\")").unwrap();
        let guard_return = guard + html[guard..].find("return;").unwrap();
        let fetch = html.find("fetch(\"/api/generate\"").unwrap();
        assert!(guard_return < fetch);
    }

    #[test]
    fn test_render_page_treats_unreadable_response_as_error() {
        let html = render_page(&Config::default()).unwrap();

        let parse = html.find("await res.json()").unwrap();
        let after_parse = &html[parse..];
        let catch = after_parse.find("catch").unwrap();
        let show_error = after_parse.find("showError(").unwrap();
        let ok_check = after_parse.find("if (!res.ok)").unwrap();
        assert!(catch < show_error && show_error < ok_check);
        assert!(!html.contains(".json().catch("));
    }
}
