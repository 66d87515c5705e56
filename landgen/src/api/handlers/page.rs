//! The concept form page.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use tracing::instrument;

use crate::{AppState, errors::Result, form};

/// Render the form with the configured slider bounds and generation mode
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let page = form::render_page(&state.config)?;
    Ok(([(header::CACHE_CONTROL, "no-cache")], Html(page)))
}

#[cfg(test)]
mod tests {
    use crate::config::GenerationMode;
    use crate::test_utils::{create_test_config, create_test_server};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_index_renders_form() {
        let server = create_test_server(create_test_config());

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        assert_eq!(
            response.headers().get("cache-control").and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );

        let html = response.text();
        assert!(html.contains(r#"name="address""#));
        assert!(html.contains(r#"min="1000""#));
        assert!(html.contains(r#"step="500""#));
        assert!(html.contains(r#"data-mode="demo""#));
    }

    #[tokio::test]
    async fn test_index_reflects_image_mode() {
        let mut config = create_test_config();
        config.generator.mode = GenerationMode::Image;
        let server = create_test_server(config);

        let html = server.get("/").await.text();
        assert!(html.contains(r#"data-mode="image""#));
    }
}
