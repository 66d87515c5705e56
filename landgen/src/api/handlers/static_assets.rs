//! HTTP handlers for static asset serving.

use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets;

/// Serve embedded static assets; anything else is a 404
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match static_assets::Assets::get(path) {
        Some(content) if !path.is_empty() => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        _ => {
            debug!("No embedded asset for {}", uri.path());
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum_test::TestServer;

    fn create_test_router() -> Router {
        Router::new().fallback(serve_embedded_asset)
    }

    #[tokio::test]
    async fn test_serve_favicon() {
        let server = TestServer::new(create_test_router()).unwrap();

        let response = server.get("/favicon.svg").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").map(|v| v.to_str().unwrap()),
            Some("image/svg+xml")
        );
        assert_eq!(
            response.headers().get("cache-control").map(|v| v.to_str().unwrap()),
            Some("no-cache")
        );
    }

    #[tokio::test]
    async fn test_serve_stylesheet() {
        let server = TestServer::new(create_test_router()).unwrap();

        let response = server.get("/styles.css").await;

        response.assert_status(StatusCode::OK);
        assert!(
            response
                .headers()
                .get("content-type")
                .map(|v| v.to_str().unwrap())
                .unwrap()
                .starts_with("text/css")
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let server = TestServer::new(create_test_router()).unwrap();

        server.get("/dashboard/users/123").await.assert_status(StatusCode::NOT_FOUND);
        server.get("/").await.assert_status(StatusCode::NOT_FOUND);
    }
}
