//! Static file backend.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::Request;
use axum::response::IntoResponse;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::backend::{Handler, HandlerFuture};

/// Serves files below a root directory, addressed by the request path.
#[derive(Debug, Clone)]
pub struct FileServer {
    dir: ServeDir,
}

impl FileServer {
    pub fn new(root: &str) -> Self {
        Self {
            dir: ServeDir::new(root),
        }
    }
}

impl Handler for FileServer {
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        let dir = self.dir.clone();
        Box::pin(async move {
            let result: Result<_, Infallible> = dir.oneshot(request).await;
            match result {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_serves_files() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("hello.txt"), "hello").unwrap();
        let server = FileServer::new(root.path().to_str().unwrap());

        let found = server
            .handle(Request::builder().uri("/hello.txt").body(Body::empty()).unwrap())
            .await;
        assert_eq!(found.status(), StatusCode::OK);
        let body = axum::body::to_bytes(found.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");

        let missing = server
            .handle(Request::builder().uri("/nope.txt").body(Body::empty()).unwrap())
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
