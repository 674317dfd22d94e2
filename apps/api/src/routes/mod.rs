pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::emotion::handlers as emotion_handlers;
use crate::meme::handlers as meme_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/classify", post(emotion_handlers::handle_classify))
        .route("/api/v1/memes", post(meme_handlers::handle_generate_meme))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::emotion::Lexicon;
    use crate::meme::pipeline::tests::{png_bytes, BoxTypesetters, FakeSearch};
    use crate::meme::MemePipeline;

    fn app(search: FakeSearch) -> Router {
        let lexicon = Arc::new(Lexicon::bundled().unwrap());
        let pipeline = MemePipeline::new(lexicon.clone(), Arc::new(search), Arc::new(BoxTypesetters));
        build_router(AppState {
            lexicon,
            pipeline: Arc::new(pipeline),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(FakeSearch::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "meme-api");
    }

    #[tokio::test]
    async fn test_classify_reports_stage_and_script() {
        let response = app(FakeSearch::default())
            .oneshot(post_json(
                "/api/v1/classify",
                serde_json::json!({"text": "tu kiti changla re tu"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["label"], "sarcasm");
        assert_eq!(body["matched_via"], "phrase");
        assert_eq!(body["script"], "transliterated");
    }

    #[tokio::test]
    async fn test_classify_rejects_blank_text() {
        let response = app(FakeSearch::default())
            .oneshot(post_json("/api/v1/classify", serde_json::json!({"text": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_meme_returns_image_with_emotion_header() {
        let mut search = FakeSearch::default();
        search.results.insert(
            "roast meme".to_string(),
            vec!["https://img.test/roast.png".to_string()],
        );
        search
            .images
            .insert("https://img.test/roast.png".to_string(), png_bytes(160, 120));

        let response = app(search)
            .oneshot(post_json(
                "/api/v1/memes",
                serde_json::json!({"text": "tu ekdum veda aahes"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()["x-detected-emotion"], "roast");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (160, 120));
    }

    #[tokio::test]
    async fn test_meme_rejects_blank_text() {
        let response = app(FakeSearch::default())
            .oneshot(post_json("/api/v1/memes", serde_json::json!({"text": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_meme_fetch_failure_is_bad_gateway() {
        // Search finds nothing and the fallback images are not fetchable either.
        let response = app(FakeSearch::default())
            .oneshot(post_json(
                "/api/v1/memes",
                serde_json::json!({"text": "nothing anywhere"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "UPSTREAM_ERROR");
    }
}
