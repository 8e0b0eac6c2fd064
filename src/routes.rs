use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::TranslationError;
use crate::state::AppState;
use crate::translate::{TranslateRequest, TranslateResponse};

const ENDPOINTS: [&str; 4] = ["/translate", "/health", "/languages", "/"];

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/translate", post(translate))
        .route("/health", get(health_check))
        .route("/languages", get(languages))
}

/// Full application: routes, CORS and request tracing
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);
    create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "NLLB Translator API is running",
        "model": state.config.backend.model_name,
        "endpoints": ENDPOINTS,
    }))
}

async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, TranslationError> {
    let request_id = Uuid::new_v4();
    translate_request(state, payload)
        .instrument(info_span!("translate", %request_id))
        .await
}

async fn translate_request(
    state: AppState,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, TranslationError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        TranslationError::MalformedRequest(rejection.body_text())
    })?;

    let translator = state.translator().ok_or_else(|| {
        warn!("Translation requested before the model finished loading");
        TranslationError::ServiceNotReady
    })?;

    match translator.handle(request).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            if err.status_code().is_client_error() {
                warn!("Translation request rejected: {}", err);
            }
            Err(err)
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let model_loaded = state.is_ready();
    let model = state
        .translator()
        .map(|t| t.model_name().to_string())
        .unwrap_or_else(|| state.config.backend.model_name.clone());
    let uptime = chrono::Utc::now() - state.started_at;
    Json(json!({
        "status": if model_loaded { "healthy" } else { "initializing" },
        "model_loaded": model_loaded,
        "model": model,
        "started_at": state.started_at,
        "uptime_seconds": uptime.num_seconds(),
    }))
}

async fn languages(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "supported_languages": state.languages.supported_languages(),
        "language_mapping": state.languages.mapping(),
        "model_family": state.languages.family(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::StubBackend;
    use crate::backend::BackendError;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn ready_state(stub: Arc<StubBackend>) -> AppState {
        let state = AppState::new(Config::default());
        state.install_backend(stub).unwrap();
        state
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_translate(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/translate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn translate_returns_result_with_echoed_fields() {
        let stub = Arc::new(StubBackend::new(|text, source, target| {
            match (text, source, target) {
                ("hello", Some("eng_Latn"), "spa_Latn") => Ok("hola".to_string()),
                _ => Err(BackendError::Generation("unexpected call".to_string())),
            }
        }));
        let app = create_app(ready_state(stub.clone()));

        let (status, body) = send(
            app,
            post_translate(r#"{"text": "hello", "source_lang": "en", "target_lang": "es"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "hola");
        assert_eq!(body["translated_text"], "hola");
        assert_eq!(body["source_lang"], "en");
        assert_eq!(body["target_lang"], "es");
        assert_eq!(body["original_text"], "hello");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn translate_accepts_long_field_names() {
        let stub = Arc::new(StubBackend::echo());
        let app = create_app(ready_state(stub.clone()));

        let (status, body) = send(
            app,
            post_translate(
                r#"{"text": "Hello", "source_language": "english", "target_language": "swahili"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translated_text"], "swh_Latn:Hello");
        assert_eq!(body["source_lang"], "english");
        assert_eq!(body["target_lang"], "swahili");
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests_without_backend_calls() {
        let stub = Arc::new(StubBackend::echo());
        let state = ready_state(stub.clone());

        let cases = [
            ("{not json", "malformed_request"),
            ("", "malformed_request"),
            (r#"{"text": 42, "source_lang": "en", "target_lang": "es"}"#, "malformed_request"),
            (r#"{"text": "", "source_lang": "en", "target_lang": "es"}"#, "missing_text"),
            (r#"{"source_lang": "en", "target_lang": "es"}"#, "missing_text"),
            (r#"{"text": "hi", "target_lang": "es"}"#, "missing_language"),
            (r#"{"text": "hi", "source_lang": "en"}"#, "missing_language"),
        ];
        for (payload, code) in cases {
            let (status, body) = send(create_app(state.clone()), post_translate(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
            assert_eq!(body["code"], code, "{}", payload);
            assert!(body["error"].is_string());
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn missing_content_type_is_malformed() {
        let app = create_app(ready_state(Arc::new(StubBackend::echo())));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/translate")
            .body(Body::from(r#"{"text": "hi"}"#))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "malformed_request");
    }

    #[tokio::test]
    async fn backend_errors_map_to_status_codes() {
        let cases = [
            (
                BackendError::UnsupportedLanguage("xx_Latn".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                BackendError::Generation("CUDA out of memory".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (BackendError::Busy, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, expected) in cases {
            let app = create_app(ready_state(Arc::new(StubBackend::failing(error.clone()))));
            let (status, body) = send(
                app,
                post_translate(r#"{"text": "hi", "source_lang": "en", "target_lang": "es"}"#),
            )
            .await;
            assert_eq!(status, expected, "{:?}", error);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn backend_message_is_passed_through() {
        let stub = Arc::new(StubBackend::failing(BackendError::Generation(
            "CUDA out of memory".to_string(),
        )));
        let app = create_app(ready_state(stub));
        let (_, body) = send(
            app,
            post_translate(r#"{"text": "hi", "source_lang": "en", "target_lang": "es"}"#),
        )
        .await;
        assert_eq!(body["error"], "Translation failed: CUDA out of memory");
        assert_eq!(body["code"], "backend_error");
    }

    #[tokio::test]
    async fn translate_before_ready_fails_fast() {
        let app = create_app(AppState::new(Config::default()));
        let (status, body) = send(
            app,
            post_translate(r#"{"text": "hi", "source_lang": "en", "target_lang": "es"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "service_not_ready");
    }

    #[tokio::test]
    async fn health_reports_model_loaded_after_install() {
        let state = AppState::new(Config::default());

        let (status, body) = send(create_app(state.clone()), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["status"], "initializing");

        state.install_backend(Arc::new(StubBackend::echo())).unwrap();

        let (status, body) = send(create_app(state), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime_seconds"].is_i64());
    }

    #[tokio::test]
    async fn languages_snapshot_is_stable() {
        let state = AppState::new(Config::default());

        let (status, first) = send(create_app(state.clone()), get_request("/languages")).await;
        assert_eq!(status, StatusCode::OK);
        let codes: Vec<&str> = first["supported_languages"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for code in ["en", "es", "fr"] {
            assert!(codes.contains(&code), "missing {}", code);
        }
        assert_eq!(first["language_mapping"]["en"], "eng_Latn");
        assert_eq!(first["model_family"], "nllb");

        let (_, second) = send(create_app(state), get_request("/languages")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let app = create_app(AppState::new(Config::default()));
        let (status, body) = send(app, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), ENDPOINTS.len());
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn concurrent_requests_get_their_own_translations() {
        let stub = Arc::new(
            StubBackend::new(|text, source, target| {
                Ok(format!("{}>{}:{}", source.unwrap_or("-"), target, text))
            })
            .with_delay(Duration::from_millis(3)),
        );
        let state = ready_state(stub.clone());
        let targets = ["es", "fr", "de", "sw", "rw"];

        let requests = (0..20).map(|i| {
            let app = create_app(state.clone());
            let target = targets[i % targets.len()];
            async move {
                let payload = json!({
                    "text": format!("message {}", i),
                    "source_lang": "en",
                    "target_lang": target,
                });
                let (status, body) = send(app, post_translate(payload.to_string())).await;
                (i, target, status, body)
            }
        });

        for (i, target, status, body) in futures::future::join_all(requests).await {
            assert_eq!(status, StatusCode::OK);
            let expected_tag = state.languages.resolve(target).to_string();
            assert_eq!(
                body["translation"],
                format!("eng_Latn>{}:message {}", expected_tag, i)
            );
            assert_eq!(body["original_text"], format!("message {}", i));
        }
        assert_eq!(stub.calls(), 20);
    }

    #[tokio::test]
    async fn cors_restricts_to_configured_origins() {
        let mut config = Config::default();
        config.server.cors_allowed_origins = vec!["https://app.example.org".to_string()];
        let app = create_app(AppState::new(config));

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://app.example.org")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.org"
        );

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example.org")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
