//! Image Edit API Server
//!
//! HTTP surface for the persistent image-edit service: the inference endpoint
//! plus health and model-info probes, served by axum on top of one shared
//! [`EditEngine`].

use std::str::FromStr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use edit_engine::EditEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod routes;

pub use config::ServerConfig;
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    /// The process-wide edit engine
    pub engine: Arc<EditEngine>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/model_info", get(routes::health::model_info))
        .route("/edit_image", post(routes::edit::edit_image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Construct the engine with the default backend and serve until stopped
///
/// The engine loads in the background so `/health` can answer during the
/// load; a failed load is terminal for the process.
pub async fn run(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(EditEngine::new(
        config.engine_config(),
        Box::new(edit_engine::PassthroughLoader),
    ));

    let loading = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = loading.load().await {
            tracing::error!("Failed to load model: {e}");
            std::process::exit(1);
        }
        info!("Server ready");
    });

    run_server(config, engine).await
}

/// Run the server until an interrupt or terminate signal arrives
pub async fn run_server(
    config: &ServerConfig,
    engine: Arc<EditEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState { engine });
    let app = create_router(state);
    let addr = config.bind_addr();

    info!("Starting edit server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Completes on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register SIGINT handler");
    };
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use edit_engine::{EditPipeline, EngineConfig, EngineError, PipelineLoader};
    use image::DynamicImage;
    use protocol::{EditImageRequest, EditImageResponse, ErrorBody, HealthResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct CountingPipeline {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl EditPipeline for CountingPipeline {
        fn apply(
            &mut self,
            image: &DynamicImage,
            _prompt: &str,
            _guidance_scale: f32,
        ) -> Result<DynamicImage, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            Ok(image.clone())
        }
    }

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl PipelineLoader for CountingLoader {
        fn load(
            &self,
            _config: &EngineConfig,
            _device: &str,
        ) -> Result<Box<dyn EditPipeline>, EngineError> {
            Ok(Box::new(CountingPipeline {
                calls: self.calls.clone(),
                delay: self.delay,
            }))
        }
    }

    struct Harness {
        router: Router,
        engine: Arc<EditEngine>,
        pipeline_calls: Arc<AtomicUsize>,
    }

    fn harness_with_delay(delay: Duration) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            calls: calls.clone(),
            delay,
        };
        let engine = Arc::new(EditEngine::new(EngineConfig::default(), Box::new(loader)));
        let router = create_router(Arc::new(AppState {
            engine: engine.clone(),
        }));
        Harness {
            router,
            engine,
            pipeline_calls: calls,
        }
    }

    fn harness() -> Harness {
        harness_with_delay(Duration::ZERO)
    }

    fn edit_request(body: &EditImageRequest) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/edit_image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn test_png_base64() -> String {
        let mut img = image::RgbImage::new(10, 10);
        img.put_pixel(2, 2, image::Rgb([255, 0, 0]));
        image_codec::encode_png_base64(&DynamicImage::ImageRgb8(img)).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_prompt_is_rejected_without_touching_engine() {
        let h = harness();
        h.engine.load().await.unwrap();

        let request = EditImageRequest {
            image_base64: test_png_base64(),
            prompt: "  ".to_string(),
            guidance_scale: 2.5,
        };
        let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert!(body.detail.contains("prompt"));
        assert_eq!(h.pipeline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_out_of_range_guidance_scale_is_rejected() {
        let h = harness();
        h.engine.load().await.unwrap();

        for scale in [0.05_f32, 10.1] {
            let request = EditImageRequest {
                image_base64: test_png_base64(),
                prompt: "add a hat".to_string(),
                guidance_scale: scale,
            };
            let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(h.pipeline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_ready_until_load_completes() {
        let h = harness();
        let request = EditImageRequest {
            image_base64: test_png_base64(),
            prompt: "add a hat".to_string(),
            guidance_scale: 2.5,
        };

        let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        h.engine.load().await.unwrap();

        let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_image_data_returns_bad_request() {
        let h = harness();
        h.engine.load().await.unwrap();

        let request = EditImageRequest {
            image_base64: "bm90IGEgcG5n".to_string(),
            prompt: "add a hat".to_string(),
            guidance_scale: 2.5,
        };
        let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert!(body.detail.contains("malformed image data"));
        assert_eq!(h.pipeline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_edit_round_trips_the_image() {
        let h = harness();
        h.engine.load().await.unwrap();

        let encoded = test_png_base64();
        let request = EditImageRequest {
            image_base64: encoded.clone(),
            prompt: "add a hat".to_string(),
            guidance_scale: 2.5,
        };
        let response = h.router.clone().oneshot(edit_request(&request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: EditImageResponse = body_json(response).await;
        let input = image_codec::decode_png_base64(&encoded).unwrap();
        let output = image_codec::decode_png_base64(&body.result).unwrap();
        assert_eq!(input.to_rgba8(), output.to_rgba8());
        assert_eq!(h.pipeline_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_health_reflects_load_state() {
        let h = harness();

        let response = h
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: HealthResponse = body_json(response).await;
        assert_eq!(body.status, "healthy");
        assert!(!body.model_loaded);
        assert!(!body.ready);

        h.engine.load().await.unwrap();

        let response = h
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: HealthResponse = body_json(response).await;
        assert!(body.ready);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_model_info_reports_configuration() {
        let h = harness();

        let response = h
            .router
            .clone()
            .oneshot(Request::get("/model_info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: protocol::ModelInfoResponse = body_json(response).await;
        assert_eq!(body.model_name, "FLUX.1-Kontext-dev");
        assert_eq!(body.torch_dtype, "bfloat16");
        assert!(!body.loaded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_health_answers_while_edit_is_in_flight() {
        let h = harness_with_delay(Duration::from_millis(300));
        h.engine.load().await.unwrap();

        let router = h.router.clone();
        let request = EditImageRequest {
            image_base64: test_png_base64(),
            prompt: "add a hat".to_string(),
            guidance_scale: 2.5,
        };
        let edit = tokio::spawn(async move {
            router.oneshot(edit_request(&request)).await.unwrap()
        });

        // Let the edit reach the pipeline before probing
        while h.pipeline_calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let health = tokio::time::timeout(Duration::from_millis(100), async {
            h.router
                .clone()
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap()
        })
        .await
        .expect("health check blocked behind an in-flight edit");
        assert_eq!(health.status(), StatusCode::OK);

        let edit_response = edit.await.unwrap();
        assert_eq!(edit_response.status(), StatusCode::OK);
    }
}
