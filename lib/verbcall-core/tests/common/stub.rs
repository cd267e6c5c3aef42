use std::net::TcpListener;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

use verbcall_core::test_server::TestServer;
use verbcall_core::{CALL_PATH, CallError, CallRequest, CallResponse};

/// A `VerbService` with a few canned verbs:
///
/// - `echo.echo`: greets the `name` of the request,
/// - `echo.boom`: always fails with `boom`,
/// - `db.insert`: always fails with `database unavailable`,
/// - `echo.slow`: echoes the request after `delay` milliseconds,
/// - `echo.binary`: answers bytes that are not UTF-8,
/// - `echo.garbage`: answers a body that is not JSON,
/// - anything else is a Connect `not_found` error.
#[derive(Debug)]
pub struct StubVerbService;

impl TestServer for StubVerbService {
    async fn launch(&self, listener: TcpListener) {
        listener.set_nonblocking(true).expect("set non-blocking");
        let listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
        info!(?listener, "launching stub verb service");

        let app = Router::new()
            .route(&format!("/{CALL_PATH}"), post(call))
            .layer(TraceLayer::new_for_http());
        axum::serve(listener, app).await.expect("server launched");
    }
}

async fn call(axum::Json(request): axum::Json<CallRequest>) -> Response {
    info!(verb = %request.verb, "stub call");
    match (request.verb.module(), request.verb.name()) {
        ("echo", "echo") => {
            let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
                return connect_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_argument",
                    "request body is not JSON",
                );
            };
            let name = body["name"].as_str().unwrap_or("anonymous");
            body_response(json!({ "message": format!("Hello, {name}!") }).to_string())
        }
        ("echo", "boom") => error_response("boom"),
        ("db", "insert") => error_response("database unavailable"),
        ("echo", "slow") => {
            let delay = serde_json::from_slice::<Value>(&request.body)
                .ok()
                .and_then(|body| body["delay"].as_u64())
                .unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            axum::Json(CallResponse::Body(request.body)).into_response()
        }
        ("echo", "binary") => {
            axum::Json(CallResponse::Body(Bytes::from_static(&[0xff, 0xfe]))).into_response()
        }
        ("echo", "garbage") => body_response("not json".to_string()),
        _ => connect_error(
            StatusCode::NOT_FOUND,
            "not_found",
            &format!("verb not found: {}", request.verb),
        ),
    }
}

fn body_response(body: String) -> Response {
    axum::Json(CallResponse::Body(Bytes::from(body))).into_response()
}

fn error_response(message: &str) -> Response {
    axum::Json(CallResponse::Error(CallError {
        message: message.to_string(),
        stack: None,
    }))
    .into_response()
}

fn connect_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, axum::Json(json!({ "code": code, "message": message }))).into_response()
}
