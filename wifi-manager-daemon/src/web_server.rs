use crate::runner::enable_radio;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use wifi_manager_core::types::ConnectionRequest;
use wifi_manager_core::{Error, WifiManager};

// The shared state for our web server.
pub type WebServerState = State<Arc<AppState>>;

pub struct AppState {
    pub manager: Arc<WifiManager>,
}

/// /api/connect 的请求体
#[derive(Deserialize)]
pub struct ConnectPayload {
    ssid: String,
    #[serde(default)]
    password: String,
}

pub fn router(manager: Arc<WifiManager>) -> Router {
    let app_state = Arc::new(AppState { manager });

    Router::new()
        .route("/api/radio/on", post(api_radio_on))
        .route("/api/radio/off", post(api_radio_off))
        .route("/api/scan", post(api_scan))
        .route("/api/networks", get(api_networks))
        .route("/api/connect", post(api_connect))
        .route("/api/status", get(api_status))
        .with_state(app_state)
}

/// Serves the presentation API until Ctrl-C.
pub async fn run_server(manager: Arc<WifiManager>, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(manager);

    tracing::info!("🌐 Web server listening on {}", bind_addr);
    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn error_response(e: &Error) -> Response {
    let status = match e {
        Error::InvalidState { .. } | Error::Busy { .. } => StatusCode::CONFLICT,
        Error::ConfigInvalid(_) => StatusCode::BAD_REQUEST,
        Error::ScanTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

fn networks_body(manager: &WifiManager) -> serde_json::Value {
    let list = manager.ap_list();
    serde_json::json!({
        "count": list.len(),
        "total_found": list.total_found(),
        "networks": list.records(),
    })
}

/// 打开无线开关：初始化并扫描，然后返回缓存的列表
async fn api_radio_on(State(state): WebServerState) -> impl IntoResponse {
    tracing::debug!("Handling /api/radio/on");
    let report = enable_radio(&state.manager).await;
    let status = if report.initialized {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let mut body = networks_body(&state.manager);
    body["report"] = serde_json::json!(report);
    (status, Json(body)).into_response()
}

/// 关闭无线开关。界面上的列表随之清空；缓存仍可通过 /api/networks 读取
async fn api_radio_off(State(state): WebServerState) -> impl IntoResponse {
    tracing::debug!("Handling /api/radio/off");
    match state.manager.deinit().await {
        Ok(()) => {
            let body = serde_json::json!({ "status": "off", "count": 0, "networks": [] });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn api_scan(State(state): WebServerState) -> impl IntoResponse {
    match state.manager.scan().await {
        Ok(_) => (StatusCode::OK, Json(networks_body(&state.manager))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// 返回缓存的扫描结果
async fn api_networks(State(state): WebServerState) -> impl IntoResponse {
    (StatusCode::OK, Json(networks_body(&state.manager))).into_response()
}

async fn api_connect(
    State(state): WebServerState,
    Json(payload): Json<ConnectPayload>,
) -> impl IntoResponse {
    tracing::debug!(ssid = %payload.ssid, "Handling /api/connect request");
    let request = ConnectionRequest::new(payload.ssid, payload.password);
    match state.manager.connect(&request).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "connecting" }))).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn api_status(State(state): WebServerState) -> impl IntoResponse {
    let manager = &state.manager;
    let body = serde_json::json!({
        "state": manager.state(),
        "owned": manager.owned_resources(),
        "link": manager.link_status(),
        "ap_count": manager.ap_count(),
        "scan_complete": manager.is_scan_complete(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use crate::runner::build_radio;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wifi_manager_core::ManagerConfig;

    fn app() -> (Router, Arc<WifiManager>) {
        let radio = Arc::new(build_radio(&DemoConfig {
            unreachable: vec!["xfinitywifi".into()],
            ..DemoConfig::default()
        }));
        let manager = Arc::new(WifiManager::with_driver(ManagerConfig::default(), radio).unwrap());
        (router(manager.clone()), manager)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn radio_on_initializes_and_lists_networks() {
        let (app, manager) = app();
        let (status, body) = call(&app, "POST", "/api/radio/on", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["initialized"], true);
        assert_eq!(body["report"]["scan"], "Scan done.");
        assert_eq!(body["count"], 6);
        assert_eq!(body["networks"][0]["ssid"], "MyHomeWiFi");
        assert_eq!(body["networks"][0]["auth_mode"], "WPA3_PSK");
        assert_eq!(manager.ap_count(), 6);
    }

    #[tokio::test]
    async fn connect_before_radio_on_is_a_conflict() {
        let (app, _) = app();
        let payload = serde_json::json!({ "ssid": "Home", "password": "secret" });
        let (status, body) = call(&app, "POST", "/api/connect", Some(payload)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("uninitialized"));
    }

    #[tokio::test]
    async fn overlong_password_is_a_bad_request() {
        let (app, _) = app();
        call(&app, "POST", "/api/radio/on", None).await;
        let payload = serde_json::json!({ "ssid": "Home", "password": "p".repeat(80) });
        let (status, _) = call(&app, "POST", "/api/connect", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn radio_off_then_status_reports_uninitialized() {
        let (app, _) = app();
        call(&app, "POST", "/api/radio/on", None).await;
        let payload = serde_json::json!({ "ssid": "MyHomeWiFi", "password": "secret" });
        let (status, body) = call(&app, "POST", "/api/connect", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "connecting");

        let (status, body) = call(&app, "POST", "/api/radio/off", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "off");
        assert_eq!(body["networks"], serde_json::json!([]));

        let (_, body) = call(&app, "GET", "/api/status", None).await;
        assert_eq!(body["state"], "uninitialized");
        assert_eq!(body["owned"]["event_loop"], "not_created");
        assert_eq!(body["ap_count"], 6);
    }
}
