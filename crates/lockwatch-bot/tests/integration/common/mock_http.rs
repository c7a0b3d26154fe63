//! Mock HTTP server for integration tests.
//!
//! Serves every upstream (JSON-RPC, DexScreener, Pump.fun, registry) from
//! one axum router whose fallback:
//! - Routes each request through a test-supplied handler
//! - Records received requests
//! - Can hold a request open forever to simulate a hung upstream

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

impl MockRequest {
    /// JSON-RPC method name, for POST requests.
    pub fn rpc_method(&self) -> Option<String> {
        let body: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        body.get("method")?.as_str().map(str::to_string)
    }

    /// JSON-RPC request id, echoed in responses.
    pub fn rpc_id(&self) -> serde_json::Value {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|b| b.get("id").cloned())
            .unwrap_or(serde_json::json!(1))
    }
}

/// Response produced by a handler.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Json(u16, serde_json::Value),
    /// Never answer.
    Hang,
}

impl MockResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::Json(200, body)
    }

    pub fn status(status: u16) -> Self {
        Self::Json(status, serde_json::json!({"error": "mock failure"}))
    }

    pub fn rpc_result(request: &MockRequest, result: serde_json::Value) -> Self {
        Self::ok(serde_json::json!({
            "jsonrpc": "2.0",
            "id": request.rpc_id(),
            "result": result
        }))
    }

    pub fn rpc_error(request: &MockRequest, code: i64, message: &str) -> Self {
        Self::ok(serde_json::json!({
            "jsonrpc": "2.0",
            "id": request.rpc_id(),
            "error": {"code": code, "message": message}
        }))
    }
}

pub type Handler = Arc<dyn Fn(&MockRequest) -> MockResponse + Send + Sync>;

#[derive(Clone)]
struct ServerState {
    handler: Handler,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

/// A mock HTTP server for testing.
pub struct MockHttpServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockHttpServer {
    /// Start a new mock server on an available port.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&MockRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<MockRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let app = Router::new().fallback(handle_request).with_state(ServerState {
            handler: Arc::new(handler),
            requests: requests.clone(),
        });

        tokio::spawn(async move {
            tokio::select! {
                _ = async move { axum::serve(listener, app).await } => {}
                _ = shutdown_rx.recv() => {}
            }
        });

        Self {
            addr,
            shutdown_tx,
            requests,
        }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// All received requests.
    pub async fn received(&self) -> Vec<MockRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of JSON-RPC calls of `method` received.
    pub async fn rpc_calls(&self, method: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.rpc_method().as_deref() == Some(method))
            .count()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_request(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let request = MockRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&body).to_string(),
    };
    state.requests.lock().await.push(request.clone());

    match (state.handler)(&request) {
        MockResponse::Json(status, body) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
        MockResponse::Hang => std::future::pending::<Response>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockHttpServer::start(|_| MockResponse::ok(serde_json::json!({}))).await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        server.shutdown().await;
    }
}
