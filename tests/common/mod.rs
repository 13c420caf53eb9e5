//! Shared utilities for integration testing.
//!
//! A mock computation service speaking the JSON WebSocket protocol on
//! `/socket`, served by axum on an ephemeral port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use tablelink::config::LinkConfig;

type Reply = Result<Value, (&'static str, String)>;

#[derive(Default)]
struct MockState {
    token: String,
    snapshot: Vec<Value>,
    announce_after_list: Vec<Value>,
    announce_delay: Duration,
    announced: Vec<Value>,
    methods: Vec<String>,
    silent: Vec<String>,
    closed_sockets: usize,
}

/// Scriptable server state shared with the test body.
#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockService {
    pub fn new(token: &str) -> Self {
        let service = Self::default();
        service.state.lock().unwrap().token = token.to_string();
        service
    }

    pub fn with_group(self, name: &str, tables: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .snapshot
            .push(json!({ "name": name, "tables": tables }));
        self
    }

    /// Push `groupsAnnounced` for this group `delay` after answering `listGroups`.
    pub fn announce_after_list(self, name: &str, tables: &[&str], delay: Duration) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.announce_after_list.push(json!({ "name": name, "tables": tables }));
            state.announce_delay = delay;
        }
        self
    }

    /// Never answer these methods. Requests are still recorded.
    pub fn silent_on(self, methods: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .silent
            .extend(methods.iter().map(|m| m.to_string()));
        self
    }

    /// Sockets whose handler has finished.
    pub fn closed_sockets(&self) -> usize {
        self.state.lock().unwrap().closed_sockets
    }

    /// Methods received so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.state.lock().unwrap().methods.clone()
    }

    fn handle(&self, method: &str, params: &Value) -> (Reply, Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state.methods.push(method.to_string());
        match method {
            "authenticate" => {
                if params["token"] == state.token.as_str() && params["type"] == "password" {
                    (Ok(Value::Null), Vec::new())
                } else {
                    (Err(("unauthorized", "Invalid credentials".to_string())), Vec::new())
                }
            }
            "listGroups" => {
                let pushes = std::mem::take(&mut state.announce_after_list);
                state.announced.extend(pushes.iter().cloned());
                (Ok(Value::Array(state.snapshot.clone())), pushes)
            }
            "fetchTable" => {
                let group = params["group"].as_str().unwrap_or_default();
                let table = params["table"].as_str().unwrap_or_default();
                let exists = state.snapshot.iter().chain(state.announced.iter()).any(|g| {
                    g["name"] == group
                        && g["tables"]
                            .as_array()
                            .is_some_and(|tables| tables.iter().any(|t| t == table))
                });
                if exists {
                    (
                        Ok(json!({
                            "id": format!("{}/{}", group, table),
                            "name": table,
                            "columns": [{ "name": "x", "type": "long" }],
                            "size": 5,
                            "refreshing": false
                        })),
                        Vec::new(),
                    )
                } else {
                    (Err(("not_found", format!("{}/{}", group, table))), Vec::new())
                }
            }
            "startSession" => (Ok(json!("session-1")), Vec::new()),
            "runCode" => (
                Ok(json!({ "changes": { "created": [{ "name": "t", "type": "Table" }] } })),
                Vec::new(),
            ),
            "fetchVariable" => (
                Ok(json!({
                    "id": format!("{}/{}", params["sessionId"].as_str().unwrap_or_default(), params["name"].as_str().unwrap_or_default()),
                    "name": params["name"],
                    "columns": [
                        { "name": "Timestamp", "type": "Instant" },
                        { "name": "x", "type": "long" }
                    ],
                    "refreshing": true
                })),
                Vec::new(),
            ),
            "closeSession" => (Ok(Value::Null), Vec::new()),
            other => (Err(("unknown_method", other.to_string())), Vec::new()),
        }
    }

    fn is_silent(&self, method: &str) -> bool {
        self.state.lock().unwrap().silent.iter().any(|m| m == method)
    }

    fn socket_closed(&self) {
        self.state.lock().unwrap().closed_sockets += 1;
    }

    fn announce_delay(&self) -> Duration {
        self.state.lock().unwrap().announce_delay
    }
}

/// Serve `service` on 127.0.0.1 and return the bound address.
pub async fn start_mock_service(service: MockService) -> SocketAddr {
    let app = Router::new()
        .route("/socket", get(ws_handler))
        .with_state(service);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn ws_handler(ws: WebSocketUpgrade, State(service): State<MockService>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(mut socket: WebSocket, service: MockService) {
    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let request: Value = serde_json::from_str(text.as_str()).unwrap();
        let id = request["id"].as_u64().unwrap();
        let method = request["method"].as_str().unwrap_or_default().to_string();

        let (reply, pushes) = service.handle(&method, &request["params"]);
        if service.is_silent(&method) {
            continue;
        }
        let frame = match reply {
            Ok(result) => json!({ "id": id, "result": result }),
            Err((code, message)) => json!({ "id": id, "error": { "code": code, "message": message } }),
        };
        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
            break;
        }

        if !pushes.is_empty() {
            tokio::time::sleep(service.announce_delay()).await;
            let event = json!({ "event": "groupsAnnounced", "groups": pushes });
            if socket.send(Message::Text(event.to_string().into())).await.is_err() {
                break;
            }
        }
    }
    service.socket_closed();
}

/// Client config pointing at `addr`.
#[allow(dead_code)]
pub fn client_config(addr: SocketAddr, token: &str) -> LinkConfig {
    let mut config = LinkConfig::default();
    config.service.base_url = format!("http://{}", addr);
    config.credentials.username = "alice".to_string();
    config.credentials.token = token.to_string();
    config.timeouts.connect_secs = 5;
    config.timeouts.resolve_secs = 2;
    config.timeouts.request_secs = 5;
    config
}
