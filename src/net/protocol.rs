//! JSON frames of the WebSocket transport.
//!
//! ```text
//! client → server  { "id": 7, "method": "fetchTable", "params": { ... } }
//! server → client  { "id": 7, "result": { ... } }
//!                  { "id": 7, "error": { "code": "not_found", "message": "..." } }
//!                  { "event": "groupsAnnounced", "groups": [ ... ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportFault;
use crate::net::types::{ResourceGroup, SessionId};

pub const METHOD_AUTHENTICATE: &str = "authenticate";
pub const METHOD_LIST_GROUPS: &str = "listGroups";
pub const METHOD_FETCH_TABLE: &str = "fetchTable";
pub const METHOD_START_SESSION: &str = "startSession";
pub const METHOD_RUN_CODE: &str = "runCode";
pub const METHOD_FETCH_VARIABLE: &str = "fetchVariable";
pub const METHOD_CLOSE_SESSION: &str = "closeSession";

/// Outgoing request frame.
#[derive(Debug, Serialize)]
pub struct Request<'a, P> {
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

/// Error body of a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl From<ErrorBody> for TransportFault {
    fn from(body: ErrorBody) -> Self {
        match body.code.as_str() {
            "unauthorized" => TransportFault::Unauthorized(body.message),
            "not_found" => TransportFault::NotFound(body.message),
            _ => TransportFault::Remote {
                code: body.code,
                message: body.message,
            },
        }
    }
}

/// Response to a request.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn into_result(self) -> Result<Value, TransportFault> {
        match self.error {
            Some(body) => Err(body.into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Server-pushed event.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    GroupsAnnounced { groups: Vec<ResourceGroup> },
}

/// Any frame the server may send.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    Response(Response),
    Event(ServerEvent),
}

#[derive(Debug, Serialize)]
pub struct FetchTableParams<'a> {
    pub group: &'a str,
    pub table: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeParams<'a> {
    pub session_id: &'a SessionId,
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchVariableParams<'a> {
    pub session_id: &'a SessionId,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams<'a> {
    pub session_id: &'a SessionId,
}
