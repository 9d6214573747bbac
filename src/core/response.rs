use serde::{Deserialize, Serialize};
use spin_sdk::http::Response;

/// Body of every response: `{ success, data?, message? }`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()) }
    }
}

pub fn json_response<T: Serialize>(status: u16, data: T) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&Envelope::success(data))?)
        .build())
}

pub fn message_response(status: u16, message: &str) -> anyhow::Result<Response> {
    let envelope = Envelope::<()> { success: true, data: None, message: Some(message.to_string()) };
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&envelope)?)
        .build())
}
