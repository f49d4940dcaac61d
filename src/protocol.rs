use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

pub fn ok(id: &str, result: Value) -> Value {
    serde_json::json!({ "id": id, "result": result })
}

pub fn err(id: &str, message: impl std::fmt::Display) -> Value {
    serde_json::json!({ "id": id, "error": message.to_string() })
}
