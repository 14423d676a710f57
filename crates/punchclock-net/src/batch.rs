//! Wire types of the batch endpoint: many REST calls in one request,
//! answered positionally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One REST call inside a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdate {
    pub method: String,
    pub relative_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The answer to the [`BatchUpdate`] at the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateResult {
    #[serde(alias = "status_code")]
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl BatchUpdateResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as JSON. Servers may send it either inline or as a string
    /// holding a JSON document.
    pub fn body_json(&self) -> Result<Value> {
        match &self.body {
            Value::String(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
            Value::String(_) => Ok(Value::Null),
            other => Ok(other.clone()),
        }
    }

    /// The body as text, for error reports.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

pub fn encode_batch(updates: &[BatchUpdate]) -> Result<String> {
    Ok(serde_json::to_string(updates)?)
}

pub fn decode_batch(body: &str) -> Result<Vec<BatchUpdateResult>> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_has_no_body() {
        let updates = vec![
            BatchUpdate {
                method: "DELETE".into(),
                relative_url: "/api/v8/tags/7".into(),
                body: None,
            },
            BatchUpdate {
                method: "POST".into(),
                relative_url: "/api/v8/tags".into(),
                body: Some(json!({ "tag": { "name": "billed" } })),
            },
        ];

        let encoded: Value = serde_json::from_str(&encode_batch(&updates).unwrap()).unwrap();
        assert!(encoded[0].get("body").is_none());
        assert_eq!(encoded[1]["body"]["tag"]["name"], "billed");
    }

    #[test]
    fn results_accept_status_code_alias_and_string_bodies() {
        let results = decode_batch(
            r#"[
                {"status": 200, "body": {"data": {"id": 1}}},
                {"status_code": 201, "body": "{\"data\": {\"id\": 2}}"},
                {"status": 404, "body": "not found"}
            ]"#,
        )
        .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].body_json().unwrap()["data"]["id"], 1);
        assert_eq!(results[1].status, 201);
        assert_eq!(results[1].body_json().unwrap()["data"]["id"], 2);
        assert!(!results[2].is_success());
        assert_eq!(results[2].body_text(), "not found");
    }
}
