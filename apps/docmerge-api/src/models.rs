//! Request and response bodies for the merge API

use docmerge_core::FormData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;

/// Body of `POST /merge-pdf`
///
/// Both members are optional at the serde level so that a missing one is
/// reported with a readable message instead of a deserializer error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeRequest {
    #[serde(rename = "templateId")]
    pub template_id: Option<String>,
    #[serde(rename = "formData")]
    pub form_data: Option<HashMap<String, Value>>,
}

impl MergeRequest {
    /// Check required members and normalise submitted values to strings
    pub fn validate(self) -> Result<(String, FormData), ApiError> {
        let template_id = self
            .template_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let form_data = self.form_data.filter(|data| !data.is_empty());

        let (Some(template_id), Some(form_data)) = (template_id, form_data) else {
            return Err(ApiError::InvalidRequest(
                "Missing required parameters (templateId, formData)".to_string(),
            ));
        };

        let form_data = form_data
            .into_iter()
            .filter_map(|(field, value)| value_text(value).map(|text| (field, text)))
            .collect();
        Ok((template_id, form_data))
    }
}

/// Textual form of a submitted value
///
/// Falsy values (`false`, `0`, `null`) count as not submitted, as do arrays
/// and objects.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Body of a successful merge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeResponse {
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
