//! Template and field definitions as authored by the template editor

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Submitted values keyed by field id
pub type FormData = HashMap<String, String>;

/// Kind of fillable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Signature,
    /// Any kind this service does not know how to draw
    #[serde(other)]
    Other,
}

/// One fillable region of a template
///
/// Coordinates are in page units with the origin at the top-left corner of
/// the page and Y growing downward, the way the editor places them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// 1-based page number; absent or 0 means the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FieldDefinition {
    /// The 1-based page this field targets, or `None` when the stored page
    /// number can never name a page
    pub fn page_number(&self) -> Option<u32> {
        match self.page {
            None | Some(0) => Some(1),
            Some(p) if p > 0 => u32::try_from(p).ok(),
            Some(_) => None,
        }
    }

    /// Zero-based page index used to address pages internally
    pub fn page_index(&self) -> Option<usize> {
        self.page_number().map(|p| p as usize - 1)
    }
}

/// A template PDF together with its field layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub storage_path: String,
    pub editable_fields: Vec<FieldDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_deserializes_editor_json() {
        let json = r#"{"id":"f1","type":"signature","page":2,"x":10,"y":20.5,"width":150,"height":40,"label":"Sign here"}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(
            field,
            FieldDefinition {
                id: "f1".to_string(),
                kind: FieldKind::Signature,
                page: Some(2),
                x: 10.0,
                y: 20.5,
                width: 150.0,
                height: 40.0,
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_other() {
        let json = r#"{"id":"f1","type":"checkbox","x":0,"y":0,"width":10,"height":10}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldKind::Other);
    }

    #[test]
    fn test_missing_page_defaults_to_first() {
        let json = r#"{"id":"f1","type":"text","x":0,"y":0,"width":10,"height":10}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.page, None);
        assert_eq!(field.page_number(), Some(1));
        assert_eq!(field.page_index(), Some(0));
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let json = r#"{"id":"f1","type":"text","page":0,"x":0,"y":0,"width":10,"height":10}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.page_index(), Some(0));
    }

    #[test]
    fn test_negative_page_has_no_index() {
        let json = r#"{"id":"f1","type":"text","page":-3,"x":0,"y":0,"width":10,"height":10}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.page_number(), None);
        assert_eq!(field.page_index(), None);
    }

    #[test]
    fn test_page_index_subtracts_one() {
        let json = r#"{"id":"f1","type":"text","page":3,"x":0,"y":0,"width":10,"height":10}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.page_index(), Some(2));
    }
}
