//! JSON-Patch documents for work item fields.
//!
//! Work items are created and updated by sending an ordered list of
//! [`PatchOperation`]s. Long text fields may carry a format hint that
//! is emitted as an extra `/multilineFieldsFormat/{field}` operation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Text values longer than this (in characters) receive a format hint.
pub const MULTILINE_FORMAT_THRESHOLD: usize = 50;

/// Path-like fields that are skipped when given a blank value.
const OPTIONAL_PATH_FIELDS: &[&str] = &["System.AreaPath", "System.IterationPath"];

/// JSON-Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
    Replace,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Replace => "replace",
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "remove" => Ok(Operation::Remove),
            "replace" => Ok(Operation::Replace),
            _ => Err(Error::Validation(format!(
                "Unsupported patch operation '{}'. Expected one of: add, replace, remove",
                s
            ))),
        }
    }
}

/// A single JSON-Patch operation against a work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: Operation,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: Operation::Add,
            path: path.into(),
            value: Some(value.into()),
        }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: Operation::Replace,
            path: path.into(),
            value: Some(value.into()),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: Operation::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// Field reference name targeted by this operation, if it is a field path.
    pub fn field_name(&self) -> Option<&str> {
        self.path.strip_prefix("/fields/")
    }
}

/// Format of a long text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    #[serde(alias = "html", alias = "HTML")]
    Html,
    #[serde(alias = "markdown", alias = "MARKDOWN")]
    Markdown,
}

impl TextFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormat::Html => "Html",
            TextFormat::Markdown => "Markdown",
        }
    }
}

/// One caller-supplied field value.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub format: Option<TextFormat>,
}

impl FieldUpdate {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<TextFormat>) -> Self {
        self.format = format;
        self
    }
}

pub fn field_path(name: &str) -> String {
    format!("/fields/{}", name)
}

pub fn format_path(name: &str) -> String {
    format!("/multilineFieldsFormat/{}", name)
}

/// True when the value is text longer than [`MULTILINE_FORMAT_THRESHOLD`].
pub fn exceeds_format_threshold(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.chars().count() > MULTILINE_FORMAT_THRESHOLD)
}

/// Format-hint operation for `field`, if `format` applies to `value`.
pub fn format_hint(field: &str, value: &Value, format: Option<TextFormat>) -> Option<PatchOperation> {
    let format = format?;
    exceeds_format_threshold(value).then(|| PatchOperation::add(format_path(field), format.as_str()))
}

fn is_blank_optional_path(name: &str, value: &Value) -> bool {
    OPTIONAL_PATH_FIELDS.contains(&name) && value.as_str().is_some_and(|s| s.trim().is_empty())
}

/// Build the patch document for a list of field values.
///
/// Order follows the input; a format hint directly follows its field.
pub fn build_field_patch(fields: &[FieldUpdate]) -> Vec<PatchOperation> {
    let mut document = Vec::with_capacity(fields.len());

    for field in fields {
        if is_blank_optional_path(&field.name, &field.value) {
            continue;
        }
        document.push(PatchOperation::add(field_path(&field.name), field.value.clone()));
        if let Some(hint) = format_hint(&field.name, &field.value, field.format) {
            document.push(hint);
        }
    }

    document
}

/// Patch document for raw operations that may carry a text format.
///
/// Operations keep their order. A field's format hint directly follows
/// its first value operation that qualifies, at most one per field.
pub fn with_format_hints<I>(operations: I) -> Vec<PatchOperation>
where
    I: IntoIterator<Item = (PatchOperation, Option<TextFormat>)>,
{
    let mut document: Vec<PatchOperation> = Vec::new();

    for (operation, format) in operations {
        let hint = operation
            .field_name()
            .zip(operation.value.as_ref())
            .and_then(|(field, value)| format_hint(field, value, format));
        document.push(operation);
        if let Some(hint) = hint {
            if !document.iter().any(|op| op.path == hint.path) {
                document.push(hint);
            }
        }
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_field() {
        let doc = build_field_patch(&[FieldUpdate::new("System.Title", "Bug X")]);
        assert_eq!(doc, vec![PatchOperation::add("/fields/System.Title", "Bug X")]);
    }

    #[test]
    fn test_order_preserved() {
        let doc = build_field_patch(&[
            FieldUpdate::new("System.Title", "Hello World!"),
            FieldUpdate::new("System.Description", "This is a sample task"),
            FieldUpdate::new("System.AreaPath", "Contoso\\Development"),
        ]);
        let paths: Vec<&str> = doc.iter().map(|op| op.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/fields/System.Title",
                "/fields/System.Description",
                "/fields/System.AreaPath"
            ]
        );
    }

    #[test]
    fn test_blank_path_fields_skipped() {
        let doc = build_field_patch(&[
            FieldUpdate::new("System.Title", "Child Task"),
            FieldUpdate::new("System.AreaPath", " "),
            FieldUpdate::new("System.IterationPath", ""),
        ]);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc[0].path, "/fields/System.Title");
    }

    #[test]
    fn test_blank_non_path_field_kept() {
        let doc = build_field_patch(&[FieldUpdate::new("System.Description", "")]);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_format_hint_threshold_is_exclusive() {
        let at_threshold = "a".repeat(50);
        let doc = build_field_patch(&[FieldUpdate::new("System.Description", at_threshold)
            .with_format(Some(TextFormat::Markdown))]);
        assert_eq!(doc.len(), 1);

        let over = "a".repeat(51);
        let doc = build_field_patch(&[
            FieldUpdate::new("System.Description", over).with_format(Some(TextFormat::Markdown)),
            FieldUpdate::new("System.Title", "Title"),
        ]);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc[0].path, "/fields/System.Description");
        assert_eq!(
            doc[1],
            PatchOperation::add("/multilineFieldsFormat/System.Description", "Markdown")
        );
        assert_eq!(doc[2].path, "/fields/System.Title");
    }

    #[test]
    fn test_no_hint_without_format() {
        let doc = build_field_patch(&[FieldUpdate::new("System.Description", "a".repeat(80))]);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_no_hint_for_non_text() {
        let doc = build_field_patch(&[FieldUpdate::new("Microsoft.VSTS.Common.Priority", 2)
            .with_format(Some(TextFormat::Markdown))]);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_threshold_counts_characters() {
        // 50 multi-byte characters stay under the threshold
        let text = "é".repeat(50);
        assert!(!exceeds_format_threshold(&json!(text)));
    }

    #[test]
    fn test_operation_serialization() {
        let op = PatchOperation::add("/fields/System.Title", "T");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "add", "path": "/fields/System.Title", "value": "T"})
        );

        let op = PatchOperation::remove("/relations/0");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/relations/0"})
        );
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!("Add".parse::<Operation>().unwrap(), Operation::Add);
        assert_eq!("replace".parse::<Operation>().unwrap(), Operation::Replace);
        assert_eq!("REMOVE".parse::<Operation>().unwrap(), Operation::Remove);
        let err = "move".parse::<Operation>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("'move'"));
    }

    #[test]
    fn test_field_update_deserialize() {
        let update: FieldUpdate = serde_json::from_value(json!({
            "name": "System.Description",
            "value": "text",
            "format": "Markdown"
        }))
        .unwrap();
        assert_eq!(update.format, Some(TextFormat::Markdown));
    }

    #[test]
    fn test_text_format_names() {
        for (name, expected) in [
            ("Html", TextFormat::Html),
            ("html", TextFormat::Html),
            ("HTML", TextFormat::Html),
            ("Markdown", TextFormat::Markdown),
            ("markdown", TextFormat::Markdown),
            ("MARKDOWN", TextFormat::Markdown),
        ] {
            let format: TextFormat = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(format, expected, "{}", name);
        }
        assert!(serde_json::from_value::<TextFormat>(json!("Text")).is_err());
    }

    #[test]
    fn test_hint_follows_its_operation() {
        let long = "x".repeat(60);
        let doc = with_format_hints([
            (
                PatchOperation::add("/fields/System.Description", long.as_str()),
                Some(TextFormat::Markdown),
            ),
            (PatchOperation::replace("/fields/System.Title", "New title"), None),
        ]);
        let paths: Vec<&str> = doc.iter().map(|op| op.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/fields/System.Description",
                "/multilineFieldsFormat/System.Description",
                "/fields/System.Title",
            ]
        );
        assert_eq!(doc[1].value, Some(json!("Markdown")));
    }

    #[test]
    fn test_one_hint_per_field() {
        let long = "y".repeat(51);
        let doc = with_format_hints([
            (
                PatchOperation::add("/fields/System.Description", long.as_str()),
                Some(TextFormat::Html),
            ),
            (
                PatchOperation::replace("/fields/System.Description", long.as_str()),
                Some(TextFormat::Html),
            ),
            (PatchOperation::remove("/relations/0"), Some(TextFormat::Html)),
        ]);
        assert_eq!(doc.len(), 4);
        assert_eq!(doc[1].path, "/multilineFieldsFormat/System.Description");
        assert_eq!(doc[2].op, Operation::Replace);
        assert_eq!(doc[3].path, "/relations/0");
    }
}
