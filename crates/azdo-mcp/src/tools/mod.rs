//! Tool sets, one per domain, and the helpers they share.
//!
//! Every tool deserializes its arguments into a typed struct, performs its
//! calls and reports the outcome as a [`ToolCallResult`]. Errors never
//! escape a tool: they become `isError` envelopes.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use azdo_core::{Domain, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::protocol::{ToolCallResult, ToolDefinition};

pub mod builds;
pub mod projects;
pub mod releases;
pub mod test_plans;
pub mod wiki;
pub mod work;
pub mod work_items;

pub use self::builds::BuildTools;
pub use self::projects::CoreTools;
pub use self::releases::ReleaseTools;
pub use self::test_plans::TestPlanTools;
pub use self::wiki::WikiTools;
pub use self::work::WorkTools;
pub use self::work_items::WorkItemTools;

/// The tools of one domain.
#[async_trait]
pub trait ToolSet: Send + Sync {
    fn domain(&self) -> Domain;

    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run a tool listed by [`ToolSet::definitions`].
    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult;
}

pub(crate) fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

pub(crate) fn unknown_tool(name: &str) -> ToolCallResult {
    ToolCallResult::error(format!("Unknown tool: {}", name))
}

/// Deserialize the arguments of `tool`; missing arguments read as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: Option<Value>,
) -> std::result::Result<T, ToolCallResult> {
    let arguments = match arguments {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(arguments) => arguments,
    };
    serde_json::from_value(arguments).map_err(|e| {
        debug!(tool = tool, error = %e, "Rejected tool arguments");
        ToolCallResult::error(format!("Invalid arguments for tool '{}': {}", tool, e))
    })
}

/// Parse the arguments, then run `handler` with them.
pub(crate) async fn with_args<T, F, Fut>(
    tool: &str,
    arguments: Option<Value>,
    handler: F,
) -> ToolCallResult
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = ToolCallResult>,
{
    match parse_args(tool, arguments) {
        Ok(args) => handler(args).await,
        Err(rejected) => rejected,
    }
}

/// Error envelope `"<context>: <message>"`.
pub(crate) fn failure(context: &str, error: &Error) -> ToolCallResult {
    ToolCallResult::error(format!("{}: {}", context, error.user_message()))
}

/// Pretty JSON on success, [`failure`] otherwise.
pub(crate) fn respond<T: Serialize>(context: &str, outcome: Result<T>) -> ToolCallResult {
    match outcome {
        Ok(value) => ToolCallResult::json(&value),
        Err(e) => failure(context, &e),
    }
}

/// Treat a `null` entity from a create/update call as [`Error::EmptyResult`].
pub(crate) fn require_entity(entity: Value, empty_message: &str) -> Result<Value> {
    if entity.is_null() {
        Err(Error::EmptyResult(empty_message.to_string()))
    } else {
        Ok(entity)
    }
}

/// Await one create/update call and wrap the returned entity.
///
/// A `null` entity is reported as `empty_message`, distinct from a failed call.
pub(crate) async fn execute_single<F>(context: &str, empty_message: &str, call: F) -> ToolCallResult
where
    F: Future<Output = Result<Value>>,
{
    let outcome = call.await.and_then(|entity| require_entity(entity, empty_message));
    respond(context, outcome)
}

/// A string, or a number sent where a string is expected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum StringOrNumber {
    Text(String),
    Number(i64),
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::Text(text) => f.write_str(text),
            StringOrNumber::Number(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        project: String,
        #[serde(default)]
        top: Option<u32>,
    }

    #[test]
    fn test_parse_args() {
        let args: Args = parse_args("t", Some(json!({"project": "Contoso", "top": 5}))).unwrap();
        assert_eq!(args.project, "Contoso");
        assert_eq!(args.top, Some(5));
    }

    #[test]
    fn test_parse_args_rejection_names_tool() {
        let rejected = parse_args::<Args>("core_list_project_teams", None).unwrap_err();
        assert!(rejected.is_error());
        assert!(rejected
            .first_text()
            .starts_with("Invalid arguments for tool 'core_list_project_teams'"));
        assert!(rejected.first_text().contains("project"));
    }

    #[test]
    fn test_failure_uses_unknown_error_for_blank_messages() {
        let result = failure("Error fetching projects", &Error::Validation(String::new()));
        assert_eq!(
            result.first_text(),
            "Error fetching projects: Unknown error occurred"
        );
    }

    #[test]
    fn test_require_entity() {
        assert!(require_entity(json!({"id": 1}), "none").is_ok());
        let err = require_entity(Value::Null, "Work item was not created").unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
        assert_eq!(err.to_string(), "Work item was not created");
    }

    #[test]
    fn test_string_or_number() {
        let values: Vec<StringOrNumber> = serde_json::from_value(json!(["a", 5])).unwrap();
        assert_eq!(values[0].to_string(), "a");
        assert_eq!(values[1].to_string(), "5");
    }
}
