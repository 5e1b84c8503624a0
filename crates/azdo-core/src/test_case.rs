//! Test case work items: steps XML and the creation patch.

use serde_json::Value;

use crate::patch::{build_field_patch, FieldUpdate};

pub const TEST_CASE_TYPE: &str = "Test Case";
pub const DEFAULT_EXPECTED_RESULT: &str = "Verify step completes successfully";

/// Fields of a new test case.
#[derive(Debug, Clone, Default)]
pub struct NewTestCase {
    pub title: String,
    pub steps: Option<String>,
    pub priority: Option<u32>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

pub fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Strip a leading `N.` numbering from a step.
fn strip_step_number(step: &str) -> &str {
    let digits = step.len() - step.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return step;
    }
    match step[digits..].strip_prefix('.') {
        Some(rest) if !rest.trim().is_empty() => rest.trim_start(),
        _ => step,
    }
}

/// Convert `"1. Do this|Expect that"` lines into the `Microsoft.VSTS.TCM.Steps` XML.
///
/// Blank lines are ignored. A step without an expected result gets
/// [`DEFAULT_EXPECTED_RESULT`].
pub fn steps_to_xml(steps: &str) -> String {
    let lines: Vec<&str> = steps
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut xml = format!("<steps id=\"0\" last=\"{}\">", lines.len());
    for (index, line) in lines.iter().enumerate() {
        let mut parts = line.split('|').map(str::trim);
        let step = strip_step_number(parts.next().unwrap_or_default());
        let expected = parts
            .next()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXPECTED_RESULT);

        xml.push_str(&format!(
            "<step id=\"{}\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">{}</parameterizedString>\
             <parameterizedString isformatted=\"true\">{}</parameterizedString>\
             </step>",
            index + 1,
            escape_xml(step),
            escape_xml(expected)
        ));
    }
    xml.push_str("</steps>");
    xml
}

impl NewTestCase {
    /// Patch document for creating the test case.
    pub fn to_patch(&self) -> Vec<crate::patch::PatchOperation> {
        let mut fields = vec![FieldUpdate::new("System.Title", self.title.as_str())];
        if let Some(steps) = self.steps.as_deref().filter(|s| !s.trim().is_empty()) {
            fields.push(FieldUpdate::new("Microsoft.VSTS.TCM.Steps", steps_to_xml(steps)));
        }
        if let Some(priority) = self.priority {
            fields.push(FieldUpdate::new("Microsoft.VSTS.Common.Priority", Value::from(priority)));
        }
        if let Some(area) = &self.area_path {
            fields.push(FieldUpdate::new("System.AreaPath", area.as_str()));
        }
        if let Some(iteration) = &self.iteration_path {
            fields.push(FieldUpdate::new("System.IterationPath", iteration.as_str()));
        }
        build_field_patch(&fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_to_xml() {
        let xml = steps_to_xml("1. Open app|App opens\n\n2. Click <Login>");
        assert_eq!(
            xml,
            "<steps id=\"0\" last=\"2\">\
             <step id=\"1\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">Open app</parameterizedString>\
             <parameterizedString isformatted=\"true\">App opens</parameterizedString>\
             </step>\
             <step id=\"2\" type=\"ActionStep\">\
             <parameterizedString isformatted=\"true\">Click &lt;Login&gt;</parameterizedString>\
             <parameterizedString isformatted=\"true\">Verify step completes successfully</parameterizedString>\
             </step></steps>"
        );
    }

    #[test]
    fn test_unnumbered_step_kept() {
        let xml = steps_to_xml("Press 'Save' & exit");
        assert!(xml.contains(">Press &apos;Save&apos; &amp; exit<"));
    }

    #[test]
    fn test_strip_step_number() {
        assert_eq!(strip_step_number("12. Run"), "Run");
        assert_eq!(strip_step_number("2024 release"), "2024 release");
        assert_eq!(strip_step_number("3."), "3.");
    }

    #[test]
    fn test_patch_skips_blank_paths() {
        let case = NewTestCase {
            title: "Login works".into(),
            steps: Some("1. Open|Opens".into()),
            priority: Some(2),
            area_path: Some("".into()),
            iteration_path: Some("Contoso\\Sprint 1".into()),
        };
        let paths: Vec<String> = case.to_patch().into_iter().map(|op| op.path).collect();
        assert_eq!(
            paths,
            vec![
                "/fields/System.Title",
                "/fields/Microsoft.VSTS.TCM.Steps",
                "/fields/Microsoft.VSTS.Common.Priority",
                "/fields/System.IterationPath"
            ]
        );
    }
}
