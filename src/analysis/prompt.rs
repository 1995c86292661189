//! Prompt construction for log diagnosis.

use crate::extraction::patterns::Category;
use crate::storage::models::{char_prefix, IssueMetadata};

/// Longest snippet sent to the model, in characters.
pub const MAX_SNIPPET_CHARS: usize = 4000;

/// Appended to snippets cut at `MAX_SNIPPET_CHARS`.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

pub const MAX_PROMPT_ENTITIES: usize = 10;
pub const MAX_PROMPT_COMPONENTS: usize = 5;
pub const MAX_PROMPT_SERVICES: usize = 5;

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a Home Assistant expert assistant that analyzes logs and \
provides suggestions for fixes. You have deep knowledge of Home Assistant components, \
integrations, and common issues.";

const GUIDANCE: &str = "Common Home Assistant issues and their typical solutions:
1. Entity unavailable: Check entity configuration, verify the device is powered and connected, check network connectivity, or restart the integration.
2. Automation errors: Check for syntax errors, verify entity IDs exist, ensure conditions are valid, or check for timing issues.
3. Script errors: Verify service calls are valid, check entity IDs, or ensure required parameters are provided.
4. Configuration errors: Look for syntax errors in YAML, check indentation, verify required fields are present, or ensure values are in the correct format.
5. Integration errors: Check if the integration is properly configured, verify credentials, check network connectivity, or update the integration.";

const RESPONSE_INSTRUCTIONS: &str = "Provide a JSON response with the following fields:
1. \"suggested_fix\": A clear, concise, step-by-step suggestion on how to fix the issue
2. \"details\": Additional context or explanation about the issue, including potential causes
3. \"confidence\": A number from 0-100 indicating your confidence in this suggestion

Only respond with valid JSON. Do not include any other text.";

/// Cut a snippet to `MAX_SNIPPET_CHARS`, marking the cut.
pub fn truncate_snippet(snippet: &str) -> String {
    let prefix = char_prefix(snippet, MAX_SNIPPET_CHARS);
    if prefix.len() < snippet.len() {
        format!("{}{}", prefix, TRUNCATION_MARKER)
    } else {
        snippet.to_string()
    }
}

/// Render the capped metadata lists; empty when there is nothing to say.
pub fn format_context(metadata: Option<&IssueMetadata>) -> String {
    let metadata = match metadata {
        Some(m) => m,
        None => return String::new(),
    };

    let mut out = String::from("CONTEXT INFORMATION:\n");
    if !metadata.entities.is_empty() {
        out.push_str(&format!(
            "Entities mentioned: {}\n",
            capped(&metadata.entities, MAX_PROMPT_ENTITIES)
        ));
    }
    if !metadata.components.is_empty() {
        out.push_str(&format!(
            "Components/integrations involved: {}\n",
            capped(&metadata.components, MAX_PROMPT_COMPONENTS)
        ));
    }
    if !metadata.services.is_empty() {
        out.push_str(&format!(
            "Services mentioned: {}\n",
            capped(&metadata.services, MAX_PROMPT_SERVICES)
        ));
    }
    out.push('\n');
    out
}

fn capped(values: &[String], limit: usize) -> String {
    values
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the user prompt for one snippet.
pub fn build_prompt(snippet: &str, category: Category, metadata: Option<&IssueMetadata>) -> String {
    format!(
        "You are a Home Assistant expert assistant. Analyze the following log snippet that \
contains a potential {phrase} issue.\n\n\
{context}LOG SNIPPET:\n```\n{snippet}\n```\n\n\
Based on the log snippet, identify the specific issue and provide a practical solution.\n\n\
{guidance}\n\n\
{instructions}\n",
        phrase = category.phrase(),
        context = format_context(metadata),
        snippet = truncate_snippet(snippet),
        guidance = GUIDANCE,
        instructions = RESPONSE_INSTRUCTIONS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> IssueMetadata {
        IssueMetadata {
            category: Category::EntityUnavailable,
            entities: (0..12).map(|i| format!("light.lamp_{}", i)).collect(),
            components: vec!["hue".to_string()],
            services: Vec::new(),
        }
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("short"), "short");

        let long = "a".repeat(MAX_SNIPPET_CHARS + 10);
        let cut = truncate_snippet(&long);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(cut.len(), MAX_SNIPPET_CHARS + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_context_caps_lists() {
        let context = format_context(Some(&metadata()));
        assert!(context.starts_with("CONTEXT INFORMATION:\n"));
        assert!(context.contains("light.lamp_9"));
        assert!(!context.contains("light.lamp_10"));
        assert!(context.contains("Components/integrations involved: hue\n"));
        assert!(!context.contains("Services mentioned"));
    }

    #[test]
    fn test_context_absent() {
        assert_eq!(format_context(None), "");
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(
            "Entity light.kitchen is unavailable",
            Category::EntityUnavailable,
            Some(&metadata()),
        );
        assert!(prompt.contains("potential entity unavailable issue"));
        assert!(prompt.contains("LOG SNIPPET:\n```\nEntity light.kitchen is unavailable\n```"));
        assert!(prompt.contains("CONTEXT INFORMATION:"));
        assert!(prompt.contains("\"suggested_fix\""));
        assert!(prompt.contains("Only respond with valid JSON."));
    }
}
