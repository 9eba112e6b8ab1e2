//! System prompt builder for intent resolution.

use crate::catalog::ActionDescriptor;

/// System prompt advertising the action surface. Providers with native
/// function calling also receive the structured schemas; the textual
/// reference keeps weaker providers honest about what exists.
pub fn intent_system_prompt(actions: &[ActionDescriptor]) -> String {
    format!(
        r#"You are a server management assistant. Translate the operator's request into
exactly one function call from the reference below, or answer in plain text if
no listed function applies.

## Rules
- Call a function ONLY when the request clearly maps to one.
- NEVER invent parameter values the operator did not provide.
- Do not ask for confirmation; dangerous operations are confirmed elsewhere.
- If nothing applies, reply briefly in plain text and make no call.

## Function Reference
{}"#,
        action_reference(actions)
    )
}

/// Render the catalog as a prompt-embeddable reference block.
fn action_reference(actions: &[ActionDescriptor]) -> String {
    let mut out = String::new();
    for action in actions {
        out.push_str(&format!("### {}\n", action.name));
        out.push_str(&format!("{}\n", action.description));
        out.push_str(&format!(
            "Input schema: {}\n\n",
            serde_json::to_string(&action.input_schema).unwrap_or_else(|_| "{}".to_string())
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCatalog;

    #[test]
    fn prompt_mentions_every_action() {
        let prompt = intent_system_prompt(&ActionCatalog::describe_all());
        assert!(prompt.contains("### list_channels"));
        assert!(prompt.contains("### ban_member"));
        assert!(prompt.contains("Input schema"));
    }
}
