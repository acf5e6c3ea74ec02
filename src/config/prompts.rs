//! Prompt templates for vidchat.
//!
//! Prompts can be customized by placing a `chat.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the condense-question chat engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// System instruction sent with every completion request.
    pub system: String,
    /// Rewrites a follow-up into a standalone question.
    /// Variables: `{{chat_history}}`, `{{question}}`.
    pub condense: String,
    /// Answers the standalone question from retrieved passages.
    /// Variables: `{{context}}`, `{{question}}`.
    pub answer: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert on Avenza Maps software product and your job is to answer technical questions.
Do not answer the questions that are irrelevant to the information provided in the context. Keep your answers technical and based on facts - do not hallucinate features."#.to_string(),

            condense: r#"Given a conversation (between Human and Assistant) and a follow up message from Human, rewrite the message to be a standalone question that captures all relevant context from the conversation.

<Chat History>
{{chat_history}}

<Follow Up Message>
{{question}}

<Standalone question>"#.to_string(),

            answer: r#"Context information is below.
---------------------
{{context}}
---------------------
Given the context information and not prior knowledge, answer the query.
Query: {{question}}
Answer: "#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in a single pass; substituted text is never
    /// scanned again. Unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                result.push_str(&rest[open..]);
                return result;
            };
            let key = &after[..close];
            match vars.get(key) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(key);
                    result.push_str("}}");
                }
            }
            rest = &after[close + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.chat.system.contains("Avenza Maps"));
        assert!(prompts.chat.condense.contains("{{chat_history}}"));
        assert!(prompts.chat.answer.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "maps {{context}} please".to_string());
        vars.insert("context".to_string(), "passage quoting {{question}}".to_string());

        for _ in 0..20 {
            let result = Prompts::render("C: {{context}} Q: {{question}} {{unknown}} {{open", &vars);
            assert_eq!(
                result,
                "C: passage quoting {{question}} Q: maps {{context}} please {{unknown}} {{open"
            );
        }
    }

    #[test]
    fn test_custom_prompt_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chat.toml"),
            "system = \"You only talk about maps.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chat.system, "You only talk about maps.");
        // Fields missing from the file keep their defaults.
        assert!(prompts.chat.answer.contains("{{question}}"));
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("product".to_string(), "Avenza Maps".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is a PDF map?".to_string());

        let rendered = prompts.render_with_custom("{{product}}: {{question}}", &vars);
        assert_eq!(rendered, "Avenza Maps: What is a PDF map?");
    }
}
