//! Prompt templates for Vidask.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom
//! prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answering questions about the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System instruction sent with every question.
    pub system: String,
    /// Framing applied to each chunk before it is embedded.
    /// Variables: `{{source}}`, `{{title}}`, `{{content}}`.
    pub document: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a personal assistant. Answer any questions I have about the Youtube Video provided.\n\
                     Translate in specific language if user asks you to\n"
                .to_string(),
            document: "Source: {{source}}, Title: {{title}} \n\nContent: {{content}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
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

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template: placeholders inside
    /// substituted values are left as they are, and unknown placeholders
    /// stay in the output.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let placeholder = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"));
        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
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

    /// The system instruction with custom variables applied.
    pub fn system_instruction(&self) -> String {
        self.render_with_custom(&self.rag.system, &HashMap::new())
    }
}
