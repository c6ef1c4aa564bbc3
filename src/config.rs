//! Loading app configuration (prompts, message overrides, governor interval,
//! mission content location) from TOML.
//!
//! See `AppConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::messages::Messages;

/// Prompt templates sent to the generative backend. Defaults are sensible for
/// English-learning quests; override them in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Free-text grading. Placeholders: {goal} {level} {allowed_patterns}
  /// {required_elements} {examples} {native_lang} {learning_lang} {user_text}.
  pub grading_template: String,
  /// Prompt translation. Placeholders: {language} {text}.
  pub translate_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      grading_template: "\
You are an English tutor inside a language learning game.

Mission goal: {goal}
Student level: {level}

Allowed sentence patterns:
{allowed_patterns}

Required elements:
{required_elements}

Examples of correct answers:
{examples}

Rules:
- Feedback and explanations must be written in this language: {native_lang}
- The user must answer ONLY in {learning_lang}
- Be strict but fair
- Accept small variations
- Return ONLY a valid JSON object, no extra text, no code blocks or markdown
- Provide detailed, educational feedback that explains the mistake, why it is \
incorrect, and how to correct it, including examples or tips

JSON format:
{\"correct\": true/false, \"intent_match\": true/false, \"grammar_ok\": true/false, \
\"errors\": [], \"feedback\": \"detailed explanation in the native language\"}

User input: \"{user_text}\""
        .into(),
      translate_template: "Translate the following English text to {language}. \
Return only the translated text, no explanations or alternatives: {text}"
        .into(),
    }
  }
}

/// Top-level TOML configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub prompts: Prompts,
  pub messages: Messages,
  /// Minimum spacing between outbound backend calls, process-wide.
  pub min_backend_interval_secs: u64,
  /// Directory of mission TOML files; the built-in seed mission is used when unset.
  pub missions_dir: Option<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      prompts: Prompts::default(),
      messages: Messages::default(),
      min_backend_interval_secs: 3,
      missions_dir: None,
    }
  }
}

/// Attempt to load `AppConfig` from QUEST_CONFIG_PATH. On any parsing/IO
/// error, returns None and the defaults apply.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("QUEST_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lingoquest_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lingoquest_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lingoquest_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
