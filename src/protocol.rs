//! Public protocol structs for the HTTP transport boundary (serde ready), and
//! the single serialization boundary for option callback tokens.
//! Keep this small and stable to evolve backend and clients independently.

use serde::{Deserialize, Serialize};

use crate::domain::LangCode;
use crate::engine::{Action, Outcome, ProgressReport, StagePrompt};
use crate::messages::Messages;
use crate::util::fill_template;

/// Inbound action envelope.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub action: ActionIn,
}

/// Wire form of a user action.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionIn {
    SelectNativeLanguage {
        code: LangCode,
    },
    SelectOption {
        #[serde(rename = "callbackToken")]
        callback_token: String,
    },
    FreeText {
        text: String,
    },
}

/// The structured payload behind an option button. Encoding and decoding
/// happen only here; nothing else splits token strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackToken {
    #[serde(rename = "stageIndex")]
    pub stage_index: u32,
    #[serde(rename = "optionIndex")]
    pub option_index: usize,
}

pub fn encode_token(token: &CallbackToken) -> String {
    // Infallible for this shape.
    serde_json::to_string(token).unwrap_or_default()
}

pub fn decode_token(raw: &str) -> Result<CallbackToken, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid callback token: {}", e))
}

/// Decode the wire action into the engine's action type.
pub fn to_action(incoming: ActionIn) -> Result<Action, String> {
    Ok(match incoming {
        ActionIn::SelectNativeLanguage { code } => Action::SelectNativeLanguage(code),
        ActionIn::SelectOption { callback_token } => {
            let token = decode_token(&callback_token)?;
            Action::SelectOption {
                stage_index: token.stage_index,
                option_index: token.option_index,
            }
        }
        ActionIn::FreeText { text } => Action::FreeText(text),
    })
}

/// Outbound reply: display text, optional buttons, terminal flag.
#[derive(Debug, Serialize)]
pub struct ReplyOut {
    #[serde(rename = "displayText")]
    pub display_text: String,
    pub options: Vec<ReplyOption>,
    #[serde(rename = "isTerminal")]
    pub is_terminal: bool,
}

#[derive(Debug, Serialize)]
pub struct ReplyOption {
    pub label: String,
    #[serde(rename = "callbackToken")]
    pub callback_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    #[serde(rename = "displayText")]
    pub display_text: String,
    pub level: String,
    pub xp: u32,
    #[serde(rename = "xpToNext")]
    pub xp_to_next: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

fn prompt_options(prompt: &StagePrompt) -> Vec<ReplyOption> {
    prompt
        .options
        .iter()
        .map(|o| ReplyOption {
            label: o.label.clone(),
            callback_token: encode_token(&CallbackToken {
                stage_index: o.stage_index,
                option_index: o.option_index,
            }),
        })
        .collect()
}

/// Render a structured outcome into the transport reply. `lang` is the
/// session's language when known; guard messages fall back to English.
pub fn to_reply(outcome: &Outcome, messages: &Messages, lang: Option<LangCode>) -> ReplyOut {
    let lang = lang.unwrap_or(LangCode::En);
    match outcome {
        Outcome::LanguageSet { lang: set, prompt } => {
            let header = fill_template(
                messages.lang_set.get(*set),
                &[("lang", set.display_name())],
            );
            ReplyOut {
                display_text: format!("{}\n\n{}", header, prompt.text),
                options: prompt_options(prompt),
                is_terminal: false,
            }
        }
        Outcome::MissionStarted { mission, prompt } => {
            let header = fill_template(
                messages.mission_started.get(lang),
                &[("mission", &mission.to_string())],
            );
            ReplyOut {
                display_text: format!("{}\n\n{}", header, prompt.text),
                options: prompt_options(prompt),
                is_terminal: false,
            }
        }
        Outcome::Advanced {
            feedback,
            explanation,
            xp_gained,
            pre_stage_hint,
            prompt,
        } => {
            let mut lines = vec![feedback.clone()];
            if let Some(explanation) = explanation {
                lines.push(explanation.clone());
            }
            lines.push(fill_template(
                messages.xp_gain.get(lang),
                &[("xp", &xp_gained.to_string())],
            ));
            if let Some(hint) = pre_stage_hint {
                lines.push(format!("\n{}", hint));
            }
            lines.push(format!("\n{}", prompt.text));
            ReplyOut {
                display_text: lines.join("\n"),
                options: prompt_options(prompt),
                is_terminal: false,
            }
        }
        Outcome::MissionComplete {
            feedback,
            explanation,
            xp_gained,
        } => {
            let mut lines = vec![feedback.clone()];
            if let Some(explanation) = explanation {
                lines.push(explanation.clone());
            }
            lines.push(fill_template(
                messages.xp_gain.get(lang),
                &[("xp", &xp_gained.to_string())],
            ));
            lines.push(format!("\n{}", messages.completed_all.get(lang)));
            ReplyOut {
                display_text: lines.join("\n"),
                options: Vec::new(),
                is_terminal: true,
            }
        }
        Outcome::Retry {
            feedback,
            explanation,
        } => {
            let mut lines = vec![feedback.clone()];
            if let Some(explanation) = explanation {
                lines.push(explanation.clone());
            }
            ReplyOut {
                display_text: lines.join("\n"),
                options: Vec::new(),
                is_terminal: false,
            }
        }
        Outcome::NeedsLanguageSelection => ReplyOut {
            display_text: messages.no_lang.get(lang).to_string(),
            options: Vec::new(),
            is_terminal: false,
        },
        Outcome::AllMissionsComplete => ReplyOut {
            display_text: messages.completed_all.get(lang).to_string(),
            options: Vec::new(),
            is_terminal: true,
        },
        Outcome::WrongInputType => ReplyOut {
            display_text: messages.wrong_input_type.get(lang).to_string(),
            options: Vec::new(),
            is_terminal: false,
        },
        Outcome::StaleStage => ReplyOut {
            display_text: messages.stale_stage.get(lang).to_string(),
            options: Vec::new(),
            is_terminal: false,
        },
    }
}

pub fn to_progress_out(report: &ProgressReport, messages: &Messages) -> ProgressOut {
    let display_text = match report.lang {
        Some(lang) => fill_template(
            messages.progress.get(lang),
            &[
                ("level", &report.level),
                ("xp", &report.xp.to_string()),
                ("xp_to_next", &report.xp_to_next.to_string()),
            ],
        ),
        None => messages.no_lang.get(LangCode::En).to_string(),
    };
    ProgressOut {
        display_text,
        level: report.level.clone(),
        xp: report.xp,
        xp_to_next: report.xp_to_next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_token_round_trips() {
        let token = CallbackToken {
            stage_index: 4,
            option_index: 2,
        };
        let encoded = encode_token(&token);
        assert_eq!(decode_token(&encoded).unwrap(), token);
        assert!(decode_token("answer_4_2").is_err());
    }

    #[test]
    fn guard_outcomes_render_localized_terminal_flags() {
        let messages = Messages::default();
        let done = to_reply(&Outcome::AllMissionsComplete, &messages, Some(LangCode::Ru));
        assert!(done.is_terminal);
        assert!(done.display_text.contains("Поздравляем"));

        let guard = to_reply(&Outcome::NeedsLanguageSelection, &messages, None);
        assert!(!guard.is_terminal);
        assert_eq!(guard.display_text, "Please select your native language first.");
    }

    #[test]
    fn wire_action_decodes_through_the_token_boundary() {
        let incoming = ActionIn::SelectOption {
            callback_token: r#"{"stageIndex":2,"optionIndex":1}"#.into(),
        };
        let action = to_action(incoming).unwrap();
        assert!(matches!(
            action,
            Action::SelectOption {
                stage_index: 2,
                option_index: 1
            }
        ));
    }
}
