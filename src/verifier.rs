//! Answer verification: both input modalities normalize to one `Verdict`.
//!
//! Choice stages grade locally with zero backend calls. Free-text stages
//! build a structured grading prompt, submit it through the call governor,
//! and strict-parse the JSON reply; a backend failure or malformed reply is
//! absorbed into a localized wrong-answer verdict and never escapes as an
//! error.

use serde::Deserialize;
use tracing::{instrument, warn};

use crate::config::Prompts;
use crate::domain::{ChoiceOption, GradingSpec, LangCode, Stage, Verdict};
use crate::error::EngineError;
use crate::governor::CallGovernor;
use crate::messages::Messages;
use crate::util::{fill_template, strip_code_fences, trunc_for_log};

/// Shape the backend must return for free-text grading. `correct` and
/// `feedback` are required; the rest is advisory.
#[derive(Debug, Deserialize)]
struct GradeResponse {
  correct: bool,
  feedback: String,
  #[serde(default)]
  explanation: Option<String>,
  #[serde(default)]
  intent_match: bool,
  #[serde(default)]
  grammar_ok: bool,
  #[serde(default)]
  errors: Vec<String>,
}

/// Deterministic grading for a choice stage. An index outside the option list
/// is a contract violation, not a grading failure.
pub fn verify_choice(
  options: &[ChoiceOption],
  option_index: usize,
  stage: &Stage,
  messages: &Messages,
  lang: LangCode,
) -> Result<Verdict, EngineError> {
  let option = options.get(option_index).ok_or(EngineError::OptionOutOfRange {
    option: option_index,
    count: options.len(),
  })?;

  let feedback = if option.correct {
    messages.correct_answer.get(lang).to_string()
  } else {
    messages.incorrect_try_again.get(lang).to_string()
  };
  Ok(Verdict::deterministic(option.correct, feedback, stage.explanation.clone()))
}

/// Delegated grading for a free-text stage. Infallible by design: every
/// failure path collapses into the localized wrong-answer verdict.
#[instrument(level = "info", skip_all, fields(%lang, answer_len = answer.len()))]
pub async fn verify_free_text(
  governor: &CallGovernor,
  prompts: &Prompts,
  grading: &GradingSpec,
  answer: &str,
  learning_lang: &str,
  messages: &Messages,
  lang: LangCode,
) -> Verdict {
  let prompt = build_grading_prompt(prompts, grading, answer, learning_lang, lang);

  let raw = match governor.grade(&prompt).await {
    Ok(raw) => raw,
    Err(e) => {
      warn!(target: "mission", error = %e, "Grading call failed; falling back to wrong-answer verdict");
      return fallback_verdict(messages, lang);
    }
  };

  match serde_json::from_str::<GradeResponse>(strip_code_fences(&raw)) {
    Ok(resp) => Verdict {
      correct: resp.correct,
      feedback: resp.feedback,
      explanation: resp.explanation,
      intent_match: resp.intent_match,
      grammar_ok: resp.grammar_ok,
      errors: resp.errors,
    },
    Err(e) => {
      warn!(target: "mission", error = %e, raw = %trunc_for_log(&raw, 120), "Malformed grading response; falling back to wrong-answer verdict");
      fallback_verdict(messages, lang)
    }
  }
}

fn fallback_verdict(messages: &Messages, lang: LangCode) -> Verdict {
  Verdict {
    correct: false,
    feedback: messages.answer_incorrect.get(lang).to_string(),
    explanation: None,
    intent_match: false,
    grammar_ok: false,
    errors: vec!["grading_unavailable".into()],
  }
}

fn build_grading_prompt(
  prompts: &Prompts,
  grading: &GradingSpec,
  answer: &str,
  learning_lang: &str,
  lang: LangCode,
) -> String {
  fill_template(
    &prompts.grading_template,
    &[
      ("goal", grading.goal.as_str()),
      ("level", grading.level.as_str()),
      ("allowed_patterns", &grading.allowed_patterns.join("\n")),
      ("required_elements", &grading.required_elements.join(", ")),
      ("examples", &grading.examples.join("\n")),
      ("native_lang", lang.display_name()),
      ("learning_lang", learning_lang),
      ("user_text", answer),
    ],
  )
}
