//! Domain models used by the backend: languages, levels, missions, stages, and verdicts.

use serde::{Deserialize, Serialize};

/// XP required per level step (level index N is reached at N * XP_PER_LEVEL total XP).
pub const XP_PER_LEVEL: u32 = 10;

/// Native-language codes the UI can display. This is a closed set;
/// authored content is always in English (`En` is the canonical source).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangCode {
  En,
  Kz,
  Ru,
}

impl LangCode {
  pub fn display_name(self) -> &'static str {
    match self {
      LangCode::En => "English",
      LangCode::Kz => "Kazakh",
      LangCode::Ru => "Russian",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      LangCode::En => "en",
      LangCode::Kz => "kz",
      LangCode::Ru => "ru",
    }
  }
}

impl std::fmt::Display for LangCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// CEFR proficiency ladder. Ordered; `next` returns None at the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageLevel {
  A1,
  A2,
  B1,
  B2,
  C1,
  C2,
}

impl LanguageLevel {
  pub fn index(self) -> u32 {
    match self {
      LanguageLevel::A1 => 0,
      LanguageLevel::A2 => 1,
      LanguageLevel::B1 => 2,
      LanguageLevel::B2 => 3,
      LanguageLevel::C1 => 4,
      LanguageLevel::C2 => 5,
    }
  }

  pub fn next(self) -> Option<LanguageLevel> {
    match self {
      LanguageLevel::A1 => Some(LanguageLevel::A2),
      LanguageLevel::A2 => Some(LanguageLevel::B1),
      LanguageLevel::B1 => Some(LanguageLevel::B2),
      LanguageLevel::B2 => Some(LanguageLevel::C1),
      LanguageLevel::C1 => Some(LanguageLevel::C2),
      LanguageLevel::C2 => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      LanguageLevel::A1 => "A1",
      LanguageLevel::A2 => "A2",
      LanguageLevel::B1 => "B1",
      LanguageLevel::B2 => "B2",
      LanguageLevel::C1 => "C1",
      LanguageLevel::C2 => "C2",
    }
  }
}

impl std::fmt::Display for LanguageLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Default for LanguageLevel {
  fn default() -> Self {
    LanguageLevel::A1
  }
}

/// One selectable answer on a choice stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChoiceOption {
  pub text: String,
  #[serde(default)]
  pub correct: bool,
}

/// Grading context handed to the generative backend for free-text stages.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GradingSpec {
  #[serde(default)]
  pub goal: String,
  #[serde(default)]
  pub level: LanguageLevel,
  #[serde(default)]
  pub allowed_patterns: Vec<String>,
  #[serde(default)]
  pub required_elements: Vec<String>,
  #[serde(default)]
  pub examples: Vec<String>,
}

/// Input modality of a stage. Exactly one modality's fields is populated per
/// stage; the wire tags match the mission content format.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "input_type")]
pub enum StageInput {
  #[serde(rename = "inline_keyboard")]
  MultipleChoice { options: Vec<ChoiceOption> },
  #[serde(rename = "text_free")]
  FreeText {
    #[serde(flatten)]
    grading: GradingSpec,
  },
}

/// One scripted turn within a mission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stage {
  pub npc_text: String,
  #[serde(flatten)]
  pub input: StageInput,
  #[serde(default)]
  pub explanation: Option<String>,
  /// Scripted context line shown before this stage's prompt (content flavor,
  /// e.g. what an NPC answered in the previous turn).
  #[serde(default)]
  pub pre_stage_hint: Option<String>,
}

/// An ordered sequence of stages with one aggregate XP reward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mission {
  #[serde(default)]
  pub title: String,
  pub reward_xp: u32,
  pub stages: Vec<Stage>,
}

/// Normalized pass/fail-with-feedback result of grading an answer, regardless
/// of modality. The advisory fields come from free-text grading and are never
/// consulted by progression logic.
#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
  pub correct: bool,
  pub feedback: String,
  pub explanation: Option<String>,
  pub intent_match: bool,
  pub grammar_ok: bool,
  pub errors: Vec<String>,
}

impl Verdict {
  /// A plain deterministic verdict (choice stages).
  pub fn deterministic(correct: bool, feedback: String, explanation: Option<String>) -> Self {
    Self {
      correct,
      feedback,
      explanation,
      intent_match: correct,
      grammar_ok: correct,
      errors: Vec::new(),
    }
  }
}
