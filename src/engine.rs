//! Progression engine: the per-user state machine. Applies guard checks,
//! asks the verifier to grade the submission, mutates the session under its
//! per-user lock, and returns a structured outcome for the transport adapter
//! to render.
//!
//! The session lock is held for the whole action, so two concurrent actions
//! from one user process sequentially and never lose an xp/stage update.

use tracing::{info, instrument};

use crate::domain::{LangCode, Mission, Stage, StageInput, Verdict};
use crate::error::EngineError;
use crate::session::Session;
use crate::state::AppState;
use crate::verifier::{verify_choice, verify_free_text};

/// Inbound user action, already decoded from the transport payload.
#[derive(Clone, Debug)]
pub enum Action {
  SelectNativeLanguage(LangCode),
  SelectOption { stage_index: u32, option_index: usize },
  FreeText(String),
}

/// A stage prompt ready for display: translated NPC line plus, for choice
/// stages, the option labels with their structured callback payloads.
#[derive(Clone, Debug)]
pub struct StagePrompt {
  pub text: String,
  pub options: Vec<PromptOption>,
}

#[derive(Clone, Debug)]
pub struct PromptOption {
  pub label: String,
  pub stage_index: u32,
  pub option_index: usize,
}

/// Structured result of one action, rendered to a transport reply by the
/// protocol layer.
#[derive(Clone, Debug)]
pub enum Outcome {
  /// Language chosen (first time or explicit reset); carries stage 1's prompt.
  LanguageSet { lang: LangCode, prompt: StagePrompt },
  /// A completed mission was acknowledged and the next one begins.
  MissionStarted { mission: u32, prompt: StagePrompt },
  /// Correct answer, more stages remain.
  Advanced {
    feedback: String,
    explanation: Option<String>,
    xp_gained: u32,
    pre_stage_hint: Option<String>,
    prompt: StagePrompt,
  },
  /// Correct answer on the final stage. The mission counter advances on the
  /// next inbound action, not here.
  MissionComplete {
    feedback: String,
    explanation: Option<String>,
    xp_gained: u32,
  },
  /// Incorrect answer; no state was mutated.
  Retry {
    feedback: String,
    explanation: Option<String>,
  },
  // Guard outcomes: emitted without invoking the verifier at all.
  NeedsLanguageSelection,
  AllMissionsComplete,
  WrongInputType,
  StaleStage,
}

/// Read-only progress projection for display queries.
#[derive(Clone, Debug)]
pub struct ProgressReport {
  pub lang: Option<LangCode>,
  pub level: String,
  pub xp: u32,
  pub xp_to_next: u32,
}

enum Submission {
  Option { stage_index: u32, option_index: usize },
  Text(String),
}

/// Entry point for every inbound action.
#[instrument(level = "info", skip(state, action))]
pub async fn handle_action(
  state: &AppState,
  user_id: i64,
  action: Action,
) -> Result<Outcome, EngineError> {
  let handle = state.sessions.session(user_id).await;
  let mut session = handle.lock().await;

  match action {
    Action::SelectNativeLanguage(code) => select_language(state, &mut session, code).await,
    Action::SelectOption {
      stage_index,
      option_index,
    } => {
      submit(
        state,
        &mut session,
        Submission::Option {
          stage_index,
          option_index,
        },
      )
      .await
    }
    Action::FreeText(text) => submit(state, &mut session, Submission::Text(text)).await,
  }
}

/// Progress query; never mutates the session.
pub async fn progress(state: &AppState, user_id: i64) -> ProgressReport {
  let handle = state.sessions.session(user_id).await;
  let session = handle.lock().await;
  ProgressReport {
    lang: session.native_lang,
    level: session.level.to_string(),
    xp: session.xp,
    xp_to_next: session.xp_to_next(),
  }
}

async fn select_language(
  state: &AppState,
  session: &mut Session,
  code: LangCode,
) -> Result<Outcome, EngineError> {
  session.select_language(code);
  info!(target: "mission", lang = %code, "Native language selected; entering mission 1");

  let mission = current_mission(state, session)?;
  let stage = mission.stage_at(session.mission, session.stage)?;
  let prompt = render_stage_prompt(state, stage, session.stage, code).await;
  Ok(Outcome::LanguageSet { lang: code, prompt })
}

async fn submit(
  state: &AppState,
  session: &mut Session,
  submission: Submission,
) -> Result<Outcome, EngineError> {
  let Some(lang) = session.native_lang else {
    return Ok(Outcome::NeedsLanguageSelection);
  };
  if session.mission == 0 {
    return Ok(Outcome::NeedsLanguageSelection);
  }

  // Deferred mission advance: a stage index past the end is the terminal
  // signal left by the previous (completing) action.
  if let Some(mission) = state.catalog.mission(session.mission) {
    if session.stage > mission.stage_count() {
      session.mission += 1;
      session.stage = 1;
      info!(target: "mission", mission = session.mission, "Mission counter advanced");
      match state.catalog.mission(session.mission) {
        None => return Ok(Outcome::AllMissionsComplete),
        Some(next) => {
          let stage = next.stage_at(session.mission, 1)?;
          let prompt = render_stage_prompt(state, stage, 1, lang).await;
          return Ok(Outcome::MissionStarted {
            mission: session.mission,
            prompt,
          });
        }
      }
    }
  } else {
    return Ok(Outcome::AllMissionsComplete);
  }

  let mission = current_mission(state, session)?;
  let stage_no = session.stage;
  let stage = mission.stage_at(session.mission, stage_no)?;

  let verdict = match submission {
    Submission::Option {
      stage_index,
      option_index,
    } => {
      if stage_index != stage_no {
        return Ok(Outcome::StaleStage);
      }
      match &stage.input {
        StageInput::MultipleChoice { options } => {
          verify_choice(options, option_index, stage, &state.messages, lang)?
        }
        StageInput::FreeText { .. } => return Ok(Outcome::WrongInputType),
      }
    }
    Submission::Text(text) => match &stage.input {
      StageInput::FreeText { grading } => {
        verify_free_text(
          &state.governor,
          &state.prompts,
          grading,
          &text,
          &session.learning_lang,
          &state.messages,
          lang,
        )
        .await
      }
      StageInput::MultipleChoice { .. } => return Ok(Outcome::WrongInputType),
    },
  };

  apply_verdict(state, session, mission, verdict, lang).await
}

async fn apply_verdict(
  state: &AppState,
  session: &mut Session,
  mission: &Mission,
  verdict: Verdict,
  lang: LangCode,
) -> Result<Outcome, EngineError> {
  let Verdict {
    correct,
    feedback,
    explanation,
    ..
  } = verdict;

  if !correct {
    return Ok(Outcome::Retry {
      feedback,
      explanation,
    });
  }

  let gained = mission.xp_per_stage();
  session.award_xp(gained);
  session.stage += 1;
  info!(target: "mission", mission = session.mission, stage = session.stage, xp = session.xp, level = %session.level, "Stage cleared");

  if session.stage > mission.stage_count() {
    return Ok(Outcome::MissionComplete {
      feedback,
      explanation,
      xp_gained: gained,
    });
  }

  let next = mission.stage_at(session.mission, session.stage)?;
  let pre_stage_hint = match &next.pre_stage_hint {
    Some(hint) => Some(state.governor.translate(&state.prompts, hint, lang).await),
    None => None,
  };
  let prompt = render_stage_prompt(state, next, session.stage, lang).await;
  Ok(Outcome::Advanced {
    feedback,
    explanation,
    xp_gained: gained,
    pre_stage_hint,
    prompt,
  })
}

fn current_mission<'a>(state: &'a AppState, session: &Session) -> Result<&'a Mission, EngineError> {
  state
    .catalog
    .mission(session.mission)
    .ok_or(EngineError::MissionOutOfRange {
      mission: session.mission,
      count: state.catalog.mission_count(),
    })
}

async fn render_stage_prompt(
  state: &AppState,
  stage: &Stage,
  stage_index: u32,
  lang: LangCode,
) -> StagePrompt {
  let text = state.governor.translate(&state.prompts, &stage.npc_text, lang).await;
  let options = match &stage.input {
    StageInput::MultipleChoice { options } => options
      .iter()
      .enumerate()
      .map(|(i, o)| PromptOption {
        label: o.text.clone(),
        stage_index,
        option_index: i,
      })
      .collect(),
    StageInput::FreeText { .. } => Vec::new(),
  };
  StagePrompt { text, options }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::MissionCatalog;
  use crate::config::Prompts;
  use crate::error::BackendError;
  use crate::governor::{CallGovernor, GenerativeBackend, OfflineBackend};
  use crate::messages::Messages;
  use crate::seeds::seed_mission;
  use crate::session::SessionStore;
  use async_trait::async_trait;
  use std::sync::Arc;
  use std::time::Duration;

  /// Grades every free-text answer as correct.
  struct AlwaysCorrect;

  #[async_trait]
  impl GenerativeBackend for AlwaysCorrect {
    async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
      Ok(r#"{"correct": true, "feedback": "Well done"}"#.into())
    }
  }

  fn test_state(backend: Arc<dyn GenerativeBackend>) -> AppState {
    AppState {
      catalog: Arc::new(MissionCatalog::from_missions(vec![seed_mission()]).unwrap()),
      sessions: SessionStore::new(),
      governor: Arc::new(CallGovernor::new(backend, Duration::ZERO)),
      prompts: Prompts::default(),
      messages: Messages::default(),
    }
  }

  fn correct_option_of(stage: &Stage) -> usize {
    match &stage.input {
      StageInput::MultipleChoice { options } => {
        options.iter().position(|o| o.correct).expect("has a correct option")
      }
      StageInput::FreeText { .. } => panic!("not a choice stage"),
    }
  }

  async fn answer_current_stage_correctly(state: &AppState, user_id: i64) -> Outcome {
    let handle = state.sessions.session(user_id).await;
    let (stage_no, is_choice) = {
      let s = handle.lock().await;
      let mission = state.catalog.mission(s.mission).unwrap();
      let stage = mission.stage_at(s.mission, s.stage).unwrap();
      (s.stage, matches!(stage.input, StageInput::MultipleChoice { .. }))
    };
    let action = if is_choice {
      let mission = state.catalog.mission(1).unwrap();
      let stage = mission.stage_at(1, stage_no).unwrap();
      Action::SelectOption {
        stage_index: stage_no,
        option_index: correct_option_of(stage),
      }
    } else {
      Action::FreeText("He wants milk, please.".into())
    };
    handle_action(state, user_id, action).await.unwrap()
  }

  #[tokio::test]
  async fn scenario_a_fresh_session_selects_russian() {
    let state = test_state(Arc::new(OfflineBackend));
    let out = handle_action(&state, 7, Action::SelectNativeLanguage(LangCode::Ru))
      .await
      .unwrap();
    assert!(matches!(out, Outcome::LanguageSet { lang: LangCode::Ru, .. }));

    let handle = state.sessions.session(7).await;
    let s = handle.lock().await;
    assert_eq!((s.mission, s.stage, s.xp), (1, 1, 0));
  }

  #[tokio::test]
  async fn scenario_b_mid_mission_correct_answer_advances() {
    let state = test_state(Arc::new(AlwaysCorrect));
    handle_action(&state, 1, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();
    {
      let handle = state.sessions.session(1).await;
      let mut s = handle.lock().await;
      s.stage = 3; // free-text stage of the 5-stage, 50 XP seed mission
    }

    let out = handle_action(&state, 1, Action::FreeText("He wants milk, please.".into()))
      .await
      .unwrap();
    let Outcome::Advanced {
      xp_gained, prompt, ..
    } = out
    else {
      panic!("expected Advanced");
    };
    assert_eq!(xp_gained, 10);
    // Stage 4's prompt rides along (offline translation serves the original).
    assert_eq!(prompt.text, "Waiter: Anything else for you two?");
    assert!(!prompt.options.is_empty());

    let handle = state.sessions.session(1).await;
    let s = handle.lock().await;
    assert_eq!((s.stage, s.xp), (4, 10));
  }

  #[tokio::test]
  async fn scenario_c_final_stage_completes_then_guards() {
    let state = test_state(Arc::new(AlwaysCorrect));
    handle_action(&state, 2, Action::SelectNativeLanguage(LangCode::Kz))
      .await
      .unwrap();
    {
      let handle = state.sessions.session(2).await;
      let mut s = handle.lock().await;
      s.stage = 5;
    }

    let out = handle_action(&state, 2, Action::FreeText("I will pay by card.".into()))
      .await
      .unwrap();
    assert!(matches!(out, Outcome::MissionComplete { xp_gained: 10, .. }));
    {
      let handle = state.sessions.session(2).await;
      let s = handle.lock().await;
      // Terminal signal: stage past the end, mission not yet advanced.
      assert_eq!((s.mission, s.stage), (1, 6));
    }

    let out = handle_action(&state, 2, Action::FreeText("hello?".into()))
      .await
      .unwrap();
    assert!(matches!(out, Outcome::AllMissionsComplete));
    let handle = state.sessions.session(2).await;
    let s = handle.lock().await;
    assert_eq!((s.mission, s.stage), (2, 1));
  }

  #[tokio::test]
  async fn full_mission_run_keeps_xp_monotonic() {
    let state = test_state(Arc::new(AlwaysCorrect));
    handle_action(&state, 3, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();

    let mut last_xp = 0;
    for _ in 0..5 {
      answer_current_stage_correctly(&state, 3).await;
      let handle = state.sessions.session(3).await;
      let s = handle.lock().await;
      assert!(s.xp >= last_xp);
      last_xp = s.xp;
    }
    let handle = state.sessions.session(3).await;
    let s = handle.lock().await;
    assert_eq!(s.xp, 50);
    // 50 XP crosses the 10/20/30/40/50 thresholds up to C2.
    assert_eq!(s.level.to_string(), "C2");
  }

  #[tokio::test]
  async fn submissions_without_language_are_guarded() {
    let state = test_state(Arc::new(OfflineBackend));
    let out = handle_action(&state, 4, Action::FreeText("hi".into())).await.unwrap();
    assert!(matches!(out, Outcome::NeedsLanguageSelection));
  }

  #[tokio::test]
  async fn modality_mismatch_is_guarded_without_grading() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 5, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();

    // Stage 1 is a choice stage; free text must not reach the verifier.
    let out = handle_action(&state, 5, Action::FreeText("I am fine".into()))
      .await
      .unwrap();
    assert!(matches!(out, Outcome::WrongInputType));

    // And an option against the free-text stage 3 is equally rejected.
    {
      let handle = state.sessions.session(5).await;
      handle.lock().await.stage = 3;
    }
    let out = handle_action(
      &state,
      5,
      Action::SelectOption {
        stage_index: 3,
        option_index: 0,
      },
    )
    .await
    .unwrap();
    assert!(matches!(out, Outcome::WrongInputType));
  }

  #[tokio::test]
  async fn stale_option_submission_is_guarded() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 6, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();
    let out = handle_action(
      &state,
      6,
      Action::SelectOption {
        stage_index: 2,
        option_index: 0,
      },
    )
    .await
    .unwrap();
    assert!(matches!(out, Outcome::StaleStage));
  }

  #[tokio::test]
  async fn incorrect_answer_leaves_state_untouched() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 8, Action::SelectNativeLanguage(LangCode::Ru))
      .await
      .unwrap();
    let out = handle_action(
      &state,
      8,
      Action::SelectOption {
        stage_index: 1,
        option_index: 0, // "Me is fine." is wrong
      },
    )
    .await
    .unwrap();
    let Outcome::Retry {
      feedback,
      explanation,
    } = out
    else {
      panic!("expected Retry");
    };
    assert_eq!(feedback, "Неправильно. Попробуйте еще раз.");
    assert!(explanation.is_some());

    let handle = state.sessions.session(8).await;
    let s = handle.lock().await;
    assert_eq!((s.stage, s.xp), (1, 0));
  }

  #[tokio::test]
  async fn pre_stage_hint_is_emitted_from_content() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 9, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();
    {
      let handle = state.sessions.session(9).await;
      handle.lock().await.stage = 2;
    }
    // Clearing stage 2 presents stage 3, which carries the scripted hint.
    let mission = state.catalog.mission(1).unwrap();
    let stage2 = mission.stage_at(1, 2).unwrap();
    let out = handle_action(
      &state,
      9,
      Action::SelectOption {
        stage_index: 2,
        option_index: correct_option_of(stage2),
      },
    )
    .await
    .unwrap();
    let Outcome::Advanced { pre_stage_hint, .. } = out else {
      panic!("expected Advanced");
    };
    assert_eq!(pre_stage_hint.as_deref(), Some("(Tom answered: I want milk)"));
  }

  #[tokio::test]
  async fn grading_failure_degrades_to_retry_not_error() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 10, Action::SelectNativeLanguage(LangCode::Kz))
      .await
      .unwrap();
    {
      let handle = state.sessions.session(10).await;
      handle.lock().await.stage = 3;
    }
    let out = handle_action(&state, 10, Action::FreeText("He wants milk.".into()))
      .await
      .unwrap();
    let Outcome::Retry { feedback, .. } = out else {
      panic!("expected Retry");
    };
    assert_eq!(feedback, "Сіздің жауабыңыз дұрыс емес. Қайтадан көріңіз.");
  }

  #[tokio::test]
  async fn option_index_out_of_range_reports_contract_violation() {
    let state = test_state(Arc::new(OfflineBackend));
    handle_action(&state, 11, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();
    let err = handle_action(
      &state,
      11,
      Action::SelectOption {
        stage_index: 1,
        option_index: 42,
      },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::OptionOutOfRange { .. }));
  }

  #[tokio::test]
  async fn progress_reports_projection() {
    let state = test_state(Arc::new(OfflineBackend));
    let fresh = progress(&state, 12).await;
    assert_eq!(fresh.lang, None);
    assert_eq!((fresh.xp, fresh.xp_to_next), (0, 10));

    handle_action(&state, 12, Action::SelectNativeLanguage(LangCode::En))
      .await
      .unwrap();
    {
      let handle = state.sessions.session(12).await;
      handle.lock().await.award_xp(15);
    }
    let report = progress(&state, 12).await;
    assert_eq!(report.level, "A2");
    assert_eq!((report.xp, report.xp_to_next), (15, 5));
  }
}
