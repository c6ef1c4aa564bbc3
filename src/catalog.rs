//! Mission catalog: loads mission documents once, validates them up front,
//! and serves read-only stage access for the rest of the process lifetime.
//!
//! Mission documents are TOML, one mission per file:
//!
//! ```toml
//! title = "At the café"
//! reward_xp = 50
//!
//! [[stages]]
//! npc_text = "Tom: Hello!"
//! input_type = "inline_keyboard"
//! options = [{ text = "Hi!", correct = true }, { text = "Me hello.", correct = false }]
//! explanation = "A greeting is answered with a greeting."
//!
//! [[stages]]
//! npc_text = "Waiter: What does Tom want?"
//! input_type = "text_free"
//! goal = "Order milk in the third person"
//! level = "A1"
//! allowed_patterns = ["He wants + noun"]
//! required_elements = ["wants", "milk"]
//! examples = ["He wants milk, please."]
//! pre_stage_hint = "(Tom answered: I want milk)"
//! ```

use std::path::Path;

use tracing::{info, instrument};

use crate::domain::{Mission, Stage, StageInput};
use crate::error::{ContentError, EngineError};

/// Read-only, validated mission set. Missions are addressed 1-based, in the
/// order they were loaded; stage order within a mission is canonical and
/// never reordered at runtime.
#[derive(Debug)]
pub struct MissionCatalog {
  missions: Vec<Mission>,
}

impl MissionCatalog {
  /// Build a catalog from already-parsed missions, validating each.
  pub fn from_missions(missions: Vec<Mission>) -> Result<Self, ContentError> {
    if missions.is_empty() {
      return Err(ContentError::Invalid {
        mission: "catalog".into(),
        detail: "no missions loaded".into(),
      });
    }
    for (i, m) in missions.iter().enumerate() {
      validate_mission(&mission_name(i, m), m)?;
    }
    Ok(Self { missions })
  }

  /// Load every `*.toml` file in `dir` (sorted by file name) as one mission each.
  #[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display()))]
  pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ContentError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Read {
      path: dir.display().to_string(),
      source: e,
    })?;

    let mut paths: Vec<_> = entries
      .filter_map(|e| e.ok().map(|e| e.path()))
      .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
      .collect();
    paths.sort();

    let mut missions = Vec::new();
    for path in paths {
      let text = std::fs::read_to_string(&path).map_err(|e| ContentError::Read {
        path: path.display().to_string(),
        source: e,
      })?;
      let mission: Mission = toml::from_str(&text).map_err(|e| ContentError::Parse {
        path: path.display().to_string(),
        source: e,
      })?;
      info!(target: "mission", path = %path.display(), title = %mission.title, stages = mission.stages.len(), "Loaded mission");
      missions.push(mission);
    }
    Self::from_missions(missions)
  }

  /// 1-based mission lookup. None past the end of the catalog.
  pub fn mission(&self, number: u32) -> Option<&Mission> {
    if number == 0 {
      return None;
    }
    self.missions.get(number as usize - 1)
  }

  pub fn mission_count(&self) -> usize {
    self.missions.len()
  }
}

impl Mission {
  pub fn stage_count(&self) -> u32 {
    self.stages.len() as u32
  }

  /// 1-based stage access; indices outside `[1, stage_count]` are a contract
  /// violation, reported rather than clamped.
  pub fn stage_at(&self, mission_no: u32, stage: u32) -> Result<&Stage, EngineError> {
    if stage == 0 || stage > self.stage_count() {
      return Err(EngineError::StageOutOfRange {
        mission: mission_no,
        stage,
        count: self.stages.len(),
      });
    }
    Ok(&self.stages[stage as usize - 1])
  }

  /// Even split of the mission reward across its stages (integer division).
  pub fn xp_per_stage(&self) -> u32 {
    self.reward_xp / self.stage_count().max(1)
  }
}

fn mission_name(index: usize, m: &Mission) -> String {
  if m.title.is_empty() {
    format!("#{}", index + 1)
  } else {
    m.title.clone()
  }
}

fn validate_mission(name: &str, m: &Mission) -> Result<(), ContentError> {
  let invalid = |detail: String| ContentError::Invalid {
    mission: name.to_string(),
    detail,
  };

  if m.stages.is_empty() {
    return Err(invalid("stage list is empty".into()));
  }
  if m.reward_xp == 0 {
    return Err(invalid("reward_xp must be positive".into()));
  }

  for (i, stage) in m.stages.iter().enumerate() {
    if stage.npc_text.trim().is_empty() {
      return Err(invalid(format!("stage {} has empty npc_text", i + 1)));
    }
    match &stage.input {
      StageInput::MultipleChoice { options } => {
        if options.is_empty() {
          return Err(invalid(format!("stage {} has an empty option list", i + 1)));
        }
        if !options.iter().any(|o| o.correct) {
          return Err(invalid(format!("stage {} has no correct option", i + 1)));
        }
      }
      StageInput::FreeText { grading } => {
        if grading.goal.trim().is_empty() {
          return Err(invalid(format!("stage {} has no grading goal", i + 1)));
        }
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::seed_mission;

  #[test]
  fn seed_mission_passes_validation() {
    let catalog = MissionCatalog::from_missions(vec![seed_mission()]).expect("valid");
    assert_eq!(catalog.mission_count(), 1);
    assert!(catalog.mission(1).is_some());
    assert!(catalog.mission(0).is_none());
    assert!(catalog.mission(2).is_none());
  }

  #[test]
  fn empty_catalog_is_rejected() {
    assert!(MissionCatalog::from_missions(vec![]).is_err());
  }

  #[test]
  fn mission_without_correct_option_is_rejected() {
    let mut m = seed_mission();
    if let StageInput::MultipleChoice { options } = &mut m.stages[0].input {
      for o in options.iter_mut() {
        o.correct = false;
      }
    }
    let err = MissionCatalog::from_missions(vec![m]).unwrap_err();
    assert!(matches!(err, ContentError::Invalid { .. }));
  }

  #[test]
  fn stage_access_is_one_based_and_bounded() {
    let m = seed_mission();
    assert!(m.stage_at(1, 1).is_ok());
    assert!(m.stage_at(1, 5).is_ok());
    assert!(m.stage_at(1, 0).is_err());
    assert!(m.stage_at(1, 6).is_err());
  }

  #[test]
  fn mission_toml_round_trips_both_modalities() {
    let doc = r#"
title = "Test"
reward_xp = 20

[[stages]]
npc_text = "Pick one."
input_type = "inline_keyboard"
options = [{ text = "yes", correct = true }, { text = "no", correct = false }]

[[stages]]
npc_text = "Write it."
input_type = "text_free"
goal = "Say hello"
level = "A1"
allowed_patterns = ["Hello + name"]
required_elements = ["hello"]
examples = ["Hello, Tom!"]
pre_stage_hint = "(Tom waved first)"
"#;
    let mission: Mission = toml::from_str(doc).expect("parse");
    let catalog = MissionCatalog::from_missions(vec![mission]).expect("valid");
    let m = catalog.mission(1).unwrap();
    assert_eq!(m.xp_per_stage(), 10);
    assert!(matches!(
      m.stage_at(1, 1).unwrap().input,
      StageInput::MultipleChoice { .. }
    ));
    let s2 = m.stage_at(1, 2).unwrap();
    assert!(matches!(s2.input, StageInput::FreeText { .. }));
    assert_eq!(s2.pre_stage_hint.as_deref(), Some("(Tom waved first)"));
  }
}
