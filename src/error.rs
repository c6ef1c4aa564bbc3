//! Error taxonomy. Only `ContentError` may be fatal (at startup); everything
//! else is recovered into a localized user-facing message before it reaches
//! the transport boundary.

use thiserror::Error;

/// Malformed mission content. Raised once at load time, never at runtime.
#[derive(Debug, Error)]
pub enum ContentError {
  #[error("failed to read mission file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse mission file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid mission {mission}: {detail}")]
  Invalid { mission: String, detail: String },
}

/// Contract violations inside the progression core. These indicate broken
/// transport wiring and are reported, never silently clamped.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("mission {mission} is out of range (catalog holds {count})")]
  MissionOutOfRange { mission: u32, count: usize },

  #[error("stage {stage} is out of range for mission {mission} ({count} stages)")]
  StageOutOfRange { mission: u32, stage: u32, count: usize },

  #[error("option {option} is out of range ({count} options)")]
  OptionOutOfRange { option: usize, count: usize },
}

/// Failures of the generative backend. `Unavailable` is the distinguished
/// quota/resource-exhaustion mode; callers degrade rather than surface it.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("backend quota exhausted")]
  Unavailable,

  #[error("backend call failed: {0}")]
  Failed(String),
}
