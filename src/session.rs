//! Per-user progression state and the process-wide session store.
//!
//! The store hands out one `Arc<Mutex<Session>>` per user: two concurrent
//! actions from the same user serialize on that mutex, while actions from
//! different users never contend on anything but the store map itself.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};

use crate::domain::{LangCode, LanguageLevel, XP_PER_LEVEL};

pub const DEFAULT_LEARNING_LANGUAGE: &str = "English";

/// Mutable progress record for one user.
#[derive(Clone, Debug)]
pub struct Session {
  pub native_lang: Option<LangCode>,
  pub learning_lang: String,
  /// 0 = quest not started; increments only on full mission completion.
  pub mission: u32,
  /// 1-based stage index. May exceed the stage count only transiently as the
  /// mission-complete signal.
  pub stage: u32,
  pub xp: u32,
  pub level: LanguageLevel,
}

impl Session {
  pub fn new() -> Self {
    Self {
      native_lang: None,
      learning_lang: DEFAULT_LEARNING_LANGUAGE.into(),
      mission: 0,
      stage: 1,
      xp: 0,
      level: LanguageLevel::A1,
    }
  }

  /// Set (or explicitly reset) the native language and enter the quest at
  /// mission 1, stage 1. XP and level survive a reset.
  pub fn select_language(&mut self, lang: LangCode) {
    self.native_lang = Some(lang);
    self.mission = 1;
    self.stage = 1;
  }

  /// Add XP and advance the level ladder as thresholds are crossed.
  /// XP is monotonically non-decreasing; there is no XP removal.
  pub fn award_xp(&mut self, gained: u32) {
    self.xp += gained;
    while self.xp >= (self.level.index() + 1) * XP_PER_LEVEL {
      match self.level.next() {
        Some(next) => self.level = next,
        None => break,
      }
    }
  }

  /// Read-only projection used by progress queries.
  pub fn xp_to_next(&self) -> u32 {
    ((self.level.index() + 1) * XP_PER_LEVEL).saturating_sub(self.xp)
  }
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

/// Process-wide session store keyed by user id. Created at startup and
/// injected explicitly; state is volatile across restarts.
#[derive(Clone, Default)]
pub struct SessionStore {
  inner: Arc<RwLock<HashMap<i64, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get-or-create the handle for a user. Callers hold the returned mutex for
  /// the whole action so same-user actions process sequentially.
  pub async fn session(&self, user_id: i64) -> Arc<Mutex<Session>> {
    if let Some(handle) = self.inner.read().await.get(&user_id) {
      return handle.clone();
    }
    let mut map = self.inner.write().await;
    map
      .entry(user_id)
      .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
      .clone()
  }
}
