//! Call governor: every outbound call to the generative backend flows through
//! here. One process-wide pacing gate keeps successive call starts at least a
//! configured interval apart (the backend quota is shared across users), and
//! a process-lifetime cache memoizes prompt translations.
//!
//! Waiting on the gate blocks only the task issuing a call; cache hits bypass
//! the gate entirely.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, instrument, warn};

use crate::config::Prompts;
use crate::domain::LangCode;
use crate::error::BackendError;
use crate::util::{fill_template, strip_code_fences};

/// The generative backend boundary: a single opaque text-in/text-out
/// operation with a distinguished quota-exhaustion failure mode.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Stand-in used when no backend is configured. Grading then degrades to the
/// wrong-answer fallback and translation serves originals.
pub struct OfflineBackend;

#[async_trait]
impl GenerativeBackend for OfflineBackend {
  async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
    Err(BackendError::Unavailable)
  }
}

pub struct CallGovernor {
  backend: Arc<dyn GenerativeBackend>,
  min_interval: Duration,
  last_call: Mutex<Option<Instant>>,
  cache: RwLock<HashMap<(String, LangCode), String>>,
}

impl CallGovernor {
  pub fn new(backend: Arc<dyn GenerativeBackend>, min_interval: Duration) -> Self {
    Self {
      backend,
      min_interval,
      last_call: Mutex::new(None),
      cache: RwLock::new(HashMap::new()),
    }
  }

  /// Wait until the shared interval since the previous outbound call has
  /// elapsed, then claim the slot. The gate lock is held across the wait so
  /// concurrent callers serialize and each claims its own slot.
  async fn pace(&self) {
    let mut last = self.last_call.lock().await;
    if let Some(prev) = *last {
      let due = prev + self.min_interval;
      if Instant::now() < due {
        sleep_until(due).await;
      }
    }
    *last = Some(Instant::now());
  }

  /// Issue a grading call. Quota exhaustion surfaces as
  /// `BackendError::Unavailable` for the verifier to absorb.
  #[instrument(level = "debug", skip_all, fields(prompt_len = prompt.len()))]
  pub async fn grade(&self, prompt: &str) -> Result<String, BackendError> {
    self.pace().await;
    self.backend.generate(prompt).await
  }

  /// Best-effort translation of authored English text. Never fails: any
  /// backend error yields the original text, and failures never populate the
  /// cache (a served-original must not shadow future valid attempts).
  #[instrument(level = "debug", skip(self, prompts, text), fields(%lang, text_len = text.len()))]
  pub async fn translate(&self, prompts: &Prompts, text: &str, lang: LangCode) -> String {
    if lang == LangCode::En {
      return text.to_string();
    }

    let key = (text.to_string(), lang);
    if let Some(hit) = self.cache.read().await.get(&key) {
      debug!(target: "lingoquest_backend", %lang, "Translation cache hit");
      return hit.clone();
    }

    self.pace().await;
    let prompt = fill_template(
      &prompts.translate_template,
      &[("language", lang.display_name()), ("text", text)],
    );
    match self.backend.generate(&prompt).await {
      Ok(raw) => {
        let translated = strip_code_fences(&raw).trim().to_string();
        self.cache.write().await.insert(key, translated.clone());
        translated
      }
      Err(e) => {
        warn!(target: "lingoquest_backend", %lang, error = %e, "Translation failed; serving original text");
        text.to_string()
      }
    }
  }

  /// Read-only cache peek, mainly for tests and diagnostics.
  #[allow(dead_code)]
  pub async fn cached(&self, text: &str, lang: LangCode) -> Option<String> {
    self.cache.read().await.get(&(text.to_string(), lang)).cloned()
  }
}
