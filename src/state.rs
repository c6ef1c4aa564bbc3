//! Application state: mission catalog, session store, call governor, prompts,
//! and the localized message table.
//!
//! Everything is created once at startup and injected explicitly; there is no
//! ambient global state. Only malformed mission content is fatal here.

use std::{sync::Arc, time::Duration};

use tracing::{info, instrument};

use crate::catalog::MissionCatalog;
use crate::config::{load_app_config_from_env, Prompts};
use crate::error::ContentError;
use crate::governor::{CallGovernor, GenerativeBackend, OfflineBackend};
use crate::messages::Messages;
use crate::openai::OpenAI;
use crate::seeds::seed_mission;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<MissionCatalog>,
    pub sessions: SessionStore,
    pub governor: Arc<CallGovernor>,
    pub prompts: Prompts,
    pub messages: Messages,
}

impl AppState {
    /// Build state from env: load config, load/validate mission content,
    /// build the governor around the configured backend.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self, ContentError> {
        let cfg = load_app_config_from_env().unwrap_or_default();

        let catalog = match &cfg.missions_dir {
            Some(dir) => MissionCatalog::load_dir(dir)?,
            None => {
                info!(target: "mission", "No missions_dir configured; using built-in seed mission");
                MissionCatalog::from_missions(vec![seed_mission()])?
            }
        };
        info!(target: "mission", missions = catalog.mission_count(), "Mission catalog ready");

        let backend: Arc<dyn GenerativeBackend> = match OpenAI::from_env() {
            Some(client) => {
                info!(target: "lingoquest_backend", base_url = %client.base_url, model = %client.model, "Generative backend enabled");
                Arc::new(client)
            }
            None => {
                info!(target: "lingoquest_backend", "Generative backend disabled (no OPENAI_API_KEY); grading and translation degrade gracefully");
                Arc::new(OfflineBackend)
            }
        };
        let governor = Arc::new(CallGovernor::new(
            backend,
            Duration::from_secs(cfg.min_backend_interval_secs),
        ));

        Ok(Self {
            catalog: Arc::new(catalog),
            sessions: SessionStore::new(),
            governor,
            prompts: cfg.prompts,
            messages: cfg.messages,
        })
    }
}
