//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! progression engine and render outcomes through the protocol layer.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::engine;
use crate::protocol::{to_action, to_progress_out, to_reply, ActionRequest, ErrorOut, HealthOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_post_action(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ActionRequest>,
) -> impl IntoResponse {
  let action = match to_action(body.action) {
    Ok(action) => action,
    Err(msg) => {
      return (StatusCode::BAD_REQUEST, Json(ErrorOut { message: msg })).into_response();
    }
  };

  match engine::handle_action(&state, body.user_id, action).await {
    Ok(outcome) => {
      let lang = {
        let handle = state.sessions.session(body.user_id).await;
        let session = handle.lock().await;
        session.native_lang
      };
      let reply = to_reply(&outcome, &state.messages, lang);
      info!(target: "mission", user_id = body.user_id, terminal = reply.is_terminal, "Action handled");
      Json(reply).into_response()
    }
    Err(e) => {
      // Contract violation: broken transport wiring, not a user mistake.
      error!(target: "mission", user_id = body.user_id, error = %e, "Action rejected");
      (
        StatusCode::BAD_REQUEST,
        Json(ErrorOut {
          message: e.to_string(),
        }),
      )
        .into_response()
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
  #[serde(rename = "userId")]
  pub user_id: i64,
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProgressQuery>,
) -> impl IntoResponse {
  let report = engine::progress(&state, q.user_id).await;
  Json(to_progress_out(&report, &state.messages))
}
