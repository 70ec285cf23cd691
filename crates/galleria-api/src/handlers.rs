//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its inputs via axum extractors, composes the
//! session manager, message store, prompt assembler, completion
//! collaborator, and post-processor, and returns JSON responses.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use galleria_chat::{build_prompt, postprocess};
use galleria_core::types::{Role, Turn};
use galleria_storage::MAX_HISTORY_LIMIT;

use crate::error::ApiError;
use crate::session;
use crate::state::AppState;

/// History rows returned when the caller does not ask for a specific limit.
const DEFAULT_DISPLAY_LIMIT: u32 = 50;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProcessInputRequest {
    pub message: Option<String>,
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessInputResponse {
    pub response: String,
    pub user_message_id: Uuid,
    pub assistant_message_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub message_id: String,
    pub feedback: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub message_id: Uuid,
    pub feedback: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub status: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub status: String,
    pub conversations: Vec<ConversationEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub status: String,
    pub conversation: ConversationEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub total_messages: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET / - ensure a session user exists and serve the chat page.
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<&'static str>), ApiError> {
    let (_, jar) = session::ensure_user(&state, jar)?;
    Ok((jar, Html(CHAT_PAGE)))
}

/// GET /health - liveness probe.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let total_messages = state.messages().count()?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_messages,
    }))
}

/// POST /process-input - one full assistant exchange.
pub async fn process_input(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ProcessInputRequest>,
) -> Result<(CookieJar, Json<ProcessInputResponse>), ApiError> {
    let message = req.message.as_deref().map(str::trim).unwrap_or("");
    if message.is_empty() {
        return Err(ApiError::BadRequest("No message provided".to_string()));
    }
    if message.chars().count() > state.config.chat.max_message_length {
        return Err(ApiError::BadRequest(format!(
            "Message exceeds maximum length of {} characters",
            state.config.chat.max_message_length
        )));
    }

    let (user_id, jar) = session::ensure_user(&state, jar)?;

    if let Some(conversation_id) = req.conversation_id {
        if !state
            .conversations()
            .owned(conversation_id, user_id, state.tenant_id())?
        {
            return Err(ApiError::BadRequest("Unknown conversation".to_string()));
        }
    }

    // Prior turns only: the new message is appended by the assembler, so it
    // appears exactly once in the collaborator payload.
    let prompt_limit = state
        .config
        .chat
        .prompt_history_turns
        .clamp(1, MAX_HISTORY_LIMIT);
    let history = state
        .messages()
        .history(user_id, state.tenant_id(), prompt_limit)?;

    let user_message_id = state.messages().append(
        user_id,
        state.tenant_id(),
        req.conversation_id,
        Role::User,
        message,
    )?;

    let prompt = build_prompt(&state.config.chat.system_prompt, &history, message);
    // On collaborator failure the user turn above is retained; history stays
    // consistent with what was actually sent.
    let raw = state.completion.complete(&prompt).await?;
    let response = postprocess(&raw);

    let assistant_message_id = state.messages().append(
        user_id,
        state.tenant_id(),
        req.conversation_id,
        Role::Assistant,
        &response,
    )?;

    if let Some(conversation_id) = req.conversation_id {
        state.conversations().touch(conversation_id)?;
    }

    Ok((
        jar,
        Json(ProcessInputResponse {
            response,
            user_message_id,
            assistant_message_id,
        }),
    ))
}

/// POST /feedback - record a -1/0/+1 score against a message token.
pub async fn feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let token = Uuid::parse_str(&req.message_id)
        .map_err(|_| ApiError::BadRequest("Invalid message identifier".to_string()))?;

    let updated = state.messages().set_feedback(token, req.feedback)?;
    if !updated {
        return Err(ApiError::NotFound("Message not found".to_string()));
    }
    Ok(Json(StatusResponse::success()))
}

/// POST /clear-session - delete the user's message history.
pub async fn clear_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<StatusResponse>), ApiError> {
    let (user_id, jar) = session::ensure_user(&state, jar)?;
    state.messages().clear(user_id, state.tenant_id())?;
    Ok((jar, Json(StatusResponse::success())))
}

/// GET /get-history - the user's recent turns, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<HistoryParams>,
) -> Result<(CookieJar, Json<HistoryResponse>), ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_DISPLAY_LIMIT);
    let (user_id, jar) = session::ensure_user(&state, jar)?;

    let turns = state.messages().history(user_id, state.tenant_id(), limit)?;
    let history = turns.into_iter().map(turn_to_entry).collect();

    Ok((
        jar,
        Json(HistoryResponse {
            status: "success".to_string(),
            history,
        }),
    ))
}

/// GET /conversations - list the user's chat threads, most recent first.
pub async fn list_conversations(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ConversationsResponse>), ApiError> {
    let (user_id, jar) = session::ensure_user(&state, jar)?;

    let conversations = state
        .conversations()
        .list(user_id, state.tenant_id())?
        .into_iter()
        .map(|c| ConversationEntry {
            id: c.id,
            title: c.title,
            created_at: micros_to_datetime(c.created_at),
            updated_at: micros_to_datetime(c.updated_at),
        })
        .collect();

    Ok((
        jar,
        Json(ConversationsResponse {
            status: "success".to_string(),
            conversations,
        }),
    ))
}

/// POST /conversations - create a new chat thread for the user.
pub async fn create_conversation(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(CookieJar, Json<CreateConversationResponse>), ApiError> {
    let (user_id, jar) = session::ensure_user(&state, jar)?;

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("New conversation");

    let created = state
        .conversations()
        .create(user_id, state.tenant_id(), title)?;

    Ok((
        jar,
        Json(CreateConversationResponse {
            status: "success".to_string(),
            conversation: ConversationEntry {
                id: created.id,
                title: created.title,
                created_at: micros_to_datetime(created.created_at),
                updated_at: micros_to_datetime(created.updated_at),
            },
        }),
    ))
}

fn turn_to_entry(turn: Turn) -> HistoryEntry {
    HistoryEntry {
        role: turn.role,
        content: turn.content,
        timestamp: micros_to_datetime(turn.timestamp),
        message_id: turn.message_token,
        feedback: turn.feedback,
    }
}

fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Minimal chat page served at `/`.
const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Galleria Assistant</title>
  <style>
    body { font-family: sans-serif; max-width: 640px; margin: 2rem auto; }
    #chat { border: 1px solid #ccc; padding: 1rem; min-height: 300px; white-space: pre-line; }
    .user { color: #234; font-weight: bold; }
    .assistant { color: #362; }
    form { display: flex; gap: .5rem; margin-top: 1rem; }
    input { flex: 1; padding: .5rem; }
  </style>
</head>
<body>
  <h1>Galleria Assistant</h1>
  <div id="chat"></div>
  <form id="form">
    <input id="input" placeholder="Ask about shops, hours, services…" autocomplete="off">
    <button>Send</button>
    <button type="button" id="clear">Clear</button>
  </form>
  <script>
    const chat = document.getElementById('chat');
    const add = (role, text) => {
      const div = document.createElement('div');
      div.className = role;
      div.innerHTML = role + ': ' + text;
      chat.appendChild(div);
    };
    fetch('/get-history').then(r => r.json()).then(d =>
      (d.history || []).forEach(m => add(m.role, m.content)));
    document.getElementById('form').addEventListener('submit', async e => {
      e.preventDefault();
      const input = document.getElementById('input');
      const message = input.value.trim();
      if (!message) return;
      add('user', message);
      input.value = '';
      const resp = await fetch('/process-input', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ message })
      });
      const data = await resp.json();
      add('assistant', data.response || data.error);
    });
    document.getElementById('clear').addEventListener('click', async () => {
      await fetch('/clear-session', { method: 'POST' });
      chat.innerHTML = '';
    });
  </script>
</body>
</html>
"#;
