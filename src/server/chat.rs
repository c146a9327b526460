use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{AppState, internal};
use crate::chat::{ChatMessage, ChatRole, now_iso};

pub const SESSION_COOKIE: &str = "counsel_session";

const PAGE: &str = include_str!("../../assets/chat.html");

/// The caller's chat session, issued on first contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    issued: bool,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match session_cookie(headers) {
            Some(id) => Self { id, issued: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                issued: true,
            },
        }
    }

    /// `Set-Cookie` for a freshly issued session, empty otherwise.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.issued {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(SET_COOKIE, value);
            }
        }
        headers
    }
}

/// Session id from the `Cookie` header, if present and a valid UUID.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

pub async fn index(headers: HeaderMap) -> impl IntoResponse {
    (Session::from_headers(&headers).headers(), Html(PAGE))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Response {
    let session = Session::from_headers(&headers);
    let message = body.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            session.headers(),
            Json(json!({ "error": "Empty message" })),
        )
            .into_response();
    }

    let history = match state.chats.history(&session.id) {
        Ok(history) => history,
        Err(e) => return internal(e).into_response(),
    };
    let asked_at = now_iso();
    let response = state.co_counsel.respond(&history, message).await;

    let user = ChatMessage {
        role: ChatRole::User,
        content: message.to_string(),
        timestamp: asked_at,
    };
    let assistant = ChatMessage::now(ChatRole::Assistant, response.as_str());
    let saved = state
        .chats
        .append(&session.id, &user)
        .and_then(|_| state.chats.append(&session.id, &assistant))
        .and_then(|_| state.chats.trim(&session.id, state.history_limit));
    if let Err(e) = saved {
        return internal(e).into_response();
    }
    debug!(session = %session.id, turns = history.len() + 2, "chat exchange saved");

    (
        session.headers(),
        Json(json!({ "response": response, "status": "success" })),
    )
        .into_response()
}

pub async fn clear(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = Session::from_headers(&headers);
    match state.chats.clear(&session.id) {
        Ok(()) => (session.headers(), Json(json!({ "status": "success" }))).into_response(),
        Err(e) => internal(e).into_response(),
    }
}

pub async fn export(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = Session::from_headers(&headers);
    match state.chats.history(&session.id) {
        Ok(conversation) => (
            session.headers(),
            Json(json!({
                "session_id": session.id,
                "conversation": conversation,
                "exported_at": now_iso(),
            })),
        )
            .into_response(),
        Err(e) => internal(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reuses_valid_cookie() {
        let id = Uuid::new_v4().to_string();
        let session = Session::from_headers(&with_cookie(&format!("theme=dark; {SESSION_COOKIE}={id}")));
        assert_eq!(session.id, id);
        assert!(session.headers().is_empty());
    }

    #[test]
    fn issues_cookie_when_missing() {
        let session = Session::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(&session.id).is_ok());
        let cookie = session.headers();
        let cookie = cookie.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}={}", session.id)));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn rejects_forged_cookie() {
        let session = Session::from_headers(&with_cookie(&format!("{SESSION_COOKIE}=../../etc")));
        assert_ne!(session.id, "../../etc");
        assert!(!session.headers().is_empty());
    }
}
