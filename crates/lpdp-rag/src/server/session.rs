//! Session id carried in a cookie

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use std::convert::Infallible;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lpdp_session";

/// Session id of the current request, minted when the client has none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    id: Option<String>,
    minted: Option<String>,
}

impl SessionCookie {
    /// Read the session cookie, ignoring malformed values
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| is_valid_id(value));
        Self { id, minted: None }
    }

    /// Existing session id, if the client sent one
    pub fn existing(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Existing id, or a fresh one the response must set
    pub fn get_or_create(&mut self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                self.minted = Some(id.clone());
                self.id = Some(id.clone());
                id
            }
        }
    }

    /// Attach `Set-Cookie` when a new id was minted for this request
    pub fn apply(&self, mut response: Response) -> Response {
        if let Some(id) = &self.minted {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
