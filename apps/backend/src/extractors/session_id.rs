use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::validate_session_id;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Session id taken from the `{session_id}` path segment, shape-checked.
/// Existence is not checked here; handlers get `SESSION_NOT_FOUND` from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for SessionId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.match_info().get("session_id") {
            None => Err(AppError::bad_request(
                ErrorCode::InvalidSessionId,
                "Missing session_id parameter",
            )),
            Some(raw) => validate_session_id(raw)
                .map(|()| SessionId(raw.to_string()))
                .map_err(AppError::from),
        };
        ready(result)
    }
}
