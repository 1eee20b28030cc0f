use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::Error;

/// Header carrying the caller identity, set by the upstream gateway
pub const USERNAME_HEADER: &str = "x-username";

const MAX_USERNAME_LEN: usize = 64;

/// The authenticated caller.
///
/// Every user-scoped operation takes one of these explicitly; there is no
/// ambient "current user".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
}

impl AuthContext {
    pub fn new(username: &str) -> Result<Self, Error> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Unauthorized("username must not be empty".into()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(Error::Unauthorized(format!(
                "username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if username.chars().any(char::is_control) {
            return Err(Error::Unauthorized(
                "username must not contain control characters".into(),
            ));
        }

        Ok(AuthContext {
            username: username.to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USERNAME_HEADER) else {
            return Err(Error::Unauthorized("not logged in".into()));
        };
        let username = value
            .to_str()
            .map_err(|_| Error::Unauthorized("username header is not valid text".into()))?;

        AuthContext::new(username)
    }
}
