use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tower_sessions::session::Error as SessionError;
use tower_sessions::Session;

const IST_KEY: &str = "ist";
const SESSION_TOKEN_KEY: &str = "stytch_session_token";

/// Typed view over the browser session.
///
/// It holds at most two values: an intermediate session token while the
/// member is between discovery authentication and organization selection,
/// and a full session token once they are logged into an organization.
#[derive(Debug, Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    pub async fn ist(&self) -> Result<Option<String>, SessionError> {
        self.session.get(IST_KEY).await
    }

    pub async fn session_token(&self) -> Result<Option<String>, SessionError> {
        self.session.get(SESSION_TOKEN_KEY).await
    }

    /// Store the intermediate session token from a discovery authentication.
    /// Any full session token is dropped at the same time: holding an IST
    /// means organization selection has not happened yet.
    pub async fn set_ist(&self, token: &str) -> Result<(), SessionError> {
        self.session.remove::<String>(SESSION_TOKEN_KEY).await?;
        self.session.insert(IST_KEY, token).await
    }

    /// Store or rotate the full session token. The IST is left alone; flows
    /// that consume one clear it explicitly.
    pub async fn set_session_token(&self, token: &str) -> Result<(), SessionError> {
        self.session.insert(SESSION_TOKEN_KEY, token).await
    }

    pub async fn clear_ist(&self) -> Result<(), SessionError> {
        self.session.remove::<String>(IST_KEY).await.map(|_| ())
    }

    pub async fn clear_session_token(&self) -> Result<(), SessionError> {
        self.session
            .remove::<String>(SESSION_TOKEN_KEY)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        Ok(AuthSession { session })
    }
}
